//! # shiplog
//!
//! A changelog manager. Changes are recorded as individual Markdown entry
//! files in a pending pool and later promoted into versioned releases, each
//! with a manifest and rendered release notes.
//!
//! ## Quick Example
//!
//! ```
//! use shiplog::entry::EntryDraft;
//! use shiplog::project::Project;
//! use shiplog::promote::{promote, PromoteOptions};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("config.yaml"), "id: demo\n").unwrap();
//! let project = Project::open(dir.path()).unwrap();
//!
//! project
//!     .create_entry(EntryDraft {
//!         title: "Fix crash on startup".to_string(),
//!         kind: "bugfix".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let options = PromoteOptions {
//!     version: Some("v1.0.0".to_string()),
//!     confirm: true,
//!     ..Default::default()
//! };
//! let outcome = promote(&project, &options).unwrap();
//! assert!(outcome.is_success());
//!
//! // Running the same promotion again changes nothing.
//! let again = promote(&project, &options).unwrap();
//! assert!(matches!(again, shiplog::promote::PromoteOutcome::UpToDate { .. }));
//! ```
//!
//! ## Core Concepts
//!
//! - **Entries (`entry`)**: Markdown files with YAML front matter, identified
//!   by their file stem.
//! - **Releases (`release`)**: A directory per version holding
//!   `manifest.yaml`, `notes.md`, and the entry files the release owns.
//! - **Promotion (`promote`)**: Moves unused entries into a release. Reruns
//!   are idempotent and only write when the rendered result differs.
//! - **Modules (`modules`, `aggregate`)**: Sibling changelog projects whose
//!   releases are folded into the parent's notes.
//! - **Resolution (`resolve`, `snapshot`)**: Maps row numbers, release
//!   versions, and id fragments to entries.
//! - **Export and statistics (`export`, `stats`)**: Re-render a release as
//!   Markdown or JSON, and summarize releases and entries per project.

pub mod aggregate;
pub mod config;
pub mod defaults;
pub mod entry;
pub mod error;
pub mod export;
pub mod git;
pub mod index;
pub mod modules;
pub mod notes;
pub mod output;
pub mod project;
pub mod promote;
pub mod publish;
pub mod release;
pub mod resolve;
pub mod slug;
pub mod snapshot;
pub mod stats;
pub mod suggestions;
pub mod validate;
pub mod version;

#[cfg(test)]
mod slug_proptest;
