//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `shiplog` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, the project root,
//!   and an [`OutputSink`], and performs the command's logic by calling into
//!   the `shiplog` library.

pub mod add;
pub mod completions;
pub mod modules;
pub mod release;
pub mod show;
pub mod stats;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use shiplog::defaults::{CONFIG_FILENAME, PACKAGE_FILENAME};
use shiplog::output::OutputSink;
use shiplog::project::Project;
use shiplog::suggestions;
use shiplog::validate::{validate_with_modules, ValidationIssue};

/// Open the project at `root`, with a hint when there is no configuration.
pub fn open_project(root: &Path) -> Result<Project> {
    let has_config = root.join(CONFIG_FILENAME).is_file()
        || root.join("..").join(PACKAGE_FILENAME).is_file();
    if !has_config {
        return Err(suggestions::config_not_found(root));
    }
    Project::open(root).map_err(suggestions::explain)
}

/// Refuse to continue when validation reports errors.
///
/// Errors are printed as warnings first so the user sees what to fix.
pub fn ensure_valid(project: &Project, action: &str, sink: &dyn OutputSink) -> Result<()> {
    let issues = validate_with_modules(project)?;
    let errors: Vec<&ValidationIssue> = issues.iter().filter(|i| i.is_error()).collect();
    if errors.is_empty() {
        return Ok(());
    }
    for issue in &errors {
        sink.warn(&issue.to_string());
    }
    Err(suggestions::validation_failed(action, errors.len()))
}
