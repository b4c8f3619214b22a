//! # Release Export
//!
//! Re-renders a release, or the pending pool, as Markdown or as a JSON
//! document. The export is computed from the manifest and entry files and
//! never reads or writes the stored `notes.md`.
//!
//! Entries are exported grouped by kind in section order (breaking,
//! feature, change, bugfix), keeping manifest order within a kind.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::entry::{sort_descending, Entry, EntryKind};
use crate::error::{Error, Result};
use crate::notes::{
    compose_release_document, extract_excerpt, MarkdownNotes, NotesRenderer, NotesStyle,
    SECTION_ORDER,
};
use crate::project::Project;
use crate::release::{normalize_notes, ReleaseManifest};

/// Heading used when exporting entries that belong to no release.
pub const UNRELEASED_TITLE: &str = "Unreleased Changes";

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

/// A release (or the pending pool) ready to be exported.
#[derive(Debug, Clone)]
pub struct ReleaseExport {
    /// `None` for the pending pool.
    pub manifest: Option<ReleaseManifest>,
    /// Entries in section order.
    pub entries: Vec<Entry>,
}

/// Pull request reference in JSON exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrJson {
    pub number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryExportJson {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub created: Option<String>,
    pub project: String,
    pub prs: Vec<PrJson>,
    pub authors: Vec<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseExportJson {
    pub version: Option<String>,
    pub title: String,
    pub intro: Option<String>,
    pub project: String,
    pub created: String,
    pub entries: Vec<EntryExportJson>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub compact: bool,
}

fn in_section_order(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by_key(|entry| {
        SECTION_ORDER
            .iter()
            .position(|kind| *kind == entry.kind())
            .unwrap_or(SECTION_ORDER.len())
    });
    entries
}

impl ReleaseExport {
    /// Load a release by its exact version label.
    ///
    /// Entries are loaded strictly: a listed id without a file is
    /// [`Error::CorruptManifest`].
    pub fn release(project: &Project, version: &str) -> Result<Self> {
        let store = project.releases();
        let manifest = store
            .find(version)?
            .ok_or_else(|| Error::UnknownRelease {
                version: version.to_string(),
            })?;
        let entries = store.load_entries(&manifest)?;
        Ok(Self {
            manifest: Some(manifest),
            entries: in_section_order(entries),
        })
    }

    /// The entries a promotion would pick up next, newest first within a
    /// kind.
    pub fn unreleased(project: &Project) -> Result<Self> {
        let mut entries = project.unused_entries()?;
        sort_descending(&mut entries);
        Ok(Self {
            manifest: None,
            entries: in_section_order(entries),
        })
    }

    /// Render as Markdown, with the release intro in front of the notes.
    pub fn to_markdown(&self, config: &Config, style: NotesStyle, explicit_links: bool) -> String {
        let intro = self.manifest.as_ref().and_then(|m| m.intro.as_deref());
        if self.entries.is_empty() && intro.is_none_or(|i| i.trim().is_empty()) {
            return "No changes found.\n".to_string();
        }
        let notes = MarkdownNotes::new(style)
            .with_explicit_links(explicit_links)
            .render(&self.entries, config);
        normalize_notes(&compose_release_document(intro, &notes))
    }

    /// Build the JSON document. `today` dates an export of the pending pool.
    pub fn to_json(&self, config: &Config, compact: bool, today: NaiveDate) -> ReleaseExportJson {
        let (version, title, intro, created) = match &self.manifest {
            Some(manifest) => (
                Some(manifest.version.clone()),
                if manifest.title.trim().is_empty() {
                    manifest.version.clone()
                } else {
                    manifest.title.clone()
                },
                manifest.intro.clone().filter(|i| !i.trim().is_empty()),
                manifest.created,
            ),
            None => (None, UNRELEASED_TITLE.to_string(), None, today),
        };

        ReleaseExportJson {
            version,
            title,
            intro,
            project: config.id.clone(),
            created: created.format("%Y-%m-%d").to_string(),
            entries: self
                .entries
                .iter()
                .map(|entry| entry_json(entry, config, compact))
                .collect(),
            compact,
        }
    }
}

fn entry_json(entry: &Entry, config: &Config, compact: bool) -> EntryExportJson {
    let repository = config.repository.as_deref().filter(|r| !r.trim().is_empty());
    EntryExportJson {
        id: entry.id.clone(),
        title: entry.title().to_string(),
        kind: entry.kind(),
        created: entry.header.created.map(|c| c.to_rfc3339()),
        project: entry
            .header
            .project
            .clone()
            .unwrap_or_else(|| config.id.clone()),
        prs: entry
            .header
            .prs
            .iter()
            .map(|number| PrJson {
                number: *number,
                url: repository.map(|repo| format!("https://github.com/{repo}/pull/{number}")),
            })
            .collect(),
        authors: entry.header.authors.clone(),
        body: entry.body.clone(),
        components: entry.header.components.clone(),
        excerpt: compact.then(|| extract_excerpt(&entry.body)),
    }
}
