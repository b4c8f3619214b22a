//! # Release Promotion
//!
//! Promotion moves pending entries into a release. It is idempotent and
//! gated by an explicit confirmation:
//!
//! 1. The target version is resolved, either from an explicit label or by
//!    bumping the latest existing release.
//! 2. An existing manifest for that version is loaded together with its
//!    entries. A listed entry without a file is fatal.
//! 3. New entries are the unused pending entries not already in the release.
//!    They are appended after the existing ones, sorted by lower-cased title
//!    and then id.
//! 4. Title, intro, and date take an explicit value first, then the existing
//!    manifest's value, then a default.
//! 5. Notes are rendered and compared with what is on disk.
//!
//! When nothing differs the plan is empty and applying it writes nothing.
//! Without confirmation the planned changes are returned unapplied.
//!
//! Relocating entry files is not transactional. If moving one file fails,
//! earlier files stay moved and the manifest is not written.

use std::fmt;
use std::fs;

use chrono::{NaiveDate, Utc};
use log::debug;

use crate::aggregate;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::notes::{
    append_module_sections, compose_release_document, MarkdownNotes, ModuleSection, NotesRenderer,
    NotesStyle,
};
use crate::project::Project;
use crate::release::{normalize_notes, ReleaseManifest};
use crate::version::{self, Bump, VersionLabel};

/// Options controlling a promotion.
#[derive(Debug, Clone, Default)]
pub struct PromoteOptions {
    /// Explicit version label.
    pub version: Option<String>,
    /// Bump the latest release instead of naming a version.
    pub bump: Option<Bump>,
    /// Release title. `Some("")` is an explicit empty title.
    pub title: Option<String>,
    /// Release intro. `Some("")` explicitly clears an existing intro.
    pub intro: Option<String>,
    /// Release date.
    pub date: Option<NaiveDate>,
    /// Notes style. When absent the existing notes' style is kept.
    pub style: Option<NotesStyle>,
    /// Render pull request references as links.
    pub explicit_links: bool,
    /// Apply the plan instead of only reporting it.
    pub confirm: bool,
}

/// A single change a promotion would make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedChange {
    CreateDirectory,
    AppendEntries(usize),
    UpdateManifest,
    RefreshNotes,
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedChange::CreateDirectory => write!(f, "create release directory"),
            PlannedChange::AppendEntries(1) => write!(f, "append 1 new entry"),
            PlannedChange::AppendEntries(n) => write!(f, "append {n} new entries"),
            PlannedChange::UpdateManifest => write!(f, "update manifest metadata"),
            PlannedChange::RefreshNotes => write!(f, "refresh release notes"),
        }
    }
}

/// Everything a promotion would write.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub manifest: ReleaseManifest,
    pub notes: String,
    pub style: NotesStyle,
    /// Entries already in the release, in manifest order.
    pub existing: Vec<Entry>,
    /// Entries to relocate from the pending pool, in append order.
    pub new_entries: Vec<Entry>,
    pub changes: Vec<PlannedChange>,
}

impl ReleasePlan {
    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn is_up_to_date(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Result of [`promote`].
#[derive(Debug, Clone)]
pub enum PromoteOutcome {
    /// Nothing differs from what is on disk. Nothing was written.
    UpToDate { version: String },
    /// Changes are needed but were not confirmed.
    Pending { plan: ReleasePlan },
    /// Changes were applied.
    Applied { plan: ReleasePlan },
}

impl PromoteOutcome {
    /// Whether the command should report success.
    pub fn is_success(&self) -> bool {
        !matches!(self, PromoteOutcome::Pending { .. })
    }
}

/// Resolve the target version of a promotion.
///
/// Returns the label and whether it was computed by a bump.
pub fn resolve_version(
    project: &Project,
    explicit: Option<&str>,
    bump: Option<Bump>,
) -> Result<(VersionLabel, bool)> {
    match (explicit, bump) {
        (Some(label), Some(_)) => Err(Error::InvalidVersion {
            label: label.to_string(),
            message: "provide either a version or a bump, not both".to_string(),
        }),
        (Some(label), None) => Ok((VersionLabel::parse(label)?, false)),
        (None, Some(bump)) => {
            let manifests = project.releases().list()?;
            let next = version::next_version(manifests.iter().map(|m| m.version.as_str()), bump)?;
            Ok((next, true))
        }
        (None, None) => Err(Error::Usage {
            message: "provide a version or one of --patch, --minor, --major".to_string(),
        }),
    }
}

/// Compute what promoting into a version would change, without writing.
pub fn plan_release(project: &Project, options: &PromoteOptions) -> Result<ReleasePlan> {
    let (label, bumped) = resolve_version(project, options.version.as_deref(), options.bump)?;
    let version = label.as_str().to_string();
    let store = project.releases();
    let config = project.config();

    let existing_manifest = store.find(&version)?;
    if bumped && existing_manifest.is_some() {
        return Err(Error::VersionConflict { version });
    }

    let existing = match &existing_manifest {
        Some(manifest) => store.load_entries(manifest)?,
        None => Vec::new(),
    };

    let mut new_entries: Vec<Entry> = project
        .unused_entries()?
        .into_iter()
        .filter(|entry| !existing.iter().any(|e| e.id == entry.id))
        .collect();
    new_entries.sort_by(Entry::release_order);

    let title = match (&options.title, &existing_manifest) {
        (Some(title), _) => title.trim().to_string(),
        (None, Some(manifest)) => manifest.title.clone(),
        (None, None) => format!("{} {}", config.name, version),
    };
    let intro = match (&options.intro, &existing_manifest) {
        (Some(intro), _) => Some(intro.trim().to_string()),
        (None, Some(manifest)) => manifest.intro.clone(),
        (None, None) => None,
    }
    .filter(|intro| !intro.is_empty());

    if existing.is_empty() && new_entries.is_empty() && intro.is_none() {
        return Err(Error::NoUnusedEntries { version });
    }

    let created = options
        .date
        .or_else(|| existing_manifest.as_ref().map(|m| m.created))
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut manifest = ReleaseManifest::new(version.clone(), created, title);
    manifest.intro = intro;
    manifest.entries = existing
        .iter()
        .chain(new_entries.iter())
        .map(|e| e.id.clone())
        .collect();
    if let Some(existing) = &existing_manifest {
        manifest.modules = existing.modules.clone();
    }

    let all_entries: Vec<Entry> = existing.iter().chain(new_entries.iter()).cloned().collect();

    let modules = project.modules()?;
    let mut aggregation = aggregate::Aggregation::default();
    if !modules.is_empty() {
        let previous = project.previous_manifest(&label)?;
        aggregation = aggregate::delta(&modules, previous.as_ref().map(|m| &m.modules), None)?;
        if !aggregation.current_versions.is_empty() {
            manifest.modules = aggregation.current_versions.clone();
        }
    }
    let sections: Vec<ModuleSection<'_>> = aggregation
        .deltas
        .values()
        .map(|delta| ModuleSection {
            config: &delta.config,
            version: delta.current_version.as_deref(),
            entries: &delta.entries,
        })
        .collect();

    let render_document = |entries: &[Entry], intro: Option<&str>, style: NotesStyle| {
        let renderer = MarkdownNotes::new(style).with_explicit_links(options.explicit_links);
        let notes = renderer.render(entries, config);
        let document = compose_release_document(intro, &notes);
        normalize_notes(&append_module_sections(&document, &sections))
    };

    // Without an explicit style, keep whichever style reproduces the current
    // notes, either as they will be or as they were before this promotion.
    let existing_notes = store.read_notes(&version)?;
    let style = match (options.style, existing_notes.as_deref()) {
        (Some(style), _) => style,
        (None, None) => config.export_style,
        (None, Some(current)) => {
            let current = current.trim_end_matches('\n');
            let previous_intro = existing_manifest.as_ref().and_then(|m| m.intro.as_deref());
            [NotesStyle::Compact, NotesStyle::Standard]
                .into_iter()
                .find(|candidate| {
                    render_document(&all_entries, manifest.intro.as_deref(), *candidate)
                        .trim_end_matches('\n')
                        == current
                        || render_document(&existing, previous_intro, *candidate)
                            .trim_end_matches('\n')
                            == current
                })
                .unwrap_or(config.export_style)
        }
    };
    let notes = render_document(&all_entries, manifest.intro.as_deref(), style);

    let mut changes = Vec::new();
    if !store.release_dir(&version).is_dir() {
        changes.push(PlannedChange::CreateDirectory);
    }
    if !new_entries.is_empty() {
        changes.push(PlannedChange::AppendEntries(new_entries.len()));
    }
    let manifest_text = manifest.to_yaml()?;
    let current_manifest = store.read_manifest_text(&version)?;
    if manifest_text.trim_end_matches('\n')
        != current_manifest.as_deref().unwrap_or_default().trim_end_matches('\n')
    {
        changes.push(PlannedChange::UpdateManifest);
    }
    if notes.trim_end_matches('\n')
        != existing_notes.as_deref().unwrap_or_default().trim_end_matches('\n')
    {
        changes.push(PlannedChange::RefreshNotes);
    }

    debug!(
        "planned release {}: {} existing, {} new, {} changes",
        version,
        existing.len(),
        new_entries.len(),
        changes.len()
    );

    Ok(ReleasePlan {
        manifest,
        notes,
        style,
        existing,
        new_entries,
        changes,
    })
}

/// Apply a plan: relocate new entries, then write the manifest and notes.
///
/// An up-to-date plan performs no filesystem operation at all.
pub fn apply_plan(project: &Project, plan: &ReleasePlan) -> Result<()> {
    if plan.is_up_to_date() {
        return Ok(());
    }
    let store = project.releases();
    let version = plan.version();
    let entries_dir = store.entries_dir(version);
    fs::create_dir_all(&entries_dir)?;

    for entry in &plan.new_entries {
        let relocation_error = |message: String| Error::RelocationFailed {
            id: entry.id.clone(),
            version: version.to_string(),
            message,
        };
        let source = &entry.path;
        let Some(file_name) = source.file_name() else {
            return Err(relocation_error(format!("{} has no file name", source.display())));
        };
        let destination = entries_dir.join(file_name);
        if !source.is_file() {
            return Err(relocation_error(format!("{} is missing", source.display())));
        }
        if destination.exists() {
            return Err(relocation_error(format!(
                "{} already exists",
                destination.display()
            )));
        }
        fs::rename(source, &destination).map_err(|e| relocation_error(e.to_string()))?;
        debug!("moved {} to {}", source.display(), destination.display());
    }

    store.write(&plan.manifest, &plan.notes)?;
    Ok(())
}

/// Plan a promotion and apply it when confirmed.
pub fn promote(project: &Project, options: &PromoteOptions) -> Result<PromoteOutcome> {
    let plan = plan_release(project, options)?;
    if plan.is_up_to_date() {
        return Ok(PromoteOutcome::UpToDate {
            version: plan.manifest.version,
        });
    }
    if !options.confirm {
        return Ok(PromoteOutcome::Pending { plan });
    }
    apply_plan(project, &plan)?;
    Ok(PromoteOutcome::Applied { plan })
}
