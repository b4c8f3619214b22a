//! # Structural Validation
//!
//! Read-only checks over a project and its modules. Validation never repairs
//! anything; it reports [`ValidationIssue`]s and leaves the decision to the
//! caller. Mutating commands refuse to run while any issue has
//! [`Severity::Error`].
//!
//! Checks performed per project:
//!
//! - every pending and released entry parses, has a title, and uses a known
//!   kind;
//! - entry `project` values match the configured id;
//! - entry components are in the configured component list;
//! - every id a manifest lists has a file in that release;
//! - no id is listed by two manifests;
//! - no id is both pending and released;
//! - files in a release's `entries/` directory that the manifest does not
//!   list (warning).
//!
//! Module validation adds duplicate module ids and prefixes per-module issues
//! with `[module-id]`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::defaults::ENTRY_EXTENSION;
use crate::entry::{Entry, EntryStore};
use crate::error::{Error, Result};
use crate::index::ReleaseIndex;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single problem found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: PathBuf,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    fn warning(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.path.display(),
            self.message
        )
    }
}

/// Validate a single project without its modules.
pub fn validate_project(project: &Project) -> Result<Vec<ValidationIssue>> {
    let config = project.config();
    let mut issues = Vec::new();

    let pending = check_entry_files(&project.entries(), config, &mut issues)?;

    let store = project.releases();
    let manifests = match store.list() {
        Ok(manifests) => manifests,
        Err(Error::ManifestParse { path, message }) => {
            issues.push(ValidationIssue::error(path, message));
            return Ok(issues);
        }
        Err(e) => return Err(e),
    };

    for manifest in &manifests {
        let entries_dir = store.entries_dir(&manifest.version);
        let released = check_entry_files(&EntryStore::new(&entries_dir), config, &mut issues)?;

        for id in &manifest.entries {
            if !released.contains(id) && !store.entry_path(&manifest.version, id).is_file() {
                issues.push(ValidationIssue::error(
                    store.manifest_path(&manifest.version),
                    format!("references missing entry '{id}'"),
                ));
            }
            if pending.contains(id) {
                issues.push(ValidationIssue::error(
                    project.entries().path_for(id),
                    format!(
                        "entry '{id}' is pending but already released in {}",
                        manifest.version
                    ),
                ));
            }
        }

        let listed: BTreeSet<&str> = manifest.entries.iter().map(String::as_str).collect();
        for stray in stray_files(&entries_dir, &listed) {
            issues.push(ValidationIssue::warning(
                stray,
                format!("not listed in the manifest of {}", manifest.version),
            ));
        }
    }

    let index = ReleaseIndex::build(&manifests);
    for (id, versions) in index.shared_ids() {
        issues.push(ValidationIssue::error(
            store.dir(),
            format!("entry '{id}' is listed by several releases: {}", versions.join(", ")),
        ));
    }

    Ok(issues)
}

/// Validate a project and every configured module.
pub fn validate_with_modules(project: &Project) -> Result<Vec<ValidationIssue>> {
    let mut issues = validate_project(project)?;

    let modules = project.modules()?;
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
    seen.insert(project.config().id.clone(), project.root().to_path_buf());
    for module in &modules {
        if let Some(first) = seen.get(module.id()) {
            issues.push(ValidationIssue::error(
                &module.root,
                format!(
                    "duplicate module id '{}' (also used by {})",
                    module.id(),
                    first.display()
                ),
            ));
            continue;
        }
        seen.insert(module.id().to_string(), module.root.clone());

        for issue in validate_project(&module.project())? {
            issues.push(ValidationIssue {
                message: format!("[{}] {}", module.id(), issue.message),
                ..issue
            });
        }
    }

    Ok(issues)
}

/// Whether any issue is an error.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

/// Parse every file of a store and check its header against the project
/// configuration. Returns the ids of files that parsed.
fn check_entry_files(
    store: &EntryStore,
    config: &Config,
    issues: &mut Vec<ValidationIssue>,
) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for path in store.paths()? {
        match Entry::read(&path) {
            Ok(entry) => {
                check_entry(&entry, config, issues);
                ids.insert(entry.id);
            }
            Err(Error::EntryParse { path, message }) => {
                issues.push(ValidationIssue::error(path, message));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(ids)
}

fn check_entry(entry: &Entry, config: &Config, issues: &mut Vec<ValidationIssue>) {
    if entry.title().trim().is_empty() {
        issues.push(ValidationIssue::error(&entry.path, "missing title"));
    }
    if let Some(project) = &entry.header.project {
        if *project != config.id {
            issues.push(ValidationIssue::error(
                &entry.path,
                format!("project '{project}' does not match '{}'", config.id),
            ));
        }
    }
    for component in &entry.header.components {
        if config.canonical_component(component).is_none() {
            issues.push(ValidationIssue::error(
                &entry.path,
                format!(
                    "unknown component '{component}' (allowed: {})",
                    config.component_names().join(", ")
                ),
            ));
        }
    }
}

/// Entry files in `dir` whose stem is not in `listed`.
fn stray_files(dir: &Path, listed: &BTreeSet<&str>) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let is_entry = path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION);
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            !is_entry || !listed.contains(stem)
        })
        .collect()
}
