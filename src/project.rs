//! A changelog project: a root directory with its configuration, its pending
//! pool, and its releases.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::entry::{Entry, EntryDraft, EntryStore};
use crate::error::{Error, Result};
use crate::modules::{self, Module};
use crate::release::{self, ManifestStore, ReleaseManifest};
use crate::version::{self, VersionLabel};

/// An opened changelog project.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Open the project at `root`, loading its configuration.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = config::load_project_config(&root)?;
        Ok(Self { root, config })
    }

    pub fn from_parts(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn entries(&self) -> EntryStore {
        EntryStore::pending(&self.root)
    }

    pub fn releases(&self) -> ManifestStore {
        ManifestStore::for_project(&self.root)
    }

    /// Create a pending entry.
    ///
    /// The id must be free in the pending pool and in every release.
    pub fn create_entry(&self, draft: EntryDraft) -> Result<Entry> {
        let id = crate::slug::entry_id(draft.title.trim())?;
        let releases = self.releases();
        for manifest in releases.list()? {
            if manifest.entries.iter().any(|e| *e == id) {
                return Err(Error::DuplicateEntryId {
                    path: releases.entry_path(&manifest.version, &id),
                    id,
                });
            }
        }
        self.entries().create(draft, &self.config)
    }

    /// Pending entries not referenced by any manifest and belonging to this
    /// project (no project set, or the configured id).
    pub fn unused_entries(&self) -> Result<Vec<Entry>> {
        let used: BTreeSet<String> = self.releases().used_ids()?;
        let pending = self.entries().list()?;
        Ok(release::unused_entries(pending, &used)
            .into_iter()
            .filter(|entry| {
                entry
                    .header
                    .project
                    .as_deref()
                    .is_none_or(|p| p == self.config.id)
            })
            .collect())
    }

    /// Modules configured for this project.
    pub fn modules(&self) -> Result<Vec<Module>> {
        modules::discover_from_config(&self.root, &self.config)
    }

    /// Greatest parseable release version.
    pub fn latest_version(&self) -> Result<Option<VersionLabel>> {
        let manifests = self.releases().list()?;
        Ok(version::latest(manifests.iter().map(|m| m.version.as_str())))
    }

    /// The manifest with the greatest version strictly lower than `version`.
    pub fn previous_manifest(&self, version: &VersionLabel) -> Result<Option<ReleaseManifest>> {
        let mut candidates: Vec<(VersionLabel, ReleaseManifest)> = self
            .releases()
            .list()?
            .into_iter()
            .filter_map(|m| VersionLabel::parse_lenient(&m.version).map(|v| (v, m)))
            .filter(|(v, _)| v.version() < version.version())
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(candidates.pop().map(|(_, m)| m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryStore;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Project) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.yaml"), "id: node\nname: Node\n").unwrap();
        let project = Project::open(temp_dir.path()).unwrap();
        (temp_dir, project)
    }

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            title: title.to_string(),
            kind: "change".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_requires_config() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            Project::open(temp_dir.path().join("missing")),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_create_entry_rejects_released_id() {
        let (_temp, project) = setup();
        let mut manifest = ReleaseManifest::new(
            "v1.0.0",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "one",
        );
        manifest.entries = vec!["fix-a".to_string()];
        project.releases().write(&manifest, "").unwrap();

        let err = project.create_entry(draft("Fix A")).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntryId { ref id, .. } if id == "fix-a"));
    }

    #[test]
    fn test_unused_entries_filters_used_and_foreign() {
        let (_temp, project) = setup();
        project.create_entry(draft("Released")).unwrap();
        project.create_entry(draft("Pending")).unwrap();
        let mut foreign = draft("Foreign");
        foreign.projects = vec!["other".to_string()];
        project.create_entry(foreign).unwrap();

        let mut manifest = ReleaseManifest::new(
            "v1.0.0",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "one",
        );
        manifest.entries = vec!["released".to_string()];
        project.releases().write(&manifest, "").unwrap();

        let ids: Vec<String> = project
            .unused_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["pending"]);
        assert_eq!(EntryStore::pending(project.root()).list().unwrap().len(), 3);
    }

    #[test]
    fn test_latest_and_previous_versions() {
        let (_temp, project) = setup();
        for version in ["v1.0.0", "v1.10.0", "v1.2.0", "snapshot"] {
            let manifest = ReleaseManifest::new(
                version,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                version,
            );
            project.releases().write(&manifest, "").unwrap();
        }

        assert_eq!(project.latest_version().unwrap().unwrap().as_str(), "v1.10.0");
        let target = VersionLabel::parse("v1.10.0").unwrap();
        assert_eq!(
            project.previous_manifest(&target).unwrap().unwrap().version,
            "v1.2.0"
        );
        let first = VersionLabel::parse("v1.0.0").unwrap();
        assert!(project.previous_manifest(&first).unwrap().is_none());
    }
}
