//! # Release Manifests
//!
//! Each release lives in its own directory under `releases/`, named after
//! the version label:
//!
//! ```text
//! releases/v1.0.0/
//!   manifest.yaml   created date, title, intro, entry ids, module versions
//!   notes.md        rendered release notes
//!   entries/        entry files relocated from the pending pool
//! ```
//!
//! The `entries` list of a manifest is append-only across promotions. Every
//! id it lists must have a file in the release's `entries/` directory; a
//! missing file is reported as [`Error::CorruptManifest`] and never skipped.
//!
//! Nothing here prevents the same entry id from being listed by two
//! manifests after a manual edit. [`crate::validate`] reports that case.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde_yaml::{Mapping, Value};

use crate::defaults::{
    ENTRY_EXTENSION, MANIFEST_FILENAME, NOTES_FILENAME, RELEASES_DIR, RELEASE_ENTRIES_DIR,
};
use crate::entry::{string_list, Entry};
use crate::error::{Error, Result};

/// A release manifest as stored in `manifest.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseManifest {
    /// Version label, equal to the release directory name.
    pub version: String,
    pub created: NaiveDate,
    pub title: String,
    pub intro: Option<String>,
    /// Entry ids in release order.
    pub entries: Vec<String>,
    /// Module id to the module version recorded at the last write.
    pub modules: BTreeMap<String, String>,
}

impl ReleaseManifest {
    pub fn new(version: impl Into<String>, created: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            created,
            title: title.into(),
            intro: None,
            entries: Vec::new(),
            modules: BTreeMap::new(),
        }
    }

    /// Parse manifest YAML for the given version label.
    ///
    /// A missing `created` defaults to today.
    pub fn parse(version: &str, content: &str, path: &Path) -> Result<Self> {
        let parse_error = |message: String| Error::ManifestParse {
            path: path.to_path_buf(),
            message,
        };

        let map = match serde_yaml::from_str::<Value>(content).map_err(|e| parse_error(e.to_string()))? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(parse_error("manifest must be a mapping".to_string())),
        };

        let created = match map.get("created") {
            None | Some(Value::Null) => Utc::now().date_naive(),
            Some(Value::String(text)) => {
                let text = text.trim();
                let date_part = text.get(..10).unwrap_or(text);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map_err(|_| parse_error(format!("invalid 'created' date '{text}'")))?
            }
            Some(other) => return Err(parse_error(format!("invalid 'created' date {other:?}"))),
        };

        let text_field = |key: &str| -> String {
            match map.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            }
        };
        let title = text_field("title");
        let intro = Some(text_field("intro")).filter(|s| !s.is_empty());

        let entries = match map.get("entries") {
            Some(value) => string_list(value, "entries").map_err(parse_error)?,
            None => Vec::new(),
        };

        let mut modules = BTreeMap::new();
        match map.get("modules") {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(raw)) => {
                for (key, value) in raw {
                    let (Some(id), Some(version)) = (scalar(key), scalar(value)) else {
                        return Err(parse_error("'modules' must map ids to versions".to_string()));
                    };
                    modules.insert(id, version);
                }
            }
            Some(_) => return Err(parse_error("'modules' must be a mapping".to_string())),
        }

        Ok(Self {
            version: version.to_string(),
            created,
            title,
            intro,
            entries,
            modules,
        })
    }

    /// Serialize to the on-disk YAML shape.
    pub fn to_yaml(&self) -> Result<String> {
        let mut map = Mapping::new();
        map.insert(
            "created".into(),
            self.created.format("%Y-%m-%d").to_string().into(),
        );
        map.insert("title".into(), self.title.clone().into());
        if let Some(intro) = self.intro.as_deref().filter(|i| !i.trim().is_empty()) {
            map.insert("intro".into(), intro.to_string().into());
        }
        map.insert(
            "entries".into(),
            Value::Sequence(self.entries.iter().map(|id| Value::String(id.clone())).collect()),
        );
        if !self.modules.is_empty() {
            let mut modules = Mapping::new();
            for (id, version) in &self.modules {
                modules.insert(id.clone().into(), version.clone().into());
            }
            map.insert("modules".into(), Value::Mapping(modules));
        }
        Ok(serde_yaml::to_string(&Value::Mapping(map))?)
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Access to the `releases/` directory of a project.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(RELEASES_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn release_dir(&self, version: &str) -> PathBuf {
        self.dir.join(version)
    }

    pub fn manifest_path(&self, version: &str) -> PathBuf {
        self.release_dir(version).join(MANIFEST_FILENAME)
    }

    pub fn notes_path(&self, version: &str) -> PathBuf {
        self.release_dir(version).join(NOTES_FILENAME)
    }

    pub fn entries_dir(&self, version: &str) -> PathBuf {
        self.release_dir(version).join(RELEASE_ENTRIES_DIR)
    }

    /// Path of a relocated entry file inside a release.
    pub fn entry_path(&self, version: &str, id: &str) -> PathBuf {
        self.entries_dir(version)
            .join(format!("{id}.{ENTRY_EXTENSION}"))
    }

    /// All manifests, sorted by version label text.
    pub fn list(&self) -> Result<Vec<ReleaseManifest>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let Some(version) = dir_entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if dir_entry.path().join(MANIFEST_FILENAME).is_file() {
                versions.push(version);
            }
        }
        versions.sort();
        versions.iter().map(|v| self.read(v)).collect()
    }

    /// The manifest for a version, if it exists.
    pub fn find(&self, version: &str) -> Result<Option<ReleaseManifest>> {
        if version.is_empty() || !self.manifest_path(version).is_file() {
            return Ok(None);
        }
        self.read(version).map(Some)
    }

    fn read(&self, version: &str) -> Result<ReleaseManifest> {
        let path = self.manifest_path(version);
        let content = fs::read_to_string(&path).map_err(|e| Error::ManifestParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        ReleaseManifest::parse(version, &content, &path)
    }

    /// Every entry id referenced by any manifest.
    pub fn used_ids(&self) -> Result<BTreeSet<String>> {
        let mut used = BTreeSet::new();
        for manifest in self.list()? {
            used.extend(manifest.entries);
        }
        Ok(used)
    }

    /// Load the entries a manifest lists, in manifest order.
    ///
    /// Fails with [`Error::CorruptManifest`] naming every listed id whose
    /// file is absent.
    pub fn load_entries(&self, manifest: &ReleaseManifest) -> Result<Vec<Entry>> {
        let mut entries = Vec::with_capacity(manifest.entries.len());
        let mut missing = Vec::new();
        for id in &manifest.entries {
            let path = self.entry_path(&manifest.version, id);
            if path.is_file() {
                entries.push(Entry::read(&path)?);
            } else {
                missing.push(id.clone());
            }
        }
        if !missing.is_empty() {
            return Err(Error::CorruptManifest {
                version: manifest.version.clone(),
                missing,
            });
        }
        Ok(entries)
    }

    /// Load the entries a manifest lists, skipping ids without a file.
    pub fn load_entries_lenient(&self, manifest: &ReleaseManifest) -> Result<Vec<Entry>> {
        let mut entries = Vec::with_capacity(manifest.entries.len());
        for id in &manifest.entries {
            let path = self.entry_path(&manifest.version, id);
            if path.is_file() {
                entries.push(Entry::read(&path)?);
            } else {
                log::debug!("release {} lists missing entry {}", manifest.version, id);
            }
        }
        Ok(entries)
    }

    /// Current notes text of a release, if the file exists.
    pub fn read_notes(&self, version: &str) -> Result<Option<String>> {
        let path = self.notes_path(version);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Current manifest text of a release, if the file exists.
    pub fn read_manifest_text(&self, version: &str) -> Result<Option<String>> {
        let path = self.manifest_path(version);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Write a manifest and its notes, creating the release directory.
    ///
    /// Existing files are overwritten.
    pub fn write(&self, manifest: &ReleaseManifest, notes: &str) -> Result<PathBuf> {
        let release_dir = self.release_dir(&manifest.version);
        fs::create_dir_all(&release_dir)?;

        let manifest_path = self.manifest_path(&manifest.version);
        fs::write(&manifest_path, manifest.to_yaml()?)?;
        fs::write(self.notes_path(&manifest.version), normalize_notes(notes))?;
        Ok(manifest_path)
    }
}

/// Notes as written to disk: trimmed, with a single trailing newline, or
/// empty.
pub fn normalize_notes(notes: &str) -> String {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Entries whose ids are not referenced by any manifest.
pub fn unused_entries(entries: Vec<Entry>, used: &BTreeSet<String>) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|entry| !used.contains(&entry.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryHeader, EntryKind};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_release_entry(store: &ManifestStore, version: &str, id: &str) {
        let entry = Entry {
            id: id.to_string(),
            header: EntryHeader::new(id, EntryKind::Change),
            body: String::new(),
            path: store.entry_path(version, id),
        };
        fs::create_dir_all(store.entries_dir(version)).unwrap();
        fs::write(store.entry_path(version, id), entry.to_markdown().unwrap()).unwrap();
    }

    #[test]
    fn test_manifest_yaml_layout() {
        let mut manifest = ReleaseManifest::new("v1.0.0", date(2025, 1, 2), "Node v1.0.0");
        manifest.entries = vec!["fix-a".to_string(), "fix-b".to_string()];
        assert_eq!(
            manifest.to_yaml().unwrap(),
            "created: 2025-01-02\ntitle: Node v1.0.0\nentries:\n- fix-a\n- fix-b\n"
        );

        manifest.intro = Some("Hello.".to_string());
        manifest
            .modules
            .insert("plugin".to_string(), "v0.3.0".to_string());
        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.contains("intro: Hello.\n"));
        assert!(yaml.ends_with("modules:\n  plugin: v0.3.0\n"));
    }

    #[test]
    fn test_manifest_parse_round_trip() {
        let mut manifest = ReleaseManifest::new("v2.0.0", date(2024, 12, 31), "Big one");
        manifest.intro = Some("Intro text.".to_string());
        manifest.entries = vec!["b".to_string(), "a".to_string()];
        manifest.modules.insert("m".to_string(), "1.0.0".to_string());

        let yaml = manifest.to_yaml().unwrap();
        let parsed = ReleaseManifest::parse("v2.0.0", &yaml, Path::new("manifest.yaml")).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_manifest_parse_lenient_fields() {
        let parsed = ReleaseManifest::parse(
            "v1",
            "title: T\nentries: only-one\ndescription: ignored\n",
            Path::new("manifest.yaml"),
        )
        .unwrap();
        assert_eq!(parsed.entries, vec!["only-one"]);
        assert_eq!(parsed.created, Utc::now().date_naive());
        assert!(parsed.intro.is_none());
    }

    #[test]
    fn test_manifest_parse_errors() {
        let path = Path::new("releases/v1/manifest.yaml");
        let err = ReleaseManifest::parse("v1", "created: soon\n", path).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
        assert!(ReleaseManifest::parse("v1", "- a\n", path).is_err());
        assert!(ReleaseManifest::parse("v1", "modules: [a]\n", path).is_err());
    }

    #[test]
    fn test_store_write_list_and_find() {
        let temp_dir = TempDir::new().unwrap();
        let store = ManifestStore::for_project(temp_dir.path());
        assert!(store.list().unwrap().is_empty());

        for version in ["v2.0.0", "v1.0.0"] {
            let manifest = ReleaseManifest::new(version, date(2025, 1, 1), version);
            store.write(&manifest, "  notes  ").unwrap();
        }
        fs::create_dir_all(store.dir().join("scratch")).unwrap();

        let versions: Vec<String> = store.list().unwrap().into_iter().map(|m| m.version).collect();
        assert_eq!(versions, vec!["v1.0.0", "v2.0.0"]);
        assert!(store.find("v1.0.0").unwrap().is_some());
        assert!(store.find("v9.9.9").unwrap().is_none());
        assert_eq!(store.read_notes("v1.0.0").unwrap().as_deref(), Some("notes\n"));
    }

    #[test]
    fn test_used_ids_spans_all_manifests() {
        let temp_dir = TempDir::new().unwrap();
        let store = ManifestStore::for_project(temp_dir.path());
        let mut first = ReleaseManifest::new("v1.0.0", date(2025, 1, 1), "one");
        first.entries = vec!["a".to_string(), "b".to_string()];
        let mut second = ReleaseManifest::new("v1.1.0", date(2025, 2, 1), "two");
        second.entries = vec!["c".to_string()];
        store.write(&first, "").unwrap();
        store.write(&second, "").unwrap();

        let used: Vec<String> = store.used_ids().unwrap().into_iter().collect();
        assert_eq!(used, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_entries_reports_every_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ManifestStore::for_project(temp_dir.path());
        let mut manifest = ReleaseManifest::new("v1.0.0", date(2025, 1, 1), "one");
        manifest.entries = vec!["present".to_string(), "gone".to_string(), "lost".to_string()];
        store.write(&manifest, "").unwrap();
        write_release_entry(&store, "v1.0.0", "present");

        let err = store.load_entries(&manifest).unwrap_err();
        match err {
            Error::CorruptManifest { version, missing } => {
                assert_eq!(version, "v1.0.0");
                assert_eq!(missing, vec!["gone", "lost"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let lenient = store.load_entries_lenient(&manifest).unwrap();
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient[0].id, "present");
    }

    #[test]
    fn test_unused_entries() {
        let make = |id: &str| Entry {
            id: id.to_string(),
            header: EntryHeader::new(id, EntryKind::Change),
            body: String::new(),
            path: PathBuf::from(id),
        };
        let used: BTreeSet<String> = ["b".to_string()].into_iter().collect();
        let unused = unused_entries(vec![make("a"), make("b"), make("c")], &used);
        let ids: Vec<&str> = unused.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes("\n\n"), "");
        assert_eq!(normalize_notes("# Notes\n\n\n"), "# Notes\n");
    }
}
