//! # Changelog Entries
//!
//! An entry is a single changelog record stored as a Markdown file with a
//! YAML front matter block:
//!
//! ```text
//! ---
//! title: Fix A
//! type: bugfix
//! components: [cli]
//! authors: [alice]
//! prs: [12]
//! created: 2025-01-01T10:00:00Z
//! ---
//!
//! Body text.
//! ```
//!
//! The file stem is the entry id. Pending entries live in `unreleased/`;
//! promotion relocates them into `releases/<version>/entries/`.
//!
//! ## Header model
//!
//! [`EntryHeader`] is a closed set of typed fields plus an `extra` bag that
//! keeps unrecognized keys verbatim. Closed fields are validated when a file
//! is parsed, so a malformed kind or timestamp is reported with the path of
//! the offending file instead of surfacing later.
//!
//! Legacy spellings are normalized transparently on read:
//!
//! - `pr`, `author`, `component` become their plural forms (having both the
//!   singular and the plural key is an error);
//! - `projects` and `products` collapse into the single `project` field and
//!   must name at most one project;
//! - scalars become one-element lists.

use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::config::Config;
use crate::defaults::{ENTRY_EXTENSION, UNRELEASED_DIR};
use crate::error::{Error, Result};
use crate::slug;

/// The closed set of entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Breaking,
    Feature,
    Bugfix,
    Change,
}

impl EntryKind {
    /// All kinds, in declaration order.
    pub const ALL: [EntryKind; 4] = [
        EntryKind::Breaking,
        EntryKind::Feature,
        EntryKind::Bugfix,
        EntryKind::Change,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Breaking => "breaking",
            EntryKind::Feature => "feature",
            EntryKind::Bugfix => "bugfix",
            EntryKind::Change => "change",
        }
    }

    /// Names of all kinds, used in error hints and completions.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        EntryKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| Error::InvalidKind {
                kind: s.trim().to_string(),
            })
    }
}

/// Typed front matter of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryHeader {
    pub title: String,
    pub kind: EntryKind,
    pub project: Option<String>,
    pub components: Vec<String>,
    pub authors: Vec<String>,
    pub prs: Vec<u64>,
    pub created: Option<DateTime<Utc>>,
    /// Unrecognized keys, preserved in their original order.
    pub extra: Mapping,
}

impl EntryHeader {
    /// Create a header with only a title and kind set.
    pub fn new(title: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            title: title.into(),
            kind,
            project: None,
            components: Vec::new(),
            authors: Vec::new(),
            prs: Vec::new(),
            created: None,
            extra: Mapping::new(),
        }
    }

    /// Build a header from a parsed front matter mapping.
    ///
    /// Errors are returned as plain messages; the caller attaches the path.
    fn from_mapping(map: Mapping) -> std::result::Result<Self, String> {
        let mut title = String::new();
        let mut kind = EntryKind::Change;
        let mut project: Option<String> = None;
        let mut legacy_project: Option<(String, Value)> = None;
        let mut components: Option<(String, Value)> = None;
        let mut authors: Option<(String, Value)> = None;
        let mut prs: Option<(String, Value)> = None;
        let mut created = None;
        let mut extra = Mapping::new();

        for (key, value) in map {
            let Some(name) = key.as_str().map(str::to_string) else {
                return Err("front matter keys must be strings".to_string());
            };
            match name.as_str() {
                "title" => title = scalar_text(&value).unwrap_or_default(),
                "type" => {
                    if let Some(text) = scalar_text(&value).filter(|t| !t.is_empty()) {
                        kind = text.parse().map_err(|e: Error| e.to_string())?;
                    }
                }
                "project" => project = single_project("project", &value)?,
                "projects" | "products" => {
                    if legacy_project.is_none() {
                        legacy_project = Some((name, value));
                    }
                }
                "components" | "component" => set_once(&mut components, "components", name, value)?,
                "authors" | "author" => set_once(&mut authors, "authors", name, value)?,
                "prs" | "pr" => set_once(&mut prs, "prs", name, value)?,
                "created" => created = parse_created_value(&value)?,
                _ => {
                    extra.insert(Value::String(name), value);
                }
            }
        }

        if project.is_none() {
            if let Some((key, value)) = legacy_project {
                project = single_project(&key, &value)?;
            }
        }

        let components = match components {
            Some((key, value)) => string_list(&value, &key)?,
            None => Vec::new(),
        };
        let authors = match authors {
            Some((key, value)) => string_list(&value, &key)?,
            None => Vec::new(),
        };
        let prs = match prs {
            Some((key, value)) => pr_list(&value, &key)?,
            None => Vec::new(),
        };

        Ok(Self {
            title,
            kind,
            project,
            components,
            authors,
            prs,
            created,
            extra,
        })
    }

    /// Serialize into a front matter mapping in canonical key order.
    pub fn to_mapping(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert("title".into(), self.title.clone().into());
        map.insert("type".into(), self.kind.as_str().into());
        if let Some(project) = &self.project {
            map.insert("project".into(), project.clone().into());
        }
        if !self.components.is_empty() {
            map.insert("components".into(), string_sequence(&self.components));
        }
        if !self.authors.is_empty() {
            map.insert("authors".into(), string_sequence(&self.authors));
        }
        if !self.prs.is_empty() {
            map.insert(
                "prs".into(),
                Value::Sequence(self.prs.iter().map(|n| Value::from(*n)).collect()),
            );
        }
        if let Some(created) = &self.created {
            map.insert("created".into(), format_timestamp(created).into());
        }
        for (key, value) in &self.extra {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

fn set_once(
    slot: &mut Option<(String, Value)>,
    plural: &str,
    key: String,
    value: Value,
) -> std::result::Result<(), String> {
    if let Some((existing, _)) = slot {
        return Err(format!(
            "both '{existing}' and '{key}' are set; use only '{plural}'"
        ));
    }
    *slot = Some((key, value));
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_sequence(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.clone())).collect())
}

/// Coerce a YAML value into a list of non-empty strings.
///
/// Scalars become one-element lists and `null` becomes an empty list.
pub(crate) fn string_list(value: &Value, key: &str) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match scalar_text(item) {
                    Some(text) if !text.is_empty() => out.push(text),
                    Some(_) => {}
                    None => return Err(format!("'{key}' must contain only scalar values")),
                }
            }
            Ok(out)
        }
        other => match scalar_text(other) {
            Some(text) if text.is_empty() => Ok(Vec::new()),
            Some(text) => Ok(vec![text]),
            None => Err(format!("'{key}' must be a string or a list of strings")),
        },
    }
}

fn pr_list(value: &Value, key: &str) -> std::result::Result<Vec<u64>, String> {
    string_list(value, key)?
        .into_iter()
        .map(|text| {
            text.trim_start_matches('#')
                .parse::<u64>()
                .map_err(|_| format!("'{key}' contains an invalid pull request number '{text}'"))
        })
        .collect()
}

fn single_project(key: &str, value: &Value) -> std::result::Result<Option<String>, String> {
    let mut projects = string_list(value, key)?;
    projects.dedup();
    match projects.len() {
        0 => Ok(None),
        1 => Ok(projects.pop()),
        _ => Err(Error::AmbiguousProject {
            key: key.to_string(),
            projects,
        }
        .to_string()),
    }
}

fn parse_created_value(value: &Value) -> std::result::Result<Option<DateTime<Utc>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| format!("invalid 'created' value '{text}'")),
        other => Err(format!("invalid 'created' value {other:?}")),
    }
}

/// Parse an RFC 3339 timestamp, a naive timestamp (taken as UTC), or a plain
/// date (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_timestamp(created: &DateTime<Utc>) -> String {
    created.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A parsed entry file.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Identifier, equal to the file stem.
    pub id: String,
    pub header: EntryHeader,
    /// Body text with surrounding whitespace removed.
    pub body: String,
    /// Location of the file the entry was read from or written to.
    pub path: PathBuf,
}

impl Entry {
    /// Read and parse an entry file.
    pub fn read(path: &Path) -> Result<Entry> {
        let content = fs::read_to_string(path).map_err(|e| Error::EntryParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse entry text. The id is taken from the path's file stem.
    pub fn parse(content: &str, path: &Path) -> Result<Entry> {
        let parse_error = |message: String| Error::EntryParse {
            path: path.to_path_buf(),
            message,
        };

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| parse_error("file name is not valid UTF-8".to_string()))?;

        let (front_matter, body) = split_front_matter(content)
            .ok_or_else(|| parse_error("missing YAML front matter".to_string()))?;

        let mapping = match serde_yaml::from_str::<Value>(front_matter)
            .map_err(|e| parse_error(e.to_string()))?
        {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(parse_error("front matter must be a mapping".to_string())),
        };

        let header = EntryHeader::from_mapping(mapping).map_err(parse_error)?;

        Ok(Entry {
            id,
            header,
            body: body.trim().to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn kind(&self) -> EntryKind {
        self.header.kind
    }

    /// Render the entry file content.
    pub fn to_markdown(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&Value::Mapping(self.header.to_mapping()))?;
        let mut out = format!("---\n{yaml}---\n");
        let body = self.body.trim();
        if !body.is_empty() {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        Ok(out)
    }

    /// Sort key for release ordering: lower-cased title, then id.
    pub(crate) fn release_order(a: &Entry, b: &Entry) -> Ordering {
        a.header
            .title
            .to_lowercase()
            .cmp(&b.header.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Split a document into front matter and body.
///
/// The document must open with a `---` line and the front matter ends at the
/// next line consisting of `---`.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    if let Some(after) = rest.strip_prefix("---") {
        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
            return Some(("", after));
        }
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Order entries newest first.
///
/// The key is `(created descending, id ascending)`. Entries without a
/// timestamp sort as if created at the Unix epoch.
pub fn sort_descending(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        let a_created = a.header.created.unwrap_or(DateTime::UNIX_EPOCH);
        let b_created = b.header.created.unwrap_or(DateTime::UNIX_EPOCH);
        b_created.cmp(&a_created).then_with(|| a.id.cmp(&b.id))
    });
}

/// Input for creating a new pending entry.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    /// Kind as supplied by the user; validated on creation.
    pub kind: String,
    /// Project values; must reduce to at most one distinct value.
    pub projects: Vec<String>,
    pub components: Vec<String>,
    pub authors: Vec<String>,
    pub prs: Vec<u64>,
    /// Creation time; defaults to now.
    pub created: Option<DateTime<Utc>>,
    pub body: String,
}

/// A directory of entry files.
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The pending pool of a project.
    pub fn pending(project_root: &Path) -> Self {
        Self::new(project_root.join(UNRELEASED_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file that holds (or would hold) the given id.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{ENTRY_EXTENSION}"))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    /// Entry file paths, sorted by file name. A missing directory is empty.
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Lazily parse every entry file.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<Entry>>> {
        Ok(self.paths()?.into_iter().map(|path| Entry::read(&path)))
    }

    /// Parse every entry file. The first malformed file aborts the listing.
    pub fn list(&self) -> Result<Vec<Entry>> {
        self.iter()?.collect()
    }

    /// Validate a draft and write it as a new entry file.
    pub fn create(&self, draft: EntryDraft, config: &Config) -> Result<Entry> {
        let kind: EntryKind = draft.kind.parse()?;

        let mut projects: Vec<String> = Vec::new();
        for project in draft.projects.iter().map(|p| p.trim()) {
            if !project.is_empty() && !projects.iter().any(|p| p == project) {
                projects.push(project.to_string());
            }
        }
        if projects.len() > 1 {
            return Err(Error::AmbiguousProject {
                key: "project".to_string(),
                projects,
            });
        }
        if let Some(project) = projects.iter().find(|p| **p != config.id) {
            return Err(Error::UnknownProject {
                project: project.clone(),
                expected: config.id.clone(),
            });
        }

        let mut components: Vec<String> = Vec::new();
        for label in draft.components.iter().filter(|c| !c.trim().is_empty()) {
            let component =
                config
                    .canonical_component(label)
                    .ok_or_else(|| Error::InvalidComponent {
                        component: label.trim().to_string(),
                        allowed: config.component_names(),
                    })?;
            if !components.contains(&component) {
                components.push(component);
            }
        }

        let title = draft.title.trim().to_string();
        let id = slug::entry_id(&title)?;
        let path = self.path_for(&id);

        let created = draft.created.unwrap_or_else(|| {
            let now = Utc::now();
            DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
        });

        let entry = Entry {
            id: id.clone(),
            header: EntryHeader {
                title,
                kind,
                project: None,
                components,
                authors: draft
                    .authors
                    .iter()
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect(),
                prs: draft.prs,
                created: Some(created),
                extra: Mapping::new(),
            },
            body: draft.body.trim().to_string(),
            path: path.clone(),
        };

        fs::create_dir_all(&self.dir)?;
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::DuplicateEntryId { id, path });
            }
            Err(e) => return Err(e.into()),
        };
        fill_or_remove(&path, file, |file| {
            let text = entry.to_markdown()?;
            file.write_all(text.as_bytes())?;
            Ok(())
        })?;
        log::debug!("wrote entry {}", path.display());
        Ok(entry)
    }
}

/// Run `fill` on a freshly created file, removing the file when it fails so
/// no partial entry blocks the id.
fn fill_or_remove<F>(path: &Path, mut file: fs::File, fill: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> Result<()>,
{
    let result = fill(&mut file);
    drop(file);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial entry {}: {}", path.display(), e);
        }
    }
    result
}
