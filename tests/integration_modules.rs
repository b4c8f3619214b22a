//! Integration tests for module discovery and aggregation into parent
//! releases.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use shiplog::aggregate;
use shiplog::entry::EntryDraft;
use shiplog::project::Project;
use shiplog::promote::{promote, PromoteOptions};
use shiplog::snapshot::Snapshot;
use shiplog::validate::validate_with_modules;
use tempfile::TempDir;

/// A workspace with a parent changelog and two packages, `a` and `b`.
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("changelog")).unwrap();
    fs::write(
        root.join("changelog/config.yaml"),
        "id: suite\nname: Suite\nmodules: ../packages/*/changelog\n",
    )
    .unwrap();
    for id in ["a", "b"] {
        let module_root = root.join("packages").join(id).join("changelog");
        fs::create_dir_all(&module_root).unwrap();
        fs::write(
            module_root.join("config.yaml"),
            format!("id: {id}\nname: Package {}\n", id.to_uppercase()),
        )
        .unwrap();
    }
    temp_dir
}

fn module(root: &Path, id: &str) -> Project {
    Project::open(root.join("packages").join(id).join("changelog")).unwrap()
}

fn ship(project: &Project, title: &str, version: &str, day: u32) {
    project
        .create_entry(EntryDraft {
            title: title.to_string(),
            kind: "bugfix".to_string(),
            created: Some(Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()),
            ..Default::default()
        })
        .unwrap();
    promote(project, &confirmed(version, None)).unwrap();
}

fn confirmed(version: &str, intro: Option<&str>) -> PromoteOptions {
    PromoteOptions {
        version: Some(version.to_string()),
        intro: intro.map(str::to_string),
        date: NaiveDate::from_ymd_opt(2025, 3, 1),
        confirm: true,
        ..Default::default()
    }
}

#[test]
fn test_discovers_modules_by_walking_up() {
    let temp_dir = workspace();
    let parent = Project::open(temp_dir.path().join("changelog")).unwrap();

    let modules = parent.modules().unwrap();
    let ids: Vec<&str> = modules.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_aggregation_returns_only_entries_since_checkpoint() {
    let temp_dir = workspace();
    let root = temp_dir.path();
    let parent = Project::open(root.join("changelog")).unwrap();

    ship(&module(root, "a"), "Old fix in a", "v0.1.0", 1);
    ship(&module(root, "b"), "Old fix in b", "v0.1.0", 2);
    promote(&parent, &confirmed("v1.0.0", Some("First suite release."))).unwrap();

    let first = parent.releases().find("v1.0.0").unwrap().unwrap();
    assert_eq!(first.modules.get("a").map(String::as_str), Some("v0.1.0"));
    assert_eq!(first.modules.get("b").map(String::as_str), Some("v0.1.0"));

    ship(&module(root, "a"), "New fix in a", "v0.2.0", 3);
    ship(&module(root, "b"), "New fix in b", "v0.1.1", 4);

    let aggregation = aggregate::delta(&parent.modules().unwrap(), Some(&first.modules), None).unwrap();
    assert_eq!(aggregation.deltas.len(), 2);
    for (id, title) in [("a", "New fix in a"), ("b", "New fix in b")] {
        let delta = &aggregation.deltas[id];
        let titles: Vec<&str> = delta.entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec![title]);
    }

    promote(&parent, &confirmed("v1.1.0", Some("Second suite release."))).unwrap();
    let second = parent.releases().find("v1.1.0").unwrap().unwrap();
    assert_eq!(second.modules.get("a").map(String::as_str), Some("v0.2.0"));
    assert_eq!(second.modules.get("b").map(String::as_str), Some("v0.1.1"));

    let notes = parent.releases().read_notes("v1.1.0").unwrap().unwrap();
    assert!(notes.starts_with("Second suite release."));
    assert!(notes.contains("## Package A v0.2.0"));
    assert!(notes.contains("New fix in a"));
    assert!(notes.contains("## Package B v0.1.1"));
    assert!(!notes.contains("Old fix"));
}

#[test]
fn test_snapshot_includes_module_entries() {
    let temp_dir = workspace();
    let root = temp_dir.path();
    let parent = Project::open(root.join("changelog")).unwrap();
    ship(&module(root, "a"), "Fix in a", "v0.1.0", 1);

    let snapshot = Snapshot::gather(&parent, true).unwrap();
    assert_eq!(snapshot.owners.get("fix-in-a").map(String::as_str), Some("a"));
    assert_eq!(snapshot.index.versions("fix-in-a"), ["v0.1.0"]);

    let without = Snapshot::gather(&parent, false).unwrap();
    assert!(without.entries.is_empty());
}

#[test]
fn test_broken_module_config_is_skipped() {
    let temp_dir = workspace();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("packages/c/changelog")).unwrap();
    fs::write(root.join("packages/c/changelog/config.yaml"), "id: [oops\n").unwrap();
    let parent = Project::open(root.join("changelog")).unwrap();

    let ids: Vec<String> = parent
        .modules()
        .unwrap()
        .iter()
        .map(|m| m.id().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_duplicate_module_ids_are_reported() {
    let temp_dir = workspace();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("packages/copy/changelog")).unwrap();
    fs::write(root.join("packages/copy/changelog/config.yaml"), "id: a\n").unwrap();
    let parent = Project::open(root.join("changelog")).unwrap();

    let issues = validate_with_modules(&parent).unwrap();
    assert!(issues
        .iter()
        .any(|issue| issue.is_error() && issue.message.contains("'a'")));
}
