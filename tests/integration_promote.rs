//! Integration tests for promoting pending entries into releases through the
//! library API.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{NaiveDate, TimeZone, Utc};
use shiplog::entry::EntryDraft;
use shiplog::error::Error;
use shiplog::index::ReleaseIndex;
use shiplog::project::Project;
use shiplog::promote::{promote, PlannedChange, PromoteOptions, PromoteOutcome};
use shiplog::version::Bump;
use tempfile::TempDir;
use walkdir::WalkDir;

fn setup() -> (TempDir, Project) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.yaml"),
        "id: core\nname: Core\nrepository: acme/core\n",
    )
    .unwrap();
    let project = Project::open(temp_dir.path()).unwrap();
    (temp_dir, project)
}

fn add(project: &Project, title: &str, kind: &str, day: u32) {
    project
        .create_entry(EntryDraft {
            title: title.to_string(),
            kind: kind.to_string(),
            authors: vec!["alice".to_string()],
            prs: vec![u64::from(day)],
            created: Some(Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()),
            body: format!("{title} details."),
            ..Default::default()
        })
        .unwrap();
}

fn release(version: &str) -> PromoteOptions {
    PromoteOptions {
        version: Some(version.to_string()),
        date: NaiveDate::from_ymd_opt(2025, 2, 1),
        confirm: true,
        ..Default::default()
    }
}

/// Every file below `root` with its modification time.
fn tree_state(root: &Path) -> BTreeMap<PathBuf, SystemTime> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let modified = e.metadata().unwrap().modified().unwrap();
            (e.path().to_path_buf(), modified)
        })
        .collect()
}

#[test]
fn test_promote_then_rerun_writes_nothing() {
    let (temp_dir, project) = setup();
    add(&project, "Fix A", "bugfix", 1);
    add(&project, "Fix B", "bugfix", 2);

    let outcome = promote(&project, &release("v1.0.0")).unwrap();
    assert!(matches!(outcome, PromoteOutcome::Applied { .. }));

    let manifest = project.releases().find("v1.0.0").unwrap().unwrap();
    assert_eq!(manifest.entries, vec!["fix-a", "fix-b"]);
    assert!(project.unused_entries().unwrap().is_empty());
    assert!(project.entries().list().unwrap().is_empty());

    let before = tree_state(temp_dir.path());
    let rerun = promote(
        &project,
        &PromoteOptions {
            version: Some("v1.0.0".to_string()),
            confirm: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(matches!(rerun, PromoteOutcome::UpToDate { ref version } if version == "v1.0.0"));
    assert_eq!(tree_state(temp_dir.path()), before);
}

#[test]
fn test_unconfirmed_promotion_changes_nothing() {
    let (temp_dir, project) = setup();
    add(&project, "Add login", "feature", 1);
    let before = tree_state(temp_dir.path());

    let outcome = promote(
        &project,
        &PromoteOptions {
            version: Some("v1.0.0".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let PromoteOutcome::Pending { plan } = outcome else {
        panic!("expected a pending plan");
    };
    assert!(plan.changes.contains(&PlannedChange::AppendEntries(1)));
    assert!(!plan.notes.is_empty());
    assert_eq!(tree_state(temp_dir.path()), before);
    assert!(!project.releases().release_dir("v1.0.0").exists());
}

#[test]
fn test_existing_entries_keep_their_position() {
    let (_temp, project) = setup();
    add(&project, "Zeta change", "change", 1);
    promote(&project, &release("v1.0.0")).unwrap();

    add(&project, "Alpha feature", "feature", 2);
    add(&project, "Beta fix", "bugfix", 3);
    let outcome = promote(&project, &release("v1.0.0")).unwrap();
    let PromoteOutcome::Applied { plan } = outcome else {
        panic!("expected applied outcome");
    };
    assert_eq!(plan.existing.len(), 1);
    assert_eq!(plan.new_entries.len(), 2);

    let manifest = project.releases().find("v1.0.0").unwrap().unwrap();
    assert_eq!(
        manifest.entries,
        vec!["zeta-change", "alpha-feature", "beta-fix"]
    );

    let notes = project.releases().read_notes("v1.0.0").unwrap().unwrap();
    for title in ["Zeta change", "Alpha feature", "Beta fix"] {
        assert!(notes.contains(title), "missing {title} in {notes}");
    }
}

#[test]
fn test_manifest_keeps_title_and_date_on_rerun() {
    let (_temp, project) = setup();
    add(&project, "Add login", "feature", 1);
    promote(
        &project,
        &PromoteOptions {
            title: Some("Spring release".to_string()),
            ..release("v1.0.0")
        },
    )
    .unwrap();

    add(&project, "Fix logout", "bugfix", 2);
    promote(
        &project,
        &PromoteOptions {
            version: Some("v1.0.0".to_string()),
            confirm: true,
            ..Default::default()
        },
    )
    .unwrap();

    let manifest = project.releases().find("v1.0.0").unwrap().unwrap();
    assert_eq!(manifest.title, "Spring release");
    assert_eq!(manifest.created, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
}

#[test]
fn test_bumps_follow_latest_release() {
    let (_temp, project) = setup();
    add(&project, "First", "feature", 1);
    promote(&project, &release("v1.2.3")).unwrap();

    add(&project, "Second", "feature", 2);
    let outcome = promote(
        &project,
        &PromoteOptions {
            bump: Some(Bump::Minor),
            confirm: true,
            ..Default::default()
        },
    )
    .unwrap();
    let PromoteOutcome::Applied { plan } = outcome else {
        panic!("expected applied outcome");
    };
    assert_eq!(plan.version(), "v1.3.0");
    assert_eq!(plan.manifest.entries, vec!["second"]);
}

#[test]
fn test_missing_entry_file_is_fatal() {
    let (_temp, project) = setup();
    add(&project, "Fix A", "bugfix", 1);
    promote(&project, &release("v1.0.0")).unwrap();
    fs::remove_file(project.releases().entry_path("v1.0.0", "fix-a")).unwrap();

    add(&project, "Fix B", "bugfix", 2);
    let err = promote(&project, &release("v1.0.0")).unwrap_err();
    assert!(matches!(err, Error::CorruptManifest { ref missing, .. } if missing == &["fix-a"]));
    assert!(project.entries().path_for("fix-b").is_file());
}

#[test]
fn test_released_ids_cannot_be_reused() {
    let (_temp, project) = setup();
    add(&project, "Fix A", "bugfix", 1);
    promote(&project, &release("v1.0.0")).unwrap();

    let err = project
        .create_entry(EntryDraft {
            title: "Fix A".to_string(),
            kind: "bugfix".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateEntryId { ref id, .. } if id == "fix-a"));
}

#[test]
fn test_promotion_never_shares_entries_between_releases() {
    let (_temp, project) = setup();
    add(&project, "Fix A", "bugfix", 1);
    promote(&project, &release("v1.0.0")).unwrap();
    add(&project, "Fix B", "bugfix", 2);
    promote(&project, &release("v1.1.0")).unwrap();
    promote(&project, &release("v1.0.0")).unwrap();

    let manifests = project.releases().list().unwrap();
    let index = ReleaseIndex::build(&manifests);
    assert_eq!(index.shared_ids().count(), 0);
    assert_eq!(index.versions("fix-a"), ["v1.0.0"]);
    assert_eq!(index.versions("fix-b"), ["v1.1.0"]);
}
