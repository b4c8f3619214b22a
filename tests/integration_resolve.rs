//! Integration tests for identifier resolution over a gathered snapshot.

use std::fs;

use chrono::{NaiveDate, TimeZone, Utc};
use shiplog::entry::EntryDraft;
use shiplog::error::Error;
use shiplog::project::Project;
use shiplog::promote::{promote, PromoteOptions};
use shiplog::resolve::ResolutionKind;
use shiplog::snapshot::Snapshot;
use tempfile::TempDir;

fn project_with(titles: &[&str]) -> (TempDir, Project) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.yaml"), "id: core\nname: Core\n").unwrap();
    let project = Project::open(temp_dir.path()).unwrap();
    for (day, title) in (1..).zip(titles) {
        project
            .create_entry(EntryDraft {
                title: title.to_string(),
                kind: "bugfix".to_string(),
                created: Some(Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap();
    }
    (temp_dir, project)
}

fn ids(entries: &[shiplog::entry::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn test_ambiguous_fragment_lists_every_candidate() {
    let (_temp, project) = project_with(&["Fix A", "Fix B"]);
    let snapshot = Snapshot::gather(&project, false).unwrap();

    let err = snapshot.resolve("fix").unwrap_err();
    match err {
        Error::AmbiguousMatch { token, candidates } => {
            assert_eq!(token, "fix");
            assert_eq!(candidates, vec!["fix-a", "fix-b"]);
        }
        other => panic!("expected ambiguous match, got {other:?}"),
    }

    let exact = snapshot.resolve("fix-a").unwrap();
    assert_eq!(exact.kind, ResolutionKind::Entry);
    assert_eq!(ids(&exact.entries), vec!["fix-a"]);
}

#[test]
fn test_rows_count_from_newest() {
    let (_temp, project) = project_with(&["Oldest", "Middle", "Newest"]);
    let snapshot = Snapshot::gather(&project, false).unwrap();

    let rows: Vec<(usize, &str)> = snapshot.rows().map(|(r, e)| (r, e.id.as_str())).collect();
    assert_eq!(rows, vec![(1, "newest"), (2, "middle"), (3, "oldest")]);

    let first = snapshot.resolve(" 1 ").unwrap();
    assert_eq!(first.kind, ResolutionKind::Row);
    assert_eq!(first.token, "1");
    assert_eq!(ids(&first.entries), vec!["newest"]);

    for token in ["0", "4", "-1"] {
        assert!(matches!(
            snapshot.resolve(token),
            Err(Error::RowOutOfRange { max: 3, .. })
        ));
    }
}

#[test]
fn test_release_tokens_resolve_to_manifest_entries() {
    let (_temp, project) = project_with(&["Fix A", "Fix B"]);
    promote(
        &project,
        &PromoteOptions {
            version: Some("v1.0.0".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 2, 1),
            confirm: true,
            ..Default::default()
        },
    )
    .unwrap();
    let snapshot = Snapshot::gather(&project, false).unwrap();

    let resolution = snapshot.resolve("v1.0.0").unwrap();
    assert_eq!(resolution.kind, ResolutionKind::Release);
    assert_eq!(ids(&resolution.entries), vec!["fix-a", "fix-b"]);
    assert_eq!(resolution.manifest.unwrap().version, "v1.0.0");
    assert_eq!(snapshot.index.versions("fix-a"), ["v1.0.0"]);

    assert!(matches!(
        snapshot.resolve("v2.0.0"),
        Err(Error::UnknownRelease { .. })
    ));
}

#[test]
fn test_release_with_missing_entry_is_corrupt() {
    let (_temp, project) = project_with(&["Fix A"]);
    promote(
        &project,
        &PromoteOptions {
            version: Some("v1.0.0".to_string()),
            confirm: true,
            ..Default::default()
        },
    )
    .unwrap();
    fs::remove_file(project.releases().entry_path("v1.0.0", "fix-a")).unwrap();

    let snapshot = Snapshot::gather(&project, false).unwrap();
    match snapshot.resolve("v1.0.0") {
        Err(Error::CorruptManifest { version, missing }) => {
            assert_eq!(version, "v1.0.0");
            assert_eq!(missing, vec!["fix-a"]);
        }
        other => panic!("expected corrupt manifest, got {other:?}"),
    }
}

#[test]
fn test_resolve_all_fails_on_first_bad_token() {
    let (_temp, project) = project_with(&["Fix A", "Fix B"]);
    let snapshot = Snapshot::gather(&project, false).unwrap();

    let both = snapshot.resolve_all(&["1", "fix-a"]).unwrap();
    assert_eq!(both.len(), 2);

    assert!(matches!(
        snapshot.resolve_all(&["fix-a", ""]),
        Err(Error::EmptyIdentifier)
    ));
}

#[test]
fn test_v_prefixed_word_is_treated_as_release() {
    let (_temp, project) = project_with(&["Validate input"]);
    let snapshot = Snapshot::gather(&project, false).unwrap();

    assert!(matches!(
        snapshot.resolve("valid"),
        Err(Error::UnknownRelease { ref version }) if version == "valid"
    ));
    assert_eq!(ids(&snapshot.resolve("1").unwrap().entries), vec!["validate-input"]);
}
