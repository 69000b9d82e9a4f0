//! Repository integration tests
//!
//! Exercise the public API end to end against a temporary repository.

use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use versions_db::{AddError, Config, GetError, Repository, VersionRecord};

fn setup() -> (TempDir, Repository) {
    let dir = tempdir().unwrap();
    let repo = Repository::init(Config::new(dir.path().join(".versions"))).unwrap();
    (dir, repo)
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn list(repo: &Repository, filename: Option<&str>) -> Vec<VersionRecord> {
    repo.list(filename)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_report_scenario() {
    let (dir, repo) = setup();
    let report = dir.path().join("report.txt");
    let report_name = path_str(&report);

    fs::write(&report, "v1").unwrap();
    let v1 = repo.add(&report_name, "first").unwrap();
    assert_eq!(v1.version, 1);

    fs::write(&report, "v2").unwrap();
    let v2 = repo.add(&report_name, "second").unwrap();
    assert_eq!(v2.version, 2);
    assert_ne!(v1.digest, v2.digest);
    assert_eq!(repo.blobs().blob_count().unwrap(), 2);

    let err = repo.add(&report_name, "third").unwrap_err();
    assert!(matches!(err, AddError::AlreadyExists(_)));
    assert_eq!(repo.blobs().blob_count().unwrap(), 2);

    let out1 = dir.path().join("out1.txt");
    let out2 = dir.path().join("out2.txt");
    repo.get_to(&report_name, 1, &out1).unwrap();
    repo.get_to(&report_name, 2, &out2).unwrap();
    assert_eq!(fs::read_to_string(&out1).unwrap(), "v1");
    assert_eq!(fs::read_to_string(&out2).unwrap(), "v2");

    let history = list(&repo, Some(&report_name));
    assert_eq!(history, vec![v1.clone(), v2.clone()]);

    let notes = dir.path().join("notes.txt");
    let notes_name = path_str(&notes);
    fs::write(&notes, "n1").unwrap();
    let n1 = repo.add(&notes_name, "notes").unwrap();
    assert_eq!(n1.version, 1);

    let all = list(&repo, None);
    assert_eq!(all, vec![v1, v2, n1]);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_successful_add_is_immediately_visible() {
    let (dir, repo) = setup();
    let file = dir.path().join("a.bin");
    fs::write(&file, [0u8, 1, 2, 255]).unwrap();
    let name = path_str(&file);

    let record = repo.add(&name, "").unwrap();

    assert!(repo.blobs().exists(&record.digest));
    assert_eq!(
        repo.log().find_by_content(&name, &record.digest).unwrap(),
        Some(record)
    );
}

#[test]
fn test_roundtrip_is_byte_exact() {
    let (dir, repo) = setup();
    let file = dir.path().join("data.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    fs::write(&file, &content).unwrap();
    let name = path_str(&file);

    repo.add(&name, "binary").unwrap();
    fs::write(&file, b"overwritten").unwrap();
    repo.get(&name, 1).unwrap();

    assert_eq!(fs::read(&file).unwrap(), content);
}

#[test]
fn test_sequence_strictly_increases() {
    let (dir, repo) = setup();
    let file = dir.path().join("counter.txt");
    let name = path_str(&file);

    for i in 0..5 {
        fs::write(&file, format!("revision {}", i)).unwrap();
        repo.add(&name, &format!("rev {}", i)).unwrap();
    }

    let records = list(&repo, Some(&name));
    let versions: Vec<_> = records.iter().map(|r| r.version).collect();
    assert_eq!(versions, [1, 2, 3, 4, 5]);
    assert!(records.windows(2).all(|w| w[0].sequence < w[1].sequence));
}

#[test]
fn test_reverting_to_old_content_is_already_exists() {
    let (dir, repo) = setup();
    let file = dir.path().join("toggle.txt");
    let name = path_str(&file);

    fs::write(&file, "a").unwrap();
    repo.add(&name, "a").unwrap();
    fs::write(&file, "b").unwrap();
    repo.add(&name, "b").unwrap();
    fs::write(&file, "a").unwrap();

    match repo.add(&name, "a again") {
        Err(AddError::AlreadyExists(existing)) => assert_eq!(existing.version, 1),
        other => panic!("expected AlreadyExists, got {:?}", other),
    }
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path().join(".versions"));
    let file = dir.path().join("report.txt");
    let name = path_str(&file);
    fs::write(&file, "v1").unwrap();

    let record = {
        let repo = Repository::init(config.clone()).unwrap();
        repo.add(&name, "first").unwrap()
    };

    let repo = Repository::open(config).unwrap();
    assert_eq!(repo.log().find_by_version(&name, 1).unwrap(), Some(record));
}

// ============================================================================
// Boundaries
// ============================================================================

#[test]
fn test_get_unknown_file() {
    let (_dir, repo) = setup();
    let err = repo.get("never-added.txt", 1).unwrap_err();
    assert!(matches!(err, GetError::NotFound { .. }));
}

#[test]
fn test_add_nonexistent_path() {
    let (dir, repo) = setup();
    let name = path_str(&dir.path().join("ghost.txt"));

    let err = repo.add(&name, "boo").unwrap_err();
    assert!(matches!(err, AddError::InvalidFile { .. }));
    assert!(list(&repo, None).is_empty());
}

#[test]
fn test_list_unknown_file_is_empty() {
    let (dir, repo) = setup();
    let file = dir.path().join("a.txt");
    fs::write(&file, "x").unwrap();
    repo.add(&path_str(&file), "").unwrap();

    assert!(list(&repo, Some("other.txt")).is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_adds_of_same_content_record_once() {
    let (dir, repo) = setup();
    let file = dir.path().join("shared.txt");
    fs::write(&file, "same for everyone").unwrap();
    let name = path_str(&file);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = &repo;
                let name = &name;
                s.spawn(move || repo.add(name, &format!("writer {}", i)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let added = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AddError::AlreadyExists(_))))
        .count();
    assert_eq!(added, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(list(&repo, None).len(), 1);
    assert_eq!(repo.blobs().blob_count().unwrap(), 1);
}

#[test]
fn test_concurrent_adds_of_different_files_are_all_logged() {
    let (dir, repo) = setup();
    let names: Vec<_> = (0..6)
        .map(|i| {
            let file = dir.path().join(format!("file{}.txt", i));
            fs::write(&file, format!("content {}", i)).unwrap();
            path_str(&file)
        })
        .collect();

    std::thread::scope(|s| {
        for name in &names {
            let repo = &repo;
            s.spawn(move || repo.add(name, "parallel").unwrap());
        }
    });

    let records = list(&repo, None);
    assert_eq!(records.len(), names.len());
    let mut sequences: Vec<_> = records.iter().map(|r| r.sequence).collect();
    sequences.dedup();
    assert_eq!(sequences, (1..=names.len() as u64).collect::<Vec<_>>());
    assert!(records.iter().all(|r| r.version == 1));
    assert!(repo.verify().unwrap().is_consistent());
}
