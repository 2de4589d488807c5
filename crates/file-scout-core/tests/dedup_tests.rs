use std::fs;
use std::path::Path;
use tempfile::tempdir;

use file_scout_core::analysis::DeletionFailure;
use file_scout_core::{
    ContentDigest, EngineConfig, Error, FileEngine, ProgressReporter, SilentReporter,
};

/// Layout:
///   a.txt, b.txt, c.txt   ("same words here")
///   d.txt                 ("different words")
///   e.txt                 ("same words herE")  ← same size as a..c
fn create_dupe_dir(root: &Path) {
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(root.join(name), "same words here").unwrap();
    }
    fs::write(root.join("d.txt"), "different words").unwrap();
    fs::write(root.join("e.txt"), "same words herE").unwrap();
}

#[test]
fn test_keeps_smallest_name_and_removes_the_rest() {
    let tmp = tempdir().unwrap();
    create_dupe_dir(tmp.path());
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    let report = engine.delete_duplicates(&mut snapshot, &SilentReporter).unwrap();

    assert_eq!(report.removed_files, vec!["b.txt", "c.txt"]);
    assert_eq!(report.kept_files, vec!["a.txt", "d.txt", "e.txt"]);
    assert!(report.failures.is_empty());

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.canonical, "a.txt");
    assert_eq!(group.duplicates, vec!["b.txt", "c.txt"]);
    assert_eq!(group.digest, ContentDigest::of_bytes(b"same words here"));

    assert!(tmp.path().join("a.txt").exists());
    assert!(!tmp.path().join("b.txt").exists());
    assert!(!tmp.path().join("c.txt").exists());
    assert_eq!(
        fs::read_to_string(tmp.path().join("d.txt")).unwrap(),
        "different words"
    );
    assert!(tmp.path().join("e.txt").exists());

    // Snapshot follows the filesystem
    assert_eq!(snapshot.names(), vec!["a.txt", "d.txt", "e.txt"]);
    assert_eq!(
        snapshot.get("a.txt").unwrap().content_digest,
        Some(group.digest)
    );
}

#[test]
fn test_no_duplicates_is_a_no_op() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("one.txt"), "first").unwrap();
    fs::write(tmp.path().join("two.txt"), "second").unwrap();
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    let report = engine.delete_duplicates(&mut snapshot, &SilentReporter).unwrap();
    assert!(report.removed_files.is_empty());
    assert!(report.groups.is_empty());
    assert_eq!(report.kept_files, vec!["one.txt", "two.txt"]);
    // Unique sizes never need hashing
    assert!(snapshot.iter().all(|r| r.content_digest.is_none()));
}

#[test]
fn test_file_changed_before_hashing_is_not_grouped() {
    let tmp = tempdir().unwrap();
    create_dupe_dir(tmp.path());
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    fs::write(tmp.path().join("b.txt"), "now unique content").unwrap();

    let report = engine.delete_duplicates(&mut snapshot, &SilentReporter).unwrap();
    assert_eq!(report.removed_files, vec!["c.txt"]);
    assert!(report.failures.is_empty());
    assert_eq!(report.groups[0].duplicates, vec!["c.txt"]);
    assert!(tmp.path().join("b.txt").exists());
    assert!(report.kept_files.contains(&"b.txt".to_string()));
}

#[test]
fn test_file_vanished_before_hashing_fails_without_deleting() {
    let tmp = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(tmp.path().join(name), "same words here").unwrap();
    }
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    fs::remove_file(tmp.path().join("a.txt")).unwrap();

    let err = engine
        .delete_duplicates(&mut snapshot, &SilentReporter)
        .unwrap_err();
    match err {
        Error::NotFound(path) => assert!(path.ends_with("a.txt")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(tmp.path().join("b.txt").exists());
    assert!(tmp.path().join("c.txt").exists());
    assert_eq!(snapshot.names(), vec!["a.txt", "b.txt", "c.txt"]);
}

/// Runs a filesystem change once hashing is done and before any deletion.
struct AfterHashing<F: Fn() + Send + Sync>(F);

impl<F: Fn() + Send + Sync> ProgressReporter for AfterHashing<F> {
    fn on_hash_complete(&self, _duplicate_groups: usize, _duration_secs: f64) {
        (self.0)()
    }
}

#[test]
fn test_duplicate_changed_after_hashing_is_reported_as_failure() {
    let tmp = tempdir().unwrap();
    create_dupe_dir(tmp.path());
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    let b = tmp.path().join("b.txt");
    let reporter = AfterHashing(move || fs::write(&b, "same words HERE").unwrap());
    let report = engine.delete_duplicates(&mut snapshot, &reporter).unwrap();

    assert_eq!(report.removed_files, vec!["c.txt"]);
    assert_eq!(
        report.failures,
        vec![DeletionFailure {
            name: "b.txt".to_string(),
            reason: "changed since it was hashed".to_string(),
        }]
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("b.txt")).unwrap(),
        "same words HERE"
    );
    assert_eq!(report.kept_files, vec!["a.txt", "b.txt", "d.txt", "e.txt"]);
}

#[test]
fn test_one_failed_removal_does_not_stop_the_group() {
    let tmp = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
        fs::write(tmp.path().join(name), "same words here").unwrap();
    }
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    // c.txt becomes a directory that cannot be hashed or removed as a file.
    let c = tmp.path().join("c.txt");
    let reporter = AfterHashing(move || {
        fs::remove_file(&c).unwrap();
        fs::create_dir(&c).unwrap();
    });
    let report = engine.delete_duplicates(&mut snapshot, &reporter).unwrap();

    assert_eq!(report.removed_files, vec!["b.txt", "d.txt"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "c.txt");
    assert!(!report.failures[0].reason.is_empty());
    assert_eq!(report.kept_files, vec!["a.txt", "c.txt"]);

    assert!(tmp.path().join("a.txt").is_file());
    assert!(tmp.path().join("c.txt").is_dir());
    assert!(!tmp.path().join("b.txt").exists());
    assert!(!tmp.path().join("d.txt").exists());
    assert_eq!(snapshot.names(), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_canonical_deleted_after_hashing_keeps_group() {
    let tmp = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(tmp.path().join(name), "shared content xyz").unwrap();
    }
    let engine = FileEngine::new(EngineConfig::default());
    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();

    let a = tmp.path().join("a.txt");
    let reporter = AfterHashing(move || fs::remove_file(&a).unwrap());
    let report = engine.delete_duplicates(&mut snapshot, &reporter).unwrap();

    assert!(report.removed_files.is_empty());
    let failed: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["b.txt", "c.txt"]);
    assert!(report
        .failures
        .iter()
        .all(|f| f.reason == "canonical file 'a.txt' no longer exists"));
    assert!(tmp.path().join("b.txt").exists());
    assert!(tmp.path().join("c.txt").exists());
}

#[test]
fn test_running_twice_removes_nothing_more() {
    let tmp = tempdir().unwrap();
    create_dupe_dir(tmp.path());
    let engine = FileEngine::new(EngineConfig::default());

    let mut snapshot = engine.load_directory(tmp.path(), &SilentReporter).unwrap();
    engine.delete_duplicates(&mut snapshot, &SilentReporter).unwrap();

    let mut reloaded = engine.load_directory(tmp.path(), &SilentReporter).unwrap();
    let report = engine.delete_duplicates(&mut reloaded, &SilentReporter).unwrap();
    assert!(report.removed_files.is_empty());
    assert_eq!(reloaded.names(), vec!["a.txt", "d.txt", "e.txt"]);
}
