use dupecmp::compare::{CompareConfig, IoOp};
use dupecmp::duplicates::{DuplicateFinder, FinderConfig};
use dupecmp::error::ExitCode;
use dupecmp::scanner::FileEntry;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_missing_files_are_failures_not_errors() {
    let finder = DuplicateFinder::with_defaults();
    let files = vec![
        FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100),
        FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100),
    ];

    let (groups, summary) = finder.find_duplicates_from_files(files).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.failed_candidates.len(), 2);
    for failure in &summary.failed_candidates {
        assert_eq!(failure.op, IoOp::Open);
    }
    assert_eq!(ExitCode::from_summary(&summary), ExitCode::PartialSuccess);
}

#[test]
fn test_failure_in_one_group_does_not_stop_others() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"0123456789").unwrap();
    fs::write(&b, b"0123456789").unwrap();

    let files = vec![
        FileEntry::new(dir.path().join("vanished1"), 50),
        FileEntry::new(dir.path().join("vanished2"), 50),
        FileEntry::new(a, 10),
        FileEntry::new(b, 10),
    ];
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 10);
    assert_eq!(summary.failed_candidates.len(), 2);
}

#[test]
fn test_file_shrunk_after_walk_is_excluded() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    fs::write(&a, b"abcdef").unwrap();
    fs::write(&b, b"abcdef").unwrap();
    fs::write(&c, b"abc").unwrap();

    // c is listed with the size it had before it was truncated
    let files = vec![
        FileEntry::new(a.clone(), 6),
        FileEntry::new(b.clone(), 6),
        FileEntry::new(c, 6),
    ];
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
}

#[test]
fn test_group_too_large_for_budget_is_skipped() {
    let dir = tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..5 {
        let path = dir.path().join(format!("big{i}"));
        fs::write(&path, b"same").unwrap();
        files.push(FileEntry::new(path, 4));
    }
    for i in 0..2 {
        let path = dir.path().join(format!("pair{i}"));
        fs::write(&path, b"pair!").unwrap();
        files.push(FileEntry::new(path, 5));
    }

    // 512 bytes serve two files, not five
    let config = FinderConfig::default()
        .with_compare_config(CompareConfig::default().with_total_buffer(512));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 5);
    assert_eq!(summary.skipped_groups, 1);
    assert_eq!(ExitCode::from_summary(&summary), ExitCode::PartialSuccess);
}

#[test]
fn test_shutdown_after_walk_marks_interrupted() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
    let (groups, summary) = finder
        .find_duplicates_from_files(vec![FileEntry::new(a, 4), FileEntry::new(b, 4)])
        .unwrap();

    assert!(groups.is_empty());
    assert!(summary.interrupted);
    assert_eq!(ExitCode::from_summary(&summary), ExitCode::Interrupted);
}
