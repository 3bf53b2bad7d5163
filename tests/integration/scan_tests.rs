use dupecmp::compare::CompareConfig;
use dupecmp::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupecmp::scanner::WalkerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

fn sorted_files(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = files.to_vec();
    files.sort();
    files
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.bytes_compared, 0);
}

#[test]
fn test_scan_unique_files_of_same_size() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.size_groups, 1);
    assert_eq!(summary.bytes_compared, 27);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let a = write(&dir.path().join("a.txt"), b"nested duplicate");
    let b = write(&dir.path().join("x/y/z/b.txt"), b"nested duplicate");
    write(&dir.path().join("x/other.txt"), b"something else entirely");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(sorted_files(&groups[0].files), sorted_files(&[a, b]));
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 16);
}

#[test]
fn test_scan_across_directories() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write(&first.path().join("photo.jpg"), b"JPEG bytes");
    write(&second.path().join("backup.jpg"), b"JPEG bytes");
    write(&second.path().join("copy.jpg"), b"JPEG bytes");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[first.path(), second.path()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn test_many_identical_files_with_one_open_file() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 256) as u8).collect();
    for i in 0..10 {
        write(&dir.path().join(format!("copy{i}")), &content);
    }
    let mut odd = content.clone();
    odd[4999] = odd[4999].wrapping_add(1);
    write(&dir.path().join("odd"), &odd);

    let config = FinderConfig::default().with_compare_config(
        CompareConfig::default()
            .with_max_open_files(1)
            .with_total_buffer(11 * 128),
    );
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 10);
    assert!(groups[0].files.iter().all(|p| !p.ends_with("odd")));
    assert_eq!(summary.duplicate_files, 9);
    assert!(!summary.has_errors());
}

#[test]
fn test_min_size_filter() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("s1"), b"tiny");
    write(&dir.path().join("s2"), b"tiny");
    write(&dir.path().join("l1"), &[9u8; 2048]);
    write(&dir.path().join("l2"), &[9u8; 2048]);

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(false, false, 1024));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2048);
}

#[test]
fn test_parallel_sessions_deliver_in_size_order() {
    let dir = tempdir().unwrap();
    for size in [100usize, 900, 300, 700, 500] {
        let content = vec![size as u8; size];
        write(&dir.path().join(format!("a{size}")), &content);
        write(&dir.path().join(format!("b{size}")), &content);
    }

    let config = FinderConfig::default()
        .with_io_threads(4)
        .with_compare_config(CompareConfig::default().with_max_open_files(1));
    let mut sizes = Vec::new();
    let summary = DuplicateFinder::new(config)
        .for_each_group(&[dir.path()], |group| sizes.push(group.size))
        .unwrap();

    assert_eq!(sizes, vec![900, 700, 500, 300, 100]);
    assert_eq!(summary.duplicate_groups, 5);
}

#[test]
fn test_not_a_directory() {
    let dir = tempdir().unwrap();
    let file = write(&dir.path().join("file"), b"x");

    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&[file])
        .unwrap_err();
    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlinks_ignored_unless_followed() {
        let data = tempdir().unwrap();
        let root = tempdir().unwrap();
        write(&data.path().join("real"), b"linked content");
        write(&root.path().join("plain"), b"linked content");
        symlink(data.path(), root.path().join("link")).unwrap();

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates(&[root.path()])
            .unwrap();
        assert!(groups.is_empty());

        let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false, 1));
        let (groups, _) = DuplicateFinder::new(config)
            .find_duplicates(&[root.path()])
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_hard_links_are_reported_as_duplicates() {
        let dir = tempdir().unwrap();
        let a = write(&dir.path().join("a"), b"hard linked");
        fs::hard_link(&a, dir.path().join("b")).unwrap();

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates(&[dir.path()])
            .unwrap();
        assert_eq!(groups.len(), 1);
    }
}
