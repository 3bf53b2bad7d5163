use dupecmp::duplicates::DuplicateFinder;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_special_characters_in_filenames() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("file with spaces.txt"), b"content").unwrap();
    fs::write(dir.path().join("duplicate1.txt"), b"content").unwrap();
    fs::write(dir.path().join("café_🦀.txt"), b"unicode content").unwrap();
    fs::write(dir.path().join("duplicate2.txt"), b"unicode content").unwrap();
    fs::write(dir.path().join("special_!@#$%^&()_+.txt"), b"special content").unwrap();
    fs::write(dir.path().join("duplicate3.txt"), b"special content").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    // "unicode content" and "special content" share a size but not content
    assert_eq!(summary.size_groups, 2);
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.len() == 2));
}

#[test]
fn test_deeply_nested_paths() {
    let dir = tempdir().unwrap();
    let mut current = dir.path().to_path_buf();
    for i in 0..15 {
        current = current.join(format!("level_{i}"));
    }
    fs::create_dir_all(&current).unwrap();
    fs::write(current.join("deep.txt"), b"deep content").unwrap();
    fs::write(dir.path().join("shallow.txt"), b"deep content").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.total_files, 2);
}

#[cfg(unix)]
#[test]
fn test_invalid_utf8_filename() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let odd = dir.path().join(OsStr::from_bytes(&[0xff, 0xfe, 0xfd]));
    // some file systems refuse such names
    if fs::write(&odd, b"invalid utf8").is_err() {
        return;
    }
    fs::write(dir.path().join("plain"), b"invalid utf8").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.contains(&odd));
}
