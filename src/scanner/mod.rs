//! Candidate discovery.
//!
//! Walks one or more directory trees and yields every regular file with its
//! length. Contents are never read here; sizes alone decide which files are
//! worth handing to the comparison engine.
//!
//! ```no_run
//! use dupecmp::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::new(false, true, 4096));
//! let (files, problems): (Vec<_>, Vec<_>) = walker.walk().partition(Result::is_ok);
//! println!("{} candidates, {} unreadable", files.len(), problems.len());
//! ```

pub mod walker;

use std::path::{Path, PathBuf};

pub use walker::Walker;

/// One regular file found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Length in bytes at the time of the walk. The file may change later.
    pub size: u64,
    /// Set when the path itself is a symlink that was followed.
    pub is_symlink: bool,
}

impl FileEntry {
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        FileEntry {
            path,
            size,
            is_symlink: false,
        }
    }
}

/// Traversal options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Descend through symlinked directories and report symlinked files.
    pub follow_symlinks: bool,
    /// Stay on the device of each root.
    pub same_fs: bool,
    /// Files shorter than this are not yielded. Zero admits empty files.
    pub min_size: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        WalkerConfig::new(false, false, 1)
    }
}

impl WalkerConfig {
    #[must_use]
    pub fn new(follow_symlinks: bool, same_fs: bool, min_size: u64) -> Self {
        WalkerConfig {
            follow_symlinks,
            same_fs,
            min_size,
        }
    }
}

/// A path the walker could not inspect. The walk carries on past it.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Listed, then gone before it could be inspected.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Symbolic link loop at {0}")]
    LinkLoop(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ScanError::PermissionDenied(p) | ScanError::NotFound(p) | ScanError::LinkLoop(p) => p,
            ScanError::Io { path, .. } => path,
        }
    }
}
