//! Single-root traversal on top of walkdir.
//!
//! Entries within a directory are visited in file name order, so repeated
//! runs over an unchanged tree produce the same candidate order and the same
//! reported sets.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Lazily walks one root.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Walker over the tree below `path`. Nothing is read until [`walk`](Self::walk).
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding once `flag` is raised.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of this walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Regular files at or above the minimum size. Unreadable paths come
    /// through as `Err` items and the walk continues past them.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .same_file_system(self.config.same_fs)
            .sort_by_file_name();

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("walk of {} cut short", self.root.display());
                    return false;
                }
                true
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    // Without follow_links a symlink is reported as itself and skipped here.
                    if !entry.file_type().is_file() {
                        return None;
                    }

                    let metadata = match entry.metadata() {
                        Ok(m) => m,
                        Err(e) => return Some(Err(self.handle_walk_error(e))),
                    };

                    let size = metadata.len();
                    if size < self.config.min_size {
                        log::trace!(
                            "Skipping file below minimum size ({}): {}",
                            size,
                            entry.path().display()
                        );
                        return None;
                    }

                    Some(Ok(FileEntry {
                        path: entry.path().to_path_buf(),
                        size,
                        is_symlink: entry.path_is_symlink(),
                    }))
                }
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Symbolic link loop: {}", path.display());
            return ScanError::LinkLoop(path);
        }

        match error.into_io_error() {
            Some(io) => match io.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    log::warn!("Permission denied: {}", path.display());
                    ScanError::PermissionDenied(path)
                }
                std::io::ErrorKind::NotFound => {
                    log::debug!("File not found (may have been deleted): {}", path.display());
                    ScanError::NotFound(path)
                }
                _ => {
                    log::warn!("I/O error for {}: {}", path.display(), io);
                    ScanError::Io { path, source: io }
                }
            },
            None => {
                log::warn!("Walker error for {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("directory walk failed"),
                }
            }
        }
    }
}
