//! Size buckets and confirmed duplicate sets.
//!
//! Two files of different length can never be byte-identical, so the walk's
//! output is bucketed by exact length before anything is opened. Each bucket
//! holding two or more files becomes one comparison session.
//!
//! ```
//! use dupecmp::duplicates::group_by_size;
//! use dupecmp::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let (buckets, stats) = group_by_size(vec![
//!     FileEntry::new(PathBuf::from("/x"), 1024),
//!     FileEntry::new(PathBuf::from("/y"), 1024),
//!     FileEntry::new(PathBuf::from("/z"), 2048),
//! ]);
//!
//! assert_eq!(buckets.len(), 1);
//! assert_eq!(buckets[0].size, 1024);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::compare::DuplicateSet;
use crate::scanner::FileEntry;

/// Files sharing one exact length, in the order the walk found them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    pub size: u64,
    pub files: Vec<FileEntry>,
}

impl SizeGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Candidate paths in session order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }
}

/// Files proven byte-identical by a comparison session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub size: u64,
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn new(size: u64, files: Vec<PathBuf>) -> Self {
        DuplicateGroup { size, files }
    }

    #[must_use]
    pub fn from_set(size: u64, set: DuplicateSet) -> Self {
        DuplicateGroup::new(size, set.paths)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Members beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes freed if only one member were kept.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size.saturating_mul(self.duplicate_count() as u64)
    }
}

/// Counts from bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    pub total_files: usize,
    /// Files alone at their length, dropped without being opened.
    pub eliminated_unique: usize,
}

/// Bucket `files` by length.
///
/// Singletons are dropped. The remaining buckets come back largest length
/// first, so sessions most likely to pay off run early and an interrupted run
/// still reports the biggest sets.
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileEntry>) -> (Vec<SizeGroup>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut buckets: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    for file in files {
        stats.total_files += 1;
        buckets.entry(file.size).or_default().push(file);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for (size, files) in buckets {
        if files.len() < 2 {
            stats.eliminated_unique += files.len();
            continue;
        }
        log::trace!("{} files of {} bytes", files.len(), size);
        groups.push(SizeGroup { size, files });
    }
    groups.sort_unstable_by(|a, b| b.size.cmp(&a.size));

    log::debug!(
        "{} files in {} size groups, {} unique lengths dropped",
        stats.total_files,
        groups.len(),
        stats.eliminated_unique
    );
    (groups, stats)
}
