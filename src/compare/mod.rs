//! Byte-level comparison engine for same-size candidate files.
//!
//! # Overview
//!
//! Given the paths of files already known to share a size, the engine finds
//! the maximal sets of byte-identical files. It reads every file once, chunk
//! by chunk, splitting candidate sets as soon as their chunks differ, so
//! files that differ early are only read up to the first differing chunk.
//!
//! Memory and descriptors are bounded:
//!
//! - one read buffer per candidate, sized from [`CompareConfig::total_buffer`]
//! - at most [`CompareConfig::max_open_files`] files open at once; others
//!   are closed and transparently reopened at their saved offset
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::compare::{compare_batch, CompareConfig};
//!
//! let paths = ["a.bin", "b.bin", "c.bin"];
//! let report = compare_batch(&paths, &CompareConfig::default()).unwrap();
//! for set in &report.clusters {
//!     println!("{:?}", set.paths);
//! }
//! ```

pub mod emitter;
mod error;
pub mod forest;
pub mod pool;
pub mod session;

#[cfg(test)]
mod test_support;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use emitter::{BatchCollector, ClusterSink, DuplicateSet};
pub use error::{CandidateFailure, ComparisonError, ErrorKind, IoOp};
pub use forest::EquivalenceForest;
pub use pool::{FsOpener, HandlePool, Opener};
pub use session::{ComparisonSession, SessionOutcome, SessionStats};

/// Smallest read buffer any candidate may get.
pub const MIN_BUFFER_PER_FILE: usize = 128;

/// Largest read buffer any candidate gets, whatever the total budget.
pub const MAX_BUFFER_PER_FILE: usize = 32 * 1024;

/// Default total buffer budget shared by one session's candidates.
pub const DEFAULT_TOTAL_BUFFER: usize = 8192;

/// Default maximum number of files one session keeps open.
pub const DEFAULT_MAX_OPEN_FILES: usize = 16;

/// Resource limits for one comparison session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Total read buffer budget in bytes, split evenly across candidates
    pub total_buffer: usize,
    /// Maximum number of simultaneously open files
    pub max_open_files: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            total_buffer: DEFAULT_TOTAL_BUFFER,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
        }
    }
}

impl CompareConfig {
    /// Set the total buffer budget.
    #[must_use]
    pub fn with_total_buffer(mut self, bytes: usize) -> Self {
        self.total_buffer = bytes;
        self
    }

    /// Set the open file limit.
    #[must_use]
    pub fn with_max_open_files(mut self, limit: usize) -> Self {
        self.max_open_files = limit;
        self
    }

    /// Per-file buffer size for `count` candidates.
    #[must_use]
    pub fn buffer_per_file(&self, count: usize) -> usize {
        (self.total_buffer / count.max(1)).clamp(MIN_BUFFER_PER_FILE, MAX_BUFFER_PER_FILE)
    }

    /// Check that this configuration can serve `count` candidates.
    ///
    /// # Errors
    ///
    /// [`ComparisonError::InvalidArgument`] if the budget leaves less than
    /// [`MIN_BUFFER_PER_FILE`] bytes per candidate or no file may be open.
    pub fn validate(&self, count: usize) -> Result<(), ComparisonError> {
        if self.max_open_files == 0 {
            return Err(ComparisonError::InvalidArgument(
                "max open files must be at least 1".to_string(),
            ));
        }
        if self.total_buffer == 0 {
            return Err(ComparisonError::InvalidArgument(
                "buffer budget must be positive".to_string(),
            ));
        }
        let share = self.total_buffer / count.max(1);
        if share < MIN_BUFFER_PER_FILE {
            return Err(ComparisonError::InvalidArgument(format!(
                "buffer budget of {} bytes gives {} files only {} bytes each (minimum {})",
                self.total_buffer, count, share, MIN_BUFFER_PER_FILE
            )));
        }
        Ok(())
    }
}

/// Result of a batch comparison.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Every set of byte-identical files
    pub clusters: Vec<DuplicateSet>,
    /// Candidates excluded because of an I/O failure
    pub failures: Vec<CandidateFailure>,
    /// Session counters
    pub stats: SessionStats,
}

impl BatchReport {
    /// Number of duplicate sets found.
    #[must_use]
    pub fn count(&self) -> usize {
        self.clusters.len()
    }
}

/// A batch comparison that stopped before every cluster was collected.
///
/// `partial.clusters` holds the sets collected before `error`. Each of them
/// is a complete duplicate set; sets the session never reached are missing.
/// `partial.failures` and `partial.stats` are left empty.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{error}")]
pub struct BatchError {
    pub error: ComparisonError,
    pub partial: BatchReport,
}

impl BatchError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl From<ComparisonError> for BatchError {
    fn from(error: ComparisonError) -> Self {
        BatchError {
            error,
            partial: BatchReport::default(),
        }
    }
}

impl From<BatchError> for ComparisonError {
    fn from(err: BatchError) -> Self {
        err.error
    }
}

/// Compare `paths` and return all duplicate sets at once.
///
/// The paths must name regular files of equal size. Fewer than two paths
/// give an empty report without touching the file system.
///
/// # Errors
///
/// See [`ComparisonSession::run`]. Clusters collected before the error are
/// kept in [`BatchError::partial`]. Failures of single candidates are not
/// errors; they are listed in [`BatchReport::failures`].
pub fn compare_batch<P: AsRef<Path>>(
    paths: &[P],
    config: &CompareConfig,
) -> Result<BatchReport, BatchError> {
    if paths.len() < 2 {
        return Ok(BatchReport::default());
    }
    let session = ComparisonSession::new(paths, config)?;
    collect_batch(session, BatchCollector::new())
}

/// Run `session` into `collector`, keeping what was collected if it fails.
fn collect_batch<O, C>(session: ComparisonSession<'_, O>, mut collector: C) -> Result<BatchReport, BatchError>
where
    O: Opener,
    C: ClusterSink + Into<Vec<DuplicateSet>>,
{
    match session.run(&mut collector) {
        Ok(outcome) => Ok(BatchReport {
            clusters: collector.into(),
            failures: outcome.failures,
            stats: outcome.stats,
        }),
        Err(error) => {
            let clusters: Vec<DuplicateSet> = collector.into();
            log::debug!("Batch stopped after {} clusters: {}", clusters.len(), error);
            Err(BatchError {
                error,
                partial: BatchReport {
                    clusters,
                    ..BatchReport::default()
                },
            })
        }
    }
}

/// Compare `paths`, handing each duplicate set to `sink` as soon as it is
/// final.
///
/// Sets delivered before an error are not retracted.
///
/// # Errors
///
/// See [`ComparisonSession::run`].
pub fn compare_batch_streaming<P, S>(
    paths: &[P],
    config: &CompareConfig,
    sink: &mut S,
) -> Result<SessionOutcome, ComparisonError>
where
    P: AsRef<Path>,
    S: ClusterSink + ?Sized,
{
    if paths.len() < 2 {
        return Ok(SessionOutcome::default());
    }
    ComparisonSession::new(paths, config)?.run(sink)
}
