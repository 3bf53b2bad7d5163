//! Duplicate finder: walk, size grouping, byte comparison.
//!
//! # Overview
//!
//! A run has three stages:
//! 1. **Walk**: collect regular files from every root (see [`crate::scanner`])
//! 2. **Size grouping**: bucket files by exact size, largest first
//!    (see [`crate::duplicates::groups`])
//! 3. **Comparison**: one comparison session per size group
//!    (see [`crate::compare`])
//!
//! Sessions share nothing, so with `io_threads > 1` several size groups are
//! compared at once. Each session gets the full [`CompareConfig`] budget, so
//! the process may hold up to `io_threads * max_open_files` files open.
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::duplicates::{DuplicateFinder, FinderConfig};
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let summary = finder
//!     .for_each_group(&["/some/path"], |group| {
//!         for path in &group.files {
//!             println!("{}", path.display());
//!         }
//!         println!();
//!     })
//!     .unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_size, DuplicateGroup, SizeGroup};
use crate::compare::{
    compare_batch, compare_batch_streaming, BatchError, BatchReport, CandidateFailure, ClusterSink,
    CompareConfig, ComparisonError, DuplicateSet, SessionOutcome,
};
use crate::progress::{ProgressCallback, PHASE_COMPARING, PHASE_WALKING};
use crate::scanner::{FileEntry, ScanError, Walker, WalkerConfig};

/// What to walk and how hard to compare.
#[derive(Clone)]
pub struct FinderConfig {
    /// Buffer budget and open file limit for each comparison session.
    pub compare: CompareConfig,
    /// Number of size groups compared concurrently.
    /// Default is 1: one session at a time.
    pub io_threads: usize,
    /// Traversal options applied to every root.
    pub walker_config: WalkerConfig,
    /// Raised by the Ctrl+C handler.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Receives walk and comparison progress.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("compare", &self.compare)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            compare: CompareConfig::default(),
            io_threads: 1,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the per-session comparison limits.
    #[must_use]
    pub fn with_compare_config(mut self, config: CompareConfig) -> Self {
        self.compare = config;
        self
    }

    /// Set how many size groups are compared concurrently.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Checked before each root and between size groups.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Counters and problems gathered over one run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Files alone at their length
    pub eliminated_by_size: usize,
    /// Number of size groups that went to comparison
    pub size_groups: usize,
    /// Size groups left uncompared because the buffer budget cannot serve them
    pub skipped_groups: usize,
    /// Confirmed sets of identical files
    pub duplicate_groups: usize,
    /// Members beyond the first, summed over all groups
    pub duplicate_files: usize,
    /// Bytes freed if one copy per set were kept
    pub reclaimable_space: u64,
    /// Bytes read while comparing content
    pub bytes_compared: u64,
    /// Candidates excluded from comparison by an I/O failure
    pub failed_candidates: Vec<CandidateFailure>,
    /// Errors encountered while walking
    pub scan_errors: Vec<ScanError>,
    /// Wall time from the first walk to the last session
    pub scan_duration: Duration,
    /// Whether the scan was interrupted before every group was compared
    pub interrupted: bool,
}

impl ScanSummary {
    /// Share of the walked bytes held by redundant copies, in percent.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }

    /// Whether some files or groups could not be fully processed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.failed_candidates.is_empty() || !self.scan_errors.is_empty() || self.skipped_groups > 0
    }

    fn add_group(&mut self, group: &DuplicateGroup) {
        self.duplicate_groups += 1;
        self.duplicate_files += group.duplicate_count();
        self.reclaimable_space += group.wasted_space();
    }
}

/// Reasons a run produces no summary at all.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// Ctrl+C before or during the walk.
    #[error("Scan interrupted by user")]
    Interrupted,

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A comparison session failed as a whole.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Hands every cluster of one session to the caller as a [`DuplicateGroup`].
struct GroupSink<'a, F> {
    size: u64,
    on_group: &'a mut F,
    summary: &'a mut ScanSummary,
}

impl<F: FnMut(DuplicateGroup)> ClusterSink for GroupSink<'_, F> {
    fn accept(&mut self, set: &DuplicateSet) -> Result<(), ComparisonError> {
        let group = DuplicateGroup::from_set(self.size, set.try_clone()?);
        self.summary.add_group(&group);
        (self.on_group)(group);
        Ok(())
    }
}

/// Duplicate finder that runs the walk → group → compare pipeline.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files below the given roots.
    ///
    /// # Errors
    ///
    /// Fails when:
    /// - a root does not exist or is not a directory
    /// - the walk is interrupted by shutdown signal
    /// - a comparison session fails as a whole
    pub fn find_duplicates<P: AsRef<Path>>(
        &self,
        roots: &[P],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let mut groups = Vec::new();
        let summary = self.for_each_group(roots, |group| groups.push(group))?;
        Ok((groups, summary))
    }

    /// Find duplicates below the given roots, handing each group to
    /// `on_group` as soon as its session finalizes it.
    ///
    /// With `io_threads > 1` sessions run concurrently and nothing is handed
    /// over until all of them have finished; groups are then delivered in
    /// size order.
    ///
    /// Groups arrive largest file size first. An interruption after the walk
    /// stops before the next size group and is reported through
    /// [`ScanSummary::interrupted`]; groups already delivered stand.
    ///
    /// # Errors
    ///
    /// See [`find_duplicates`](Self::find_duplicates).
    pub fn for_each_group<P, F>(&self, roots: &[P], mut on_group: F) -> Result<ScanSummary, FinderError>
    where
        P: AsRef<Path>,
        F: FnMut(DuplicateGroup),
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let files = self.collect_files(roots, &mut summary)?;
        self.compare_files(files, &mut summary, &mut on_group)?;

        summary.scan_duration = start_time.elapsed();
        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );
        Ok(summary)
    }

    /// Skip the walk and compare an already collected file list.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::Comparison` if a session fails as a whole.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();
        let mut groups = Vec::new();

        self.compare_files(files, &mut summary, &mut |group: DuplicateGroup| {
            groups.push(group);
        })?;

        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Walk every root and collect regular files.
    fn collect_files<P: AsRef<Path>>(
        &self,
        roots: &[P],
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileEntry>, FinderError> {
        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.to_path_buf()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.to_path_buf()));
            }
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let callback = self.config.progress_callback.as_ref();
        if let Some(callback) = callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut files = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for root in roots {
            let root = root.as_ref();
            log::info!("Walking {}", root.display());
            if let Some(callback) = callback {
                callback.on_message(&format!("Walking {}", root.display()));
            }

            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(Arc::clone(flag));
            }

            for result in walker.walk() {
                match result {
                    Ok(file) => {
                        // Overlapping roots must not pair a file with itself.
                        if !seen.insert(file.path.clone()) {
                            log::trace!("Already collected: {}", file.path.display());
                            continue;
                        }
                        files.push(file);
                        if let Some(callback) = callback {
                            callback.on_progress(files.len(), "");
                        }
                    }
                    Err(e) => summary.scan_errors.push(e),
                }
            }
        }

        if let Some(callback) = callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files ({}), {} scan errors",
            files.len(),
            ByteSize(files.iter().map(|f| f.size).sum::<u64>()),
            summary.scan_errors.len()
        );
        Ok(files)
    }

    /// Group `files` by size and compare every group.
    fn compare_files<F: FnMut(DuplicateGroup)>(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
        on_group: &mut F,
    ) -> Result<(), FinderError> {
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();

        let (size_groups, size_stats) = group_by_size(files);
        summary.eliminated_by_size = size_stats.eliminated_unique;
        summary.size_groups = size_groups.len();

        if size_groups.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            return Ok(());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_COMPARING, size_groups.len());
        }

        let result = if self.config.io_threads > 1 && size_groups.len() > 1 {
            self.compare_parallel(&size_groups, summary, on_group)
        } else {
            self.compare_sequential(&size_groups, summary, on_group)
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_COMPARING);
        }

        if summary.interrupted {
            log::warn!("Comparison interrupted, results are incomplete");
        }
        result
    }

    /// Compare size groups one at a time, streaming clusters as they finalize.
    fn compare_sequential<F: FnMut(DuplicateGroup)>(
        &self,
        size_groups: &[SizeGroup],
        summary: &mut ScanSummary,
        on_group: &mut F,
    ) -> Result<(), FinderError> {
        for (done, group) in size_groups.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                summary.interrupted = true;
                return Ok(());
            }

            let paths: Vec<&Path> = group.paths().collect();
            let mut sink = GroupSink {
                size: group.size,
                on_group: &mut *on_group,
                summary: &mut *summary,
            };
            let result = compare_batch_streaming(&paths, &self.config.compare, &mut sink);
            record_session(group, result, summary)?;
            self.report_group_done(done + 1, group);
        }
        Ok(())
    }

    /// Compare size groups on a dedicated thread pool.
    ///
    /// Clusters are delivered after all sessions finish, in size order, so
    /// the output does not depend on thread scheduling.
    fn compare_parallel<F: FnMut(DuplicateGroup)>(
        &self,
        size_groups: &[SizeGroup],
        summary: &mut ScanSummary,
        on_group: &mut F,
    ) -> Result<(), FinderError> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to create comparison thread pool ({e}), comparing sequentially");
                return self.compare_sequential(size_groups, summary, on_group);
            }
        };

        let done = AtomicUsize::new(0);
        let results: Vec<Option<Result<BatchReport, BatchError>>> = pool.install(|| {
            size_groups
                .par_iter()
                .map(|group| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let paths: Vec<&Path> = group.paths().collect();
                    let result = compare_batch(&paths, &self.config.compare);
                    self.report_group_done(done.fetch_add(1, Ordering::SeqCst) + 1, group);
                    Some(result)
                })
                .collect()
        });

        for (group, result) in size_groups.iter().zip(results) {
            let Some(result) = result else {
                summary.interrupted = true;
                continue;
            };
            let outcome = match result {
                Ok(report) => {
                    let clusters_emitted = report.clusters.len();
                    deliver(group.size, report.clusters, summary, on_group);
                    Ok(SessionOutcome {
                        clusters_emitted,
                        failures: report.failures,
                        stats: report.stats,
                    })
                }
                // sets found before the failure stand, as in the sequential path
                Err(BatchError { error, partial }) => {
                    deliver(group.size, partial.clusters, summary, on_group);
                    Err(error)
                }
            };
            record_session(group, outcome, summary)?;
        }
        Ok(())
    }

    fn report_group_done(&self, done: usize, group: &SizeGroup) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(done, &format!("{} x {}", ByteSize(group.size), group.len()));
            callback.on_item_completed(group.size * group.len() as u64);
        }
    }
}

fn deliver<F: FnMut(DuplicateGroup)>(
    size: u64,
    clusters: Vec<DuplicateSet>,
    summary: &mut ScanSummary,
    on_group: &mut F,
) {
    for set in clusters {
        let found = DuplicateGroup::from_set(size, set);
        summary.add_group(&found);
        on_group(found);
    }
}

/// Fold one session's outcome into the summary.
///
/// A group the buffer budget cannot serve is skipped with a warning; any
/// other session failure aborts the scan.
fn record_session(
    group: &SizeGroup,
    result: Result<SessionOutcome, ComparisonError>,
    summary: &mut ScanSummary,
) -> Result<(), FinderError> {
    match result {
        Ok(outcome) => {
            log::debug!(
                "Size group {} bytes x {}: {} rounds, {} bytes read, {} failures",
                group.size,
                group.len(),
                outcome.stats.rounds,
                outcome.stats.bytes_read,
                outcome.failures.len()
            );
            summary.bytes_compared += outcome.stats.bytes_read;
            summary.failed_candidates.extend(outcome.failures);
            Ok(())
        }
        Err(ComparisonError::InvalidArgument(reason)) => {
            log::warn!(
                "Skipping {} files of {} bytes: {}",
                group.len(),
                group.size,
                reason
            );
            summary.skipped_groups += 1;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
