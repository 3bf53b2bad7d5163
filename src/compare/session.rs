//! Round-based incremental clustering of same-size candidates.
//!
//! # Overview
//!
//! A [`ComparisonSession`] owns everything needed to compare one batch of
//! candidates that share a file size:
//!
//! - the [`EquivalenceForest`] of current equality decisions
//! - the `order` permutation, in which every current cluster is a
//!   contiguous run of indices sharing a root
//! - one read buffer per candidate
//! - the [`HandlePool`] bounding open descriptors
//!
//! Every pass walks the runs of `order`. A run of one has no partner left
//! and its stream is closed. Every longer run ("group") reads the next
//! chunk of each member, then splits by chunk content: the group's slice of
//! `order` is sorted by chunk, and one linear scan over the sorted slice
//! unions neighbours with equal chunks and separates the rest. Candidates
//! with a sticky I/O failure sort to the front of the slice as singletons.
//! The session ends after a pass in which no group read any new bytes.
//!
//! Each byte of each file is read at most once, and sets only ever split,
//! so the loop terminates after at most `size / buffer + 2` passes.

use std::cmp::Ordering;
use std::path::Path;

use super::emitter::{ClusterSink, DuplicateSet};
use super::forest::EquivalenceForest;
use super::pool::{FsOpener, HandlePool, Opener, PoolStats};
use super::{CandidateFailure, CompareConfig, ComparisonError};

/// Counters describing one finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of candidates compared
    pub candidates: usize,
    /// Per-file read buffer size in bytes
    pub buffer_size: usize,
    /// Passes over the order, including the final one that read nothing
    pub rounds: usize,
    /// Total bytes read from all candidates
    pub bytes_read: u64,
    /// First-time file opens
    pub opens: usize,
    /// Reopens after a handle was evicted
    pub reopens: usize,
    /// Handles closed to stay within the open-file limit
    pub evictions: usize,
    /// Highest number of files open at once
    pub peak_open: usize,
}

/// What a finished session reports besides the clusters themselves.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    /// Number of clusters handed to the sink
    pub clusters_emitted: usize,
    /// Candidates excluded because of an I/O failure
    pub failures: Vec<CandidateFailure>,
    /// Session counters
    pub stats: SessionStats,
}

/// Comparison state for one batch of same-size candidates.
#[derive(Debug)]
pub struct ComparisonSession<'a, O: Opener = FsOpener> {
    paths: Vec<&'a Path>,
    forest: EquivalenceForest,
    order: Vec<usize>,
    buffers: Vec<Vec<u8>>,
    counts: Vec<usize>,
    buffer_size: usize,
    pool: HandlePool<'a, O>,
    rounds: usize,
}

impl<'a> ComparisonSession<'a, FsOpener> {
    /// Set up a session over `paths` reading from the file system.
    ///
    /// # Errors
    ///
    /// - [`ComparisonError::InvalidArgument`] if the configuration cannot
    ///   serve `paths.len()` candidates; no file has been opened yet
    /// - [`ComparisonError::OutOfMemory`] if session state cannot be allocated
    pub fn new<P: AsRef<Path>>(
        paths: &'a [P],
        config: &CompareConfig,
    ) -> Result<Self, ComparisonError> {
        Self::with_opener(paths, config, FsOpener)
    }
}

impl<'a, O: Opener> ComparisonSession<'a, O> {
    /// Set up a session whose files are opened through `opener`.
    pub fn with_opener<P: AsRef<Path>>(
        paths: &'a [P],
        config: &CompareConfig,
        opener: O,
    ) -> Result<Self, ComparisonError> {
        let count = paths.len();
        config.validate(count)?;
        let buffer_size = config.buffer_per_file(count);

        let mut path_refs: Vec<&'a Path> = Vec::new();
        path_refs
            .try_reserve_exact(count)
            .map_err(|e| ComparisonError::out_of_memory("candidate list", e))?;
        path_refs.extend(paths.iter().map(AsRef::as_ref));

        let mut order = Vec::new();
        order
            .try_reserve_exact(count)
            .map_err(|e| ComparisonError::out_of_memory("candidate order", e))?;
        order.extend(0..count);

        let mut counts = Vec::new();
        counts
            .try_reserve_exact(count)
            .map_err(|e| ComparisonError::out_of_memory("read counts", e))?;
        counts.resize(count, 0);

        let mut buffers = Vec::new();
        buffers
            .try_reserve_exact(count)
            .map_err(|e| ComparisonError::out_of_memory("read buffers", e))?;
        for _ in 0..count {
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(buffer_size)
                .map_err(|e| ComparisonError::out_of_memory("read buffer", e))?;
            buffer.resize(buffer_size, 0);
            buffers.push(buffer);
        }

        let forest = EquivalenceForest::merged(count)?;
        let pool = HandlePool::new(opener, config.max_open_files, path_refs.iter().copied())?;

        Ok(Self {
            paths: path_refs,
            forest,
            order,
            buffers,
            counts,
            buffer_size,
            pool,
            rounds: 0,
        })
    }

    /// Per-file read buffer size chosen for this session.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Run the session to completion, handing each cluster to `sink`.
    ///
    /// All handles are released when this returns, whether or not it
    /// succeeded. Clusters already handed to `sink` before an error are not
    /// retracted.
    ///
    /// # Errors
    ///
    /// - [`ComparisonError::ResourceExhaustion`] if no file can be opened
    /// - [`ComparisonError::OutOfMemory`] if a cluster copy cannot be built
    /// - any error returned by `sink`
    pub fn run<S: ClusterSink + ?Sized>(
        mut self,
        sink: &mut S,
    ) -> Result<SessionOutcome, ComparisonError> {
        log::debug!(
            "Comparing {} candidates with {} byte buffers, at most {} open files",
            self.paths.len(),
            self.buffer_size,
            self.pool.limit()
        );

        let result = self.cluster().and_then(|()| self.emit(sink));
        self.pool.close_all();
        let clusters_emitted = result?;

        let stats = self.stats();
        log::debug!(
            "Session finished: {} clusters, {} rounds, {} bytes read, {} reopens",
            clusters_emitted,
            stats.rounds,
            stats.bytes_read,
            stats.reopens
        );

        let mut failures = Vec::new();
        failures
            .try_reserve_exact(self.pool.failures().count())
            .map_err(|e| ComparisonError::out_of_memory("failure list", e))?;
        failures.extend(self.pool.failures().cloned());

        Ok(SessionOutcome {
            clusters_emitted,
            failures,
            stats,
        })
    }

    /// Session counters so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let PoolStats {
            opens,
            reopens,
            evictions,
            peak_open,
            bytes_read,
        } = self.pool.stats();
        SessionStats {
            candidates: self.paths.len(),
            buffer_size: self.buffer_size,
            rounds: self.rounds,
            bytes_read,
            opens,
            reopens,
            evictions,
            peak_open,
        }
    }

    /// Run passes until one makes no progress.
    fn cluster(&mut self) -> Result<(), ComparisonError> {
        loop {
            self.rounds += 1;
            let progressed = self.pass()?;
            log::trace!("Round {} done, progressed: {}", self.rounds, progressed);
            if !progressed {
                return Ok(());
            }
        }
    }

    /// One pass over every group. Returns whether any group read new bytes.
    fn pass(&mut self) -> Result<bool, ComparisonError> {
        let total = self.order.len();
        let mut progressed = false;
        let mut start = 0;
        while start < total {
            let len = self.run_length(start);
            if len == 1 {
                self.pool.close(self.order[start]);
            } else if self.compare_group(start, len)? {
                progressed = true;
            }
            start += len;
        }
        Ok(progressed)
    }

    /// Length of the run of equal roots beginning at `order[start]`.
    fn run_length(&mut self, start: usize) -> usize {
        let root = self.forest.find(self.order[start]);
        let mut end = start + 1;
        while end < self.order.len() && self.forest.find(self.order[end]) == root {
            end += 1;
        }
        end - start
    }

    /// Read the next chunk of every member of `order[start..start + len]`
    /// and split the group by chunk content.
    ///
    /// Returns whether any healthy member read a positive number of bytes.
    fn compare_group(&mut self, start: usize, len: usize) -> Result<bool, ComparisonError> {
        let end = start + len;

        let mut min_positive: Option<usize> = None;
        for pos in start..end {
            let idx = self.order[pos];
            let count = self.pool.read(idx, &mut self.buffers[idx])?;
            self.counts[idx] = count;
            if count > 0 && self.pool.failure(idx).is_none() {
                min_positive = Some(min_positive.map_or(count, |m| m.min(count)));
            }
        }
        let window = min_positive.unwrap_or(0);

        self.forest.reset_range(&self.order, start, len);

        let pool = &self.pool;
        let buffers = &self.buffers;
        let counts = &self.counts;
        let chunk = |idx: usize| &buffers[idx][..counts[idx]];
        self.order[start..end].sort_by(|&a, &b| {
            match (pool.failure(a).is_some(), pool.failure(b).is_some()) {
                (true, true) => a.cmp(&b),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) if window == 0 => Ordering::Equal,
                (false, false) => chunk(a).cmp(chunk(b)),
            }
        });

        let mut previous: Option<usize> = None;
        for pos in start..end {
            let idx = self.order[pos];
            if self.pool.failure(idx).is_some() {
                self.forest.mark_different(idx, idx);
                continue;
            }
            match previous {
                Some(prev) if window == 0 || chunk(prev) == chunk(idx) => {
                    self.forest.union(prev, idx);
                }
                Some(prev) => self.forest.mark_different(prev, idx),
                None => self.forest.mark_different(idx, idx),
            }
            previous = Some(idx);
        }

        Ok(window > 0)
    }

    /// Hand every finalized cluster to `sink`. Returns how many were sent.
    fn emit<S: ClusterSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, ComparisonError> {
        let total = self.order.len();
        let mut emitted = 0;
        let mut members = Vec::new();
        let mut start = 0;
        while start < total {
            let len = self.run_length(start);
            if len > 1 {
                members.clear();
                members
                    .try_reserve(len)
                    .map_err(|e| ComparisonError::out_of_memory("cluster members", e))?;
                members.extend(
                    self.order[start..start + len]
                        .iter()
                        .copied()
                        .filter(|&idx| self.pool.failure(idx).is_none()),
                );
                if members.len() > 1 {
                    members.sort_unstable();
                    let set = DuplicateSet::try_from_paths(
                        members.iter().map(|&idx| self.paths[idx]),
                        members.len(),
                    )?;
                    sink.accept(&set)?;
                    emitted += 1;
                }
            }
            start += len;
        }
        Ok(emitted)
    }
}
