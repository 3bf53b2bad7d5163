//! Bounded pool of open file handles.
//!
//! # Overview
//!
//! A [`HandlePool`] lets a session read from any number of candidates while
//! never holding more than `limit` files open at once. Handles live only in
//! the pool's recency map (most recently touched first). Per-candidate
//! [`StreamState`] keeps the path, resume offset and sticky failure, never
//! the handle itself.
//!
//! When the pool is full, the least recently used handle is closed. A later
//! read on that candidate reopens the file and seeks back to its offset, so
//! callers see one continuous stream.
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::compare::pool::{FsOpener, HandlePool};
//! use std::path::Path;
//!
//! let paths = [Path::new("a.bin"), Path::new("b.bin")];
//! let mut pool = HandlePool::new(FsOpener, 1, paths.iter().copied()).unwrap();
//! let mut buf = vec![0u8; 4096];
//!
//! // Only one descriptor is ever open; `b.bin` evicts `a.bin` and back.
//! let a = pool.read(0, &mut buf).unwrap();
//! let b = pool.read(1, &mut buf).unwrap();
//! let a_next = pool.read(0, &mut buf).unwrap();
//! # let _ = (a, b, a_next);
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;

use super::{CandidateFailure, ComparisonError, IoOp};

/// Opens candidate files on behalf of a [`HandlePool`].
///
/// The default [`FsOpener`] opens regular files read-only. Other
/// implementations can wrap or replace the file system.
pub trait Opener {
    /// Readable, seekable handle type.
    type Handle: Read + Seek;

    /// Open `path` for reading from the start.
    fn open(&mut self, path: &Path) -> io::Result<Self::Handle>;
}

/// Opens files from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl Opener for FsOpener {
    type Handle = File;

    fn open(&mut self, path: &Path) -> io::Result<File> {
        File::open(path)
    }
}

/// Whether an open failure means the process ran out of descriptors.
///
/// These failures are retried after closing a pooled handle instead of being
/// charged to the candidate.
pub fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        matches!(err.raw_os_error(), Some(libc::EMFILE) | Some(libc::ENFILE))
    }
    #[cfg(windows)]
    {
        // ERROR_TOO_MANY_OPEN_FILES
        err.raw_os_error() == Some(4)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = err;
        false
    }
}

/// Lifecycle of one candidate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Never opened.
    Unopened,
    /// Opened at least once; may currently be parked (evicted).
    Active,
    /// Closed for good: end of file reached, failed, or explicitly closed.
    Finished,
}

/// Per-candidate stream bookkeeping.
#[derive(Debug)]
pub struct StreamState<'a> {
    path: &'a Path,
    offset: u64,
    status: StreamStatus,
    failure: Option<CandidateFailure>,
}

impl<'a> StreamState<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            offset: 0,
            status: StreamStatus::Unopened,
            failure: None,
        }
    }

    /// Candidate path.
    #[must_use]
    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// Bytes consumed so far; the resume position after a reopen.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Sticky failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&CandidateFailure> {
        self.failure.as_ref()
    }
}

/// Handle pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// First-time opens
    pub opens: usize,
    /// Reopens after eviction
    pub reopens: usize,
    /// Handles closed to make room
    pub evictions: usize,
    /// Highest number of simultaneously open handles
    pub peak_open: usize,
    /// Total bytes read through the pool
    pub bytes_read: u64,
}

/// Bounded, LRU-evicting pool of candidate file handles.
pub struct HandlePool<'a, O: Opener = FsOpener> {
    opener: O,
    limit: usize,
    streams: Vec<StreamState<'a>>,
    handles: LruCache<usize, O::Handle>,
    stats: PoolStats,
}

impl<O: Opener> std::fmt::Debug for HandlePool<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlePool")
            .field("limit", &self.limit)
            .field("open", &self.handles.len())
            .field("streams", &self.streams)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'a, O: Opener> HandlePool<'a, O> {
    /// Create a pool over `paths`, allowing at most `limit` open handles.
    ///
    /// Streams are addressed by their position in `paths`.
    ///
    /// # Errors
    ///
    /// - [`ComparisonError::InvalidArgument`] if `limit` is zero
    /// - [`ComparisonError::OutOfMemory`] if stream state cannot be allocated
    pub fn new(
        opener: O,
        limit: usize,
        paths: impl ExactSizeIterator<Item = &'a Path>,
    ) -> Result<Self, ComparisonError> {
        if limit == 0 {
            return Err(ComparisonError::InvalidArgument(
                "at least one open file must be allowed".to_string(),
            ));
        }

        let mut streams = Vec::new();
        streams
            .try_reserve_exact(paths.len())
            .map_err(|e| ComparisonError::out_of_memory("stream state", e))?;
        streams.extend(paths.map(StreamState::new));

        Ok(Self {
            opener,
            limit,
            streams,
            handles: LruCache::unbounded(),
            stats: PoolStats::default(),
        })
    }

    /// Maximum number of simultaneously open handles.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of handles open right now.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    /// Whether the handle for `idx` is currently open.
    #[must_use]
    pub fn is_open(&self, idx: usize) -> bool {
        self.handles.contains(&idx)
    }

    /// Stream state for `idx`.
    #[must_use]
    pub fn stream(&self, idx: usize) -> &StreamState<'a> {
        &self.streams[idx]
    }

    /// Sticky failure recorded for `idx`.
    #[must_use]
    pub fn failure(&self, idx: usize) -> Option<&CandidateFailure> {
        self.streams[idx].failure.as_ref()
    }

    /// All recorded failures, in candidate order.
    pub fn failures(&self) -> impl Iterator<Item = &CandidateFailure> {
        self.streams.iter().filter_map(|s| s.failure.as_ref())
    }

    /// Pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Make sure the stream for `idx` has an open handle.
    ///
    /// Returns `Ok(false)` when the candidate cannot be read: it has a sticky
    /// failure (possibly recorded by this call) or was already finished.
    ///
    /// # Errors
    ///
    /// [`ComparisonError::ResourceExhaustion`] when the file cannot be opened
    /// for lack of descriptors even after every other handle was closed.
    pub fn open(&mut self, idx: usize) -> Result<bool, ComparisonError> {
        let stream = &self.streams[idx];
        if stream.failure.is_some() || stream.status == StreamStatus::Finished {
            return Ok(false);
        }
        if self.handles.get(&idx).is_some() {
            return Ok(true);
        }

        let reopen = stream.status == StreamStatus::Active;
        let Some(mut handle) = self.acquire(idx)? else {
            return Ok(false);
        };

        let offset = self.streams[idx].offset;
        if reopen {
            self.stats.reopens += 1;
            log::trace!(
                "Reopening {} at offset {}",
                self.streams[idx].path.display(),
                offset
            );
            if offset > 0 {
                if let Err(e) = handle.seek(SeekFrom::Start(offset)) {
                    self.fail(idx, IoOp::Seek, e);
                    return Ok(false);
                }
            }
        } else {
            self.stats.opens += 1;
        }

        self.streams[idx].status = StreamStatus::Active;
        self.handles.push(idx, handle);
        self.stats.peak_open = self.stats.peak_open.max(self.handles.len());
        Ok(true)
    }

    /// Read up to `buf.len()` bytes from the stream for `idx`.
    ///
    /// Reopens and seeks transparently if the handle was evicted. Fills the
    /// buffer completely unless the end of the file is reached, so every
    /// healthy stream of a same-size batch advances by the same amount.
    /// Returns `Ok(0)` at end of file and for candidates with a sticky
    /// failure; a read failure is recorded against the candidate.
    ///
    /// # Errors
    ///
    /// Only the fatal [`ComparisonError::ResourceExhaustion`] from reopening.
    pub fn read(&mut self, idx: usize, buf: &mut [u8]) -> Result<usize, ComparisonError> {
        if !self.open(idx)? {
            return Ok(0);
        }
        let Some(handle) = self.handles.get_mut(&idx) else {
            return Ok(0);
        };

        match fill(handle, buf) {
            Ok(n) => {
                self.streams[idx].offset += n as u64;
                self.stats.bytes_read += n as u64;
                if n < buf.len() {
                    // End of file: nothing left to resume.
                    self.close(idx);
                }
                Ok(n)
            }
            Err(e) => {
                self.fail(idx, IoOp::Read, e);
                Ok(0)
            }
        }
    }

    /// Release the handle for `idx` for good. Idempotent.
    pub fn close(&mut self, idx: usize) {
        self.handles.pop(&idx);
        self.streams[idx].status = StreamStatus::Finished;
    }

    /// Release every open handle.
    pub fn close_all(&mut self) {
        while let Some((idx, _handle)) = self.handles.pop_lru() {
            self.streams[idx].status = StreamStatus::Finished;
        }
    }

    /// Open the file for `idx`, evicting as needed.
    fn acquire(&mut self, idx: usize) -> Result<Option<O::Handle>, ComparisonError> {
        while self.handles.len() >= self.limit {
            if !self.evict_one() {
                break;
            }
        }

        let path = self.streams[idx].path;
        loop {
            match self.opener.open(path) {
                Ok(handle) => return Ok(Some(handle)),
                Err(e) if is_descriptor_exhaustion(&e) => {
                    if !self.evict_one() {
                        return Err(ComparisonError::ResourceExhaustion {
                            path: path.to_path_buf(),
                            source: Arc::new(e),
                        });
                    }
                    log::debug!(
                        "Out of descriptors opening {}, closed one pooled handle",
                        path.display()
                    );
                }
                Err(e) => {
                    self.fail(idx, IoOp::Open, e);
                    return Ok(None);
                }
            }
        }
    }

    /// Close the least recently used handle. Returns false if none was open.
    fn evict_one(&mut self) -> bool {
        match self.handles.pop_lru() {
            Some((victim, _handle)) => {
                self.stats.evictions += 1;
                log::trace!(
                    "Evicted {} at offset {}",
                    self.streams[victim].path.display(),
                    self.streams[victim].offset
                );
                true
            }
            None => false,
        }
    }

    /// Record a sticky failure and drop the handle.
    fn fail(&mut self, idx: usize, op: IoOp, err: io::Error) {
        self.handles.pop(&idx);
        let stream = &mut self.streams[idx];
        stream.status = StreamStatus::Finished;
        if stream.failure.is_none() {
            let failure = CandidateFailure::new(idx, stream.path, op, err);
            log::warn!("{failure}");
            stream.failure = Some(failure);
        }
    }
}

/// Read until `buf` is full or the reader reports end of file.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
