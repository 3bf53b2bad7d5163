//! Error types for comparison sessions.

use std::collections::TryReserveError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// The I/O operation a candidate failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IoOp {
    /// Opening (or reopening) the file.
    Open,
    /// Reading file content.
    Read,
    /// Seeking back to the resume offset after a reopen.
    Seek,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Read => f.write_str("read"),
            Self::Seek => f.write_str("seek"),
        }
    }
}

/// Broad classification of a [`ComparisonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Bad buffer or handle-limit configuration.
    InvalidArgument,
    /// An allocation could not be satisfied.
    OutOfMemory,
    /// Open or read failure on one candidate.
    IoFailure,
    /// The handle pool cannot keep even one file open.
    ResourceExhaustion,
}

/// Errors that can occur while comparing a batch of candidates.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ComparisonError {
    /// The session configuration is unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Memory for session state or results could not be allocated.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// An I/O error on a specific candidate.
    #[error("Cannot {op} file '{path}': {source}")]
    Io {
        /// Candidate path
        path: PathBuf,
        /// Operation that failed
        op: IoOp,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// No file could be opened even after every pooled handle was released.
    #[error("Cannot open '{path}' even with no other files open: {source}")]
    ResourceExhaustion {
        /// Path that could not be opened
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ComparisonError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::ResourceExhaustion { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    /// Whether this error aborts a whole session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::IoFailure
    }

    pub(crate) fn out_of_memory(what: &str, err: TryReserveError) -> Self {
        Self::OutOfMemory(format!("failed to allocate {what}: {err}"))
    }
}

/// A sticky I/O failure attributed to exactly one candidate.
///
/// Once recorded, the candidate is treated as different from every other
/// candidate for the rest of its session.
#[derive(Debug, Clone)]
pub struct CandidateFailure {
    /// Index of the candidate in the session's path list
    pub index: usize,
    /// Candidate path
    pub path: PathBuf,
    /// Operation that failed
    pub op: IoOp,
    /// The underlying I/O error
    pub source: Arc<std::io::Error>,
}

impl CandidateFailure {
    pub(crate) fn new(index: usize, path: &Path, op: IoOp, source: std::io::Error) -> Self {
        Self {
            index,
            path: path.to_path_buf(),
            op,
            source: Arc::new(source),
        }
    }

    /// Convert into the session-level error value for this failure.
    #[must_use]
    pub fn to_error(&self) -> ComparisonError {
        ComparisonError::Io {
            path: self.path.clone(),
            op: self.op,
            source: Arc::clone(&self.source),
        }
    }
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot {} file '{}': {}",
            self.op,
            self.path.display(),
            self.source
        )
    }
}
