//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2026-01-01T12:00:00Z",
//!   "duplicates": [
//!     { "size": 1024, "files": ["/path/to/file1.txt", "/path/to/file2.txt"] }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "size_groups": 12,
//!     "skipped_groups": 0,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "bytes_compared": 204800,
//!     "failed_candidates": [],
//!     "scan_errors": 0,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "DC000"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::compare::{CandidateFailure, IoOp};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A duplicate set in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Absolute paths where they can be resolved
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a confirmed duplicate group.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            size: group.size,
            files: group.files.iter().map(|p| normalize_path(p)).collect(),
        }
    }
}

/// A candidate that could not be compared.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Path of the candidate
    pub path: String,
    /// Operation that failed
    pub op: IoOp,
    /// Error message from the operating system
    pub error: String,
}

impl From<&CandidateFailure> for JsonFailure {
    fn from(failure: &CandidateFailure) -> Self {
        Self {
            path: failure.path.to_string_lossy().into_owned(),
            op: failure.op,
            error: failure.source.to_string(),
        }
    }
}

/// Scan statistics in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files collected by the walk
    pub total_files: usize,
    /// Total size of collected files in bytes
    pub total_size: u64,
    /// Size groups sent to comparison
    pub size_groups: usize,
    /// Size groups skipped because the buffer budget cannot serve them
    pub skipped_groups: usize,
    /// Confirmed duplicate sets
    pub duplicate_groups: usize,
    /// Duplicate files, excluding one original per set
    pub duplicate_files: usize,
    /// Bytes reclaimable by removing duplicates
    pub reclaimable_space: u64,
    /// Bytes read while comparing
    pub bytes_compared: u64,
    /// Candidates excluded by I/O failures
    pub failed_candidates: Vec<JsonFailure>,
    /// Number of walk errors
    pub scan_errors: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Numeric exit code
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g. "DC000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Convert scan statistics.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            size_groups: summary.size_groups,
            skipped_groups: summary.skipped_groups,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            bytes_compared: summary.bytes_compared,
            failed_candidates: summary.failed_candidates.iter().map(JsonFailure::from).collect(),
            scan_errors: summary.scan_errors.len(),
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Time the report was produced
    pub generated_at: DateTime<Utc>,
    /// Duplicate sets, largest file size first
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build a report.
    ///
    /// ```
    /// use dupecmp::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupecmp::error::ExitCode;
    /// use dupecmp::output::json::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     1024,
    ///     vec![PathBuf::from("/file1.txt"), PathBuf::from("/file2.txt")],
    /// )];
    /// let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now(),
            duplicates: groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Canonicalize where possible, else keep the path as given.
fn normalize_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
