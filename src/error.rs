//! Process exit codes and machine-readable error reports.

use serde::Serialize;

use crate::compare::ComparisonError;
use crate::duplicates::{FinderError, ScanSummary};

/// Exit codes of the `dupecmp` binary.
///
/// - 0: duplicates found
/// - 1: error
/// - 2: no duplicates found
/// - 3: duplicates may be missing because some files or groups failed
/// - 130: interrupted (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An error stopped the scan.
    GeneralError = 1,
    /// Scan completed without finding duplicates.
    NoDuplicates = 2,
    /// Scan completed, but some candidates or size groups were not compared.
    PartialSuccess = 3,
    /// Scan was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DC000",
            Self::GeneralError => "DC001",
            Self::NoDuplicates => "DC002",
            Self::PartialSuccess => "DC003",
            Self::Interrupted => "DC130",
        }
    }

    /// Exit code for a scan that returned normally.
    ///
    /// Interruption wins over failures, failures win over the duplicate count.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.interrupted {
            Self::Interrupted
        } else if !summary.failed_candidates.is_empty() || summary.skipped_groups > 0 {
            Self::PartialSuccess
        } else if summary.duplicate_groups > 0 {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a scan that ended in an error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code prefix (e.g. "DC001")
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Human-readable message, including causes
    pub message: String,
    /// Comparison failure category, when a comparison caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            kind: comparison_error(err).map(|e| format!("{:?}", e.kind())),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

fn comparison_error(err: &anyhow::Error) -> Option<&ComparisonError> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<ComparisonError>().or_else(|| {
            match cause.downcast_ref::<FinderError>() {
                Some(FinderError::Comparison(e)) => Some(e),
                _ => None,
            }
        })
    })
}
