//! Command-line interface definitions for dupecmp.
//!
//! This module defines all CLI arguments using the clap derive API. Options
//! that also exist in the configuration file are optional here, so that an
//! absent flag leaves the configured value alone.
//!
//! # Example
//!
//! ```bash
//! # Find duplicates below two directories
//! dupecmp ~/Downloads ~/Pictures
//!
//! # Tight limits: 4 KiB of buffers and 4 open files per size group
//! dupecmp -b 4KiB -o 4 ~/Downloads
//!
//! # JSON report, including empty files
//! dupecmp --output json -m 0 ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::compare::MIN_BUFFER_PER_FILE;

/// Find files with identical content.
///
/// Files are grouped by size, then compared byte by byte in bounded memory
/// while keeping a bounded number of files open.
#[derive(Debug, Parser)]
#[command(name = "dupecmp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to search for duplicates
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directories: Vec<PathBuf>,

    /// Only process files within the same file system as each directory
    #[arg(short = 'f', long)]
    pub same_fs: bool,

    /// Follow symbolic links when processing files
    #[arg(short = 's', long)]
    pub follow_symlinks: bool,

    /// Total comparison buffer per size group (default 8192, min 128)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(short = 'b', long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub max_buffer: Option<usize>,

    /// Maximum number of open files per size group (default 16)
    #[arg(
        short = 'o',
        long,
        visible_alias = "max-of",
        value_name = "COUNT",
        value_parser = parse_count
    )]
    pub max_open_files: Option<usize>,

    /// Only check files with a size greater than or equal to SIZE (default 1)
    ///
    /// With 0, empty files are reported as one duplicate set.
    #[arg(
        short = 'm',
        long,
        visible_alias = "min-file-size",
        value_name = "SIZE",
        value_parser = parse_size
    )]
    pub min_size: Option<u64>,

    /// Number of size groups compared concurrently (default 1)
    ///
    /// Each concurrent comparison gets its own open file limit.
    #[arg(long, value_name = "N", value_parser = parse_count)]
    pub io_threads: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One path per line, a blank line before each duplicate set
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupecmp::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a total buffer size; at least one per-file minimum.
///
/// # Errors
///
/// Returns an error for unparsable sizes and sizes below 128 bytes.
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    let bytes = usize::try_from(bytes).map_err(|_| format!("Buffer size too large: {bytes}"))?;
    if bytes < MIN_BUFFER_PER_FILE {
        return Err(format!(
            "Buffer size must be at least {MIN_BUFFER_PER_FILE} bytes"
        ));
    }
    Ok(bytes)
}

/// Parse a positive count.
///
/// # Errors
///
/// Returns an error for non-numbers and zero.
pub fn parse_count(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid count: '{s}'"))?;
    if n == 0 {
        return Err("Count must be at least 1".to_string());
    }
    Ok(n)
}
