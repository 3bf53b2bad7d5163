//! Plain text output, streamed as duplicate sets are confirmed.
//!
//! Each set is preceded by a blank line and lists one path per line. After
//! the last set a final blank line separates the report from the summary,
//! which goes to stderr:
//!
//! ```text
//!
//! /photos/a.jpg
//! /backup/a.jpg
//!
//! /music/x.mp3
//! /music/copy of x.mp3
//!
//! ```

use std::io::{self, Write};

use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Streaming text writer for duplicate sets.
#[derive(Debug)]
pub struct TextOutput<W: Write> {
    writer: W,
    groups_written: usize,
}

impl<W: Write> TextOutput<W> {
    /// Create a text writer over `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            groups_written: 0,
        }
    }

    /// Number of sets written so far.
    #[must_use]
    pub fn groups_written(&self) -> usize {
        self.groups_written
    }

    /// Write one duplicate set and flush, so it shows up while the scan
    /// continues.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_group(&mut self, group: &DuplicateGroup) -> io::Result<()> {
        writeln!(self.writer)?;
        for path in &group.files {
            writeln!(self.writer, "{}", path.display())?;
        }
        self.writer.flush()?;
        self.groups_written += 1;
        Ok(())
    }

    /// Write the closing blank line (only if any set was written) and
    /// return the writer.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.groups_written > 0 {
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write the end-of-scan summary.
///
/// Color follows the global `yansi` setting.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_summary<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(
        writer,
        "Total files being processed: {}",
        summary.total_files.bold()
    )?;
    writeln!(
        writer,
        "Total equality clusters: {}",
        summary.duplicate_groups.bold()
    )?;
    if summary.duplicate_groups > 0 {
        writeln!(
            writer,
            "Duplicate files: {} ({} reclaimable)",
            summary.duplicate_files,
            summary.reclaimable_display().green()
        )?;
    }
    if !summary.failed_candidates.is_empty() {
        writeln!(
            writer,
            "{} files could not be compared",
            summary.failed_candidates.len().yellow()
        )?;
    }
    if summary.skipped_groups > 0 {
        writeln!(
            writer,
            "{} size groups skipped: buffer too small for their file count",
            summary.skipped_groups.yellow()
        )?;
    }
    if !summary.scan_errors.is_empty() {
        writeln!(
            writer,
            "{} entries could not be read while walking",
            summary.scan_errors.len().yellow()
        )?;
    }
    if summary.interrupted {
        writeln!(writer, "{}", "Interrupted: results are incomplete".red())?;
    }
    Ok(())
}
