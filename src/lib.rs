//! dupecmp - duplicate file finder with bounded-resource content comparison
//!
//! Files are grouped by size, then every size group is compared byte by
//! byte with [`compare::ComparisonSession`]: all candidates are read in
//! lockstep, chunk by chunk, and split into equality clusters as soon as
//! their content diverges. Memory is bounded by a configurable buffer budget
//! and open file descriptors by a configurable limit, independently of how
//! many files a group holds.
//!
//! The [`compare`] module is usable on its own:
//!
//! ```no_run
//! use dupecmp::compare::{compare_batch, CompareConfig};
//!
//! let report = compare_batch(&["a.bin", "b.bin", "c.bin"], &CompareConfig::default())?;
//! for cluster in &report.clusters {
//!     println!("{:?}", cluster.paths);
//! }
//! # Ok::<(), dupecmp::compare::ComparisonError>(())
//! ```

pub mod cli;
pub mod compare;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::output::{write_summary, CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::signal::ShutdownHandler;

/// Run the `dupecmp` command line application.
///
/// # Errors
///
/// Returns an error when the configuration is invalid, a root cannot be
/// scanned, a comparison fails as a whole, the walk is interrupted, or the
/// results cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stderr().is_terminal() {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut finder_config = config.finder_config().with_shutdown_flag(handler.get_flag());
    if !cli.quiet && !cli.no_progress && io::stderr().is_terminal() {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let finder = DuplicateFinder::new(finder_config);

    let summary = match config.output {
        OutputFormat::Text => run_text(&finder, &cli, &handler)?,
        OutputFormat::Json => {
            let (groups, summary) = finder.find_duplicates(&cli.directories)?;
            let output = JsonOutput::new(&groups, &summary, ExitCode::from_summary(&summary));
            output
                .write_to(&mut io::stdout().lock(), true)
                .context("Failed to write JSON output")?;
            summary
        }
        OutputFormat::Csv => {
            let (groups, summary) = finder.find_duplicates(&cli.directories)?;
            CsvOutput::new(&groups)
                .write_to(io::stdout().lock())
                .context("Failed to write CSV output")?;
            summary
        }
    };

    Ok(ExitCode::from_summary(&summary))
}

/// Print duplicate sets as their size groups finish, then the summary.
fn run_text(
    finder: &DuplicateFinder,
    cli: &Cli,
    handler: &ShutdownHandler,
) -> anyhow::Result<ScanSummary> {
    let mut output = TextOutput::new(io::stdout().lock());
    let mut write_error: Option<io::Error> = None;

    let summary = finder.for_each_group(&cli.directories, |group: DuplicateGroup| {
        if write_error.is_some() {
            return;
        }
        if let Err(e) = output.write_group(&group) {
            // stdout is gone (e.g. a closed pipe); stop before the next group
            handler.request_shutdown();
            write_error = Some(e);
        }
    })?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write results");
    }
    output.finish().context("Failed to write results")?;

    if !cli.quiet {
        let mut stderr = io::stderr().lock();
        write_summary(&mut stderr, &summary)?;
        stderr.flush()?;
    }
    Ok(summary)
}
