//! Output formatters for duplicate scan results.
//!
//! - [`text`]: the default, streamed while the scan runs
//! - [`json`]: for automation and scripting
//! - [`csv`]: for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::duplicates::DuplicateFinder;
//! use dupecmp::error::ExitCode;
//! use dupecmp::output::JsonOutput;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(&["."]).unwrap();
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::from_summary(&summary));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::{write_summary, TextOutput};
