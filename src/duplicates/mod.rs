//! Duplicate detection module.
//!
//! This module provides:
//! - Size-based file grouping
//! - The scan pipeline feeding size groups to the comparison engine
//! - Duplicate group management

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, SizeGroup};
