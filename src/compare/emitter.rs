//! Delivery of finalized clusters to callers.
//!
//! # Overview
//!
//! A session hands every finalized cluster to a [`ClusterSink`] as a
//! [`DuplicateSet`] holding its own copies of the member paths. Two sinks
//! cover the two delivery modes:
//!
//! - any `FnMut(&DuplicateSet)` closure, invoked once per cluster as soon as
//!   it is known (streaming)
//! - [`BatchCollector`], which accumulates copies for a single result value
//!   (batch)
//!
//! All copies are made with fallible allocation. If one fails, the clusters
//! delivered or collected before it stay intact and the session stops with
//! [`ComparisonError::OutOfMemory`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ComparisonError;

/// A set of byte-identical files found by one comparison session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    /// Member paths, in the order the caller supplied them
    pub paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Build a set by copying `count` paths.
    ///
    /// # Errors
    ///
    /// [`ComparisonError::OutOfMemory`] if any copy cannot be allocated.
    pub fn try_from_paths<'p>(
        paths: impl IntoIterator<Item = &'p Path>,
        count: usize,
    ) -> Result<Self, ComparisonError> {
        let mut copied = Vec::new();
        copied
            .try_reserve_exact(count)
            .map_err(|e| ComparisonError::out_of_memory("duplicate set", e))?;
        for path in paths {
            copied.push(try_clone_path(path)?);
        }
        Ok(Self { paths: copied })
    }

    /// Number of files in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Number of files in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Check if `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Copy this set with fallible allocation.
    pub fn try_clone(&self) -> Result<Self, ComparisonError> {
        Self::try_from_paths(self.paths.iter().map(PathBuf::as_path), self.paths.len())
    }
}

/// Copy a path, reporting allocation failure instead of aborting.
fn try_clone_path(path: &Path) -> Result<PathBuf, ComparisonError> {
    let mut copy = OsString::new();
    copy.try_reserve_exact(path.as_os_str().len())
        .map_err(|e| ComparisonError::out_of_memory("path copy", e))?;
    copy.push(path.as_os_str());
    Ok(PathBuf::from(copy))
}

/// Receives finalized clusters from a comparison session.
///
/// The set passed to [`accept`](ClusterSink::accept) is only borrowed for
/// the duration of the call; copy it to keep it. Returning an error stops
/// the session from emitting further clusters and the error is returned to
/// the session's caller.
pub trait ClusterSink {
    /// Handle one finalized cluster.
    fn accept(&mut self, set: &DuplicateSet) -> Result<(), ComparisonError>;
}

impl<F> ClusterSink for F
where
    F: FnMut(&DuplicateSet),
{
    fn accept(&mut self, set: &DuplicateSet) -> Result<(), ComparisonError> {
        self(set);
        Ok(())
    }
}

/// Sink that keeps a copy of every cluster it receives.
///
/// On an allocation failure the clusters collected so far are kept and
/// remain available through [`clusters`](Self::clusters).
/// [`compare_batch`](super::compare_batch) hands them back in
/// [`BatchError::partial`](super::BatchError::partial).
#[derive(Debug, Default)]
pub struct BatchCollector {
    clusters: Vec<DuplicateSet>,
}

impl BatchCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clusters collected so far.
    #[must_use]
    pub fn clusters(&self) -> &[DuplicateSet] {
        &self.clusters
    }

    /// Take the collected clusters.
    #[must_use]
    pub fn into_clusters(self) -> Vec<DuplicateSet> {
        self.clusters
    }
}

impl From<BatchCollector> for Vec<DuplicateSet> {
    fn from(collector: BatchCollector) -> Self {
        collector.clusters
    }
}

impl ClusterSink for BatchCollector {
    fn accept(&mut self, set: &DuplicateSet) -> Result<(), ComparisonError> {
        self.clusters
            .try_reserve(1)
            .map_err(|e| ComparisonError::out_of_memory("duplicate set list", e))?;
        let copy = set.try_clone()?;
        self.clusters.push(copy);
        Ok(())
    }
}
