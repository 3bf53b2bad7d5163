//! Union-find over candidate indices.
//!
//! # Overview
//!
//! The [`EquivalenceForest`] records which candidates of a comparison session
//! are currently known to hold equal content. Every index starts out either
//! *unassigned* (a singleton that has not been compared in the current round)
//! or linked to a parent. Two indices are currently equal iff [`find`] returns
//! the same root for both.
//!
//! An unassigned index is its own root, so two unassigned indices are never
//! reported equal by accident.
//!
//! [`find`]: EquivalenceForest::find

use super::ComparisonError;

/// Parent slot of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    /// Not yet compared against anything in the current round.
    Unassigned,
    /// Linked to a parent (a root links to itself).
    Link(usize),
}

/// Union-find structure tracking merge/split decisions between candidates.
#[derive(Debug, Clone)]
pub struct EquivalenceForest {
    parent: Vec<Parent>,
}

impl EquivalenceForest {
    /// Create a forest of `len` unassigned singletons.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::OutOfMemory`] if the parent array cannot be
    /// allocated.
    pub fn new(len: usize) -> Result<Self, ComparisonError> {
        let mut parent = Vec::new();
        parent
            .try_reserve_exact(len)
            .map_err(|e| ComparisonError::out_of_memory("equivalence forest", e))?;
        parent.resize(len, Parent::Unassigned);
        Ok(Self { parent })
    }

    /// Create a forest in which all `len` indices already share one root.
    ///
    /// This is the starting state of a session: before anything is read,
    /// every same-size candidate is a potential duplicate of every other.
    pub fn merged(len: usize) -> Result<Self, ComparisonError> {
        let mut forest = Self::new(len)?;
        for idx in 1..len {
            forest.union(0, idx);
        }
        Ok(forest)
    }

    /// Number of indices tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if the forest tracks no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Whether `idx` is still unassigned in the current round.
    #[must_use]
    pub fn is_unassigned(&self, idx: usize) -> bool {
        self.parent[idx] == Parent::Unassigned
    }

    /// Find the root of `idx`, compressing the path on the way.
    pub fn find(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while let Parent::Link(next) = self.parent[root] {
            if next == root {
                break;
            }
            root = next;
        }

        // Point every node on the walked path straight at the root.
        let mut cur = idx;
        while let Parent::Link(next) = self.parent[cur] {
            if next == root {
                break;
            }
            self.parent[cur] = Parent::Link(root);
            cur = next;
        }
        root
    }

    /// Whether `a` and `b` currently share a root.
    pub fn same(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Merge the sets of `a` and `b`.
    ///
    /// - both unassigned: `a` becomes the root of a new two-member set
    /// - one unassigned: it joins the other's set
    /// - both rooted: the root of `b` is linked under the root of `a`
    pub fn union(&mut self, a: usize, b: usize) {
        match (self.parent[a], self.parent[b]) {
            (Parent::Unassigned, Parent::Unassigned) => {
                self.parent[a] = Parent::Link(a);
                if a != b {
                    self.parent[b] = Parent::Link(a);
                }
            }
            (Parent::Unassigned, Parent::Link(_)) => {
                let root = self.find(b);
                self.parent[a] = Parent::Link(root);
            }
            (Parent::Link(_), Parent::Unassigned) => {
                let root = self.find(a);
                self.parent[b] = Parent::Link(root);
            }
            (Parent::Link(_), Parent::Link(_)) => {
                let root_a = self.find(a);
                let root_b = self.find(b);
                if root_a != root_b {
                    self.parent[root_b] = Parent::Link(root_a);
                }
            }
        }
    }

    /// Record that `a` and `b` were observed to differ.
    ///
    /// Unassigned indices are promoted to their own root. Sets already merged
    /// in this round are left alone.
    pub fn mark_different(&mut self, a: usize, b: usize) {
        if self.parent[a] == Parent::Unassigned {
            self.parent[a] = Parent::Link(a);
        }
        if self.parent[b] == Parent::Unassigned {
            self.parent[b] = Parent::Link(b);
        }
    }

    /// Reset the indices listed in `order[start..start + len]` to unassigned.
    pub fn reset_range(&mut self, order: &[usize], start: usize, len: usize) {
        for &idx in &order[start..start + len] {
            self.parent[idx] = Parent::Unassigned;
        }
    }
}
