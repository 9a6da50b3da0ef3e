//! Nearest-neighbour index abstraction.
//!
//! Planners keep two of these (connected vertices and free samples) and
//! query them with a shrinking connection radius, so the index must support
//! removal as well as insertion. Entries are `(state, id)` pairs; the id is
//! whatever stable identifier the caller uses for its vertices.

use std::collections::HashMap;

use kiddo::{KdTree, SquaredEuclidean};

/// Mutable nearest-neighbour container over `(state, id)` pairs.
pub trait NearestNeighbors<const D: usize> {
    fn add(&mut self, state: [f64; D], id: u64);

    /// Remove an entry. Returns false if it was not present.
    fn remove(&mut self, state: &[f64; D], id: u64) -> bool;

    fn clear(&mut self);

    fn size(&self) -> usize;

    /// All stored ids, in unspecified order.
    fn list(&self) -> Vec<u64>;

    /// Ids within `radius` of `query`, nearest first.
    fn nearest_r(&self, query: &[f64; D], radius: f64) -> Vec<u64>;

    /// The `k` ids nearest to `query`, nearest first.
    fn nearest_k(&self, query: &[f64; D], k: usize) -> Vec<u64>;
}

/// k-d tree index with a side table of stored states.
///
/// The side table makes `list` and id-keyed bookkeeping cheap; the tree
/// answers the metric queries.
pub struct KdTreeIndex<const D: usize> {
    tree: KdTree<f64, D>,
    states: HashMap<u64, [f64; D]>,
}

impl<const D: usize> KdTreeIndex<D> {
    pub fn new() -> Self {
        Self {
            tree: KdTree::new(),
            states: HashMap::new(),
        }
    }
}

impl<const D: usize> Default for KdTreeIndex<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> NearestNeighbors<D> for KdTreeIndex<D> {
    fn add(&mut self, state: [f64; D], id: u64) {
        self.tree.add(&state, id);
        self.states.insert(id, state);
    }

    fn remove(&mut self, state: &[f64; D], id: u64) -> bool {
        if self.states.remove(&id).is_none() {
            return false;
        }
        self.tree.remove(state, id);
        true
    }

    fn clear(&mut self) {
        self.tree = KdTree::new();
        self.states.clear();
    }

    fn size(&self) -> usize {
        self.states.len()
    }

    fn list(&self) -> Vec<u64> {
        self.states.keys().copied().collect()
    }

    fn nearest_r(&self, query: &[f64; D], radius: f64) -> Vec<u64> {
        self.tree
            .within::<SquaredEuclidean>(query, radius * radius)
            .into_iter()
            .map(|n| n.item)
            .collect()
    }

    fn nearest_k(&self, query: &[f64; D], k: usize) -> Vec<u64> {
        self.tree
            .nearest_n::<SquaredEuclidean>(query, k)
            .into_iter()
            .map(|n| n.item)
            .collect()
    }
}
