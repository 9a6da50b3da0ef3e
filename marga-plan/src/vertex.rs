//! Vertices of the search graph.

use std::collections::{HashMap, HashSet};

use crate::objective::Cost;

/// Stable identifier of a vertex. Monotonically allocated, never reused, so
/// a stale id held by a queue entry or a failure record can never alias a
/// different vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u64);

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which of the two mutually-exclusive populations a vertex belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// Unconnected candidate state awaiting a first connection.
    Pool,
    /// Connected member of the search tree.
    Tree,
}

/// One node of the search graph.
///
/// A vertex is born as a free sample (no parent, infinite cost-to-come),
/// joins the tree when an edge first connects it, and may be demoted back
/// to a sample if pruning disconnects it. Link maintenance and cost
/// cascades are mediated by [`SearchGraph`](crate::graph::SearchGraph) so
/// they can walk the subtree; the vertex itself only stores state.
#[derive(Clone, Debug)]
pub struct Vertex<const D: usize> {
    id: VertexId,
    state: [f64; D],
    membership: Membership,
    is_root: bool,
    parent: Option<VertexId>,
    /// True cost of the edge from the parent; meaningless without one.
    edge_cost: Cost,
    children: Vec<VertexId>,
    /// Cost-to-come through the tree; infinite while disconnected.
    cost: Cost,
    /// Targets proven useless from this vertex (collision or heuristic),
    /// kept only while edge-failure tracking is on.
    failed_children: HashSet<VertexId>,
    /// Motion-check outcomes per target, kept only while edge-failure
    /// tracking is on. States never move, so an outcome holds for the
    /// lifetime of the pair and is never cleared.
    motion_checks: HashMap<VertexId, bool>,
    /// Expansion epoch last seen by the queue; vertices whose mark differs
    /// from the queue's epoch have not been expanded this batch.
    pub(crate) queue_epoch: u64,
}

impl<const D: usize> Vertex<D> {
    pub(crate) fn new_sample(id: VertexId, state: [f64; D]) -> Self {
        Self {
            id,
            state,
            membership: Membership::Pool,
            is_root: false,
            parent: None,
            edge_cost: Cost(f64::INFINITY),
            children: Vec::new(),
            cost: Cost(f64::INFINITY),
            failed_children: HashSet::new(),
            motion_checks: HashMap::new(),
            queue_epoch: 0,
        }
    }

    pub(crate) fn new_root(id: VertexId, state: [f64; D]) -> Self {
        Self {
            id,
            state,
            membership: Membership::Tree,
            is_root: true,
            parent: None,
            edge_cost: Cost(0.0),
            children: Vec::new(),
            cost: Cost(0.0),
            failed_children: HashSet::new(),
            motion_checks: HashMap::new(),
            queue_epoch: 0,
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn state(&self) -> &[f64; D] {
        &self.state
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }

    pub(crate) fn set_membership(&mut self, membership: Membership) {
        self.membership = membership;
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Connected vertices carry a finite tree cost; the root counts.
    pub fn is_connected(&self) -> bool {
        self.is_root || self.parent.is_some()
    }

    pub fn parent(&self) -> Option<VertexId> {
        self.parent
    }

    pub(crate) fn set_parent_link(&mut self, parent: VertexId, edge_cost: Cost) {
        self.parent = Some(parent);
        self.edge_cost = edge_cost;
    }

    pub(crate) fn clear_parent_link(&mut self) {
        self.parent = None;
        self.edge_cost = Cost(f64::INFINITY);
    }

    /// Cached true cost of the edge from the parent.
    pub fn edge_cost(&self) -> Cost {
        self.edge_cost
    }

    pub fn children(&self) -> &[VertexId] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: VertexId) {
        debug_assert!(!self.children.contains(&child));
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: VertexId) {
        self.children.retain(|&c| c != child);
    }

    pub(crate) fn take_children(&mut self) -> Vec<VertexId> {
        std::mem::take(&mut self.children)
    }

    /// Current cost-to-come (infinite while disconnected).
    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub(crate) fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    /// Record that the edge to `target` was proven useless.
    pub(crate) fn mark_failed_child(&mut self, target: VertexId) {
        self.failed_children.insert(target);
    }

    pub fn has_failed_child(&self, target: VertexId) -> bool {
        self.failed_children.contains(&target)
    }

    /// Forget recorded failures. Called when this vertex is rewired (its
    /// cost changed, so heuristic failures are stale) or recycled into the
    /// sample pool. Motion-check outcomes survive: they depend only on the
    /// states, not on costs.
    pub(crate) fn clear_failure_memory(&mut self) {
        self.failed_children.clear();
    }

    /// Outcome of a previous motion check to `target`, if one was made.
    pub fn recorded_motion_check(&self, target: VertexId) -> Option<bool> {
        self.motion_checks.get(&target).copied()
    }

    pub(crate) fn record_motion_check(&mut self, target: VertexId, valid: bool) {
        self.motion_checks.insert(target, valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_starts_disconnected() {
        let v: Vertex<2> = Vertex::new_sample(VertexId(3), [0.1, 0.2]);
        assert_eq!(v.membership(), Membership::Pool);
        assert!(!v.is_connected());
        assert!(!v.cost().is_finite());
        assert!(v.children().is_empty());
    }

    #[test]
    fn test_root_is_connected_at_zero_cost() {
        let v: Vertex<2> = Vertex::new_root(VertexId(0), [0.0, 0.0]);
        assert!(v.is_root());
        assert!(v.is_connected());
        assert!(!v.has_parent());
        assert_eq!(v.cost().value(), 0.0);
    }

    #[test]
    fn test_child_links() {
        let mut v: Vertex<2> = Vertex::new_root(VertexId(0), [0.0, 0.0]);
        v.add_child(VertexId(1));
        v.add_child(VertexId(2));
        assert_eq!(v.children(), &[VertexId(1), VertexId(2)]);
        v.remove_child(VertexId(1));
        assert_eq!(v.children(), &[VertexId(2)]);
    }

    #[test]
    fn test_failure_memory() {
        let mut v: Vertex<2> = Vertex::new_sample(VertexId(1), [0.5, 0.5]);
        assert!(!v.has_failed_child(VertexId(9)));
        v.mark_failed_child(VertexId(9));
        assert!(v.has_failed_child(VertexId(9)));
        v.clear_failure_memory();
        assert!(!v.has_failed_child(VertexId(9)));
    }

    #[test]
    fn test_motion_check_memory_survives_failure_clearing() {
        let mut v: Vertex<2> = Vertex::new_sample(VertexId(1), [0.5, 0.5]);
        assert_eq!(v.recorded_motion_check(VertexId(4)), None);
        v.record_motion_check(VertexId(4), false);
        v.record_motion_check(VertexId(5), true);
        v.clear_failure_memory();
        assert_eq!(v.recorded_motion_check(VertexId(4)), Some(false));
        assert_eq!(v.recorded_motion_check(VertexId(5)), Some(true));
    }
}
