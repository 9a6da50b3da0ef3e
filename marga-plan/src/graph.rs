//! The search graph: vertex arena plus the two spatial populations.
//!
//! Every live vertex is in exactly one of two nearest-neighbour indices:
//! the *tree* (connected to the root) or the *sample pool* (free states
//! awaiting a first connection). Edges exist only as parent/child links
//! inside tree vertices; cost-to-come cascades down those links whenever a
//! parent changes.

use std::collections::HashMap;

use marga_space::{KdTreeIndex, NearestNeighbors};

use crate::error::{PlanError, Result};
use crate::objective::{Cost, Objective};
use crate::vertex::{Membership, Vertex, VertexId};

pub struct SearchGraph<const D: usize> {
    vertices: HashMap<VertexId, Vertex<D>>,
    next_id: u64,
    tree_index: Box<dyn NearestNeighbors<D>>,
    sample_index: Box<dyn NearestNeighbors<D>>,
    root: Option<VertexId>,
}

impl<const D: usize> SearchGraph<D> {
    pub fn new() -> Self {
        Self::with_indices(
            Box::new(KdTreeIndex::<D>::new()),
            Box::new(KdTreeIndex::<D>::new()),
        )
    }

    /// Build a graph over caller-supplied index structures.
    pub fn with_indices(
        tree_index: Box<dyn NearestNeighbors<D>>,
        sample_index: Box<dyn NearestNeighbors<D>>,
    ) -> Self {
        Self {
            vertices: HashMap::new(),
            next_id: 0,
            tree_index,
            sample_index,
            root: None,
        }
    }

    fn allocate_id(&mut self) -> VertexId {
        let id = VertexId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create the root vertex. There is exactly one per graph.
    pub fn create_root(&mut self, state: [f64; D]) -> VertexId {
        debug_assert!(self.root.is_none(), "root already designated");
        let id = self.allocate_id();
        self.vertices.insert(id, Vertex::new_root(id, state));
        self.tree_index.add(state, id.0);
        self.root = Some(id);
        id
    }

    /// Create a free sample in the pool.
    pub fn create_sample(&mut self, state: [f64; D]) -> VertexId {
        let id = self.allocate_id();
        self.vertices.insert(id, Vertex::new_sample(id, state));
        self.sample_index.add(state, id.0);
        id
    }

    pub fn root(&self) -> Option<VertexId> {
        self.root
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Borrow a vertex that is known to be live.
    ///
    /// A missing id means a holder outlived the arena entry, which the
    /// id-allocation and pruning rules rule out; treat it as fatal.
    pub fn vertex(&self, id: VertexId) -> &Vertex<D> {
        self.vertices
            .get(&id)
            .unwrap_or_else(|| panic!("{} is not in the vertex arena", id))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex<D> {
        self.vertices
            .get_mut(&id)
            .unwrap_or_else(|| panic!("{} is not in the vertex arena", id))
    }

    pub fn tree_size(&self) -> usize {
        self.tree_index.size()
    }

    pub fn pool_size(&self) -> usize {
        self.sample_index.size()
    }

    /// Combined population, the `N` of the RGG terms.
    pub fn population(&self) -> usize {
        self.tree_size() + self.pool_size()
    }

    pub fn tree_ids(&self) -> Vec<VertexId> {
        self.tree_index.list().into_iter().map(VertexId).collect()
    }

    pub fn sample_ids(&self) -> Vec<VertexId> {
        self.sample_index.list().into_iter().map(VertexId).collect()
    }

    pub fn nearest_tree_r(&self, query: &[f64; D], radius: f64) -> Vec<VertexId> {
        self.tree_index
            .nearest_r(query, radius)
            .into_iter()
            .map(VertexId)
            .collect()
    }

    pub fn nearest_tree_k(&self, query: &[f64; D], k: usize) -> Vec<VertexId> {
        self.tree_index
            .nearest_k(query, k)
            .into_iter()
            .map(VertexId)
            .collect()
    }

    pub fn nearest_samples_r(&self, query: &[f64; D], radius: f64) -> Vec<VertexId> {
        self.sample_index
            .nearest_r(query, radius)
            .into_iter()
            .map(VertexId)
            .collect()
    }

    pub fn nearest_samples_k(&self, query: &[f64; D], k: usize) -> Vec<VertexId> {
        self.sample_index
            .nearest_k(query, k)
            .into_iter()
            .map(VertexId)
            .collect()
    }

    /// Attach `child` under `parent` with the given true edge cost,
    /// updating the child's cost-to-come and, with `cascade`, every cost in
    /// the child's subtree.
    pub fn set_parent<O: Objective<D>>(
        &mut self,
        child: VertexId,
        parent: VertexId,
        edge_cost: Cost,
        cascade: bool,
        objective: &O,
    ) {
        debug_assert!(
            self.vertex(child).parent().is_none(),
            "set_parent on a vertex that still has a parent"
        );
        debug_assert!(!self.is_ancestor(child, parent), "rewire would form a cycle");
        self.vertex_mut(parent).add_child(child);
        self.vertex_mut(child).set_parent_link(parent, edge_cost);
        let parent_cost = self.vertex(parent).cost();
        self.vertex_mut(child)
            .set_cost(objective.combine(parent_cost, edge_cost));
        if cascade {
            self.cascade_cost_to_descendants(child, objective);
        }
    }

    /// Detach `child` from its parent. With `cascade`, the whole subtree's
    /// costs become infinite.
    pub fn clear_parent<O: Objective<D>>(
        &mut self,
        child: VertexId,
        cascade: bool,
        objective: &O,
    ) {
        if let Some(parent) = self.vertex(child).parent() {
            if self.contains(parent) {
                self.vertex_mut(parent).remove_child(child);
            }
        }
        self.vertex_mut(child).clear_parent_link();
        self.vertex_mut(child).set_cost(objective.infinite_cost());
        if cascade {
            self.cascade_cost_to_descendants(child, objective);
        }
    }

    /// Recompute this vertex's cost from its parent's current cost and the
    /// cached edge cost, then propagate depth-first through the subtree.
    pub fn update_cost_descending<O: Objective<D>>(&mut self, id: VertexId, objective: &O) {
        let cost = match self.vertex(id).parent() {
            Some(parent) => {
                let parent_cost = self.vertex(parent).cost();
                objective.combine(parent_cost, self.vertex(id).edge_cost())
            }
            None if self.vertex(id).is_root() => objective.identity_cost(),
            None => objective.infinite_cost(),
        };
        self.vertex_mut(id).set_cost(cost);
        self.cascade_cost_to_descendants(id, objective);
    }

    fn cascade_cost_to_descendants<O: Objective<D>>(&mut self, id: VertexId, objective: &O) {
        let mut stack: Vec<VertexId> = self.vertex(id).children().to_vec();
        while let Some(v) = stack.pop() {
            let parent = self
                .vertex(v)
                .parent()
                .expect("child link without a parent back-reference");
            let cost = objective.combine(self.vertex(parent).cost(), self.vertex(v).edge_cost());
            self.vertex_mut(v).set_cost(cost);
            stack.extend_from_slice(self.vertex(v).children());
        }
    }

    /// All vertices of the subtree rooted at `id`, `id` first.
    pub fn subtree_ids(&self, id: VertexId) -> Vec<VertexId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(v) = stack.pop() {
            out.push(v);
            stack.extend_from_slice(self.vertex(v).children());
        }
        out
    }

    fn is_ancestor(&self, candidate: VertexId, of: VertexId) -> bool {
        let mut current = Some(of);
        while let Some(v) = current {
            if v == candidate {
                return true;
            }
            current = self.vertex(v).parent();
        }
        false
    }

    /// Move a connected sample into the tree population.
    pub fn promote_to_tree(&mut self, id: VertexId) -> Result<()> {
        if !self.vertex(id).is_connected() {
            return Err(PlanError::Invariant(format!(
                "{} must be connected to the graph before joining the tree",
                id
            )));
        }
        let state = *self.vertex(id).state();
        self.sample_index.remove(&state, id.0);
        self.tree_index.add(state, id.0);
        self.vertex_mut(id).set_membership(Membership::Tree);
        Ok(())
    }

    /// Return a disconnected tree vertex to the sample pool with a clean
    /// slate.
    pub fn recycle_to_pool(&mut self, id: VertexId) {
        let state = *self.vertex(id).state();
        self.tree_index.remove(&state, id.0);
        self.sample_index.add(state, id.0);
        let vertex = self.vertex_mut(id);
        vertex.set_membership(Membership::Pool);
        vertex.clear_parent_link();
        vertex.set_cost(Cost(f64::INFINITY));
        vertex.clear_failure_memory();
        vertex.take_children();
    }

    /// Destroy a free sample.
    pub fn drop_sample(&mut self, id: VertexId) {
        let state = *self.vertex(id).state();
        self.sample_index.remove(&state, id.0);
        self.vertices.remove(&id);
    }

    /// Destroy a vertex that has already been detached from the tree
    /// structure.
    pub fn destroy_tree_vertex(&mut self, id: VertexId) {
        let state = *self.vertex(id).state();
        self.tree_index.remove(&state, id.0);
        self.vertices.remove(&id);
    }

    /// States along the tree path from the root to `id`, root first.
    /// Consecutive duplicate states collapse to one, so a goal coincident
    /// with the start yields a single-state path.
    pub fn path_from_root(&self, id: VertexId) -> Vec<[f64; D]> {
        let mut reverse: Vec<[f64; D]> = Vec::new();
        let mut current = Some(id);
        while let Some(v) = current {
            reverse.push(*self.vertex(v).state());
            current = self.vertex(v).parent();
        }
        reverse.reverse();
        reverse.dedup();
        reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::PathLengthObjective;
    use approx::assert_relative_eq;

    fn chain_graph() -> (SearchGraph<2>, VertexId, VertexId, VertexId) {
        // root -> a -> b along the x axis.
        let obj = PathLengthObjective::new();
        let mut graph = SearchGraph::new();
        let root = graph.create_root([0.0, 0.0]);
        let a = graph.create_sample([0.3, 0.0]);
        let b = graph.create_sample([0.7, 0.0]);
        graph.set_parent(a, root, Cost(0.3), true, &obj);
        graph.promote_to_tree(a).unwrap();
        graph.set_parent(b, a, Cost(0.4), true, &obj);
        graph.promote_to_tree(b).unwrap();
        (graph, root, a, b)
    }

    #[test]
    fn test_costs_accumulate_down_the_chain() {
        let (graph, root, a, b) = chain_graph();
        assert_relative_eq!(graph.vertex(root).cost().value(), 0.0);
        assert_relative_eq!(graph.vertex(a).cost().value(), 0.3);
        assert_relative_eq!(graph.vertex(b).cost().value(), 0.7);
        assert_eq!(graph.tree_size(), 3);
        assert_eq!(graph.pool_size(), 0);
    }

    #[test]
    fn test_rewire_cascades_costs() {
        let obj = PathLengthObjective::new();
        let (mut graph, root, a, b) = chain_graph();
        // Reattach a with a cheaper edge; b's cost must follow.
        graph.clear_parent(a, false, &obj);
        graph.set_parent(a, root, Cost(0.1), true, &obj);
        assert_relative_eq!(graph.vertex(a).cost().value(), 0.1);
        assert_relative_eq!(graph.vertex(b).cost().value(), 0.5);
    }

    #[test]
    fn test_update_cost_descending_uses_cached_edge_costs() {
        let obj = PathLengthObjective::new();
        let (mut graph, _root, a, b) = chain_graph();
        // Falsify a's cost, then let the recomputation repair the chain
        // from the cached edge costs.
        graph.vertex_mut(a).set_cost(Cost(9.0));
        graph.vertex_mut(b).set_cost(Cost(9.9));
        graph.update_cost_descending(a, &obj);
        assert_relative_eq!(graph.vertex(a).cost().value(), 0.3);
        assert_relative_eq!(graph.vertex(b).cost().value(), 0.7);
    }

    #[test]
    fn test_clear_parent_cascades_infinity() {
        let obj = PathLengthObjective::new();
        let (mut graph, _root, a, b) = chain_graph();
        graph.clear_parent(a, true, &obj);
        assert!(!graph.vertex(a).cost().is_finite());
        assert!(!graph.vertex(b).cost().is_finite());
        // Links below the cut stay intact.
        assert_eq!(graph.vertex(b).parent(), Some(a));
    }

    #[test]
    fn test_promote_unconnected_is_invariant_violation() {
        let mut graph: SearchGraph<2> = SearchGraph::new();
        graph.create_root([0.0, 0.0]);
        let free = graph.create_sample([0.5, 0.5]);
        assert!(graph.promote_to_tree(free).is_err());
    }

    #[test]
    fn test_partition_is_maintained() {
        let (mut graph, _root, a, _b) = chain_graph();
        let s = graph.create_sample([0.9, 0.9]);
        assert_eq!(graph.tree_size(), 3);
        assert_eq!(graph.pool_size(), 1);

        let obj = PathLengthObjective::new();
        graph.clear_parent(a, true, &obj);
        graph.recycle_to_pool(a);
        assert_eq!(graph.tree_size(), 2);
        assert_eq!(graph.pool_size(), 2);

        graph.drop_sample(s);
        assert_eq!(graph.pool_size(), 1);
        assert!(!graph.contains(s));
    }

    #[test]
    fn test_subtree_ids() {
        let (graph, root, a, b) = chain_graph();
        let subtree = graph.subtree_ids(root);
        assert_eq!(subtree.len(), 3);
        let from_a = graph.subtree_ids(a);
        assert_eq!(from_a, vec![a, b]);
    }

    #[test]
    fn test_path_from_root() {
        let (graph, _root, _a, b) = chain_graph();
        let path = graph.path_from_root(b);
        assert_eq!(path, vec![[0.0, 0.0], [0.3, 0.0], [0.7, 0.0]]);
    }

    #[test]
    fn test_path_collapses_duplicate_states() {
        let obj = PathLengthObjective::new();
        let mut graph: SearchGraph<2> = SearchGraph::new();
        let root = graph.create_root([0.5, 0.5]);
        let goal = graph.create_sample([0.5, 0.5]);
        graph.set_parent(goal, root, Cost(0.0), true, &obj);
        graph.promote_to_tree(goal).unwrap();
        assert_eq!(graph.path_from_root(goal), vec![[0.5, 0.5]]);
    }
}
