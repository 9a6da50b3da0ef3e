//! Heuristic oracle: every admissible estimate the queue sorts by.
//!
//! Thin layer over the objective that fixes the start and goal states, so
//! the rest of the search can ask for cost-to-come / cost-to-go / edge
//! bounds without carrying the problem definition around. The objective is
//! held by value; there is no dynamic dispatch on these hot paths.

use crate::graph::SearchGraph;
use crate::objective::{Cost, Objective};
use crate::vertex::VertexId;

#[derive(Clone, Debug)]
pub struct HeuristicOracle<const D: usize, O: Objective<D>> {
    objective: O,
    start: [f64; D],
    goal: [f64; D],
}

impl<const D: usize, O: Objective<D>> HeuristicOracle<D, O> {
    pub fn new(objective: O, start: [f64; D], goal: [f64; D]) -> Self {
        Self {
            objective,
            start,
            goal,
        }
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    pub fn start(&self) -> &[f64; D] {
        &self.start
    }

    pub fn goal(&self) -> &[f64; D] {
        &self.goal
    }

    /// Admissible cost-to-come: `g_hat(v)`.
    pub fn g_hat(&self, graph: &SearchGraph<D>, v: VertexId) -> Cost {
        self.objective
            .motion_cost_heuristic(&self.start, graph.vertex(v).state())
    }

    /// Admissible cost-to-go: `h_hat(v)`.
    pub fn h_hat(&self, graph: &SearchGraph<D>, v: VertexId) -> Cost {
        self.objective
            .motion_cost_heuristic(graph.vertex(v).state(), &self.goal)
    }

    /// Admissible edge cost: `c_hat(u, v)`.
    pub fn c_hat(&self, graph: &SearchGraph<D>, u: VertexId, v: VertexId) -> Cost {
        self.objective
            .motion_cost_heuristic(graph.vertex(u).state(), graph.vertex(v).state())
    }

    /// Admissible solution cost through `v`: `f_hat(v) = g_hat ⊕ h_hat`.
    pub fn f_hat(&self, graph: &SearchGraph<D>, v: VertexId) -> Cost {
        self.objective
            .combine(self.g_hat(graph, v), self.h_hat(graph, v))
    }

    /// Admissible solution cost through the edge `(u, v)`:
    /// `g_hat(u) ⊕ c_hat(u,v) ⊕ h_hat(v)`.
    pub fn lower_bound_edge(&self, graph: &SearchGraph<D>, u: VertexId, v: VertexId) -> Cost {
        self.objective.combine3(
            self.g_hat(graph, u),
            self.c_hat(graph, u, v),
            self.h_hat(graph, v),
        )
    }

    /// Vertex-queue sort value: `g_t(v) ⊕ h_hat(v)`.
    pub fn current_vertex_value(&self, graph: &SearchGraph<D>, v: VertexId) -> Cost {
        self.objective
            .combine(graph.vertex(v).cost(), self.h_hat(graph, v))
    }

    /// Tree cost at the target reached through the edge:
    /// `g_t(u) ⊕ c_hat(u,v)`.
    pub fn current_edge_target_value(
        &self,
        graph: &SearchGraph<D>,
        u: VertexId,
        v: VertexId,
    ) -> Cost {
        self.objective
            .combine(graph.vertex(u).cost(), self.c_hat(graph, u, v))
    }

    /// Edge-queue sort key: solution estimate through the edge, then the
    /// tree cost at the target as tie-breaker.
    pub fn edge_sort_key(&self, graph: &SearchGraph<D>, u: VertexId, v: VertexId) -> (Cost, Cost) {
        let through = self.current_edge_target_value(graph, u, v);
        (
            self.objective.combine(through, self.h_hat(graph, v)),
            through,
        )
    }

    /// True (not heuristic) cost of the edge.
    pub fn true_edge_cost(&self, graph: &SearchGraph<D>, u: VertexId, v: VertexId) -> Cost {
        self.objective
            .motion_cost(graph.vertex(u).state(), graph.vertex(v).state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::PathLengthObjective;
    use approx::assert_relative_eq;

    fn oracle_and_graph() -> (
        HeuristicOracle<2, PathLengthObjective>,
        SearchGraph<2>,
        VertexId,
        VertexId,
    ) {
        let mut graph = SearchGraph::new();
        let root = graph.create_root([0.0, 0.0]);
        let v = graph.create_sample([0.5, 0.0]);
        let oracle = HeuristicOracle::new(PathLengthObjective::new(), [0.0, 0.0], [1.0, 0.0]);
        (oracle, graph, root, v)
    }

    #[test]
    fn test_vertex_heuristics() {
        let (oracle, graph, _root, v) = oracle_and_graph();
        assert_relative_eq!(oracle.g_hat(&graph, v).value(), 0.5);
        assert_relative_eq!(oracle.h_hat(&graph, v).value(), 0.5);
        assert_relative_eq!(oracle.f_hat(&graph, v).value(), 1.0);
    }

    #[test]
    fn test_edge_heuristics() {
        let (oracle, graph, root, v) = oracle_and_graph();
        assert_relative_eq!(oracle.c_hat(&graph, root, v).value(), 0.5);
        assert_relative_eq!(oracle.lower_bound_edge(&graph, root, v).value(), 1.0);
        assert_relative_eq!(oracle.true_edge_cost(&graph, root, v).value(), 0.5);
    }

    #[test]
    fn test_sort_key_tracks_tree_cost() {
        let (oracle, mut graph, root, v) = oracle_and_graph();
        // Disconnected target: key is driven by the source's tree cost.
        let (f, g) = oracle.edge_sort_key(&graph, root, v);
        assert_relative_eq!(f.value(), 1.0);
        assert_relative_eq!(g.value(), 0.5);

        // An expensive detour at the source shifts both components.
        graph.vertex_mut(root).set_cost(Cost(0.2));
        let (f, g) = oracle.edge_sort_key(&graph, root, v);
        assert_relative_eq!(f.value(), 1.2);
        assert_relative_eq!(g.value(), 0.7);
    }

    #[test]
    fn test_current_vertex_value_infinite_when_disconnected() {
        let (oracle, graph, _root, v) = oracle_and_graph();
        assert!(!oracle.current_vertex_value(&graph, v).is_finite());
    }
}
