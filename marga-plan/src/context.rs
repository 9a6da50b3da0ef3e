//! Shared state of an active search.
//!
//! Everything the queue and the planner loop both need lives here: the
//! graph, the heuristic oracle, the sampler, the RGG terms and the running
//! cost bookkeeping. The queue borrows the context mutably during
//! expansion, which is how the lazy per-batch sampling gets triggered by
//! the first neighbour query.

use marga_space::{InformedSampler, NearestNeighbors, SharedSolutionCost, SpaceInformation};

use crate::config::BitStarConfig;
use crate::graph::SearchGraph;
use crate::heuristic::HeuristicOracle;
use crate::objective::{Cost, Objective};
use crate::rgg::RggTerms;
use crate::stats::SearchStats;
use crate::vertex::VertexId;

pub(crate) struct SearchContext<const D: usize, O: Objective<D>> {
    pub si: SpaceInformation<D>,
    pub graph: SearchGraph<D>,
    pub oracle: HeuristicOracle<D, O>,
    pub sampler: InformedSampler<D>,
    pub shared_cost: SharedSolutionCost,
    pub rgg: RggTerms,
    pub params: BitStarConfig,
    pub start_id: VertexId,
    pub goal_id: VertexId,
    /// Best solution cost found so far.
    pub best_cost: Cost,
    /// Solution cost at the time of the last prune.
    pub pruned_cost: Cost,
    /// Admissible bound on any solution; the search is done when it can no
    /// longer beat `best_cost`.
    pub min_cost: Cost,
    /// Cost space sampled so far; a batch samples when this is better than
    /// the current solution cost.
    pub cost_sampled: Cost,
    /// Samples per unit informed measure, kept for just-in-time sampling
    /// extensions.
    pub sample_density: f64,
    pub has_solution: bool,
    pub stats: SearchStats,
    /// Every (source, target) pair actually motion-checked, recorded for
    /// the duplicate-check assertions in the test suite.
    #[cfg(test)]
    pub checked_edges: Vec<(VertexId, VertexId)>,
}

impl<const D: usize, O: Objective<D>> SearchContext<D, O> {
    pub fn new(
        si: SpaceInformation<D>,
        objective: O,
        start: [f64; D],
        goal: [f64; D],
        params: BitStarConfig,
        indices: Option<(Box<dyn NearestNeighbors<D>>, Box<dyn NearestNeighbors<D>>)>,
    ) -> Self {
        let shared_cost = SharedSolutionCost::infinite();
        let seed = params
            .rng_seed
            .unwrap_or_else(marga_space::sampler::entropy_seed);
        let sampler = InformedSampler::new(*si.space(), start, goal, shared_cost.clone(), seed);

        let mut graph = match indices {
            Some((tree_index, sample_index)) => SearchGraph::with_indices(tree_index, sample_index),
            None => SearchGraph::new(),
        };
        let start_id = graph.create_root(start);
        let goal_id = graph.create_sample(goal);

        let oracle = HeuristicOracle::new(objective, start, goal);
        let best_cost = oracle.objective().infinite_cost();
        let min_cost = oracle.g_hat(&graph, goal_id);
        let rgg = RggTerms::new(D, params.rewire_factor, params.use_k_nearest);

        let mut ctx = Self {
            si,
            graph,
            oracle,
            sampler,
            shared_cost,
            rgg,
            params,
            start_id,
            goal_id,
            best_cost,
            pruned_cost: best_cost,
            min_cost,
            // Suppress sampling until the first batch lowers this to
            // `min_cost`; the start-goal graph is checked on its own first.
            cost_sampled: best_cost,
            sample_density: 0.0,
            has_solution: false,
            stats: SearchStats::default(),
            #[cfg(test)]
            checked_edges: Vec::new(),
        };
        ctx.update_nearest_terms();
        ctx
    }

    pub fn goal_cost(&self) -> Cost {
        self.graph.vertex(self.goal_id).cost()
    }

    /// Free samples near `v`, drawing the batch's samples first if that has
    /// not happened yet.
    pub fn nearest_samples(&mut self, v: VertexId) -> Vec<VertexId> {
        self.update_samples();
        self.stats.nearest_neighbour_calls += 1;
        let state = *self.graph.vertex(v).state();
        if self.rgg.use_k_nearest() {
            self.graph.nearest_samples_k(&state, self.rgg.k())
        } else {
            self.graph.nearest_samples_r(&state, self.rgg.r())
        }
    }

    /// Tree vertices near `v`.
    pub fn nearest_vertices(&mut self, v: VertexId) -> Vec<VertexId> {
        self.stats.nearest_neighbour_calls += 1;
        let state = *self.graph.vertex(v).state();
        if self.rgg.use_k_nearest() {
            self.graph.nearest_tree_k(&state, self.rgg.k())
        } else {
            self.graph.nearest_tree_r(&state, self.rgg.r())
        }
    }

    /// Draw the batch's samples if the sampled cost space lags the current
    /// solution. Eager: the whole batch is drawn at once (just-in-time
    /// sampling of cost shells is a possible extension).
    fn update_samples(&mut self) {
        let obj = self.oracle.objective().clone();
        if !obj.is_cost_better_than(self.cost_sampled, self.best_cost) {
            return;
        }

        self.stats.samples += self.params.samples_per_batch as u64;
        for _ in 0..self.params.samples_per_batch {
            let state = self.sampler.sample_uniform();
            self.stats.state_collision_checks += 1;
            if self.si.is_valid(&state) {
                self.graph.create_sample(state);
            }
        }

        self.cost_sampled = obj.infinite_cost();
        self.update_nearest_terms();
    }

    /// Refresh the RGG radius / neighbour count for the current population.
    pub fn update_nearest_terms(&mut self) {
        let n = self.graph.population();
        self.rgg.update(n, self.sampler.informed_measure());
    }

    /// Relative solution-cost change, infinite if there was no finite cost
    /// before.
    pub fn fractional_change(&self, new_cost: Cost, old_cost: Cost) -> f64 {
        let obj = self.oracle.objective();
        if !obj.is_finite(old_cost) {
            f64::INFINITY
        } else {
            (new_cost.value() - old_cost.value()) / old_cost.value()
        }
    }
}
