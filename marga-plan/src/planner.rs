//! The batched anytime planner.
//!
//! Grows a tree of collision-free motions from the start towards the goal
//! over an implicit random geometric graph. Work proceeds in batches: draw
//! a set of informed samples, then process candidate edges strictly in
//! order of their potential solution quality until none can improve the
//! current solution, then prune, shrink the connection radius and start the
//! next batch. The result is an anytime, almost-surely asymptotically
//! optimal search that tightens its own sampling region as solutions
//! improve.
//!
//! ```no_run
//! use marga_plan::config::BitStarConfig;
//! use marga_plan::objective::PathLengthObjective;
//! use marga_plan::planner::{BitStar, ProblemDefinition};
//! use marga_plan::termination::TerminationCondition;
//! use marga_space::{AlwaysValid, Bounds, RealVectorSpace, SpaceInformation};
//!
//! let si = SpaceInformation::new(
//!     RealVectorSpace::new(Bounds::unit()),
//!     Box::new(AlwaysValid),
//! );
//! let mut planner =
//!     BitStar::<2>::new(si, PathLengthObjective::new(), BitStarConfig::default()).unwrap();
//! planner
//!     .setup(&ProblemDefinition::single([0.1, 0.1], [0.9, 0.9]))
//!     .unwrap();
//! let result = planner
//!     .solve(TerminationCondition::after_iterations(2000))
//!     .unwrap();
//! if result.solution_found {
//!     println!("cost {:?}", planner.best_cost());
//! }
//! ```

use tracing::{debug, info, warn};

use marga_space::{NearestNeighbors, SpaceInformation};

use crate::config::BitStarConfig;
use crate::context::SearchContext;
use crate::error::{PlanError, Result};
use crate::objective::{Cost, Objective, PathLengthObjective};
use crate::queue::SearchQueue;
use crate::stats::{Progress, SearchStats};
use crate::termination::TerminationCondition;
use crate::vertex::VertexId;

/// Start state(s) and goal state of a query.
///
/// The planner requires exactly one start; the collection shape exists so
/// that over-specified problems fail loudly at setup instead of silently
/// planning from an arbitrary start.
#[derive(Clone, Debug)]
pub struct ProblemDefinition<const D: usize> {
    starts: Vec<[f64; D]>,
    goal: [f64; D],
}

impl<const D: usize> ProblemDefinition<D> {
    pub fn new(goal: [f64; D]) -> Self {
        Self {
            starts: Vec::new(),
            goal,
        }
    }

    /// The common case: one start, one goal.
    pub fn single(start: [f64; D], goal: [f64; D]) -> Self {
        Self {
            starts: vec![start],
            goal,
        }
    }

    pub fn add_start(&mut self, start: [f64; D]) {
        self.starts.push(start);
    }

    pub fn starts(&self) -> &[[f64; D]] {
        &self.starts
    }

    pub fn goal(&self) -> &[f64; D] {
        &self.goal
    }
}

/// Outcome of a solve call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveResult {
    pub solution_found: bool,
    /// Reserved; the planner does not report approximate solutions.
    pub approximate: bool,
}

/// One vertex of an exported graph snapshot.
#[derive(Clone, Copy, Debug)]
pub struct PlannerDataVertex<const D: usize> {
    pub state: [f64; D],
    /// State of the tree parent; `None` for the root.
    pub parent: Option<[f64; D]>,
    pub is_root: bool,
}

/// Snapshot of the search graph for visualisation and debugging.
#[derive(Clone, Debug)]
pub struct PlannerData<const D: usize> {
    /// Free samples awaiting connection.
    pub samples: Vec<[f64; D]>,
    /// Tree vertices with their incoming edge.
    pub vertices: Vec<PlannerDataVertex<D>>,
    /// The goal state, if a solution reaches it.
    pub goal: Option<[f64; D]>,
}

struct ActiveSearch<const D: usize, O: Objective<D>> {
    ctx: SearchContext<D, O>,
    queue: SearchQueue<D>,
}

/// Batch Informed Trees planner over a `D`-dimensional real-vector space.
pub struct BitStar<const D: usize, O: Objective<D> = PathLengthObjective> {
    config: BitStarConfig,
    objective: O,
    /// Present while no search is set up; moves into the search context at
    /// setup and back on clear.
    si: Option<SpaceInformation<D>>,
    /// Caller-supplied index structures, consumed by the next setup.
    custom_indices: Option<(Box<dyn NearestNeighbors<D>>, Box<dyn NearestNeighbors<D>>)>,
    search: Option<ActiveSearch<D, O>>,
}

impl<const D: usize, O: Objective<D>> BitStar<D, O> {
    /// Create a planner. Fails on out-of-range configuration.
    pub fn new(si: SpaceInformation<D>, objective: O, config: BitStarConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            objective,
            si: Some(si),
            custom_indices: None,
            search: None,
        })
    }

    /// Replace the nearest-neighbour index structures used by the next
    /// setup. Fails once a search is set up: the indices hold live data at
    /// that point and cannot be swapped.
    pub fn set_nearest_neighbors(
        &mut self,
        tree_index: Box<dyn NearestNeighbors<D>>,
        sample_index: Box<dyn NearestNeighbors<D>>,
    ) -> Result<()> {
        if self.search.is_some() {
            return Err(PlanError::Config(
                "the nearest-neighbour structure cannot be changed once the planner is set up"
                    .to_string(),
            ));
        }
        self.custom_indices = Some((tree_index, sample_index));
        Ok(())
    }

    /// Bind the planner to a query. Clears any previous search.
    pub fn setup(&mut self, problem: &ProblemDefinition<D>) -> Result<()> {
        self.clear();
        self.config.validate()?;

        if problem.starts().len() != 1 {
            return Err(PlanError::Config(format!(
                "expected exactly 1 start state, got {}",
                problem.starts().len()
            )));
        }
        let start = problem.starts()[0];
        let goal = *problem.goal();

        let si = self
            .si
            .take()
            .ok_or_else(|| PlanError::Invariant("space information missing".to_string()))?;

        if !si.is_valid(&start) {
            self.si = Some(si);
            return Err(PlanError::Config("start state is invalid".to_string()));
        }
        if !si.is_valid(&goal) {
            warn!("goal state is invalid; the search cannot succeed");
        }

        let ctx = SearchContext::new(
            si,
            self.objective.clone(),
            start,
            goal,
            self.config.clone(),
            self.custom_indices.take(),
        );
        let mut queue = SearchQueue::new(self.config.use_edge_failure_tracking);
        queue.insert_vertex(&ctx, ctx.start_id);

        self.search = Some(ActiveSearch { ctx, queue });
        Ok(())
    }

    /// Drop the current search, keeping the configuration.
    pub fn clear(&mut self) {
        if let Some(search) = self.search.take() {
            self.si = Some(search.ctx.si);
        }
    }

    pub fn is_setup(&self) -> bool {
        self.search.is_some()
    }

    /// Run the anytime search until the objective is satisfied, the
    /// termination condition fires, or no better solution can exist.
    pub fn solve(&mut self, mut termination: TerminationCondition) -> Result<SolveResult> {
        let search = self.search.as_mut().ok_or_else(|| {
            PlanError::Config("solve() called without a problem definition".to_string())
        })?;
        let obj = search.ctx.oracle.objective().clone();

        info!(
            min_cost = search.ctx.min_cost.value(),
            "searching for a solution"
        );

        let mut stop_loop = false;
        while !obj.is_satisfied(search.ctx.best_cost)
            && !termination.should_terminate(search.ctx.stats.iterations)
            && obj.is_cost_better_than(search.ctx.min_cost, search.ctx.best_cost)
            && !stop_loop
        {
            search.ctx.stats.iterations += 1;
            search.status_message("iterate");

            // With strict ordering, stale keys are refreshed before every
            // pop; otherwise inversions are tolerated until they would
            // cause a wrong batch termination.
            if search.ctx.params.use_strict_queue_ordering && !search.queue.is_sorted() {
                search.resort();
            }

            // An empty queue means a fresh start or an exhausted batch.
            if search.queue.is_empty() {
                search.new_batch();
            }

            let Some((u, x)) = search.pop_front_edge() else {
                continue;
            };

            // Best case for this edge given the current tree:
            // g_t(u) ⊕ c_hat(u,x) ⊕ h_hat(x) against the goal's tree cost.
            let goal_cost = search.ctx.goal_cost();
            let through_tree = obj.combine3(
                search.ctx.graph.vertex(u).cost(),
                search.ctx.oracle.c_hat(&search.ctx.graph, u, x),
                search.ctx.oracle.h_hat(&search.ctx.graph, x),
            );

            if obj.is_cost_better_than(through_tree, goal_cost) {
                // The heuristic said maybe; now pay for the true edge cost.
                let true_cost = search.ctx.oracle.true_edge_cost(&search.ctx.graph, u, x);
                let through_edge = obj.combine3(
                    search.ctx.oracle.g_hat(&search.ctx.graph, u),
                    true_cost,
                    search.ctx.oracle.h_hat(&search.ctx.graph, x),
                );

                if !obj.is_cost_better_than(through_edge, goal_cost) {
                    // Too costly no matter how the tree evolves.
                    search.record_edge_failure(u, x);
                } else if !search.check_edge(u, x) {
                    search.record_edge_failure(u, x);
                } else {
                    // Does it actually improve the tree at x?
                    let improved = obj.combine(search.ctx.graph.vertex(u).cost(), true_cost);
                    if obj.is_cost_better_than(improved, search.ctx.graph.vertex(x).cost()) {
                        search.add_edge(u, x, true_cost)?;

                        if obj.is_cost_better_than(search.ctx.goal_cost(), search.ctx.best_cost)
                        {
                            search.ctx.has_solution = true;
                            search.ctx.best_cost = search.ctx.goal_cost();
                            search.ctx.shared_cost.set(search.ctx.best_cost.value());
                            search.queue.set_threshold(search.ctx.best_cost);
                            stop_loop = search.ctx.params.stop_on_each_solution_improvement;

                            info!(
                                cost = search.ctx.best_cost.value(),
                                iterations = search.ctx.stats.iterations,
                                vertices = search.ctx.stats.vertices,
                                rewirings = search.ctx.stats.rewirings,
                                graph_size = search.ctx.graph.tree_size(),
                                "found improved solution"
                            );
                        }

                        // Queued rewires of x that the new edge dominates
                        // are dead weight now.
                        search.queue.prune_edges_to(&search.ctx, x);
                    }
                }
            } else if !search.queue.is_sorted() {
                // The best edge looks useless, but the ordering is stale;
                // resort before concluding anything about the batch.
                search.resort();
            } else {
                // Perfectly sorted and the best edge cannot help: the
                // batch is exhausted.
                search.status_message("batch exhausted, clearing queue");
                search.queue.finish();
            }
        }

        let result = SolveResult {
            solution_found: search.ctx.has_solution,
            approximate: false,
        };

        if result.solution_found {
            info!(
                cost = search.ctx.best_cost.value(),
                samples = search.ctx.stats.samples,
                vertices = search.ctx.stats.vertices,
                rewirings = search.ctx.stats.rewirings,
                graph_size = search.ctx.graph.tree_size(),
                "finished with a solution"
            );
        } else {
            info!(
                samples = search.ctx.stats.samples,
                iterations = search.ctx.stats.iterations,
                "finished without a solution"
            );
        }

        Ok(result)
    }

    // ------------------------------------------------------------------
    // Results and introspection
    // ------------------------------------------------------------------

    /// Cost of the best solution found so far; infinite if none.
    pub fn best_cost(&self) -> Cost {
        match &self.search {
            Some(search) => search.ctx.best_cost,
            None => Cost(f64::INFINITY),
        }
    }

    pub fn has_solution(&self) -> bool {
        self.search
            .as_ref()
            .map_or(false, |search| search.ctx.has_solution)
    }

    /// States of the best solution path, start first.
    pub fn best_path(&self) -> Option<Vec<[f64; D]>> {
        let search = self.search.as_ref()?;
        if !search.ctx.has_solution {
            return None;
        }
        Some(search.ctx.graph.path_from_root(search.ctx.goal_id))
    }

    pub fn stats(&self) -> SearchStats {
        self.search
            .as_ref()
            .map_or_else(SearchStats::default, |search| search.ctx.stats)
    }

    /// Live snapshot of costs, populations and queue sizes.
    pub fn progress(&self) -> Option<Progress> {
        let search = self.search.as_ref()?;
        Some(Progress {
            best_cost: search.ctx.best_cost.value(),
            free_states: search.ctx.graph.pool_size(),
            tree_vertices: search.ctx.graph.tree_size(),
            vertex_queue_size: search.queue.num_vertices(),
            edge_queue_size: search.queue.num_edges(),
            stats: search.ctx.stats,
        })
    }

    /// Export the current graph for visualisation.
    pub fn planner_data(&self) -> Option<PlannerData<D>> {
        let search = self.search.as_ref()?;
        let ctx = &search.ctx;

        let samples = ctx
            .graph
            .sample_ids()
            .into_iter()
            .map(|id| *ctx.graph.vertex(id).state())
            .collect();

        let vertices = ctx
            .graph
            .tree_ids()
            .into_iter()
            .map(|id| {
                let v = ctx.graph.vertex(id);
                PlannerDataVertex {
                    state: *v.state(),
                    parent: v.parent().map(|p| *ctx.graph.vertex(p).state()),
                    is_root: v.is_root(),
                }
            })
            .collect();

        Some(PlannerData {
            samples,
            vertices,
            goal: ctx.has_solution.then(|| *ctx.oracle.goal()),
        })
    }

    /// The edge the search would process next, as a state pair.
    pub fn next_edge_in_queue(&mut self) -> Option<([f64; D], [f64; D])> {
        let search = self.search.as_mut()?;
        if search.ctx.params.use_strict_queue_ordering && !search.queue.is_sorted() {
            search.resort();
        }
        let ActiveSearch { ctx, queue } = search;
        let (u, x) = queue.front_edge(ctx)?;
        Some((*ctx.graph.vertex(u).state(), *ctx.graph.vertex(x).state()))
    }

    /// Solution estimate of the next edge in the queue.
    pub fn next_edge_value_in_queue(&mut self) -> Option<Cost> {
        let search = self.search.as_mut()?;
        if search.ctx.params.use_strict_queue_ordering && !search.queue.is_sorted() {
            search.resort();
        }
        let ActiveSearch { ctx, queue } = search;
        queue.front_edge_value(ctx).map(|(f, _)| f)
    }

    /// Queued edges as state pairs, best first.
    pub fn edge_queue_snapshot(&self) -> Vec<([f64; D], [f64; D])> {
        let Some(search) = self.search.as_ref() else {
            return Vec::new();
        };
        search
            .queue
            .list_edges()
            .into_iter()
            .map(|(u, x)| {
                (
                    *search.ctx.graph.vertex(u).state(),
                    *search.ctx.graph.vertex(x).state(),
                )
            })
            .collect()
    }

    /// Queued vertices as states, best first.
    pub fn vertex_queue_snapshot(&self) -> Vec<[f64; D]> {
        let Some(search) = self.search.as_ref() else {
            return Vec::new();
        };
        search
            .queue
            .list_vertices()
            .into_iter()
            .map(|v| *search.ctx.graph.vertex(v).state())
            .collect()
    }

    /// Estimate the free and obstructed measure of the space by sampling.
    ///
    /// A debugging aid with no effect on the search. Returns
    /// `(free_measure, obstructed_measure)`.
    pub fn estimate_measures(&mut self, num_samples: usize) -> Result<(f64, f64)> {
        let search = self
            .search
            .as_mut()
            .ok_or(PlanError::SamplerNotAllocated)?;

        let mut free = 0usize;
        for _ in 0..num_samples {
            let state = search.ctx.sampler.sample_uniform();
            if search.ctx.si.is_valid(&state) {
                free += 1;
            }
        }

        let total = search.ctx.si.measure();
        let fraction_free = free as f64 / num_samples as f64;
        let free_measure = fraction_free * total;
        let obstructed_measure = (1.0 - fraction_free) * total;
        info!(
            num_samples,
            free_measure, obstructed_measure, "estimated space measures"
        );
        Ok((free_measure, obstructed_measure))
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub fn config(&self) -> &BitStarConfig {
        &self.config
    }

    /// Seed of the sampler's local RNG.
    pub fn rng_local_seed(&self) -> Result<u64> {
        let search = self.search.as_ref().ok_or(PlanError::SamplerNotAllocated)?;
        Ok(search.ctx.sampler.local_seed())
    }

    /// Re-seed the sampler's local RNG.
    pub fn set_rng_local_seed(&mut self, seed: u64) -> Result<()> {
        let search = self.search.as_mut().ok_or(PlanError::SamplerNotAllocated)?;
        search.ctx.sampler.set_local_seed(seed);
        Ok(())
    }

    pub fn set_rewire_factor(&mut self, rewire_factor: f64) -> Result<()> {
        if !(1.0..=2.0).contains(&rewire_factor) {
            return Err(PlanError::Config(format!(
                "rewire_factor must lie in [1.0, 2.0], got {}",
                rewire_factor
            )));
        }
        self.config.rewire_factor = rewire_factor;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.rewire_factor = rewire_factor;
            search.ctx.rgg.set_rewire_factor(rewire_factor);
            search.ctx.update_nearest_terms();
        }
        Ok(())
    }

    pub fn set_samples_per_batch(&mut self, samples: usize) -> Result<()> {
        if samples == 0 {
            return Err(PlanError::Config(
                "samples_per_batch must be at least 1".to_string(),
            ));
        }
        self.config.samples_per_batch = samples;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.samples_per_batch = samples;
        }
        Ok(())
    }

    pub fn set_use_k_nearest(&mut self, use_k_nearest: bool) {
        if use_k_nearest && !self.config.use_k_nearest {
            // Two separate indices share one k; the split between them is
            // conservative rather than exact.
            warn!("the k-nearest variant of the search is approximate");
        }
        self.config.use_k_nearest = use_k_nearest;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.use_k_nearest = use_k_nearest;
            search.ctx.rgg.set_use_k_nearest(use_k_nearest);
            search.ctx.update_nearest_terms();
        }
    }

    pub fn set_use_failure_tracking(&mut self, track: bool) {
        self.config.use_edge_failure_tracking = track;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.use_edge_failure_tracking = track;
            search.queue.set_use_failure_tracking(track);
        }
    }

    pub fn set_strict_queue_ordering(&mut self, strict: bool) {
        self.config.use_strict_queue_ordering = strict;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.use_strict_queue_ordering = strict;
        }
    }

    pub fn set_use_graph_pruning(&mut self, prune: bool) {
        if !prune {
            warn!("graph pruning disabled; samples and vertices will accumulate");
        }
        self.config.use_graph_pruning = prune;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.use_graph_pruning = prune;
        }
    }

    pub fn set_prune_threshold_fraction(&mut self, fraction: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PlanError::Config(format!(
                "prune threshold must be specified as a fraction in [0.0, 1.0], got {}",
                fraction
            )));
        }
        self.config.prune_threshold_as_fractional_cost_change = fraction;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.prune_threshold_as_fractional_cost_change = fraction;
        }
        Ok(())
    }

    pub fn set_stop_on_each_solution_improvement(&mut self, stop: bool) {
        self.config.stop_on_each_solution_improvement = stop;
        if let Some(search) = self.search.as_mut() {
            search.ctx.params.stop_on_each_solution_improvement = stop;
        }
    }
}

impl<const D: usize, O: Objective<D>> ActiveSearch<D, O> {
    fn pop_front_edge(&mut self) -> Option<(VertexId, VertexId)> {
        let Self { ctx, queue } = self;
        queue.pop_front_edge(ctx)
    }

    /// Start a new batch: reset the queue for full re-expansion, prune what
    /// the current solution rules out, and arm the sampler.
    fn new_batch(&mut self) {
        self.ctx.stats.batches += 1;
        self.status_message("start new batch");

        // Arm the sampler: the batch's samples are drawn on the first
        // neighbour query.
        self.ctx.cost_sampled = self.ctx.min_cost;

        {
            let Self { ctx, queue } = self;
            queue.reset(ctx);
        }

        self.prune();

        self.ctx.sample_density =
            self.ctx.params.samples_per_batch as f64 / self.ctx.sampler.informed_measure();
    }

    /// Discard samples and vertices that cannot improve the current
    /// solution, if pruning is worthwhile.
    fn prune(&mut self) {
        let worthwhile = self.ctx.params.use_graph_pruning
            && self.ctx.has_solution
            && self
                .ctx
                .fractional_change(self.ctx.best_cost, self.ctx.pruned_cost)
                .abs()
                > self.ctx.params.prune_threshold_as_fractional_cost_change;
        if !worthwhile {
            return;
        }

        // Only prune when the informed subset is actually smaller than the
        // space; otherwise nothing can be ruled out.
        let informed_smaller = !self.ctx.sampler.has_informed_measure()
            || self.ctx.sampler.informed_measure() < self.ctx.si.measure();
        if !informed_smaller {
            return;
        }

        info!(
            from = self.ctx.pruned_cost.value(),
            to = self.ctx.best_cost.value(),
            "pruning the planning problem"
        );
        self.ctx.stats.prunings += 1;

        // Free samples first.
        for s in self.ctx.graph.sample_ids() {
            if self.queue.sample_prune_condition(&self.ctx, s) {
                self.ctx.graph.drop_sample(s);
                self.ctx.stats.states_pruned += 1;
            }
        }

        // Then the tree, via the queue so its bookkeeping stays coherent.
        let (disconnected, destroyed) = {
            let Self { ctx, queue } = self;
            queue.prune(ctx)
        };
        self.ctx.stats.vertices_disconnected += disconnected;
        self.ctx.stats.states_pruned += destroyed;

        self.ctx.pruned_cost = self.ctx.best_cost;
    }

    fn resort(&mut self) {
        self.ctx.stats.resorts += 1;
        let (disconnected, destroyed) = {
            let Self { ctx, queue } = self;
            queue.resort(ctx)
        };
        self.ctx.stats.vertices_disconnected += disconnected;
        self.ctx.stats.states_pruned += destroyed;
    }

    /// Motion-check the edge. With failure tracking on, the outcome is
    /// memoised per pair (states never move), so no edge is ever
    /// collision-checked twice.
    fn check_edge(&mut self, u: VertexId, x: VertexId) -> bool {
        if self.ctx.params.use_edge_failure_tracking {
            if let Some(valid) = self.ctx.graph.vertex(u).recorded_motion_check(x) {
                return valid;
            }
        }

        self.ctx.stats.edge_collision_checks += 1;
        #[cfg(test)]
        self.ctx.checked_edges.push((u, x));

        let a = *self.ctx.graph.vertex(u).state();
        let b = *self.ctx.graph.vertex(x).state();
        let valid = self.ctx.si.check_motion(&a, &b);

        if self.ctx.params.use_edge_failure_tracking {
            self.ctx.graph.vertex_mut(u).record_motion_check(x, valid);
        }
        valid
    }

    fn record_edge_failure(&mut self, u: VertexId, x: VertexId) {
        if self.ctx.params.use_edge_failure_tracking {
            self.ctx.graph.vertex_mut(u).mark_failed_child(x);
        }
    }

    /// Commit an edge to the tree: a rewire if the target is already
    /// connected, an extension otherwise.
    fn add_edge(&mut self, u: VertexId, x: VertexId, edge_cost: Cost) -> Result<()> {
        let obj = self.ctx.oracle.objective().clone();

        if self.ctx.graph.vertex(x).is_connected() {
            // Rewire: swap the parent and cascade the cheaper costs down;
            // cached queue keys below x go stale until the next resort.
            self.ctx.stats.rewirings += 1;
            self.ctx.graph.vertex_mut(x).clear_failure_memory();
            self.ctx.graph.clear_parent(x, false, &obj);
            self.ctx.graph.set_parent(x, u, edge_cost, true, &obj);
            self.queue.mark_vertex_unsorted(x);
        } else {
            // Extend: the sample becomes a tree vertex and queues up for
            // its own expansion.
            self.ctx.graph.set_parent(x, u, edge_cost, true, &obj);
            self.ctx.graph.promote_to_tree(x)?;
            self.queue.insert_vertex(&self.ctx, x);
            self.ctx.stats.vertices += 1;
        }
        Ok(())
    }

    fn status_message(&self, message: &str) {
        debug!(
            cost = self.ctx.best_cost.value(),
            batches = self.ctx.stats.batches,
            iterations = self.ctx.stats.iterations,
            graph = self.ctx.graph.tree_size(),
            free = self.ctx.graph.pool_size(),
            queued_edges = self.queue.num_edges(),
            samples = self.ctx.stats.samples,
            vertices = self.ctx.stats.vertices,
            prunings = self.ctx.stats.prunings,
            rewirings = self.ctx.stats.rewirings,
            nn_calls = self.ctx.stats.nearest_neighbour_calls,
            state_checks = self.ctx.stats.state_collision_checks,
            edge_checks = self.ctx.stats.edge_collision_checks,
            "{message}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marga_space::{Bounds, FnValidityChecker, RealVectorSpace};
    use std::collections::HashSet;

    /// A vertical wall at 0.4 < x < 0.6 below y = 0.8.
    fn wall_space() -> SpaceInformation<2> {
        SpaceInformation::new(
            RealVectorSpace::new(Bounds::unit()),
            Box::new(FnValidityChecker(|s: &[f64; 2]| {
                !(s[0] > 0.4 && s[0] < 0.6 && s[1] < 0.8)
            })),
        )
    }

    #[test]
    fn test_failure_tracking_never_rechecks_an_edge() {
        let mut config = BitStarConfig::default();
        config.samples_per_batch = 100;
        config.rng_seed = Some(23);
        config.use_edge_failure_tracking = true;

        let mut planner =
            BitStar::new(wall_space(), PathLengthObjective::new(), config).unwrap();
        planner
            .setup(&ProblemDefinition::single([0.0, 0.0], [1.0, 0.0]))
            .unwrap();
        planner
            .solve(TerminationCondition::after_iterations(4000))
            .unwrap();

        let checked = &planner.search.as_ref().unwrap().ctx.checked_edges;
        assert!(!checked.is_empty());
        let mut seen = HashSet::new();
        for &pair in checked {
            assert!(
                seen.insert(pair),
                "edge ({}, {}) was collision-checked twice",
                pair.0,
                pair.1
            );
        }
    }
}
