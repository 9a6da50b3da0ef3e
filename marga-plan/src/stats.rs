//! Search progress counters.

use serde::Serialize;

/// Cumulative counters maintained by the search.
///
/// Plain integers: the core is single-threaded, so no atomics are needed.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SearchStats {
    /// Main-loop iterations.
    pub iterations: u64,
    /// Batches started.
    pub batches: u64,
    /// Graph prunings performed.
    pub prunings: u64,
    /// Queue resorts performed after rewires.
    pub resorts: u64,
    /// States drawn from the sampler (valid or not).
    pub samples: u64,
    /// Vertices ever added to the tree.
    pub vertices: u64,
    /// Free states destroyed by pruning.
    pub states_pruned: u64,
    /// Tree vertices disconnected by pruning or resorting.
    pub vertices_disconnected: u64,
    /// Parent swaps performed on existing tree vertices.
    pub rewirings: u64,
    /// Single-state validity checks.
    pub state_collision_checks: u64,
    /// Full-motion collision checks.
    pub edge_collision_checks: u64,
    /// Nearest-neighbour queries issued.
    pub nearest_neighbour_calls: u64,
}

/// Point-in-time snapshot of the search, counters included.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Progress {
    /// Cost of the best solution found so far (infinite if none).
    pub best_cost: f64,
    /// Unconnected samples currently held.
    pub free_states: usize,
    /// Vertices currently in the tree.
    pub tree_vertices: usize,
    /// Vertices awaiting expansion.
    pub vertex_queue_size: usize,
    /// Edges awaiting processing.
    pub edge_queue_size: usize,
    pub stats: SearchStats,
}
