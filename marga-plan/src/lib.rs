//! # Marga-Plan: Batch Informed Trees
//!
//! An anytime, almost-surely asymptotically-optimal sampling-based motion
//! planner. The search grows a tree of collision-free motions from the
//! start state towards a goal state over an implicit random geometric
//! graph, processing candidate edges in best-first order of the solution
//! they could produce.
//!
//! # Architecture
//!
//! The crate is layered; each module maps to one component of the search:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    planner/                         │  ← Batch loop, gates, results
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     queue/                          │  ← Integrated vertex/edge queue
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │           graph/  heuristic/  rgg/                  │  ← Tree + pool, admissible
//! │                                                     │    estimates, connection terms
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │           vertex/  objective/  config/              │  ← Foundation types
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The geometric substrate (state spaces, validity checking, informed
//! sampling, nearest-neighbour indices) lives in the `marga-space` crate.
//!
//! # How the search works
//!
//! Work proceeds in *batches*. Each batch draws a set of valid states from
//! the informed sampler, resets the queue so every tree vertex will be
//! re-expanded under the new, smaller connection radius, and prunes
//! whatever the current best solution already rules out. The main loop
//! then pops candidate edges in best-first order, discards those that
//! cannot beat the current solution, collision-checks the survivors and
//! inserts the improving ones into the tree, rewiring descendants when a
//! cheaper parent appears. When the best remaining edge cannot help, the
//! batch is exhausted and the next one starts. The loop ends when the
//! optimum is provably reached, the objective is satisfied, or the caller
//! terminates it.

pub mod config;
pub mod error;
pub mod graph;
pub mod heuristic;
pub mod objective;
pub mod planner;
pub mod queue;
pub mod rgg;
pub mod stats;
pub mod termination;
pub mod vertex;

mod context;

pub use config::BitStarConfig;
pub use error::{PlanError, Result};
pub use objective::{Cost, Objective, PathLengthObjective};
pub use planner::{BitStar, PlannerData, PlannerDataVertex, ProblemDefinition, SolveResult};
pub use stats::{Progress, SearchStats};
pub use termination::TerminationCondition;
pub use vertex::{Membership, Vertex, VertexId};
