//! # Marga-Space: Geometric Foundation for Sampling-Based Planning
//!
//! Real-vector state spaces and the supporting machinery a sampling-based
//! motion planner needs: bounds, validity checking, discrete motion
//! validation, informed sampling and nearest-neighbour indices.
//!
//! The state dimension is a compile-time constant, so a state is a plain
//! `[f64; D]` and every index structure is monomorphised per dimension.
//!
//! ## Quick Start
//!
//! ```rust
//! use marga_space::{Bounds, RealVectorSpace, SpaceInformation, AlwaysValid};
//!
//! // A unit square with a trivial validity checker.
//! let space = RealVectorSpace::new(Bounds::unit());
//! let si: SpaceInformation<2> = SpaceInformation::new(space, Box::new(AlwaysValid));
//!
//! assert!(si.is_valid(&[0.5, 0.5]));
//! assert!(si.check_motion(&[0.0, 0.0], &[1.0, 1.0]));
//! ```
//!
//! ## Modules
//!
//! - [`bounds`]: Axis-aligned state-space limits
//! - [`space`]: The real-vector space (distance, measure, interpolation)
//! - [`validity`]: State validity checking and discrete motion validation
//! - [`sampler`]: Uniform and informed (prolate-hyperspheroid) sampling
//! - [`nn`]: Nearest-neighbour index abstraction backed by a k-d tree

pub mod bounds;
pub mod nn;
pub mod sampler;
pub mod space;
pub mod validity;

pub use bounds::Bounds;
pub use nn::{KdTreeIndex, NearestNeighbors};
pub use sampler::{unit_ball_measure, InformedSampler, SharedSolutionCost};
pub use space::RealVectorSpace;
pub use validity::{AlwaysValid, FnValidityChecker, SpaceInformation, StateValidityChecker};
