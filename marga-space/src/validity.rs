//! State validity checking and discrete motion validation.
//!
//! A planner sees the world only through [`SpaceInformation`]: per-state
//! validity plus a discrete motion check that subdivides a segment at a
//! fixed resolution and validates the interior states.

use crate::space::RealVectorSpace;

/// Fraction of the space extent used as the motion-validation step.
const DEFAULT_VALIDATION_RESOLUTION: f64 = 0.01;

/// Decides whether a single state is collision-free.
pub trait StateValidityChecker<const D: usize> {
    fn is_valid(&self, state: &[f64; D]) -> bool;
}

/// Accepts every state.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysValid;

impl<const D: usize> StateValidityChecker<D> for AlwaysValid {
    fn is_valid(&self, _state: &[f64; D]) -> bool {
        true
    }
}

/// Adapts a closure into a [`StateValidityChecker`].
pub struct FnValidityChecker<F>(pub F);

impl<const D: usize, F> StateValidityChecker<D> for FnValidityChecker<F>
where
    F: Fn(&[f64; D]) -> bool,
{
    fn is_valid(&self, state: &[f64; D]) -> bool {
        (self.0)(state)
    }
}

/// A state space paired with its validity checker and motion validator.
pub struct SpaceInformation<const D: usize> {
    space: RealVectorSpace<D>,
    checker: Box<dyn StateValidityChecker<D>>,
    /// Motion-validation step, as a fraction of the space extent.
    validation_resolution: f64,
}

impl<const D: usize> SpaceInformation<D> {
    pub fn new(space: RealVectorSpace<D>, checker: Box<dyn StateValidityChecker<D>>) -> Self {
        Self {
            space,
            checker,
            validation_resolution: DEFAULT_VALIDATION_RESOLUTION,
        }
    }

    /// Override the motion-validation resolution (fraction of space extent).
    pub fn with_validation_resolution(mut self, resolution: f64) -> Self {
        self.validation_resolution = resolution;
        self
    }

    pub fn space(&self) -> &RealVectorSpace<D> {
        &self.space
    }

    pub fn dimension(&self) -> usize {
        D
    }

    pub fn measure(&self) -> f64 {
        self.space.measure()
    }

    pub fn distance(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        self.space.distance(a, b)
    }

    pub fn is_valid(&self, state: &[f64; D]) -> bool {
        self.space.bounds().contains(state) && self.checker.is_valid(state)
    }

    /// Validate the straight-line motion from `a` to `b`.
    ///
    /// Checks the end state and then the interior states at the validation
    /// resolution. The start state is assumed valid, matching the usual
    /// contract of incremental planners (the tree only ever extends from
    /// states that were already validated).
    pub fn check_motion(&self, a: &[f64; D], b: &[f64; D]) -> bool {
        if !self.is_valid(b) {
            return false;
        }

        let step = self.validation_resolution * self.space.max_extent();
        let segments = (self.space.distance(a, b) / step).ceil() as usize;
        for i in 1..segments {
            let t = i as f64 / segments as f64;
            if !self.is_valid(&self.space.interpolate(a, b, t)) {
                return false;
            }
        }

        true
    }
}
