//! Uniform and informed state sampling.
//!
//! Once a solution of cost `c` exists, only states `x` with
//! `d(start, x) + d(x, goal) < c` can lie on a better path; that set is a
//! prolate hyperspheroid with the start and goal at its foci. The sampler
//! reads the current solution cost from a shared cell on every draw and
//! restricts itself to that subset by rejection.

use std::cell::Cell;
use std::f64::consts::PI;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bounds::Bounds;
use crate::space::RealVectorSpace;

/// Rejection attempts per draw before falling back to a plain uniform
/// sample. A fallback state outside the informed subset is harmless: the
/// admissibility threshold discards it before it can enter the search.
const MAX_REJECTION_ATTEMPTS: usize = 100;

/// A fresh RNG seed drawn from the operating system.
pub fn entropy_seed() -> u64 {
    rand::random()
}

/// Measure of the unit ball in `d` dimensions (ζ_d).
///
/// Computed by the two-step recurrence `V_d = V_{d-2} · 2π / d` from
/// `V_0 = 1`, `V_1 = 2`, avoiding a gamma-function dependency.
pub fn unit_ball_measure(d: usize) -> f64 {
    let mut v = if d % 2 == 0 { 1.0 } else { 2.0 };
    let mut k = if d % 2 == 0 { 2 } else { 3 };
    while k <= d {
        v *= 2.0 * PI / k as f64;
        k += 2;
    }
    v
}

/// Solution cost shared between the planner and the sampler.
///
/// The planner writes it synchronously whenever the best cost improves, so
/// the very next draw samples from the current informed subset. `Rc` is
/// deliberate: the search is single-threaded by design.
#[derive(Clone, Debug)]
pub struct SharedSolutionCost(Rc<Cell<f64>>);

impl SharedSolutionCost {
    pub fn infinite() -> Self {
        Self(Rc::new(Cell::new(f64::INFINITY)))
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }

    pub fn set(&self, cost: f64) {
        self.0.set(cost);
    }

    pub fn is_finite(&self) -> bool {
        self.0.get().is_finite()
    }
}

impl Default for SharedSolutionCost {
    fn default() -> Self {
        Self::infinite()
    }
}

/// Draws states from the space, restricted to the informed subset once the
/// shared solution cost is finite.
pub struct InformedSampler<const D: usize> {
    space: RealVectorSpace<D>,
    start: [f64; D],
    goal: [f64; D],
    /// Distance between the foci, the minimum transverse diameter.
    min_transverse: f64,
    best_cost: SharedSolutionCost,
    rng: StdRng,
    seed: u64,
}

impl<const D: usize> InformedSampler<D> {
    pub fn new(
        space: RealVectorSpace<D>,
        start: [f64; D],
        goal: [f64; D],
        best_cost: SharedSolutionCost,
        seed: u64,
    ) -> Self {
        let min_transverse = space.distance(&start, &goal);
        Self {
            space,
            start,
            goal,
            min_transverse,
            best_cost,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn local_seed(&self) -> u64 {
        self.seed
    }

    /// Re-seed the local RNG.
    pub fn set_local_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Whether [`informed_measure`](Self::informed_measure) is meaningful.
    pub fn has_informed_measure(&self) -> bool {
        true
    }

    /// Measure of the subset that could still improve the solution.
    ///
    /// The closed-form prolate-hyperspheroid volume, clamped to the space
    /// measure (the hyperspheroid may extend past the bounds). Equals the
    /// space measure while no solution exists.
    pub fn informed_measure(&self) -> f64 {
        let c = self.best_cost.get();
        if !c.is_finite() {
            return self.space.measure();
        }
        self.phs_measure(c).min(self.space.measure())
    }

    fn phs_measure(&self, c_best: f64) -> f64 {
        if c_best <= self.min_transverse {
            return 0.0;
        }
        let conjugate = (c_best.powi(2) - self.min_transverse.powi(2))
            .max(0.0)
            .sqrt();
        unit_ball_measure(D) * (c_best / 2.0) * (conjugate / 2.0).powi(D as i32 - 1)
    }

    fn bounds(&self) -> &Bounds<D> {
        self.space.bounds()
    }

    /// Draw one state.
    ///
    /// While the shared cost is infinite this is a plain uniform draw from
    /// the bounds; afterwards it rejects states whose best-case path cost
    /// through them is no better than the current solution.
    pub fn sample_uniform(&mut self) -> [f64; D] {
        let c = self.best_cost.get();
        if !c.is_finite() {
            let bounds = self.space.bounds();
            return bounds.sample(&mut self.rng);
        }

        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let bounds = self.space.bounds();
            let state = bounds.sample(&mut self.rng);
            let through = self.space.distance(&self.start, &state)
                + self.space.distance(&state, &self.goal);
            if through < c {
                return state;
            }
        }

        let bounds = self.space.bounds();
        bounds.sample(&mut self.rng)
    }
}
