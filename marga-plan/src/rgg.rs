//! Random-geometric-graph connection terms.
//!
//! The implicit graph over samples connects two states iff they are within
//! a radius `r(N)` (or are mutual k-nearest neighbours) that shrinks as the
//! number of states `N` grows. The constants follow the RGG connectivity
//! results used by asymptotically-optimal planners, scaled by a
//! user-supplied rewire factor ≥ 1.

use std::f64::consts::E;

use marga_space::unit_ball_measure;

/// Current connection radius / neighbour count, recomputed whenever the
/// combined sample-and-tree population changes materially.
#[derive(Clone, Copy, Debug)]
pub struct RggTerms {
    dimension: usize,
    rewire_factor: f64,
    use_k_nearest: bool,
    /// Population-independent factor of k(N).
    k_rgg: f64,
    r: f64,
    k: usize,
}

impl RggTerms {
    pub fn new(dimension: usize, rewire_factor: f64, use_k_nearest: bool) -> Self {
        let mut terms = Self {
            dimension,
            rewire_factor,
            use_k_nearest,
            k_rgg: 0.0,
            r: 0.0,
            k: 0,
        };
        terms.initialize();
        terms
    }

    /// Recompute the population-independent constants.
    pub fn initialize(&mut self) {
        let d = self.dimension as f64;
        self.k_rgg = self.rewire_factor * (E + E / d);
    }

    pub fn set_rewire_factor(&mut self, rewire_factor: f64) {
        self.rewire_factor = rewire_factor;
        self.initialize();
    }

    pub fn set_use_k_nearest(&mut self, use_k_nearest: bool) {
        self.use_k_nearest = use_k_nearest;
        self.initialize();
    }

    pub fn use_k_nearest(&self) -> bool {
        self.use_k_nearest
    }

    /// Update the population-dependent term for `n` total states drawn from
    /// a subset of measure `informed_measure`.
    pub fn update(&mut self, n: usize, informed_measure: f64) {
        if self.use_k_nearest {
            self.k = self.k_for(n);
        } else {
            self.r = self.r_for(n, informed_measure);
        }
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// `r(N) = η · 2 · ((1 + 1/d) · μ / ζ_d)^(1/d) · (log N / N)^(1/d)`
    fn r_for(&self, n: usize, informed_measure: f64) -> f64 {
        let d = self.dimension as f64;
        let card = n as f64;
        self.minimum_rgg_r(informed_measure) * (card.ln() / card).powf(1.0 / d)
    }

    /// `k(N) = ⌈η · (e + e/d) · log N⌉`
    fn k_for(&self, n: usize) -> usize {
        (self.k_rgg * (n as f64).ln()).ceil() as usize
    }

    /// Radius for a unit-population graph over the informed subset.
    fn minimum_rgg_r(&self, informed_measure: f64) -> f64 {
        let d = self.dimension as f64;
        self.rewire_factor
            * 2.0
            * ((1.0 + 1.0 / d) * informed_measure / unit_ball_measure(self.dimension))
                .powf(1.0 / d)
    }

    /// Cost bound on the local neighbourhood.
    ///
    /// An approximation (`2r`) that is only meaningful for path-length
    /// style objectives; it exists for just-in-time sampling extensions and
    /// diagnostics.
    pub fn neighbourhood_cost(&self) -> f64 {
        2.0 * self.r
    }
}
