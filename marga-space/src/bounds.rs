//! Axis-aligned bounds for real-vector state spaces.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Axis-aligned lower/upper limits of a `D`-dimensional box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<const D: usize> {
    low: [f64; D],
    high: [f64; D],
}

impl<const D: usize> Bounds<D> {
    /// Create bounds from explicit per-axis limits.
    ///
    /// # Panics
    ///
    /// If any axis has `low > high` or a non-finite limit.
    pub fn new(low: [f64; D], high: [f64; D]) -> Self {
        for axis in 0..D {
            assert!(
                low[axis].is_finite() && high[axis].is_finite() && low[axis] <= high[axis],
                "invalid bounds on axis {}: [{}, {}]",
                axis,
                low[axis],
                high[axis]
            );
        }
        Self { low, high }
    }

    /// The unit box `[0, 1]^D`.
    pub fn unit() -> Self {
        Self {
            low: [0.0; D],
            high: [1.0; D],
        }
    }

    /// A box symmetric about the origin, `[-half_extent, half_extent]^D`.
    pub fn symmetric(half_extent: f64) -> Self {
        Self::new([-half_extent; D], [half_extent; D])
    }

    pub fn low(&self) -> &[f64; D] {
        &self.low
    }

    pub fn high(&self) -> &[f64; D] {
        &self.high
    }

    /// Lebesgue measure (hyper-volume) of the box.
    pub fn measure(&self) -> f64 {
        (0..D).map(|i| self.high[i] - self.low[i]).product()
    }

    /// Length of the box diagonal, the largest distance between two states.
    pub fn max_extent(&self) -> f64 {
        (0..D)
            .map(|i| (self.high[i] - self.low[i]).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    pub fn contains(&self, state: &[f64; D]) -> bool {
        (0..D).all(|i| state[i] >= self.low[i] && state[i] <= self.high[i])
    }

    /// Draw a state uniformly from the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> [f64; D] {
        let mut state = [0.0; D];
        for (axis, value) in state.iter_mut().enumerate() {
            *value = Uniform::new_inclusive(self.low[axis], self.high[axis]).sample(rng);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_measure_and_extent() {
        let bounds: Bounds<2> = Bounds::new([0.0, 0.0], [2.0, 3.0]);
        assert_relative_eq!(bounds.measure(), 6.0);
        assert_relative_eq!(bounds.max_extent(), 13.0_f64.sqrt());

        let unit: Bounds<3> = Bounds::unit();
        assert_relative_eq!(unit.measure(), 1.0);
    }

    #[test]
    fn test_contains() {
        let bounds: Bounds<2> = Bounds::symmetric(1.0);
        assert!(bounds.contains(&[0.0, 0.0]));
        assert!(bounds.contains(&[-1.0, 1.0]));
        assert!(!bounds.contains(&[1.01, 0.0]));
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let bounds: Bounds<2> = Bounds::new([-1.0, 2.0], [1.0, 5.0]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = bounds.sample(&mut rng);
            assert!(bounds.contains(&s));
        }
    }

    #[test]
    #[should_panic]
    fn test_inverted_bounds_panic() {
        let _ = Bounds::<1>::new([1.0], [0.0]);
    }
}
