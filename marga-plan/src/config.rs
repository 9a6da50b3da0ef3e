//! Planner configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{PlanError, Result};

/// Tunable parameters of the batched search.
#[derive(Clone, Debug, Deserialize)]
pub struct BitStarConfig {
    /// Resort the queues before every pop instead of tolerating transient
    /// ordering inversions after rewires.
    #[serde(default = "default_strict_queue_ordering")]
    pub use_strict_queue_ordering: bool,

    /// Scaling applied to the theoretical minimum connection radius /
    /// neighbour count. Must lie in [1.0, 2.0].
    #[serde(default = "default_rewire_factor")]
    pub rewire_factor: f64,

    /// States drawn per batch. Must be at least 1.
    #[serde(default = "default_samples_per_batch")]
    pub samples_per_batch: usize,

    /// Remember edges that failed a collision or heuristic check and never
    /// consider them again until the source vertex is rewired.
    #[serde(default = "default_edge_failure_tracking")]
    pub use_edge_failure_tracking: bool,

    /// Connect to the k nearest neighbours instead of all neighbours
    /// within a radius.
    #[serde(default = "default_k_nearest")]
    pub use_k_nearest: bool,

    /// Discard samples and vertices that cannot improve the current
    /// solution.
    #[serde(default = "default_graph_pruning")]
    pub use_graph_pruning: bool,

    /// Minimum fractional solution-cost change required to trigger a
    /// prune. Must lie in [0.0, 1.0].
    #[serde(default = "default_prune_fraction")]
    pub prune_threshold_as_fractional_cost_change: f64,

    /// Return from solve() every time the solution improves.
    #[serde(default = "default_stop_on_improvement")]
    pub stop_on_each_solution_improvement: bool,

    /// Seed for the sampler's local RNG. Unset means seed from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for BitStarConfig {
    fn default() -> Self {
        Self {
            use_strict_queue_ordering: default_strict_queue_ordering(),
            rewire_factor: default_rewire_factor(),
            samples_per_batch: default_samples_per_batch(),
            use_edge_failure_tracking: default_edge_failure_tracking(),
            use_k_nearest: default_k_nearest(),
            use_graph_pruning: default_graph_pruning(),
            prune_threshold_as_fractional_cost_change: default_prune_fraction(),
            stop_on_each_solution_improvement: default_stop_on_improvement(),
            rng_seed: None,
        }
    }
}

// Default value functions
fn default_strict_queue_ordering() -> bool {
    false
}
fn default_rewire_factor() -> f64 {
    1.1
}
fn default_samples_per_batch() -> usize {
    100
}
fn default_edge_failure_tracking() -> bool {
    false
}
fn default_k_nearest() -> bool {
    false
}
fn default_graph_pruning() -> bool {
    true
}
fn default_prune_fraction() -> f64 {
    0.01
}
fn default_stop_on_improvement() -> bool {
    false
}

impl BitStarConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlanError::Config(format!("Failed to read config file: {}", e)))?;
        let config: BitStarConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges. Called by the planner at setup.
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=2.0).contains(&self.rewire_factor) {
            return Err(PlanError::Config(format!(
                "rewire_factor must lie in [1.0, 2.0], got {}",
                self.rewire_factor
            )));
        }
        if self.samples_per_batch == 0 {
            return Err(PlanError::Config(
                "samples_per_batch must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.prune_threshold_as_fractional_cost_change) {
            return Err(PlanError::Config(format!(
                "prune threshold must be specified as a fraction in [0.0, 1.0], got {}",
                self.prune_threshold_as_fractional_cost_change
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BitStarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_batch, 100);
        assert!((config.rewire_factor - 1.1).abs() < 1e-12);
        assert!(config.use_graph_pruning);
        assert!(!config.use_strict_queue_ordering);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let mut config = BitStarConfig::default();
        config.rewire_factor = 0.9;
        assert!(config.validate().is_err());

        let mut config = BitStarConfig::default();
        config.samples_per_batch = 0;
        assert!(config.validate().is_err());

        let mut config = BitStarConfig::default();
        config.prune_threshold_as_fractional_cost_change = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BitStarConfig =
            toml::from_str("samples_per_batch = 32\nuse_k_nearest = true\n").unwrap();
        assert_eq!(config.samples_per_batch, 32);
        assert!(config.use_k_nearest);
        assert!((config.rewire_factor - 1.1).abs() < 1e-12);
    }
}
