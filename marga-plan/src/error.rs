//! Error types for the planner.
//!
//! Only setup-time misconfiguration and internal invariant breaches are
//! errors. Failing to find a solution is normal flow and is reported
//! through [`SolveResult`](crate::planner::SolveResult), not here.

use thiserror::Error;

/// Planner error type
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search invariant violated: {0}")]
    Invariant(String),

    #[error("Sampler not allocated; call setup() first")]
    SamplerNotAllocated,
}

impl From<toml::de::Error> for PlanError {
    fn from(e: toml::de::Error) -> Self {
        PlanError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
