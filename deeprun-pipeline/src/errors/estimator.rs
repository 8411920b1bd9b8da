//! Error types for the cost estimator.
use thiserror::Error;

use crate::errors::ChainClientError;

/// Represents errors that can occur while producing a cost estimate.
///
/// Gas estimation failures are absorbed into fallback estimates and never
/// surface here; only fee, balance, and required-value lookups propagate.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("Chain client error: {0}")]
    Chain(#[from] ChainClientError),
}
