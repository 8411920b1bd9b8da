//! # Deeprun Pipeline
//! This crate defines the runtime components that move game actions and chain
//! events through the system.
//! It includes the chain client, the action worker pool and its engine seam,
//! the cost estimator, execution metrics, and the chain event indexer, along
//! with error handling.
pub mod chain;
pub mod engine;
pub mod estimator;
pub mod indexer;
pub mod metrics;
pub mod worker;

pub mod errors;
