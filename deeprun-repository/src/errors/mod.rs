//! Error types for the deeprun repository.
//! Consolidates and re-exports error types related to queue and indexer store operations.
mod actions;
mod indexer;

pub use actions::ActionQueueError;
pub use indexer::IndexerStoreError;
