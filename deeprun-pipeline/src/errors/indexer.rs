//! Error types for the chain event indexer.
//! Defines specific errors that can abort an indexer tick.
use deeprun_repository::IndexerStoreError;
use thiserror::Error;

use crate::errors::ChainClientError;

/// Represents errors that can occur within the chain indexer.
///
/// This enum consolidates chain client failures (log fetches and read-model
/// refresh reads) and persistence failures from the indexer store.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Chain client error: {0}")]
    Chain(#[from] ChainClientError),

    #[error("Store error: {0}")]
    Store(#[from] IndexerStoreError),
}
