//! Error types for the indexer store.
//! Defines specific errors that can occur while persisting cursors, processed-log
//! markers, and read-model rows.
use thiserror::Error;

/// Represents errors that can occur within the indexer store.
///
/// This enum consolidates various error conditions specific to database interactions,
/// such as SQLx errors during upserts and malformed rows read back from storage.
#[derive(Debug, Error)]
pub enum IndexerStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}
