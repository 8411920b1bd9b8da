//! Error types for the action queue.
//! Defines specific errors that can occur during database operations related to queued actions.
use thiserror::Error;

/// Represents errors that can occur within the action queue.
///
/// This enum consolidates various error conditions specific to database interactions,
/// such as SQLx errors during claim and status transitions.
#[derive(Debug, Error)]
pub enum ActionQueueError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}
