//! Error types for the action worker pool.
use deeprun_repository::ActionQueueError;
use thiserror::Error;

/// Represents errors that can occur within the action worker.
///
/// Engine failures are classified and recorded on the submission instead of
/// surfacing here; this enum covers queue persistence and task join failures.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Queue error: {0}")]
    Queue(#[from] ActionQueueError),

    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
