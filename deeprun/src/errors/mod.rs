//! Error types for the deeprun service.
//! Defines a comprehensive set of errors that can occur while wiring and
//! running the daemon, consolidating errors from the pipeline and storage.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Chain client error: {0}")]
    Chain(#[from] deeprun_pipeline::errors::ChainClientError),
    #[error("Signal error: {0}")]
    Signal(#[from] std::io::Error),
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}
