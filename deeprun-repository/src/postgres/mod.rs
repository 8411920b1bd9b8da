//! PostgreSQL implementations of the repository interfaces.
//! Provides concrete, pool-backed implementations of `ActionQueue` and
//! `IndexerStore`, plus the embedded schema migrator.
mod actions;
mod indexer;

pub use actions::PostgresActionQueue;
pub use indexer::PostgresIndexerStore;

/// Embedded schema migrations, applied at startup and by integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
