//! # Deeprun Repository
//! This crate provides traits and implementations for persisting queued
//! actions and indexed chain state. It includes definitions for errors,
//! interfaces, and concrete implementations for PostgreSQL.
pub mod conflict;
pub mod errors;
pub mod interfaces;
pub mod postgres;

pub use conflict::derive_conflict_key;
pub use errors::{ActionQueueError, IndexerStoreError};
pub use interfaces::{ActionQueue, IndexerStore};
pub use postgres::{PostgresActionQueue, PostgresIndexerStore};
