//! # Deeprun
//!
//! This crate wires the deeprun daemon: configuration management, error
//! handling, and dependency injection for the chain indexer and the action
//! execution surface.
pub mod config;
pub mod errors;

pub use config::{Dependencies, ServiceConfig};
pub use errors::ServiceError;
