//! # Deeprun Shared
//! This crate defines the domain types shared across the deeprun middleware:
//! the agent action union, queue submissions and receipts, decoded chain
//! events, the revert taxonomy, and leaderboard pagination cursors.
pub mod leaderboard;
pub mod taxonomy;
pub mod types;
