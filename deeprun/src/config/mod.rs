//! Configuration module for the deeprun service.
//! Defines environment-driven settings and dependency wiring.
mod dependencies;
mod env;

pub use dependencies::Dependencies;
pub use env::ServiceConfig;
