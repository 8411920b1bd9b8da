//! Engine seam between the action worker and transaction execution.
//!
//! The pipeline claims, retries and records actions but never plans or signs
//! transactions itself. An embedding service supplies the `ActionEngine` and
//! the worker drives it one claimed action at a time.

use async_trait::async_trait;

use deeprun_shared::types::{ActionInput, ActionReceipt};

/// Trait for executing a claimed action against the chain.
///
/// Implementations own wallet management, calldata planning and receipt
/// assembly. A returned error is classified into the failure taxonomy to
/// decide between retry and terminal failure, so implementations should keep
/// revert reasons verbatim in the error text.
#[async_trait]
pub trait ActionEngine: Send + Sync {
    /// Executes one action to completion and returns its receipt.
    async fn execute(&self, action: &ActionInput) -> anyhow::Result<ActionReceipt>;
}
