use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::ActionInput;

/// Lifecycle state of a queued action.
///
/// `queued` and `retry` are claimable; `running` is exclusive per conflict
/// key; `succeeded` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Queued,
    Running,
    Retry,
    Succeeded,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Queued => "queued",
            ActionStatus::Running => "running",
            ActionStatus::Retry => "retry",
            ActionStatus::Succeeded => "succeeded",
            ActionStatus::Failed => "failed",
        }
    }
}

/// One row of the action queue, as persisted.
///
/// `request` is the immutable snapshot of the validated action; `result`
/// carries the engine receipt once the action succeeded. `attempts` counts
/// claims, so a first execution observes `attempts == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSubmission {
    pub action_id: Uuid,
    pub signer: String,
    pub idempotency_key: String,
    pub action_type: String,
    pub request: ActionInput,
    pub conflict_key: Option<String>,
    pub status: ActionStatus,
    pub result: Option<serde_json::Value>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub attempts: i32,
    pub tx_hashes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
