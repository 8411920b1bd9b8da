use serde::{Deserialize, Serialize};

/// Success payload returned by the action engine and persisted as `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReceipt {
    pub code: String,
    #[serde(default)]
    pub tx_hashes: Vec<String>,
    #[serde(default)]
    pub delta_events: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ReceiptDetails>,
}

/// Engine-specific receipt details. Unknown keys survive a round trip through
/// the database via `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_latency_ms: Option<StageLatency>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Milliseconds spent in each phase of a commit-reveal execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLatency {
    pub commit_submit: u64,
    pub mine_wait: u64,
    pub reveal_submit: u64,
}

impl ActionReceipt {
    /// Shorthand for a plain `OK` receipt with the given transaction hashes.
    pub fn ok(tx_hashes: Vec<String>) -> Self {
        Self {
            code: "OK".to_string(),
            tx_hashes,
            delta_events: Vec::new(),
            details: None,
        }
    }

    /// Stage timings, present only when the engine reported all three phases.
    pub fn stage_latency(&self) -> Option<&StageLatency> {
        self.details.as_ref()?.stage_latency_ms.as_ref()
    }
}
