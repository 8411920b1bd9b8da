//! In-process execution metrics for the action worker.
//!
//! Counters and latency rings live behind one mutex and are written on every
//! queue transition. `snapshot` renders them into a serializable view with
//! camelCase keys, matching the wire shape served to operators. Nothing here
//! is persisted; a restart starts the counters over.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use deeprun_shared::types::ActionReceipt;

/// Samples kept per latency ring before the oldest are dropped.
const LATENCY_RING_CAPACITY: usize = 512;

/// `ActionMetrics` aggregates queue outcomes and commit-reveal stage
/// latencies for the lifetime of the process.
pub struct ActionMetrics {
    inner: Mutex<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    totals: ActionTotals,
    by_type: HashMap<String, TypeCounts>,
    revert_taxonomy: HashMap<String, u64>,
    revert_taxonomy_by_type: HashMap<String, HashMap<String, u64>>,
    commit_submit_ms: VecDeque<u64>,
    mine_wait_ms: VecDeque<u64>,
    reveal_submit_ms: VecDeque<u64>,
}

/// Lifetime counters across all action types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTotals {
    pub succeeded: u64,
    pub failed: u64,
    pub queued: u64,
    pub retried: u64,
}

/// Outcome counters for one action type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub succeeded: u64,
    pub failed: u64,
}

/// P95 stage latencies, `None` until the ring has at least one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLatencyPercentiles {
    pub commit_submit_p95: Option<u64>,
    pub mine_wait_p95: Option<u64>,
    pub reveal_submit_p95: Option<u64>,
}

/// A point-in-time copy of every counter, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub totals: ActionTotals,
    pub by_type: HashMap<String, TypeCounts>,
    pub revert_taxonomy: HashMap<String, u64>,
    pub revert_taxonomy_by_type: HashMap<String, HashMap<String, u64>>,
    pub stage_latency_ms: StageLatencyPercentiles,
}

impl ActionMetrics {
    /// Creates an empty metrics collector.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsInner::default()),
        }
    }

    /// Records an accepted enqueue.
    pub fn record_queued(&self) {
        self.lock().totals.queued += 1;
    }

    /// Records a rescheduled attempt.
    pub fn record_retry(&self) {
        self.lock().totals.retried += 1;
    }

    /// Records a terminal success, folding stage latencies into the rings
    /// when the engine reported them.
    pub fn record_succeeded(&self, action_type: &str, receipt: &ActionReceipt) {
        let mut inner = self.lock();
        inner.totals.succeeded += 1;
        inner.by_type.entry(action_type.to_string()).or_default().succeeded += 1;

        if let Some(latency) = receipt.stage_latency() {
            push_sample(&mut inner.commit_submit_ms, latency.commit_submit);
            push_sample(&mut inner.mine_wait_ms, latency.mine_wait);
            push_sample(&mut inner.reveal_submit_ms, latency.reveal_submit);
        }
    }

    /// Records a terminal failure under its taxonomy code.
    pub fn record_failed(&self, action_type: &str, error_code: &str) {
        let mut inner = self.lock();
        inner.totals.failed += 1;
        inner.by_type.entry(action_type.to_string()).or_default().failed += 1;
        *inner.revert_taxonomy.entry(error_code.to_string()).or_default() += 1;
        *inner
            .revert_taxonomy_by_type
            .entry(action_type.to_string())
            .or_default()
            .entry(error_code.to_string())
            .or_default() += 1;
    }

    /// Copies every counter into a serializable snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();
        MetricsSnapshot {
            totals: inner.totals,
            by_type: inner.by_type.clone(),
            revert_taxonomy: inner.revert_taxonomy.clone(),
            revert_taxonomy_by_type: inner.revert_taxonomy_by_type.clone(),
            stage_latency_ms: StageLatencyPercentiles {
                commit_submit_p95: percentile_95(&inner.commit_submit_ms),
                mine_wait_p95: percentile_95(&inner.mine_wait_ms),
                reveal_submit_p95: percentile_95(&inner.reveal_submit_ms),
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsInner> {
        // A poisoned lock only means a panic mid-update; counters stay usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ActionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_sample(ring: &mut VecDeque<u64>, value: u64) {
    if ring.len() == LATENCY_RING_CAPACITY {
        ring.pop_front();
    }
    ring.push_back(value);
}

fn percentile_95(ring: &VecDeque<u64>) -> Option<u64> {
    if ring.is_empty() {
        return None;
    }
    let mut sorted: Vec<u64> = ring.iter().copied().collect();
    sorted.sort_unstable();
    let rank = (sorted.len() as f64 * 0.95).floor() as usize;
    Some(sorted[rank.saturating_sub(1)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use deeprun_shared::types::{ReceiptDetails, StageLatency};

    fn receipt_with_latency(commit: u64, mine: u64, reveal: u64) -> ActionReceipt {
        ActionReceipt {
            code: "OK".to_string(),
            tx_hashes: vec!["0xabc".to_string()],
            delta_events: Vec::new(),
            details: Some(ReceiptDetails {
                stage_latency_ms: Some(StageLatency {
                    commit_submit: commit,
                    mine_wait: mine,
                    reveal_submit: reveal,
                }),
                extra: serde_json::Map::new(),
            }),
        }
    }

    #[test]
    fn test_fresh_metrics_have_no_latency_percentiles() {
        let metrics = ActionMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stage_latency_ms, StageLatencyPercentiles::default());
        assert_eq!(snapshot.totals.succeeded, 0);
    }

    #[test]
    fn test_p95_of_one_hundred_samples() {
        let metrics = ActionMetrics::new();
        // Insert descending so the percentile depends on sorting inside
        // the snapshot, not on insertion order.
        for value in (1..=100).rev() {
            metrics.record_succeeded("start_dungeon", &receipt_with_latency(value, value, value));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stage_latency_ms.commit_submit_p95, Some(95));
        assert_eq!(snapshot.stage_latency_ms.mine_wait_p95, Some(95));
        assert_eq!(snapshot.totals.succeeded, 100);
        assert_eq!(snapshot.by_type["start_dungeon"].succeeded, 100);
    }

    #[test]
    fn test_single_sample_is_its_own_p95() {
        let metrics = ActionMetrics::new();
        metrics.record_succeeded("start_dungeon", &receipt_with_latency(40, 900, 31));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stage_latency_ms.commit_submit_p95, Some(40));
        assert_eq!(snapshot.stage_latency_ms.mine_wait_p95, Some(900));
        assert_eq!(snapshot.stage_latency_ms.reveal_submit_p95, Some(31));
    }

    #[test]
    fn test_rings_drop_oldest_samples_past_capacity() {
        let metrics = ActionMetrics::new();
        for value in 1..=1_000u64 {
            metrics.record_succeeded("open_lootboxes_max", &receipt_with_latency(value, value, value));
        }

        // The ring keeps 489..=1000; rank floor(512 * 0.95) - 1 = 485 lands
        // on 974 after sorting.
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.stage_latency_ms.mine_wait_p95, Some(974));
    }

    #[test]
    fn test_success_without_stage_latency_only_moves_counters() {
        let metrics = ActionMetrics::new();
        metrics.record_succeeded("claim_player", &ActionReceipt::ok(vec!["0x1".to_string()]));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.totals.succeeded, 1);
        assert_eq!(snapshot.stage_latency_ms.commit_submit_p95, None);
    }

    #[test]
    fn test_failures_feed_both_taxonomy_maps() {
        let metrics = ActionMetrics::new();
        metrics.record_failed("start_dungeon", "PRECHECK_RUN_ALREADY_ACTIVE");
        metrics.record_failed("start_dungeon", "PRECHECK_RUN_ALREADY_ACTIVE");
        metrics.record_failed("claim_player", "CHAIN_ALREADY_CLAIMED");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.totals.failed, 3);
        assert_eq!(snapshot.revert_taxonomy["PRECHECK_RUN_ALREADY_ACTIVE"], 2);
        assert_eq!(
            snapshot.revert_taxonomy_by_type["start_dungeon"]["PRECHECK_RUN_ALREADY_ACTIVE"],
            2
        );
        assert_eq!(
            snapshot.revert_taxonomy_by_type["claim_player"]["CHAIN_ALREADY_CLAIMED"],
            1
        );
        assert_eq!(snapshot.by_type["start_dungeon"].failed, 2);
    }

    #[test]
    fn test_snapshot_serializes_with_camel_case_keys() {
        let metrics = ActionMetrics::new();
        metrics.record_queued();
        metrics.record_retry();

        let value = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(value["totals"]["queued"], 1);
        assert_eq!(value["totals"]["retried"], 1);
        assert!(value["revertTaxonomyByType"].is_object());
        assert!(value["stageLatencyMs"]["commitSubmitP95"].is_null());
    }
}
