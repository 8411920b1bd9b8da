//! Action worker pool.
//!
//! Runs a configurable number of identical claim loops against the action
//! queue. Each loop claims one submission at a time, drives it through the
//! engine, and records the outcome. Engine failures are classified into the
//! failure taxonomy to decide between retry and terminal failure; queue
//! persistence failures abort the pool so the supervisor can restart it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::engine::ActionEngine;
use crate::errors::WorkerError;
use crate::metrics::ActionMetrics;
use deeprun_repository::ActionQueue;
use deeprun_shared::taxonomy::classify;

/// Tuning knobs for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent claim loops.
    pub concurrency: usize,
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
    /// Attempts after which a retryable failure becomes terminal.
    pub retry_max: i32,
    /// Base backoff, multiplied by the attempt count before a retry.
    pub retry_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            poll_interval: Duration::from_millis(500),
            retry_max: 3,
            retry_backoff: Duration::from_millis(800),
        }
    }
}

/// What a claim loop should do after one pass.
#[derive(Debug, PartialEq, Eq)]
enum LoopStep {
    /// Nothing claimable; sleep one poll interval.
    Idle,
    /// An action reached a terminal status; claim again immediately.
    Executed,
    /// An action was rescheduled; sleep the attempt-scaled backoff.
    Backoff(Duration),
}

/// `ActionWorker` is responsible for executing queued actions through the
/// engine and recording every outcome on the queue and the metrics.
pub struct ActionWorker {
    queue: Arc<dyn ActionQueue>,
    engine: Arc<dyn ActionEngine>,
    metrics: Arc<ActionMetrics>,
    config: WorkerConfig,
    running: AtomicBool,
}

impl ActionWorker {
    /// Creates a new `ActionWorker` instance.
    ///
    /// # Arguments
    ///
    /// * `queue` - The action queue to claim from and record outcomes on.
    /// * `engine` - The engine that executes claimed actions.
    /// * `metrics` - Shared execution metrics.
    /// * `config` - Pool tuning knobs.
    pub fn new(
        queue: Arc<dyn ActionQueue>,
        engine: Arc<dyn ActionEngine>,
        metrics: Arc<ActionMetrics>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            engine,
            metrics,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Runs the pool until `stop` is called or a queue failure aborts it.
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean stop, or the first `WorkerError` raised by any
    /// claim loop.
    pub async fn run_forever(self: Arc<Self>) -> Result<(), WorkerError> {
        self.running.store(true, Ordering::SeqCst);
        info!(concurrency = self.config.concurrency, "starting action worker pool");

        let mut loops = JoinSet::new();
        for _ in 0..self.config.concurrency {
            let worker = Arc::clone(&self);
            loops.spawn(async move { worker.run_loop().await });
        }

        while let Some(joined) = loops.join_next().await {
            joined??;
        }
        Ok(())
    }

    /// Asks every claim loop to exit after its current pass.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn run_loop(&self) -> Result<(), WorkerError> {
        while self.running.load(Ordering::SeqCst) {
            match self.process_one().await? {
                LoopStep::Idle => tokio::time::sleep(self.config.poll_interval).await,
                LoopStep::Executed => {}
                LoopStep::Backoff(delay) => tokio::time::sleep(delay).await,
            }
        }
        Ok(())
    }

    /// Claims and settles at most one submission.
    async fn process_one(&self) -> Result<LoopStep, WorkerError> {
        let Some(claimed) = self.queue.claim_next().await? else {
            return Ok(LoopStep::Idle);
        };

        match self.engine.execute(&claimed.request).await {
            Ok(receipt) => {
                self.queue.mark_succeeded(claimed.action_id, &receipt).await?;
                self.metrics.record_succeeded(&claimed.action_type, &receipt);
                Ok(LoopStep::Executed)
            }
            Err(err) => {
                let normalized = classify(&format!("{err:#}"));
                if normalized.retryable && claimed.attempts < self.config.retry_max {
                    self.queue
                        .mark_retry(claimed.action_id, normalized.code, &normalized.message)
                        .await?;
                    self.metrics.record_retry();
                    let delay = self.config.retry_backoff * claimed.attempts.max(1) as u32;
                    return Ok(LoopStep::Backoff(delay));
                }

                warn!(
                    action_id = %claimed.action_id,
                    action_type = %claimed.action_type,
                    code = normalized.code,
                    "action failed terminally"
                );
                self.queue
                    .mark_failed(claimed.action_id, normalized.code, &normalized.message)
                    .await?;
                self.metrics.record_failed(&claimed.action_type, normalized.code);
                Ok(LoopStep::Executed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use uuid::Uuid;

    use deeprun_repository::errors::ActionQueueError;
    use deeprun_shared::types::{
        ActionInput, ActionReceipt, ActionStatus, ActionSubmission,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Transition {
        Succeeded(Uuid, String),
        Retry(Uuid, String),
        Failed(Uuid, String),
    }

    #[derive(Default)]
    struct MockQueue {
        claims: Mutex<VecDeque<ActionSubmission>>,
        transitions: Mutex<Vec<Transition>>,
    }

    impl MockQueue {
        fn with_claims(claims: Vec<ActionSubmission>) -> Self {
            Self {
                claims: Mutex::new(claims.into()),
                transitions: Mutex::new(Vec::new()),
            }
        }

        fn transitions(&self) -> Vec<Transition> {
            self.transitions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionQueue for MockQueue {
        async fn enqueue(
            &self,
            _: &str,
            _: Option<&str>,
            _: &ActionInput,
        ) -> Result<ActionSubmission, ActionQueueError> {
            unimplemented!("not exercised by the worker")
        }

        async fn claim_next(&self) -> Result<Option<ActionSubmission>, ActionQueueError> {
            Ok(self.claims.lock().unwrap().pop_front())
        }

        async fn mark_succeeded(
            &self,
            action_id: Uuid,
            receipt: &ActionReceipt,
        ) -> Result<(), ActionQueueError> {
            self.transitions
                .lock()
                .unwrap()
                .push(Transition::Succeeded(action_id, receipt.code.clone()));
            Ok(())
        }

        async fn mark_retry(
            &self,
            action_id: Uuid,
            error_code: &str,
            _: &str,
        ) -> Result<(), ActionQueueError> {
            self.transitions
                .lock()
                .unwrap()
                .push(Transition::Retry(action_id, error_code.to_string()));
            Ok(())
        }

        async fn mark_failed(
            &self,
            action_id: Uuid,
            error_code: &str,
            _: &str,
        ) -> Result<(), ActionQueueError> {
            self.transitions
                .lock()
                .unwrap()
                .push(Transition::Failed(action_id, error_code.to_string()));
            Ok(())
        }

        async fn get_by_id(&self, _: Uuid) -> Result<Option<ActionSubmission>, ActionQueueError> {
            Ok(None)
        }

        async fn get_by_signer_and_key(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<ActionSubmission>, ActionQueueError> {
            Ok(None)
        }

        async fn get_latest_by_character(
            &self,
            _: i64,
        ) -> Result<Option<ActionSubmission>, ActionQueueError> {
            Ok(None)
        }
    }

    struct MockEngine {
        outcomes: Mutex<VecDeque<anyhow::Result<ActionReceipt>>>,
    }

    impl MockEngine {
        fn scripted(outcomes: Vec<anyhow::Result<ActionReceipt>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait]
    impl ActionEngine for MockEngine {
        async fn execute(&self, _: &ActionInput) -> anyhow::Result<ActionReceipt> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ActionReceipt::ok(Vec::new())))
        }
    }

    fn claimed(attempts: i32) -> ActionSubmission {
        ActionSubmission {
            action_id: Uuid::new_v4(),
            signer: "0x00000000000000000000000000000000000000aa".to_string(),
            idempotency_key: Uuid::new_v4().to_string(),
            action_type: "start_dungeon".to_string(),
            request: ActionInput::StartDungeon {
                character_id: 9,
                difficulty: 2,
                dungeon_level: 5,
                variance_mode: 1,
            },
            conflict_key: Some("character:9".to_string()),
            status: ActionStatus::Running,
            result: None,
            error_code: None,
            error_message: None,
            attempts,
            tx_hashes: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn worker(queue: MockQueue, engine: MockEngine, config: WorkerConfig) -> Arc<ActionWorker> {
        Arc::new(ActionWorker::new(
            Arc::new(queue),
            Arc::new(engine),
            Arc::new(ActionMetrics::new()),
            config,
        ))
    }

    #[tokio::test]
    async fn test_empty_queue_idles() {
        let worker = worker(
            MockQueue::default(),
            MockEngine::scripted(Vec::new()),
            WorkerConfig::default(),
        );

        assert_eq!(worker.process_one().await.unwrap(), LoopStep::Idle);
    }

    #[tokio::test]
    async fn test_success_marks_succeeded_and_records_metrics() {
        let submission = claimed(1);
        let action_id = submission.action_id;
        let queue = Arc::new(MockQueue::with_claims(vec![submission]));
        let engine = MockEngine::scripted(vec![Ok(ActionReceipt::ok(vec!["0xf00".to_string()]))]);
        let worker = Arc::new(ActionWorker::new(
            queue.clone(),
            Arc::new(engine),
            Arc::new(ActionMetrics::new()),
            WorkerConfig::default(),
        ));

        let step = worker.process_one().await.unwrap();

        assert_eq!(step, LoopStep::Executed);
        assert_eq!(
            queue.transitions(),
            vec![Transition::Succeeded(action_id, "OK".to_string())]
        );
        let snapshot = worker.metrics.snapshot();
        assert_eq!(snapshot.totals.succeeded, 1);
        assert_eq!(snapshot.by_type["start_dungeon"].succeeded, 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_under_max_backs_off_by_attempts() {
        let submission = claimed(2);
        let action_id = submission.action_id;
        let queue = Arc::new(MockQueue::with_claims(vec![submission]));
        let engine = MockEngine::scripted(vec![Err(anyhow!("429 Too Many Requests"))]);
        let worker = Arc::new(ActionWorker::new(
            queue.clone(),
            Arc::new(engine),
            Arc::new(ActionMetrics::new()),
            WorkerConfig::default(),
        ));

        let step = worker.process_one().await.unwrap();

        assert_eq!(step, LoopStep::Backoff(Duration::from_millis(1_600)));
        assert_eq!(
            queue.transitions(),
            vec![Transition::Retry(action_id, "INFRA_RATE_LIMIT".to_string())]
        );
        assert_eq!(worker.metrics.snapshot().totals.retried, 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_at_max_attempts_fails_terminally() {
        let submission = claimed(3);
        let action_id = submission.action_id;
        let queue = Arc::new(MockQueue::with_claims(vec![submission]));
        let engine = MockEngine::scripted(vec![Err(anyhow!("request timed out"))]);
        let worker = Arc::new(ActionWorker::new(
            queue.clone(),
            Arc::new(engine),
            Arc::new(ActionMetrics::new()),
            WorkerConfig::default(),
        ));

        let step = worker.process_one().await.unwrap();

        assert_eq!(step, LoopStep::Executed);
        assert_eq!(
            queue.transitions(),
            vec![Transition::Failed(
                action_id,
                "INFRA_TRANSIENT_ERROR".to_string()
            )]
        );
        let snapshot = worker.metrics.snapshot();
        assert_eq!(snapshot.totals.failed, 1);
        assert_eq!(
            snapshot.revert_taxonomy_by_type["start_dungeon"]["INFRA_TRANSIENT_ERROR"],
            1
        );
    }

    #[tokio::test]
    async fn test_non_retryable_revert_never_retries() {
        let submission = claimed(1);
        let action_id = submission.action_id;
        let queue = Arc::new(MockQueue::with_claims(vec![submission]));
        let engine = MockEngine::scripted(vec![Err(anyhow!(
            "execution reverted: CharacterNotFound(9)"
        ))]);
        let worker = Arc::new(ActionWorker::new(
            queue.clone(),
            Arc::new(engine),
            Arc::new(ActionMetrics::new()),
            WorkerConfig::default(),
        ));

        let step = worker.process_one().await.unwrap();

        assert_eq!(step, LoopStep::Executed);
        assert_eq!(
            queue.transitions(),
            vec![Transition::Failed(
                action_id,
                "PRECHECK_CHARACTER_NOT_FOUND".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_stop_lets_every_loop_drain() {
        let worker = worker(
            MockQueue::default(),
            MockEngine::scripted(Vec::new()),
            WorkerConfig {
                concurrency: 3,
                poll_interval: Duration::from_millis(1),
                ..WorkerConfig::default()
            },
        );

        let running = Arc::clone(&worker);
        let handle = tokio::spawn(async move { running.run_forever().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        worker.stop();

        let joined = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("pool should stop promptly")
            .expect("task should not panic");
        assert!(joined.is_ok());
    }
}
