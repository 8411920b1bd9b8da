//! Chain event indexer for the deeprun pipeline.
//!
//! Polls the RPC endpoint for logs from the watched game contracts, decodes
//! them into world events and folds them into the read model, advancing a
//! persistent cursor chunk by chunk. Provider quirks are absorbed inside the
//! fetch loop: an oversized range halves the chunk and retries, a rate limit
//! backs off with growing delays. A handler failure rolls back the
//! processed-log marker and aborts the tick before the cursor moves, so the
//! log is replayed on the next poll.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::chain::ChainClient;
use crate::errors::{ChainClientError, IndexerError};
use deeprun_repository::IndexerStore;

mod apply;

/// Tuning for the chain indexer loop.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Name of the cursor row this indexer advances.
    pub stream_name: String,

    /// First block of interest. The cursor seeds one block below it so the
    /// first tick starts here.
    pub start_block: u64,

    /// Initial `eth_getLogs` window size in blocks.
    pub block_chunk: u64,

    /// Ceiling on blocks processed in one tick, bounding catch-up bursts.
    pub max_blocks_per_tick: u64,

    /// Delay between ticks.
    pub poll_interval: Duration,

    /// Base delay after a rate-limited log fetch, scaled by the attempt
    /// number.
    pub rate_limit_backoff: Duration,

    /// Rate-limited fetches tolerated per range before the tick fails.
    pub rate_limit_retry_max: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            stream_name: "deeprun_main".to_string(),
            start_block: 1,
            block_chunk: 200,
            max_blocks_per_tick: 2_000,
            poll_interval: Duration::from_millis(1_500),
            rate_limit_backoff: Duration::from_millis(500),
            rate_limit_retry_max: 4,
        }
    }
}

/// The `ChainIndexer` is responsible for keeping the read model in sync with
/// the deployed game contracts.
///
/// Each tick walks the span between the persisted cursor and the
/// confirmation-adjusted chain head in chunks, applying the decoded logs in
/// block and log-index order and writing the cursor once per chunk. Crash
/// recovery leans on the processed-log markers: a chunk replayed after a
/// partial failure skips the logs that already landed.
pub struct ChainIndexer {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn IndexerStore>,
    config: IndexerConfig,
    running: AtomicBool,
}

impl ChainIndexer {
    /// Creates a new `ChainIndexer`.
    ///
    /// # Arguments
    ///
    /// * `chain` - Client used to fetch heads, logs, and refresh reads.
    /// * `store` - Persistence for the cursor, markers, and read model.
    /// * `config` - Loop tuning.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn IndexerStore>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            chain,
            store,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Runs the indexer until [`stop`](Self::stop) is called.
    ///
    /// A failed tick is logged and retried on the next poll; the cursor only
    /// ever advances past fully applied chunks, so no log is lost to an
    /// error.
    pub async fn run_forever(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(
            stream = %self.config.stream_name,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "chain indexer started"
        );

        while self.running.load(Ordering::SeqCst) {
            if let Err(err) = self.tick().await {
                error!(error = %err, "indexer tick failed");
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        info!("chain indexer stopped");
    }

    /// Signals the polling loop to exit after the tick in flight.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Processes every block between the cursor and the safe head, capped at
    /// `max_blocks_per_tick`.
    ///
    /// The range is fetched in chunks. Each chunk's logs are sorted, decoded,
    /// marked, and applied one at a time; the cursor is persisted after the
    /// chunk even when it held no logs. If applying a log fails its marker is
    /// removed and the tick aborts with the cursor still pointing below the
    /// chunk, which makes the next tick fetch the same span again.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the walk reached the effective head, or an
    /// `IndexerError` carrying the first fetch, read, or write failure.
    #[instrument(skip(self), fields(stream = %self.config.stream_name))]
    pub async fn tick(&self) -> Result<(), IndexerError> {
        let default_block = self.config.start_block.saturating_sub(1);
        let cursor = self
            .store
            .get_cursor(&self.config.stream_name, default_block)
            .await?;
        let safe_head = self.chain.safe_head().await?;

        let effective_head = safe_head.min(
            cursor
                .last_processed_block
                .saturating_add(self.config.max_blocks_per_tick),
        );
        if effective_head <= cursor.last_processed_block {
            return Ok(());
        }

        let mut from_block = cursor.last_processed_block + 1;
        // The chunk shrinks for the rest of the tick once a provider rejects
        // a range, and resets on the next tick.
        let mut chunk = self.config.block_chunk.max(1);

        'chunks: while from_block <= effective_head {
            let to_block = from_block.saturating_add(chunk - 1).min(effective_head);

            let mut rate_limit_attempt = 0u32;
            let mut logs = loop {
                match self.chain.fetch_logs(from_block, to_block).await {
                    Ok(logs) => break logs,
                    Err(err) if is_range_limit_error(&err) && chunk > 1 => {
                        chunk = (chunk / 2).max(1);
                        warn!(
                            from_block,
                            to_block, chunk, "log range rejected, halving the chunk"
                        );
                        continue 'chunks;
                    }
                    Err(err)
                        if is_rate_limit_error(&err)
                            && rate_limit_attempt < self.config.rate_limit_retry_max =>
                    {
                        rate_limit_attempt += 1;
                        warn!(
                            from_block,
                            to_block,
                            attempt = rate_limit_attempt,
                            "log fetch rate limited, backing off"
                        );
                        tokio::time::sleep(self.config.rate_limit_backoff * rate_limit_attempt)
                            .await;
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            logs.sort_by_key(|log| (log.block_number, log.log_index));

            for log in &logs {
                let Some(decoded) = self.chain.decode_log(log) else {
                    continue;
                };
                if !self.store.mark_processed(&decoded).await? {
                    continue;
                }
                if let Err(err) =
                    apply::apply_event(self.chain.as_ref(), self.store.as_ref(), &decoded).await
                {
                    self.store.unmark_processed(&decoded).await?;
                    return Err(err);
                }
            }

            self.store
                .set_cursor(&self.config.stream_name, to_block, -1)
                .await?;
            from_block = to_block + 1;
        }

        Ok(())
    }
}

/// Matches the provider messages that mean the requested log range is wider
/// than the endpoint allows. Wording varies by provider, so the match is
/// deliberately fuzzy.
fn is_range_limit_error(err: &ChainClientError) -> bool {
    let text = err.to_string().to_lowercase();
    text.contains("eth_getlogs") && (text.contains("block range") || text.contains("up to a"))
}

/// Matches the provider messages that mean the endpoint is shedding load.
fn is_rate_limit_error(err: &ChainClientError) -> bool {
    let text = err.to_string().to_lowercase();
    ["429", "too many requests", "rate limit", "rate-limit", "max requests"]
        .iter()
        .any(|needle| text.contains(needle))
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    use alloy::primitives::{Address, B256, Bytes, U256};
    use async_trait::async_trait;

    use super::*;
    use crate::chain::{FeeEstimate, RawLog};
    use deeprun_repository::interfaces::{
        CharacterCreatedRecord, CharacterLevelRecord, EpochClaimRecord, EpochStateRecord,
        EquipmentRecord, IndexerCursor, LootboxCreditsRecord, RfqRecord, TradeOfferRecord,
    };
    use deeprun_repository::IndexerStoreError;
    use deeprun_shared::leaderboard::{LeaderboardCursor, LeaderboardRow};
    use deeprun_shared::types::{ActionInput, DecodedLog, WorldEvent};

    struct MockChain {
        safe_head: u64,
        fetch_results: Mutex<VecDeque<Result<Vec<RawLog>, ChainClientError>>>,
        fetch_calls: Mutex<Vec<(u64, u64)>>,
    }

    impl MockChain {
        fn new(safe_head: u64, results: Vec<Result<Vec<RawLog>, ChainClientError>>) -> Self {
            Self {
                safe_head,
                fetch_results: Mutex::new(results.into_iter().collect()),
                fetch_calls: Mutex::new(Vec::new()),
            }
        }

        fn fetch_calls(&self) -> Vec<(u64, u64)> {
            self.fetch_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn safe_head(&self) -> Result<u64, ChainClientError> {
            Ok(self.safe_head)
        }

        async fn fetch_logs(
            &self,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<RawLog>, ChainClientError> {
            self.fetch_calls.lock().unwrap().push((from_block, to_block));
            self.fetch_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn decode_log(&self, log: &RawLog) -> Option<DecodedLog> {
            // Zeroed first topic marks a log the tests want skipped.
            if log.topics.first() == Some(&B256::ZERO) {
                return None;
            }
            Some(DecodedLog {
                address: log.address,
                block_number: log.block_number,
                block_hash: log.block_hash,
                log_index: log.log_index,
                transaction_hash: log.transaction_hash,
                event: WorldEvent::DungeonFinished {
                    character_id: U256::from(log.block_number * 10 + log.log_index),
                    dungeon_level: 1,
                    success: true,
                    rooms_cleared: 5,
                    room_count: 5,
                },
            })
        }

        async fn fee_estimate(&self) -> Result<FeeEstimate, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn native_balance(&self, _address: Address) -> Result<U256, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn owner_of_character(
            &self,
            _character_id: U256,
        ) -> Result<Address, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn character_last_level_up_epoch(
            &self,
            _character_id: U256,
        ) -> Result<u32, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn lootbox_credits(
            &self,
            _character_id: U256,
            _tier: u32,
        ) -> Result<u32, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn lootbox_bound_credits(
            &self,
            _character_id: U256,
            _tier: u32,
            _variance_mode: u8,
        ) -> Result<u32, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upgrade_stone_balance(&self, _character_id: U256) -> Result<u32, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn commit_fee(&self) -> Result<U256, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn premium_purchase_quote(
            &self,
            _character_id: U256,
            _difficulty: u8,
            _amount: u16,
        ) -> Result<U256, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn trade_escrow_create_fee(&self) -> Result<U256, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn rfq_create_fee(&self) -> Result<U256, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }

        async fn estimate_action_gas(
            &self,
            _action: &ActionInput,
            _value: U256,
        ) -> Result<u64, ChainClientError> {
            unimplemented!("not used by indexer tests")
        }
    }

    #[derive(Default)]
    struct MockStore {
        cursor: Mutex<Option<IndexerCursor>>,
        cursor_writes: Mutex<Vec<(u64, i64)>>,
        marked: Mutex<Vec<(u64, u64)>>,
        unmarked: Mutex<Vec<(u64, u64)>>,
        already_processed: Mutex<HashSet<(u64, u64)>>,
        deltas: Mutex<Vec<Option<i64>>>,
        fail_delta_for_character: Option<i64>,
    }

    impl MockStore {
        fn with_cursor(block: u64) -> Self {
            let store = Self::default();
            *store.cursor.lock().unwrap() = Some(IndexerCursor {
                last_processed_block: block,
                last_processed_log_index: -1,
            });
            store
        }

        fn cursor_writes(&self) -> Vec<(u64, i64)> {
            self.cursor_writes.lock().unwrap().clone()
        }

        fn marked(&self) -> Vec<(u64, u64)> {
            self.marked.lock().unwrap().clone()
        }

        fn unmarked(&self) -> Vec<(u64, u64)> {
            self.unmarked.lock().unwrap().clone()
        }

        fn deltas(&self) -> Vec<Option<i64>> {
            self.deltas.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IndexerStore for MockStore {
        async fn get_cursor(
            &self,
            _name: &str,
            default_block: u64,
        ) -> Result<IndexerCursor, IndexerStoreError> {
            Ok(self.cursor.lock().unwrap().unwrap_or(IndexerCursor {
                last_processed_block: default_block,
                last_processed_log_index: -1,
            }))
        }

        async fn set_cursor(
            &self,
            _name: &str,
            block_number: u64,
            log_index: i64,
        ) -> Result<(), IndexerStoreError> {
            *self.cursor.lock().unwrap() = Some(IndexerCursor {
                last_processed_block: block_number,
                last_processed_log_index: log_index,
            });
            self.cursor_writes
                .lock()
                .unwrap()
                .push((block_number, log_index));
            Ok(())
        }

        async fn mark_processed(&self, log: &DecodedLog) -> Result<bool, IndexerStoreError> {
            let key = (log.block_number, log.log_index);
            if self.already_processed.lock().unwrap().contains(&key) {
                return Ok(false);
            }
            self.marked.lock().unwrap().push(key);
            Ok(true)
        }

        async fn unmark_processed(&self, log: &DecodedLog) -> Result<(), IndexerStoreError> {
            self.unmarked
                .lock()
                .unwrap()
                .push((log.block_number, log.log_index));
            Ok(())
        }

        async fn upsert_character_created(
            &self,
            _record: &CharacterCreatedRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_character_level(
            &self,
            _record: &CharacterLevelRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_lootbox_credits(
            &self,
            _record: &LootboxCreditsRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_equipment(&self, _record: &EquipmentRecord) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_upgrade_stones(
            &self,
            _character_id: i64,
            _balance: i32,
            _block_number: i64,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_epoch_state(
            &self,
            _record: &EpochStateRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_epoch_claim(
            &self,
            _record: &EpochClaimRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_rfq(&self, _record: &RfqRecord) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn set_rfq_status(
            &self,
            _rfq_id: i64,
            _active: bool,
            _filled: Option<bool>,
            _block_number: i64,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn upsert_trade_offer(
            &self,
            _record: &TradeOfferRecord,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn set_trade_offer_active(
            &self,
            _offer_id: i64,
            _active: bool,
            _block_number: i64,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn insert_event_delta(
            &self,
            _log: &DecodedLog,
            character_id: Option<i64>,
        ) -> Result<(), IndexerStoreError> {
            if self.fail_delta_for_character.is_some()
                && character_id == self.fail_delta_for_character
            {
                return Err(IndexerStoreError::InvalidRow(
                    "scripted delta failure".to_string(),
                ));
            }
            self.deltas.lock().unwrap().push(character_id);
            Ok(())
        }

        async fn list_leaderboard(
            &self,
            _limit: i64,
            _after: Option<&LeaderboardCursor>,
        ) -> Result<Vec<LeaderboardRow>, IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }

        async fn reset_for_chain_restart(
            &self,
            _name: &str,
            _safe_head: u64,
        ) -> Result<(), IndexerStoreError> {
            unimplemented!("not used by indexer tests")
        }
    }

    fn raw_log(block_number: u64, log_index: u64) -> RawLog {
        RawLog {
            address: Address::repeat_byte(0x11),
            topics: vec![B256::repeat_byte(0x22)],
            data: Bytes::new(),
            block_number,
            block_hash: B256::repeat_byte(0x33),
            log_index,
            transaction_hash: B256::repeat_byte(0x44),
        }
    }

    fn undecodable_log(block_number: u64, log_index: u64) -> RawLog {
        RawLog {
            topics: vec![B256::ZERO],
            ..raw_log(block_number, log_index)
        }
    }

    fn provider_error(message: &str) -> ChainClientError {
        // The detectors only look at rendered text, so the variant is
        // irrelevant here.
        ChainClientError::NotEstimable(message.to_string())
    }

    fn range_limit_error() -> ChainClientError {
        provider_error("eth_getLogs is limited to a 500 block range")
    }

    fn rate_limit_error() -> ChainClientError {
        provider_error("429 Too Many Requests")
    }

    fn test_config(block_chunk: u64) -> IndexerConfig {
        IndexerConfig {
            block_chunk,
            poll_interval: Duration::from_millis(1),
            rate_limit_backoff: Duration::from_millis(1),
            ..IndexerConfig::default()
        }
    }

    fn indexer(chain: Arc<MockChain>, store: Arc<MockStore>, config: IndexerConfig) -> ChainIndexer {
        ChainIndexer::new(chain, store, config)
    }

    #[tokio::test]
    async fn test_tick_noops_when_cursor_is_at_the_safe_head() {
        let chain = Arc::new(MockChain::new(100, Vec::new()));
        let store = Arc::new(MockStore::with_cursor(100));
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        assert!(chain.fetch_calls().is_empty());
        assert!(store.cursor_writes().is_empty());
    }

    #[tokio::test]
    async fn test_tick_walks_the_range_in_chunks() {
        let chain = Arc::new(MockChain::new(25, Vec::new()));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        assert_eq!(chain.fetch_calls(), vec![(1, 10), (11, 20), (21, 25)]);
        assert_eq!(store.cursor_writes(), vec![(10, -1), (20, -1), (25, -1)]);
    }

    #[tokio::test]
    async fn test_catch_up_is_capped_per_tick() {
        let chain = Arc::new(MockChain::new(100_000, Vec::new()));
        let store = Arc::new(MockStore::default());
        let config = IndexerConfig {
            max_blocks_per_tick: 10,
            ..test_config(10)
        };
        let indexer = indexer(chain.clone(), store.clone(), config);

        indexer.tick().await.unwrap();

        assert_eq!(chain.fetch_calls(), vec![(1, 10)]);
        assert_eq!(store.cursor_writes(), vec![(10, -1)]);
    }

    #[tokio::test]
    async fn test_range_limit_halves_the_chunk_and_retries() {
        let chain = Arc::new(MockChain::new(8, vec![Err(range_limit_error())]));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(8));

        indexer.tick().await.unwrap();

        // The rejected [1, 8] fetch is retried as two four-block windows.
        assert_eq!(chain.fetch_calls(), vec![(1, 8), (1, 4), (5, 8)]);
        assert_eq!(store.cursor_writes(), vec![(4, -1), (8, -1)]);
    }

    #[tokio::test]
    async fn test_range_limit_at_single_block_chunk_propagates() {
        let chain = Arc::new(MockChain::new(5, vec![Err(range_limit_error())]));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(1));

        let result = indexer.tick().await;

        assert!(matches!(result, Err(IndexerError::Chain(_))));
        assert_eq!(chain.fetch_calls(), vec![(1, 1)]);
        assert!(store.cursor_writes().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_backs_off_then_succeeds() {
        let chain = Arc::new(MockChain::new(5, vec![
            Err(rate_limit_error()),
            Err(rate_limit_error()),
            Ok(Vec::new()),
        ]));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        assert_eq!(chain.fetch_calls(), vec![(1, 5), (1, 5), (1, 5)]);
        assert_eq!(store.cursor_writes(), vec![(5, -1)]);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries_and_propagates() {
        let chain = Arc::new(MockChain::new(5, vec![
            Err(rate_limit_error()),
            Err(rate_limit_error()),
            Err(rate_limit_error()),
        ]));
        let store = Arc::new(MockStore::default());
        let config = IndexerConfig {
            rate_limit_retry_max: 2,
            ..test_config(10)
        };
        let indexer = indexer(chain.clone(), store.clone(), config);

        let result = indexer.tick().await;

        assert!(matches!(result, Err(IndexerError::Chain(_))));
        assert_eq!(chain.fetch_calls().len(), 3);
        assert!(store.cursor_writes().is_empty());
    }

    #[tokio::test]
    async fn test_logs_apply_in_order_and_advance_the_cursor() {
        let batch = vec![raw_log(2, 0), raw_log(1, 1), raw_log(1, 0)];
        let chain = Arc::new(MockChain::new(3, vec![Ok(batch)]));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        // Character ids encode (block * 10 + log index), so order is visible.
        assert_eq!(store.deltas(), vec![Some(10), Some(11), Some(20)]);
        assert_eq!(store.marked(), vec![(1, 0), (1, 1), (2, 0)]);
        assert_eq!(store.cursor_writes(), vec![(3, -1)]);
    }

    #[tokio::test]
    async fn test_already_processed_logs_are_skipped() {
        let chain = Arc::new(MockChain::new(1, vec![Ok(vec![raw_log(1, 0), raw_log(1, 1)])]));
        let store = Arc::new(MockStore::default());
        store.already_processed.lock().unwrap().insert((1, 0));
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        assert_eq!(store.deltas(), vec![Some(11)]);
        assert_eq!(store.marked(), vec![(1, 1)]);
        assert_eq!(store.cursor_writes(), vec![(1, -1)]);
    }

    #[tokio::test]
    async fn test_undecodable_logs_are_skipped_but_the_cursor_advances() {
        let chain = Arc::new(MockChain::new(1, vec![Ok(vec![undecodable_log(1, 0)])]));
        let store = Arc::new(MockStore::default());
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        indexer.tick().await.unwrap();

        assert!(store.deltas().is_empty());
        assert!(store.marked().is_empty());
        assert_eq!(store.cursor_writes(), vec![(1, -1)]);
    }

    #[tokio::test]
    async fn test_apply_failure_unmarks_the_log_and_leaves_the_cursor() {
        let chain = Arc::new(MockChain::new(1, vec![Ok(vec![raw_log(1, 0), raw_log(1, 1)])]));
        let mut store = MockStore::default();
        store.fail_delta_for_character = Some(10);
        let store = Arc::new(store);
        let indexer = indexer(chain.clone(), store.clone(), test_config(10));

        let result = indexer.tick().await;

        assert!(matches!(result, Err(IndexerError::Store(_))));
        assert_eq!(store.marked(), vec![(1, 0)]);
        assert_eq!(store.unmarked(), vec![(1, 0)]);
        assert!(store.deltas().is_empty());
        assert!(store.cursor_writes().is_empty());
    }

    #[tokio::test]
    async fn test_stop_ends_the_polling_loop() {
        let chain = Arc::new(MockChain::new(0, Vec::new()));
        let store = Arc::new(MockStore::default());
        let indexer = Arc::new(ChainIndexer::new(
            chain,
            store,
            test_config(10),
        ));

        let runner = {
            let indexer = indexer.clone();
            tokio::spawn(async move { indexer.run_forever().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        indexer.stop();

        tokio::time::timeout(Duration::from_secs(1), runner)
            .await
            .expect("indexer loop should exit after stop")
            .unwrap();
    }
}
