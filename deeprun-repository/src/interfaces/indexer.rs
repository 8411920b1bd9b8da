//! This module defines the `IndexerStore` trait, which provides an interface
//! for persisting indexer progress and the chain-derived read model.
//! It abstracts cursor tracking, processed-log markers, and per-table upserts.
use deeprun_shared::leaderboard::{LeaderboardCursor, LeaderboardRow};
use deeprun_shared::types::DecodedLog;

use crate::errors::IndexerStoreError;

/// Resume position of an indexer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerCursor {
    pub last_processed_block: u64,
    pub last_processed_log_index: i64,
}

/// Row shape for the three tables seeded when a character is minted.
#[derive(Debug, Clone)]
pub struct CharacterCreatedRecord {
    pub character_id: i64,
    pub owner: String,
    pub race: i16,
    pub class_type: i16,
    pub name: String,
    pub level_up_epoch: i64,
    pub block_number: i64,
}

/// Row shape for the `character_levels` table.
#[derive(Debug, Clone)]
pub struct CharacterLevelRecord {
    pub character_id: i64,
    pub owner: String,
    pub best_level: i32,
    pub last_level_up_epoch: i64,
    pub block_number: i64,
}

/// Row shape for the `lootbox_credits` table, one row per character and tier.
#[derive(Debug, Clone)]
pub struct LootboxCreditsRecord {
    pub character_id: i64,
    pub tier: i16,
    pub total: i32,
    pub bound_stable: i32,
    pub bound_neutral: i32,
    pub bound_swingy: i32,
    pub block_number: i64,
}

/// Row shape for the `character_equipment` table, one row per character and slot.
#[derive(Debug, Clone)]
pub struct EquipmentRecord {
    pub character_id: i64,
    pub slot: i16,
    pub item_id: String,
    pub block_number: i64,
}

/// Row shape for the `epoch_states` table.
#[derive(Debug, Clone)]
pub struct EpochStateRecord {
    pub epoch_id: i64,
    pub finalized: bool,
    pub cutoff_level: i32,
    pub total_eligible_weight: String,
    pub fees_for_players: String,
    pub fees_for_deployer: String,
    pub block_number: i64,
}

/// Row shape for the `epoch_claims` table. Deployer claims are stored under
/// character id zero since they are not tied to any character.
#[derive(Debug, Clone)]
pub struct EpochClaimRecord {
    pub epoch_id: i64,
    pub character_id: i64,
    pub claimant: String,
    pub amount: String,
    pub tx_hash: String,
    pub block_number: i64,
}

/// Row shape for the `rfqs` table.
#[derive(Debug, Clone)]
pub struct RfqRecord {
    pub rfq_id: i64,
    pub maker: String,
    pub slot: i16,
    pub min_tier: i16,
    pub set_mask: String,
    pub mmo_offered: String,
    pub expiry: i64,
    pub active: bool,
    pub filled: bool,
    pub block_number: i64,
}

/// Row shape for the `trade_offers` table. Item id lists are stored as JSONB
/// arrays of decimal strings.
#[derive(Debug, Clone)]
pub struct TradeOfferRecord {
    pub offer_id: i64,
    pub maker: String,
    pub requested_mmo: String,
    pub offered_item_ids: Vec<String>,
    pub requested_item_ids: Vec<String>,
    pub active: bool,
    pub block_number: i64,
}

/// A trait that defines the interface for the indexer's persistence layer.
///
/// This trait provides a clean abstraction over the underlying data store for
/// the chain indexer. It covers cursor retrieval and persistence, exactly-once
/// processed-log markers, and the upserts that maintain the read model.
#[async_trait::async_trait]
pub trait IndexerStore: Send + Sync {
    /// Fetches the cursor for a stream, seeding it at `default_block` with log
    /// index -1 when no row exists yet.
    async fn get_cursor(
        &self,
        name: &str,
        default_block: u64,
    ) -> Result<IndexerCursor, IndexerStoreError>;

    /// Persists the cursor for a stream.
    async fn set_cursor(
        &self,
        name: &str,
        block_number: u64,
        log_index: i64,
    ) -> Result<(), IndexerStoreError>;

    /// Records that a log is being processed.
    ///
    /// Returns `true` when the marker was newly inserted and `false` when the
    /// log was already recorded, in which case the caller must skip it.
    async fn mark_processed(&self, log: &DecodedLog) -> Result<bool, IndexerStoreError>;

    /// Removes a processed-log marker after a failed handler, so the log is
    /// retried on the next tick.
    async fn unmark_processed(&self, log: &DecodedLog) -> Result<(), IndexerStoreError>;

    /// Seeds the character, level, and upgrade-stone rows for a new character.
    async fn upsert_character_created(
        &self,
        record: &CharacterCreatedRecord,
    ) -> Result<(), IndexerStoreError>;

    /// Upserts a character's level row.
    async fn upsert_character_level(
        &self,
        record: &CharacterLevelRecord,
    ) -> Result<(), IndexerStoreError>;

    /// Upserts a character's lootbox credit counts for one tier.
    async fn upsert_lootbox_credits(
        &self,
        record: &LootboxCreditsRecord,
    ) -> Result<(), IndexerStoreError>;

    /// Upserts the item equipped in one of a character's slots.
    async fn upsert_equipment(&self, record: &EquipmentRecord) -> Result<(), IndexerStoreError>;

    /// Upserts a character's upgrade stone balance.
    async fn upsert_upgrade_stones(
        &self,
        character_id: i64,
        balance: i32,
        block_number: i64,
    ) -> Result<(), IndexerStoreError>;

    /// Upserts a leaderboard epoch's finalization state.
    async fn upsert_epoch_state(&self, record: &EpochStateRecord)
    -> Result<(), IndexerStoreError>;

    /// Upserts an epoch claim row.
    async fn upsert_epoch_claim(&self, record: &EpochClaimRecord)
    -> Result<(), IndexerStoreError>;

    /// Upserts an RFQ row.
    async fn upsert_rfq(&self, record: &RfqRecord) -> Result<(), IndexerStoreError>;

    /// Updates an RFQ's lifecycle flags. `filled` is left unchanged when `None`.
    async fn set_rfq_status(
        &self,
        rfq_id: i64,
        active: bool,
        filled: Option<bool>,
        block_number: i64,
    ) -> Result<(), IndexerStoreError>;

    /// Upserts a trade offer row.
    async fn upsert_trade_offer(&self, record: &TradeOfferRecord)
    -> Result<(), IndexerStoreError>;

    /// Marks a trade offer active or inactive.
    async fn set_trade_offer_active(
        &self,
        offer_id: i64,
        active: bool,
        block_number: i64,
    ) -> Result<(), IndexerStoreError>;

    /// Appends a compact per-event delta row, attributed to a character when
    /// the event names one.
    async fn insert_event_delta(
        &self,
        log: &DecodedLog,
        character_id: Option<i64>,
    ) -> Result<(), IndexerStoreError>;

    /// Lists leaderboard rows ordered by best level descending, character id
    /// ascending, resuming after the given cursor position.
    async fn list_leaderboard(
        &self,
        limit: i64,
        after: Option<&LeaderboardCursor>,
    ) -> Result<Vec<LeaderboardRow>, IndexerStoreError>;

    /// Discards all indexed state and queued actions after a chain reset.
    ///
    /// Truncates the read model, processed-log markers, and submissions in one
    /// transaction, then re-seeds the cursor just below the current safe head.
    async fn reset_for_chain_restart(
        &self,
        name: &str,
        safe_head: u64,
    ) -> Result<(), IndexerStoreError>;
}
