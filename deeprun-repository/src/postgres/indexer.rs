//! PostgreSQL implementation of the indexer store.
//!
//! Provides a production-ready PostgreSQL backend for the `IndexerStore` trait.
//! Cursor rows and processed-log markers give the indexer crash-safe,
//! exactly-once application, and every read-model write is an idempotent upsert.
//!
//! ## Database Tables
//!
//! - `indexer_cursors`: Resume position per indexer stream
//! - `processed_logs`: Exactly-once markers keyed by `(chain_id, tx_hash, log_index)`
//! - `characters`, `character_levels`, `lootbox_credits`, `character_equipment`,
//!   `upgrade_stones`: Per-character read model
//! - `epoch_states`, `epoch_claims`: Leaderboard epoch lifecycle
//! - `rfqs`, `trade_offers`: Marketplace read model
//! - `event_deltas`: Compact per-event change feed
use async_trait::async_trait;
use alloy::primitives::{Address, B256};
use deeprun_shared::leaderboard::{LeaderboardCursor, LeaderboardRow};
use deeprun_shared::types::DecodedLog;

use crate::interfaces::{
    CharacterCreatedRecord, CharacterLevelRecord, EpochClaimRecord, EpochStateRecord,
    EquipmentRecord, IndexerCursor, LootboxCreditsRecord, RfqRecord, TradeOfferRecord,
};
use crate::{IndexerStore, IndexerStoreError};

/// PostgreSQL implementation of the indexer store.
///
/// All writes are scoped to one chain id so that several networks can share a
/// database without their markers or deltas colliding.
pub struct PostgresIndexerStore {
    pool: sqlx::PgPool,
    chain_id: i64,
}

impl PostgresIndexerStore {
    /// Creates a new PostgreSQL indexer store instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    /// * `chain_id` - Chain id that scopes markers and deltas
    pub fn new(pool: sqlx::PgPool, chain_id: i64) -> Self {
        Self { pool, chain_id }
    }
}

#[async_trait]
impl IndexerStore for PostgresIndexerStore {
    async fn get_cursor(
        &self,
        name: &str,
        default_block: u64,
    ) -> Result<IndexerCursor, IndexerStoreError> {
        let row = sqlx::query_as::<_, CursorRow>(
            "SELECT last_processed_block, last_processed_log_index FROM indexer_cursors WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(IndexerCursor {
                last_processed_block: row.last_processed_block as u64,
                last_processed_log_index: row.last_processed_log_index,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO indexer_cursors(name, last_processed_block, last_processed_log_index)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(default_block as i64)
        .bind(-1i64)
        .execute(&self.pool)
        .await?;

        Ok(IndexerCursor {
            last_processed_block: default_block,
            last_processed_log_index: -1,
        })
    }

    async fn set_cursor(
        &self,
        name: &str,
        block_number: u64,
        log_index: i64,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO indexer_cursors(name, last_processed_block, last_processed_log_index, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (name) DO UPDATE SET
              last_processed_block = EXCLUDED.last_processed_block,
              last_processed_log_index = EXCLUDED.last_processed_log_index,
              updated_at = NOW()
            "#,
        )
        .bind(name)
        .bind(block_number as i64)
        .bind(log_index)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_processed(&self, log: &DecodedLog) -> Result<bool, IndexerStoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO processed_logs(chain_id, tx_hash, log_index, block_number, block_hash, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(self.chain_id)
        .bind(hex_b256(&log.transaction_hash))
        .bind(log.log_index as i64)
        .bind(log.block_number as i64)
        .bind(hex_b256(&log.block_hash))
        .bind(hex_address(&log.address))
        .execute(&self.pool)
        .await?;

        Ok(inserted.rows_affected() > 0)
    }

    async fn unmark_processed(&self, log: &DecodedLog) -> Result<(), IndexerStoreError> {
        sqlx::query("DELETE FROM processed_logs WHERE chain_id = $1 AND tx_hash = $2 AND log_index = $3")
            .bind(self.chain_id)
            .bind(hex_b256(&log.transaction_hash))
            .bind(log.log_index as i64)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_character_created(
        &self,
        record: &CharacterCreatedRecord,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO characters(character_id, owner, race, class_type, name, created_block, updated_block)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (character_id) DO UPDATE SET
              owner = EXCLUDED.owner,
              race = EXCLUDED.race,
              class_type = EXCLUDED.class_type,
              name = EXCLUDED.name,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.character_id)
        .bind(&record.owner)
        .bind(record.race)
        .bind(record.class_type)
        .bind(&record.name)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        // Fresh characters start at level 1 and zero stones. The stone seed is
        // DO NOTHING so a later balance is never clobbered by a replayed mint.
        sqlx::query(
            r#"
            INSERT INTO character_levels(character_id, owner, best_level, last_level_up_epoch, updated_block)
            VALUES ($1, $2, 1, $3, $4)
            ON CONFLICT (character_id) DO UPDATE SET
              owner = EXCLUDED.owner,
              best_level = EXCLUDED.best_level,
              last_level_up_epoch = EXCLUDED.last_level_up_epoch,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.character_id)
        .bind(&record.owner)
        .bind(record.level_up_epoch)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO upgrade_stones(character_id, balance, updated_block)
            VALUES ($1, 0, $2)
            ON CONFLICT (character_id) DO NOTHING
            "#,
        )
        .bind(record.character_id)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_character_level(
        &self,
        record: &CharacterLevelRecord,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO character_levels(character_id, owner, best_level, last_level_up_epoch, updated_block)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (character_id) DO UPDATE SET
              owner = EXCLUDED.owner,
              best_level = EXCLUDED.best_level,
              last_level_up_epoch = EXCLUDED.last_level_up_epoch,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.character_id)
        .bind(&record.owner)
        .bind(record.best_level)
        .bind(record.last_level_up_epoch)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_lootbox_credits(
        &self,
        record: &LootboxCreditsRecord,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO lootbox_credits(
              character_id, tier, total_credits, variance_0, variance_1, variance_2, updated_block
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (character_id, tier) DO UPDATE SET
              total_credits = EXCLUDED.total_credits,
              variance_0 = EXCLUDED.variance_0,
              variance_1 = EXCLUDED.variance_1,
              variance_2 = EXCLUDED.variance_2,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.character_id)
        .bind(record.tier)
        .bind(record.total)
        .bind(record.bound_stable)
        .bind(record.bound_neutral)
        .bind(record.bound_swingy)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_equipment(&self, record: &EquipmentRecord) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO character_equipment(character_id, slot, item_id, updated_block)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (character_id, slot) DO UPDATE SET
              item_id = EXCLUDED.item_id,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.character_id)
        .bind(record.slot)
        .bind(&record.item_id)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_upgrade_stones(
        &self,
        character_id: i64,
        balance: i32,
        block_number: i64,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO upgrade_stones(character_id, balance, updated_block)
            VALUES ($1, $2, $3)
            ON CONFLICT (character_id) DO UPDATE SET
              balance = EXCLUDED.balance,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(character_id)
        .bind(balance)
        .bind(block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_epoch_state(
        &self,
        record: &EpochStateRecord,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO epoch_states(
              epoch_id, finalized, cutoff_level, total_eligible_weight,
              fees_for_players, fees_for_deployer, updated_block
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (epoch_id) DO UPDATE SET
              finalized = EXCLUDED.finalized,
              cutoff_level = EXCLUDED.cutoff_level,
              total_eligible_weight = EXCLUDED.total_eligible_weight,
              fees_for_players = EXCLUDED.fees_for_players,
              fees_for_deployer = EXCLUDED.fees_for_deployer,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.epoch_id)
        .bind(record.finalized)
        .bind(record.cutoff_level)
        .bind(&record.total_eligible_weight)
        .bind(&record.fees_for_players)
        .bind(&record.fees_for_deployer)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_epoch_claim(
        &self,
        record: &EpochClaimRecord,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO epoch_claims(epoch_id, character_id, claimed, amount, tx_hash, claimant, updated_block)
            VALUES ($1, $2, TRUE, $3, $4, $5, $6)
            ON CONFLICT (epoch_id, character_id) DO UPDATE SET
              claimed = TRUE,
              amount = EXCLUDED.amount,
              tx_hash = EXCLUDED.tx_hash,
              claimant = EXCLUDED.claimant,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.epoch_id)
        .bind(record.character_id)
        .bind(&record.amount)
        .bind(&record.tx_hash)
        .bind(&record.claimant)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_rfq(&self, record: &RfqRecord) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO rfqs(rfq_id, maker, slot, min_tier, set_mask, mmo_offered, expiry, active, filled, updated_block)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (rfq_id) DO UPDATE SET
              maker = EXCLUDED.maker,
              slot = EXCLUDED.slot,
              min_tier = EXCLUDED.min_tier,
              set_mask = EXCLUDED.set_mask,
              mmo_offered = EXCLUDED.mmo_offered,
              expiry = EXCLUDED.expiry,
              active = EXCLUDED.active,
              filled = EXCLUDED.filled,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.rfq_id)
        .bind(&record.maker)
        .bind(record.slot)
        .bind(record.min_tier)
        .bind(&record.set_mask)
        .bind(&record.mmo_offered)
        .bind(record.expiry)
        .bind(record.active)
        .bind(record.filled)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_rfq_status(
        &self,
        rfq_id: i64,
        active: bool,
        filled: Option<bool>,
        block_number: i64,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query(
            r#"
            UPDATE rfqs
            SET active = $2,
                filled = COALESCE($3, filled),
                updated_block = $4
            WHERE rfq_id = $1
            "#,
        )
        .bind(rfq_id)
        .bind(active)
        .bind(filled)
        .bind(block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_trade_offer(
        &self,
        record: &TradeOfferRecord,
    ) -> Result<(), IndexerStoreError> {
        let offered = serde_json::to_value(&record.offered_item_ids)?;
        let requested = serde_json::to_value(&record.requested_item_ids)?;

        sqlx::query(
            r#"
            INSERT INTO trade_offers(
              offer_id, maker, requested_mmo, offered_item_ids, requested_item_ids, active, updated_block
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (offer_id) DO UPDATE SET
              maker = EXCLUDED.maker,
              requested_mmo = EXCLUDED.requested_mmo,
              offered_item_ids = EXCLUDED.offered_item_ids,
              requested_item_ids = EXCLUDED.requested_item_ids,
              active = EXCLUDED.active,
              updated_block = EXCLUDED.updated_block
            "#,
        )
        .bind(record.offer_id)
        .bind(&record.maker)
        .bind(&record.requested_mmo)
        .bind(&offered)
        .bind(&requested)
        .bind(record.active)
        .bind(record.block_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_trade_offer_active(
        &self,
        offer_id: i64,
        active: bool,
        block_number: i64,
    ) -> Result<(), IndexerStoreError> {
        sqlx::query("UPDATE trade_offers SET active = $2, updated_block = $3 WHERE offer_id = $1")
            .bind(offer_id)
            .bind(active)
            .bind(block_number)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_event_delta(
        &self,
        log: &DecodedLog,
        character_id: Option<i64>,
    ) -> Result<(), IndexerStoreError> {
        // DO NOTHING keeps a retried log from duplicating its delta when the
        // handler failed after this insert.
        sqlx::query(
            r#"
            INSERT INTO event_deltas(chain_id, block_number, log_index, tx_hash, character_id, kind, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (chain_id, tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(self.chain_id)
        .bind(log.block_number as i64)
        .bind(log.log_index as i64)
        .bind(hex_b256(&log.transaction_hash))
        .bind(character_id)
        .bind(log.event.name())
        .bind(log.event.payload())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_leaderboard(
        &self,
        limit: i64,
        after: Option<&LeaderboardCursor>,
    ) -> Result<Vec<LeaderboardRow>, IndexerStoreError> {
        let after_level = after.map(|cursor| cursor.best_level as i32);
        let after_character = after.map(|cursor| cursor.character_id as i64);

        let rows = sqlx::query_as::<_, LeaderboardDbRow>(
            r#"
            SELECT character_id, owner, best_level, last_level_up_epoch
            FROM character_levels
            WHERE $2::INT IS NULL
               OR best_level < $2
               OR (best_level = $2 AND character_id > $3)
            ORDER BY best_level DESC, character_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(after_level)
        .bind(after_character)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeaderboardDbRow::into_row).collect()
    }

    async fn reset_for_chain_restart(
        &self,
        name: &str,
        safe_head: u64,
    ) -> Result<(), IndexerStoreError> {
        let fallback_block = safe_head.saturating_sub(1);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "TRUNCATE TABLE \
             event_deltas, \
             epoch_claims, \
             epoch_states, \
             trade_offers, \
             rfqs, \
             upgrade_stones, \
             character_equipment, \
             lootbox_credits, \
             character_levels, \
             characters, \
             processed_logs, \
             action_submissions, \
             indexer_cursors \
             RESTART IDENTITY",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO indexer_cursors(name, last_processed_block, last_processed_log_index, updated_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(name)
        .bind(fallback_block as i64)
        .bind(-1i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CursorRow {
    last_processed_block: i64,
    last_processed_log_index: i64,
}

#[derive(sqlx::FromRow)]
struct LeaderboardDbRow {
    character_id: i64,
    owner: String,
    best_level: i32,
    last_level_up_epoch: i64,
}

impl LeaderboardDbRow {
    fn into_row(self) -> Result<LeaderboardRow, IndexerStoreError> {
        let character_id = u64::try_from(self.character_id)
            .map_err(|_| IndexerStoreError::InvalidRow(format!("character_id {}", self.character_id)))?;
        let best_level = u32::try_from(self.best_level)
            .map_err(|_| IndexerStoreError::InvalidRow(format!("best_level {}", self.best_level)))?;
        let last_level_up_epoch = u64::try_from(self.last_level_up_epoch).map_err(|_| {
            IndexerStoreError::InvalidRow(format!("last_level_up_epoch {}", self.last_level_up_epoch))
        })?;

        Ok(LeaderboardRow {
            character_id,
            owner: self.owner,
            best_level,
            last_level_up_epoch,
        })
    }
}

fn hex_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

fn hex_b256(value: &B256) -> String {
    format!("0x{}", hex::encode(value.as_slice()))
}
