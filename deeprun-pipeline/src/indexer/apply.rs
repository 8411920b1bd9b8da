//! Folds decoded world events into the read model.
//!
//! Each event maps to at most one table upsert plus a compact delta row.
//! Counters the event does not carry in full are re-read from the contracts,
//! so a row always reflects chain state at processing time instead of
//! event-local arithmetic.
use alloy::primitives::{Address, B256, U256};
use tracing::instrument;

use crate::chain::ChainClient;
use crate::errors::IndexerError;
use deeprun_repository::{IndexerStore, IndexerStoreError};
use deeprun_repository::interfaces::{
    CharacterCreatedRecord, CharacterLevelRecord, EpochClaimRecord, EpochStateRecord,
    EquipmentRecord, LootboxCreditsRecord, RfqRecord, TradeOfferRecord,
};
use deeprun_shared::types::{DecodedLog, WorldEvent};

// Variance modes as encoded on-chain.
const VARIANCE_STABLE: u8 = 0;
const VARIANCE_NEUTRAL: u8 = 1;
const VARIANCE_SWINGY: u8 = 2;

/// Applies one decoded log to the read model.
///
/// # Arguments
///
/// * `chain` - Client used for the refresh reads some events require.
/// * `store` - Persistence for the read-model tables and the delta stream.
/// * `log` - The decoded log to fold in.
///
/// # Returns
///
/// `Ok(())` once every write for the event has landed, or an `IndexerError`
/// if a read or write failed. The caller rolls back the processed-log marker
/// on failure so the log is replayed.
#[instrument(skip_all, fields(event = log.event.name(), block = log.block_number))]
pub(crate) async fn apply_event(
    chain: &dyn ChainClient,
    store: &dyn IndexerStore,
    log: &DecodedLog,
) -> Result<(), IndexerError> {
    let block_number = log.block_number as i64;

    match &log.event {
        WorldEvent::CharacterCreated {
            character_id,
            owner,
            race,
            class_type,
            name,
        } => {
            let level_up_epoch = chain.character_last_level_up_epoch(*character_id).await?;
            store
                .upsert_character_created(&CharacterCreatedRecord {
                    character_id: to_i64(*character_id)?,
                    owner: address_string(owner),
                    race: i16::from(*race),
                    class_type: i16::from(*class_type),
                    name: name.clone(),
                    level_up_epoch: i64::from(level_up_epoch),
                    block_number,
                })
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::CharacterLevelUpdated {
            character_id,
            old_level: _,
            new_level,
            last_level_up_epoch,
        } => {
            // The epoch rides on the event; only the owner needs a read.
            let owner = chain.owner_of_character(*character_id).await?;
            store
                .upsert_character_level(&CharacterLevelRecord {
                    character_id: to_i64(*character_id)?,
                    owner: address_string(&owner),
                    best_level: *new_level as i32,
                    last_level_up_epoch: i64::from(*last_level_up_epoch),
                    block_number,
                })
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::LootboxCredited {
            character_id, tier, ..
        }
        | WorldEvent::LootboxOpened {
            character_id, tier, ..
        }
        | WorldEvent::LootboxOpenMaxResolved {
            character_id, tier, ..
        } => {
            let (total, bound_stable, bound_neutral, bound_swingy) = tokio::try_join!(
                chain.lootbox_credits(*character_id, *tier),
                chain.lootbox_bound_credits(*character_id, *tier, VARIANCE_STABLE),
                chain.lootbox_bound_credits(*character_id, *tier, VARIANCE_NEUTRAL),
                chain.lootbox_bound_credits(*character_id, *tier, VARIANCE_SWINGY),
            )?;
            store
                .upsert_lootbox_credits(&LootboxCreditsRecord {
                    character_id: to_i64(*character_id)?,
                    tier: *tier as i16,
                    total: total as i32,
                    bound_stable: bound_stable as i32,
                    bound_neutral: bound_neutral as i32,
                    bound_swingy: bound_swingy as i32,
                    block_number,
                })
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::ItemEquipped {
            character_id,
            item_id,
            slot,
        } => {
            store
                .upsert_equipment(&EquipmentRecord {
                    character_id: to_i64(*character_id)?,
                    slot: i16::from(*slot),
                    item_id: item_id.to_string(),
                    block_number,
                })
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::UpgradeStoneGranted { character_id, .. }
        | WorldEvent::ItemRerolled { character_id, .. }
        | WorldEvent::SetPieceForged { character_id, .. } => {
            let balance = chain.upgrade_stone_balance(*character_id).await?;
            store
                .upsert_upgrade_stones(to_i64(*character_id)?, balance as i32, block_number)
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::EpochFinalized {
            epoch_id,
            cutoff_level,
            fees_for_players,
            fees_for_deployer,
            total_eligible_weight,
        } => {
            store
                .upsert_epoch_state(&EpochStateRecord {
                    epoch_id: i64::from(*epoch_id),
                    finalized: true,
                    cutoff_level: *cutoff_level as i32,
                    total_eligible_weight: total_eligible_weight.to_string(),
                    fees_for_players: fees_for_players.to_string(),
                    fees_for_deployer: fees_for_deployer.to_string(),
                    block_number,
                })
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::PlayerClaimed {
            epoch_id,
            character_id,
            owner,
            amount,
        } => {
            store
                .upsert_epoch_claim(&EpochClaimRecord {
                    epoch_id: i64::from(*epoch_id),
                    character_id: to_i64(*character_id)?,
                    claimant: address_string(owner),
                    amount: amount.to_string(),
                    tx_hash: hash_string(&log.transaction_hash),
                    block_number,
                })
                .await?;
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }

        WorldEvent::DeployerClaimed {
            epoch_id,
            deployer,
            amount,
        } => {
            // Deployer claims have no character; they land under id zero.
            store
                .upsert_epoch_claim(&EpochClaimRecord {
                    epoch_id: i64::from(*epoch_id),
                    character_id: 0,
                    claimant: address_string(deployer),
                    amount: amount.to_string(),
                    tx_hash: hash_string(&log.transaction_hash),
                    block_number,
                })
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::RfqCreated {
            rfq_id,
            maker,
            slot,
            min_tier,
            set_mask,
            mmo_offered,
            expiry,
        } => {
            store
                .upsert_rfq(&RfqRecord {
                    rfq_id: to_i64(*rfq_id)?,
                    maker: address_string(maker),
                    slot: i16::from(*slot),
                    min_tier: *min_tier as i16,
                    set_mask: set_mask.to_string(),
                    mmo_offered: mmo_offered.to_string(),
                    expiry: *expiry as i64,
                    active: true,
                    filled: false,
                    block_number,
                })
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::RfqFilled { rfq_id, .. } => {
            store
                .set_rfq_status(to_i64(*rfq_id)?, false, Some(true), block_number)
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::RfqCancelled { rfq_id } => {
            store
                .set_rfq_status(to_i64(*rfq_id)?, false, Some(false), block_number)
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::OfferCreated {
            offer_id,
            maker,
            requested_mmo,
            offered_item_ids,
            requested_item_ids,
        } => {
            store
                .upsert_trade_offer(&TradeOfferRecord {
                    offer_id: to_i64(*offer_id)?,
                    maker: address_string(maker),
                    requested_mmo: requested_mmo.to_string(),
                    offered_item_ids: decimal_strings(offered_item_ids),
                    requested_item_ids: decimal_strings(requested_item_ids),
                    active: true,
                    block_number,
                })
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        WorldEvent::OfferCancelled { offer_id, .. }
        | WorldEvent::OfferFulfilled { offer_id, .. } => {
            store
                .set_trade_offer_active(to_i64(*offer_id)?, false, block_number)
                .await?;
            store.insert_event_delta(log, None).await?;
        }

        // Commit lifecycle and dungeon progress only feed the delta stream.
        WorldEvent::ActionCommitted { character_id, .. }
        | WorldEvent::ActionExpired { character_id, .. }
        | WorldEvent::LootboxItemDropped { character_id, .. }
        | WorldEvent::DungeonStarted { character_id, .. }
        | WorldEvent::DungeonRoomResolved { character_id, .. }
        | WorldEvent::DungeonFinished { character_id, .. } => {
            store
                .insert_event_delta(log, Some(to_i64(*character_id)?))
                .await?;
        }
    }

    Ok(())
}

fn to_i64(value: U256) -> Result<i64, IndexerStoreError> {
    i64::try_from(value).map_err(|_| {
        IndexerStoreError::InvalidRow(format!(
            "value {value} does not fit in a signed 64-bit column"
        ))
    })
}

fn address_string(address: &Address) -> String {
    format!("{address:#x}")
}

fn hash_string(hash: &B256) -> String {
    format!("{hash:#x}")
}

fn decimal_strings(values: &[U256]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
