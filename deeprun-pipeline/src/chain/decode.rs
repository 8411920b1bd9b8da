//! Log decoding for the watched game contracts.
//!
//! Matches `topic0` against the generated event signature hashes and lowers
//! each payload into the shared `WorldEvent` union. Dispatch happens on the
//! emitting address first, so identically named events on different contracts
//! cannot collide. Anything that does not match decodes to `None` and is
//! skipped upstream.

use alloy::primitives::{LogData, U256};
use alloy::sol_types::SolEvent;

use super::contracts::{IFeeVault, IGameWorld, IRfqMarket, ITradeEscrow};
use super::{ContractAddresses, RawLog};
use deeprun_shared::types::{DecodedLog, WorldEvent};

pub(crate) fn decode_log(addresses: &ContractAddresses, log: &RawLog) -> Option<DecodedLog> {
    let event = if log.address == addresses.game_world {
        decode_game_world(log)?
    } else if log.address == addresses.fee_vault {
        decode_fee_vault(log)?
    } else if log.address == addresses.rfq_market {
        decode_rfq_market(log)?
    } else if log.address == addresses.trade_escrow {
        decode_trade_escrow(log)?
    } else {
        // Covers the items collection: watched for completeness, never decoded.
        return None;
    };

    Some(DecodedLog {
        address: log.address,
        block_number: log.block_number,
        block_hash: log.block_hash,
        log_index: log.log_index,
        transaction_hash: log.transaction_hash,
        event,
    })
}

fn payload(log: &RawLog) -> LogData {
    LogData::new_unchecked(log.topics.clone(), log.data.clone())
}

fn decode_game_world(log: &RawLog) -> Option<WorldEvent> {
    let topic0 = *log.topics.first()?;
    let data = payload(log);

    if topic0 == IGameWorld::CharacterCreated::SIGNATURE_HASH {
        let event = IGameWorld::CharacterCreated::decode_log_data(&data).ok()?;
        Some(WorldEvent::CharacterCreated {
            character_id: event.characterId,
            owner: event.owner,
            race: event.race,
            class_type: event.classType,
            name: event.name,
        })
    } else if topic0 == IGameWorld::CharacterLevelUpdated::SIGNATURE_HASH {
        let event = IGameWorld::CharacterLevelUpdated::decode_log_data(&data).ok()?;
        Some(WorldEvent::CharacterLevelUpdated {
            character_id: event.characterId,
            old_level: event.oldLevel,
            new_level: event.newLevel,
            last_level_up_epoch: event.lastLevelUpEpoch,
        })
    } else if topic0 == IGameWorld::LootboxCredited::SIGNATURE_HASH {
        let event = IGameWorld::LootboxCredited::decode_log_data(&data).ok()?;
        Some(WorldEvent::LootboxCredited {
            character_id: event.characterId,
            tier: event.tier,
            amount: event.amount,
        })
    } else if topic0 == IGameWorld::LootboxOpened::SIGNATURE_HASH {
        let event = IGameWorld::LootboxOpened::decode_log_data(&data).ok()?;
        Some(WorldEvent::LootboxOpened {
            character_id: event.characterId,
            commit_id: event.commitId,
            tier: event.tier,
            amount: event.amount,
            variance_mode: event.varianceMode,
            entropy: event.entropy,
        })
    } else if topic0 == IGameWorld::LootboxOpenMaxResolved::SIGNATURE_HASH {
        let event = IGameWorld::LootboxOpenMaxResolved::decode_log_data(&data).ok()?;
        Some(WorldEvent::LootboxOpenMaxResolved {
            character_id: event.characterId,
            commit_id: event.commitId,
            tier: event.tier,
            requested_amount: event.requestedAmount,
            opened_amount: event.openedAmount,
            variance_mode: event.varianceMode,
        })
    } else if topic0 == IGameWorld::LootboxItemDropped::SIGNATURE_HASH {
        let event = IGameWorld::LootboxItemDropped::decode_log_data(&data).ok()?;
        Some(WorldEvent::LootboxItemDropped {
            character_id: event.characterId,
            commit_id: event.commitId,
            item_id: event.itemId,
            slot: event.slot,
            item_tier: event.itemTier,
            seed: event.seed,
            variance_mode: event.varianceMode,
        })
    } else if topic0 == IGameWorld::ItemEquipped::SIGNATURE_HASH {
        let event = IGameWorld::ItemEquipped::decode_log_data(&data).ok()?;
        Some(WorldEvent::ItemEquipped {
            character_id: event.characterId,
            item_id: event.itemId,
            slot: event.slot,
        })
    } else if topic0 == IGameWorld::ItemRerolled::SIGNATURE_HASH {
        let event = IGameWorld::ItemRerolled::decode_log_data(&data).ok()?;
        Some(WorldEvent::ItemRerolled {
            character_id: event.characterId,
            item_token_id: event.itemTokenId,
            new_nonce: event.newNonce,
        })
    } else if topic0 == IGameWorld::SetPieceForged::SIGNATURE_HASH {
        let event = IGameWorld::SetPieceForged::decode_log_data(&data).ok()?;
        Some(WorldEvent::SetPieceForged {
            character_id: event.characterId,
            item_token_id: event.itemTokenId,
            target_set_id: event.targetSetId,
            stones_spent: event.stonesSpent,
            mmo_spent: event.mmoSpent,
            new_seed: event.newSeed,
        })
    } else if topic0 == IGameWorld::UpgradeStoneGranted::SIGNATURE_HASH {
        let event = IGameWorld::UpgradeStoneGranted::decode_log_data(&data).ok()?;
        Some(WorldEvent::UpgradeStoneGranted {
            character_id: event.characterId,
            amount: event.amount,
            reason: event.reason,
        })
    } else if topic0 == IGameWorld::ActionCommitted::SIGNATURE_HASH {
        let event = IGameWorld::ActionCommitted::decode_log_data(&data).ok()?;
        Some(WorldEvent::ActionCommitted {
            commit_id: event.commitId,
            character_id: event.characterId,
            actor: event.actor,
            action_type: event.actionType,
            variance_mode: event.varianceMode,
            commit_block: event.commitBlock,
        })
    } else if topic0 == IGameWorld::ActionExpired::SIGNATURE_HASH {
        let event = IGameWorld::ActionExpired::decode_log_data(&data).ok()?;
        Some(WorldEvent::ActionExpired {
            commit_id: event.commitId,
            character_id: event.characterId,
            action_type: event.actionType,
        })
    } else if topic0 == IGameWorld::DungeonStarted::SIGNATURE_HASH {
        let event = IGameWorld::DungeonStarted::decode_log_data(&data).ok()?;
        Some(WorldEvent::DungeonStarted {
            character_id: event.characterId,
            commit_id: event.commitId,
            dungeon_level: event.dungeonLevel,
            difficulty: event.difficulty,
            variance_mode: event.varianceMode,
            room_count: event.roomCount,
        })
    } else if topic0 == IGameWorld::DungeonRoomResolved::SIGNATURE_HASH {
        let event = IGameWorld::DungeonRoomResolved::decode_log_data(&data).ok()?;
        Some(WorldEvent::DungeonRoomResolved {
            character_id: event.characterId,
            room_index: event.roomIndex,
            boss: event.boss,
            success: event.success,
            hp_after: event.hpAfter,
            mana_after: event.manaAfter,
        })
    } else if topic0 == IGameWorld::DungeonFinished::SIGNATURE_HASH {
        let event = IGameWorld::DungeonFinished::decode_log_data(&data).ok()?;
        Some(WorldEvent::DungeonFinished {
            character_id: event.characterId,
            dungeon_level: event.dungeonLevel,
            success: event.success,
            rooms_cleared: event.roomsCleared,
            room_count: event.roomCount,
        })
    } else {
        None
    }
}

fn decode_fee_vault(log: &RawLog) -> Option<WorldEvent> {
    let topic0 = *log.topics.first()?;
    let data = payload(log);

    if topic0 == IFeeVault::EpochFinalized::SIGNATURE_HASH {
        let event = IFeeVault::EpochFinalized::decode_log_data(&data).ok()?;
        Some(WorldEvent::EpochFinalized {
            epoch_id: event.epochId,
            cutoff_level: event.cutoffLevel,
            fees_for_players: event.feesForPlayers,
            fees_for_deployer: event.feesForDeployer,
            total_eligible_weight: event.totalEligibleWeight,
        })
    } else if topic0 == IFeeVault::PlayerClaimed::SIGNATURE_HASH {
        let event = IFeeVault::PlayerClaimed::decode_log_data(&data).ok()?;
        Some(WorldEvent::PlayerClaimed {
            epoch_id: event.epochId,
            character_id: event.characterId,
            owner: event.owner,
            amount: event.amount,
        })
    } else if topic0 == IFeeVault::DeployerClaimed::SIGNATURE_HASH {
        let event = IFeeVault::DeployerClaimed::decode_log_data(&data).ok()?;
        Some(WorldEvent::DeployerClaimed {
            epoch_id: event.epochId,
            deployer: event.deployer,
            amount: event.amount,
        })
    } else {
        None
    }
}

fn decode_rfq_market(log: &RawLog) -> Option<WorldEvent> {
    let topic0 = *log.topics.first()?;
    let data = payload(log);

    if topic0 == IRfqMarket::RFQCreated::SIGNATURE_HASH {
        let event = IRfqMarket::RFQCreated::decode_log_data(&data).ok()?;
        Some(WorldEvent::RfqCreated {
            rfq_id: event.rfqId,
            maker: event.maker,
            slot: event.slot,
            min_tier: event.minTier,
            set_mask: event.setMask,
            mmo_offered: U256::from(event.mmoOffered),
            expiry: event.expiry.to::<u64>(),
        })
    } else if topic0 == IRfqMarket::RFQFilled::SIGNATURE_HASH {
        let event = IRfqMarket::RFQFilled::decode_log_data(&data).ok()?;
        Some(WorldEvent::RfqFilled {
            rfq_id: event.rfqId,
            maker: event.maker,
            taker: event.taker,
            item_token_id: event.itemTokenId,
        })
    } else if topic0 == IRfqMarket::RFQCancelled::SIGNATURE_HASH {
        let event = IRfqMarket::RFQCancelled::decode_log_data(&data).ok()?;
        Some(WorldEvent::RfqCancelled {
            rfq_id: event.rfqId,
        })
    } else {
        None
    }
}

fn decode_trade_escrow(log: &RawLog) -> Option<WorldEvent> {
    let topic0 = *log.topics.first()?;
    let data = payload(log);

    if topic0 == ITradeEscrow::OfferCreated::SIGNATURE_HASH {
        let event = ITradeEscrow::OfferCreated::decode_log_data(&data).ok()?;
        Some(WorldEvent::OfferCreated {
            offer_id: event.offerId,
            maker: event.maker,
            requested_mmo: U256::from(event.requestedMmo),
            offered_item_ids: event.offeredItemIds,
            requested_item_ids: event.requestedItemIds,
        })
    } else if topic0 == ITradeEscrow::OfferCancelled::SIGNATURE_HASH {
        let event = ITradeEscrow::OfferCancelled::decode_log_data(&data).ok()?;
        Some(WorldEvent::OfferCancelled {
            offer_id: event.offerId,
            maker: event.maker,
        })
    } else if topic0 == ITradeEscrow::OfferFulfilled::SIGNATURE_HASH {
        let event = ITradeEscrow::OfferFulfilled::decode_log_data(&data).ok()?;
        Some(WorldEvent::OfferFulfilled {
            offer_id: event.offerId,
            maker: event.maker,
            taker: event.taker,
        })
    } else {
        None
    }
}
