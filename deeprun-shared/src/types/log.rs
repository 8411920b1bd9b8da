use alloy::primitives::{Address, B256, U256, hex};
use serde_json::{Value, json};

/// A chain log the indexer decoded into a known world event.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub address: Address,
    pub block_number: u64,
    pub block_hash: B256,
    pub log_index: u64,
    pub transaction_hash: B256,
    pub event: WorldEvent,
}

/// Domain events emitted by the deployed game contracts.
///
/// The first group maps onto read-model tables; the variants from
/// `ActionCommitted` down are decoded only to feed the compact event-delta
/// stream (dungeon progress, commit lifecycle, item drops). Topics outside
/// this set do not decode and are skipped by the indexer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    CharacterCreated {
        character_id: U256,
        owner: Address,
        race: u8,
        class_type: u8,
        name: String,
    },
    CharacterLevelUpdated {
        character_id: U256,
        old_level: u32,
        new_level: u32,
        last_level_up_epoch: u32,
    },
    LootboxCredited {
        character_id: U256,
        tier: u32,
        amount: u32,
    },
    LootboxOpened {
        character_id: U256,
        commit_id: U256,
        tier: u32,
        amount: u16,
        variance_mode: u8,
        entropy: B256,
    },
    LootboxOpenMaxResolved {
        character_id: U256,
        commit_id: U256,
        tier: u32,
        requested_amount: u16,
        opened_amount: u16,
        variance_mode: u8,
    },
    ItemEquipped {
        character_id: U256,
        item_id: U256,
        slot: u8,
    },
    ItemRerolled {
        character_id: U256,
        item_token_id: U256,
        new_nonce: u32,
    },
    SetPieceForged {
        character_id: U256,
        item_token_id: U256,
        target_set_id: u8,
        stones_spent: u8,
        mmo_spent: U256,
        new_seed: u64,
    },
    UpgradeStoneGranted {
        character_id: U256,
        amount: u32,
        reason: u8,
    },
    EpochFinalized {
        epoch_id: u32,
        cutoff_level: u32,
        fees_for_players: U256,
        fees_for_deployer: U256,
        total_eligible_weight: U256,
    },
    PlayerClaimed {
        epoch_id: u32,
        character_id: U256,
        owner: Address,
        amount: U256,
    },
    DeployerClaimed {
        epoch_id: u32,
        deployer: Address,
        amount: U256,
    },
    RfqCreated {
        rfq_id: U256,
        maker: Address,
        slot: u8,
        min_tier: u32,
        set_mask: U256,
        mmo_offered: U256,
        expiry: u64,
    },
    RfqFilled {
        rfq_id: U256,
        maker: Address,
        taker: Address,
        item_token_id: U256,
    },
    RfqCancelled {
        rfq_id: U256,
    },
    OfferCreated {
        offer_id: U256,
        maker: Address,
        requested_mmo: U256,
        offered_item_ids: Vec<U256>,
        requested_item_ids: Vec<U256>,
    },
    OfferCancelled {
        offer_id: U256,
        maker: Address,
    },
    OfferFulfilled {
        offer_id: U256,
        maker: Address,
        taker: Address,
    },
    ActionCommitted {
        commit_id: U256,
        character_id: U256,
        actor: Address,
        action_type: u8,
        variance_mode: u8,
        commit_block: u64,
    },
    ActionExpired {
        commit_id: U256,
        character_id: U256,
        action_type: u8,
    },
    LootboxItemDropped {
        character_id: U256,
        commit_id: U256,
        item_id: U256,
        slot: u8,
        item_tier: u32,
        seed: u64,
        variance_mode: u8,
    },
    DungeonStarted {
        character_id: U256,
        commit_id: U256,
        dungeon_level: u32,
        difficulty: u8,
        variance_mode: u8,
        room_count: u8,
    },
    DungeonRoomResolved {
        character_id: U256,
        room_index: u8,
        boss: bool,
        success: bool,
        hp_after: u32,
        mana_after: u32,
    },
    DungeonFinished {
        character_id: U256,
        dungeon_level: u32,
        success: bool,
        rooms_cleared: u8,
        room_count: u8,
    },
}

impl WorldEvent {
    /// The on-chain event name, used as the `kind` of delta rows.
    pub fn name(&self) -> &'static str {
        match self {
            WorldEvent::CharacterCreated { .. } => "CharacterCreated",
            WorldEvent::CharacterLevelUpdated { .. } => "CharacterLevelUpdated",
            WorldEvent::LootboxCredited { .. } => "LootboxCredited",
            WorldEvent::LootboxOpened { .. } => "LootboxOpened",
            WorldEvent::LootboxOpenMaxResolved { .. } => "LootboxOpenMaxResolved",
            WorldEvent::ItemEquipped { .. } => "ItemEquipped",
            WorldEvent::ItemRerolled { .. } => "ItemRerolled",
            WorldEvent::SetPieceForged { .. } => "SetPieceForged",
            WorldEvent::UpgradeStoneGranted { .. } => "UpgradeStoneGranted",
            WorldEvent::EpochFinalized { .. } => "EpochFinalized",
            WorldEvent::PlayerClaimed { .. } => "PlayerClaimed",
            WorldEvent::DeployerClaimed { .. } => "DeployerClaimed",
            WorldEvent::RfqCreated { .. } => "RFQCreated",
            WorldEvent::RfqFilled { .. } => "RFQFilled",
            WorldEvent::RfqCancelled { .. } => "RFQCancelled",
            WorldEvent::OfferCreated { .. } => "OfferCreated",
            WorldEvent::OfferCancelled { .. } => "OfferCancelled",
            WorldEvent::OfferFulfilled { .. } => "OfferFulfilled",
            WorldEvent::ActionCommitted { .. } => "ActionCommitted",
            WorldEvent::ActionExpired { .. } => "ActionExpired",
            WorldEvent::LootboxItemDropped { .. } => "LootboxItemDropped",
            WorldEvent::DungeonStarted { .. } => "DungeonStarted",
            WorldEvent::DungeonRoomResolved { .. } => "DungeonRoomResolved",
            WorldEvent::DungeonFinished { .. } => "DungeonFinished",
        }
    }

    /// The character a delta row is attributed to, when the event names one.
    pub fn character_id(&self) -> Option<U256> {
        match self {
            WorldEvent::CharacterCreated { character_id, .. }
            | WorldEvent::CharacterLevelUpdated { character_id, .. }
            | WorldEvent::LootboxCredited { character_id, .. }
            | WorldEvent::LootboxOpened { character_id, .. }
            | WorldEvent::LootboxOpenMaxResolved { character_id, .. }
            | WorldEvent::ItemEquipped { character_id, .. }
            | WorldEvent::ItemRerolled { character_id, .. }
            | WorldEvent::SetPieceForged { character_id, .. }
            | WorldEvent::UpgradeStoneGranted { character_id, .. }
            | WorldEvent::PlayerClaimed { character_id, .. }
            | WorldEvent::ActionCommitted { character_id, .. }
            | WorldEvent::ActionExpired { character_id, .. }
            | WorldEvent::LootboxItemDropped { character_id, .. }
            | WorldEvent::DungeonStarted { character_id, .. }
            | WorldEvent::DungeonRoomResolved { character_id, .. }
            | WorldEvent::DungeonFinished { character_id, .. } => Some(*character_id),
            WorldEvent::EpochFinalized { .. }
            | WorldEvent::DeployerClaimed { .. }
            | WorldEvent::RfqCreated { .. }
            | WorldEvent::RfqFilled { .. }
            | WorldEvent::RfqCancelled { .. }
            | WorldEvent::OfferCreated { .. }
            | WorldEvent::OfferCancelled { .. }
            | WorldEvent::OfferFulfilled { .. } => None,
        }
    }

    /// JSON payload stored with a delta row. Small integers stay numbers;
    /// wide integers and addresses are rendered as strings so the payload
    /// survives JSON number precision limits.
    pub fn payload(&self) -> Value {
        match self {
            WorldEvent::CharacterCreated {
                character_id,
                owner,
                race,
                class_type,
                name,
            } => json!({
                "characterId": character_id.to_string(),
                "owner": hex_address(owner),
                "race": race,
                "classType": class_type,
                "name": name,
            }),
            WorldEvent::CharacterLevelUpdated {
                character_id,
                old_level,
                new_level,
                last_level_up_epoch,
            } => json!({
                "characterId": character_id.to_string(),
                "oldLevel": old_level,
                "newLevel": new_level,
                "lastLevelUpEpoch": last_level_up_epoch,
            }),
            WorldEvent::LootboxCredited {
                character_id,
                tier,
                amount,
            } => json!({
                "characterId": character_id.to_string(),
                "tier": tier,
                "amount": amount,
            }),
            WorldEvent::LootboxOpened {
                character_id,
                commit_id,
                tier,
                amount,
                variance_mode,
                entropy,
            } => json!({
                "characterId": character_id.to_string(),
                "commitId": commit_id.to_string(),
                "tier": tier,
                "amount": amount,
                "varianceMode": variance_mode,
                "entropy": hex_bytes(entropy),
            }),
            WorldEvent::LootboxOpenMaxResolved {
                character_id,
                commit_id,
                tier,
                requested_amount,
                opened_amount,
                variance_mode,
            } => json!({
                "characterId": character_id.to_string(),
                "commitId": commit_id.to_string(),
                "tier": tier,
                "requestedAmount": requested_amount,
                "openedAmount": opened_amount,
                "varianceMode": variance_mode,
            }),
            WorldEvent::ItemEquipped {
                character_id,
                item_id,
                slot,
            } => json!({
                "characterId": character_id.to_string(),
                "itemId": item_id.to_string(),
                "slot": slot,
            }),
            WorldEvent::ItemRerolled {
                character_id,
                item_token_id,
                new_nonce,
            } => json!({
                "characterId": character_id.to_string(),
                "itemTokenId": item_token_id.to_string(),
                "newNonce": new_nonce,
            }),
            WorldEvent::SetPieceForged {
                character_id,
                item_token_id,
                target_set_id,
                stones_spent,
                mmo_spent,
                new_seed,
            } => json!({
                "characterId": character_id.to_string(),
                "itemTokenId": item_token_id.to_string(),
                "targetSetId": target_set_id,
                "stonesSpent": stones_spent,
                "mmoSpent": mmo_spent.to_string(),
                "newSeed": new_seed.to_string(),
            }),
            WorldEvent::UpgradeStoneGranted {
                character_id,
                amount,
                reason,
            } => json!({
                "characterId": character_id.to_string(),
                "amount": amount,
                "reason": reason,
            }),
            WorldEvent::EpochFinalized {
                epoch_id,
                cutoff_level,
                fees_for_players,
                fees_for_deployer,
                total_eligible_weight,
            } => json!({
                "epochId": epoch_id,
                "cutoffLevel": cutoff_level,
                "feesForPlayers": fees_for_players.to_string(),
                "feesForDeployer": fees_for_deployer.to_string(),
                "totalEligibleWeight": total_eligible_weight.to_string(),
            }),
            WorldEvent::PlayerClaimed {
                epoch_id,
                character_id,
                owner,
                amount,
            } => json!({
                "epochId": epoch_id,
                "characterId": character_id.to_string(),
                "owner": hex_address(owner),
                "amount": amount.to_string(),
            }),
            WorldEvent::DeployerClaimed {
                epoch_id,
                deployer,
                amount,
            } => json!({
                "epochId": epoch_id,
                "deployer": hex_address(deployer),
                "amount": amount.to_string(),
            }),
            WorldEvent::RfqCreated {
                rfq_id,
                maker,
                slot,
                min_tier,
                set_mask,
                mmo_offered,
                expiry,
            } => json!({
                "rfqId": rfq_id.to_string(),
                "maker": hex_address(maker),
                "slot": slot,
                "minTier": min_tier,
                "setMask": set_mask.to_string(),
                "mmoOffered": mmo_offered.to_string(),
                "expiry": expiry.to_string(),
            }),
            WorldEvent::RfqFilled {
                rfq_id,
                maker,
                taker,
                item_token_id,
            } => json!({
                "rfqId": rfq_id.to_string(),
                "maker": hex_address(maker),
                "taker": hex_address(taker),
                "itemTokenId": item_token_id.to_string(),
            }),
            WorldEvent::RfqCancelled { rfq_id } => json!({
                "rfqId": rfq_id.to_string(),
            }),
            WorldEvent::OfferCreated {
                offer_id,
                maker,
                requested_mmo,
                offered_item_ids,
                requested_item_ids,
            } => json!({
                "offerId": offer_id.to_string(),
                "maker": hex_address(maker),
                "requestedMmo": requested_mmo.to_string(),
                "offeredItemIds": decimal_strings(offered_item_ids),
                "requestedItemIds": decimal_strings(requested_item_ids),
            }),
            WorldEvent::OfferCancelled { offer_id, maker } => json!({
                "offerId": offer_id.to_string(),
                "maker": hex_address(maker),
            }),
            WorldEvent::OfferFulfilled {
                offer_id,
                maker,
                taker,
            } => json!({
                "offerId": offer_id.to_string(),
                "maker": hex_address(maker),
                "taker": hex_address(taker),
            }),
            WorldEvent::ActionCommitted {
                commit_id,
                character_id,
                actor,
                action_type,
                variance_mode,
                commit_block,
            } => json!({
                "commitId": commit_id.to_string(),
                "characterId": character_id.to_string(),
                "actor": hex_address(actor),
                "actionType": action_type,
                "varianceMode": variance_mode,
                "commitBlock": commit_block.to_string(),
            }),
            WorldEvent::ActionExpired {
                commit_id,
                character_id,
                action_type,
            } => json!({
                "commitId": commit_id.to_string(),
                "characterId": character_id.to_string(),
                "actionType": action_type,
            }),
            WorldEvent::LootboxItemDropped {
                character_id,
                commit_id,
                item_id,
                slot,
                item_tier,
                seed,
                variance_mode,
            } => json!({
                "characterId": character_id.to_string(),
                "commitId": commit_id.to_string(),
                "itemId": item_id.to_string(),
                "slot": slot,
                "itemTier": item_tier,
                "seed": seed.to_string(),
                "varianceMode": variance_mode,
            }),
            WorldEvent::DungeonStarted {
                character_id,
                commit_id,
                dungeon_level,
                difficulty,
                variance_mode,
                room_count,
            } => json!({
                "characterId": character_id.to_string(),
                "commitId": commit_id.to_string(),
                "dungeonLevel": dungeon_level,
                "difficulty": difficulty,
                "varianceMode": variance_mode,
                "roomCount": room_count,
            }),
            WorldEvent::DungeonRoomResolved {
                character_id,
                room_index,
                boss,
                success,
                hp_after,
                mana_after,
            } => json!({
                "characterId": character_id.to_string(),
                "roomIndex": room_index,
                "boss": boss,
                "success": success,
                "hpAfter": hp_after,
                "manaAfter": mana_after,
            }),
            WorldEvent::DungeonFinished {
                character_id,
                dungeon_level,
                success,
                rooms_cleared,
                room_count,
            } => json!({
                "characterId": character_id.to_string(),
                "dungeonLevel": dungeon_level,
                "success": success,
                "roomsCleared": rooms_cleared,
                "roomCount": room_count,
            }),
        }
    }
}

fn hex_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

fn hex_bytes(bytes: &B256) -> String {
    format!("0x{}", hex::encode(bytes.as_slice()))
}

fn decimal_strings(values: &[U256]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
