use serde::{Deserialize, Serialize};

/// Scoring objective used when the engine picks gear for `equip_best`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipObjective {
    #[default]
    Balanced,
    Dps,
    Survivability,
}

/// The closed union of actions an agent can submit to the queue.
///
/// Serialized with a `type` tag (snake_case) and camelCase field names so the
/// stored `request` payload matches the wire format of the agent API. Every
/// dispatch over this union is an exhaustive `match`; adding a variant forces
/// the conflict-key map, the estimator and the gas table to be revisited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionInput {
    #[serde(rename_all = "camelCase")]
    CreateCharacter { race: u8, class_type: u8, name: String },
    #[serde(rename_all = "camelCase")]
    StartDungeon {
        character_id: u64,
        difficulty: u8,
        dungeon_level: u32,
        #[serde(default = "default_variance_mode")]
        variance_mode: u8,
    },
    /// Single-room form carries `potion_choice`/`ability_choice`; the batch
    /// form carries both plural arrays with matching lengths.
    #[serde(rename_all = "camelCase")]
    NextRoom {
        character_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        potion_choice: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ability_choice: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        potion_choices: Option<Vec<u8>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ability_choices: Option<Vec<u8>>,
    },
    #[serde(rename_all = "camelCase")]
    OpenLootboxesMax {
        character_id: u64,
        tier: u32,
        max_amount: u16,
        #[serde(default = "default_variance_mode")]
        variance_mode: u8,
    },
    #[serde(rename_all = "camelCase")]
    EquipBest {
        character_id: u64,
        #[serde(default)]
        objective: EquipObjective,
    },
    #[serde(rename_all = "camelCase")]
    RerollItem { character_id: u64, item_id: u64 },
    #[serde(rename_all = "camelCase")]
    ForgeSetPiece {
        character_id: u64,
        item_id: u64,
        target_set_id: u8,
    },
    #[serde(rename_all = "camelCase")]
    BuyPremiumLootboxes {
        character_id: u64,
        difficulty: u8,
        amount: u16,
    },
    #[serde(rename_all = "camelCase")]
    FinalizeEpoch { epoch_id: u32 },
    #[serde(rename_all = "camelCase")]
    ClaimPlayer { epoch_id: u32, character_id: u64 },
    #[serde(rename_all = "camelCase")]
    ClaimDeployer { epoch_id: u32 },
    /// MMO amounts travel as decimal strings; they can exceed `u64`.
    #[serde(rename_all = "camelCase")]
    CreateTradeOffer {
        offered_item_ids: Vec<u64>,
        requested_item_ids: Vec<u64>,
        requested_mmo: String,
    },
    #[serde(rename_all = "camelCase")]
    FulfillTradeOffer { offer_id: u64 },
    #[serde(rename_all = "camelCase")]
    CancelTradeOffer { offer_id: u64 },
    #[serde(rename_all = "camelCase")]
    CancelExpiredTradeOffer { offer_id: u64 },
    #[serde(rename_all = "camelCase")]
    CreateRfq {
        slot: u8,
        min_tier: u32,
        acceptable_set_mask: String,
        mmo_offered: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expiry: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    FillRfq { rfq_id: u64, item_token_id: u64 },
    #[serde(rename_all = "camelCase")]
    CancelRfq { rfq_id: u64 },
}

fn default_variance_mode() -> u8 {
    1
}

impl ActionInput {
    /// Returns the snake_case discriminator stored in `action_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionInput::CreateCharacter { .. } => "create_character",
            ActionInput::StartDungeon { .. } => "start_dungeon",
            ActionInput::NextRoom { .. } => "next_room",
            ActionInput::OpenLootboxesMax { .. } => "open_lootboxes_max",
            ActionInput::EquipBest { .. } => "equip_best",
            ActionInput::RerollItem { .. } => "reroll_item",
            ActionInput::ForgeSetPiece { .. } => "forge_set_piece",
            ActionInput::BuyPremiumLootboxes { .. } => "buy_premium_lootboxes",
            ActionInput::FinalizeEpoch { .. } => "finalize_epoch",
            ActionInput::ClaimPlayer { .. } => "claim_player",
            ActionInput::ClaimDeployer { .. } => "claim_deployer",
            ActionInput::CreateTradeOffer { .. } => "create_trade_offer",
            ActionInput::FulfillTradeOffer { .. } => "fulfill_trade_offer",
            ActionInput::CancelTradeOffer { .. } => "cancel_trade_offer",
            ActionInput::CancelExpiredTradeOffer { .. } => "cancel_expired_trade_offer",
            ActionInput::CreateRfq { .. } => "create_rfq",
            ActionInput::FillRfq { .. } => "fill_rfq",
            ActionInput::CancelRfq { .. } => "cancel_rfq",
        }
    }

    /// The character a queued action operates on, when it names one.
    pub fn character_id(&self) -> Option<u64> {
        match self {
            ActionInput::StartDungeon { character_id, .. }
            | ActionInput::NextRoom { character_id, .. }
            | ActionInput::OpenLootboxesMax { character_id, .. }
            | ActionInput::EquipBest { character_id, .. }
            | ActionInput::RerollItem { character_id, .. }
            | ActionInput::ForgeSetPiece { character_id, .. }
            | ActionInput::BuyPremiumLootboxes { character_id, .. }
            | ActionInput::ClaimPlayer { character_id, .. } => Some(*character_id),
            ActionInput::CreateCharacter { .. }
            | ActionInput::FinalizeEpoch { .. }
            | ActionInput::ClaimDeployer { .. }
            | ActionInput::CreateTradeOffer { .. }
            | ActionInput::FulfillTradeOffer { .. }
            | ActionInput::CancelTradeOffer { .. }
            | ActionInput::CancelExpiredTradeOffer { .. }
            | ActionInput::CreateRfq { .. }
            | ActionInput::FillRfq { .. }
            | ActionInput::CancelRfq { .. } => None,
        }
    }
}
