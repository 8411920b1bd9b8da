//! Conflict-key derivation for queued actions.
//!
//! Two actions with the same conflict key are never in flight at the same
//! time. Character-scoped actions serialize per character, trade-offer
//! settlement serializes per offer, and everything else runs freely.
use deeprun_shared::types::ActionInput;

/// Derives the conflict key for an action, or `None` when the action has no
/// serialization requirement.
pub fn derive_conflict_key(action: &ActionInput) -> Option<String> {
    match action {
        ActionInput::StartDungeon { character_id, .. }
        | ActionInput::NextRoom { character_id, .. }
        | ActionInput::OpenLootboxesMax { character_id, .. }
        | ActionInput::EquipBest { character_id, .. }
        | ActionInput::RerollItem { character_id, .. }
        | ActionInput::ForgeSetPiece { character_id, .. }
        | ActionInput::BuyPremiumLootboxes { character_id, .. }
        | ActionInput::ClaimPlayer { character_id, .. } => {
            Some(format!("character:{character_id}"))
        }
        ActionInput::FulfillTradeOffer { offer_id }
        | ActionInput::CancelTradeOffer { offer_id }
        | ActionInput::CancelExpiredTradeOffer { offer_id } => {
            Some(format!("trade_offer:{offer_id}"))
        }
        ActionInput::CreateCharacter { .. }
        | ActionInput::FinalizeEpoch { .. }
        | ActionInput::ClaimDeployer { .. }
        | ActionInput::CreateTradeOffer { .. }
        | ActionInput::CreateRfq { .. }
        | ActionInput::FillRfq { .. }
        | ActionInput::CancelRfq { .. } => None,
    }
}
