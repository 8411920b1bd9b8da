//! This module defines and re-exports the interfaces for the deeprun repository.
//! It serves as a central point for accessing traits related to data interaction.
mod actions;
mod indexer;

pub use actions::ActionQueue;
pub use indexer::{
    CharacterCreatedRecord, CharacterLevelRecord, EpochClaimRecord, EpochStateRecord,
    EquipmentRecord, IndexerCursor, IndexerStore, LootboxCreditsRecord, RfqRecord,
    TradeOfferRecord,
};
