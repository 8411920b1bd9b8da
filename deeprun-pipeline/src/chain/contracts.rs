//! Solidity bindings for the deployed game contracts, generated with the
//! `sol!` macro.
//!
//! Event shapes and `indexed` markers must match the deployed contracts
//! exactly or topic hashes diverge and decoding silently misses logs. The
//! items collection is intentionally absent: its mint and seed events feed no
//! table and are never decoded.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IGameWorld {
        function createCharacter(uint8 race, uint8 classType, string memory name) external returns (uint256 characterId);
        function commitActionWithVariance(uint256 characterId, uint8 actionType, bytes32 commitHash, uint64 nonce, uint8 varianceMode) external payable returns (uint256 commitId);
        function commitFee() external view returns (uint256);
        function hashLootboxOpen(bytes32 secret, address actor, uint256 characterId, uint64 nonce, uint32 tier, uint16 amount, uint8 varianceMode, bool maxMode) external pure returns (bytes32 hash);
        function hashDungeonRun(bytes32 secret, address actor, uint256 characterId, uint64 nonce, uint8 difficulty, uint32 dungeonLevel, uint8 varianceMode) external pure returns (bytes32 hash);
        function resolveNextRoom(uint256 characterId, uint8 potionChoice, uint8 abilityChoice) external;
        function resolveRooms(uint256 characterId, uint8[] memory potionChoices, uint8[] memory abilityChoices) external returns (uint8 resolvedCount, bool runStillActive);
        function rerollItemStats(uint256 characterId, uint256 itemTokenId) external returns (uint32 newNonce);
        function forgeSetPiece(uint256 characterId, uint256 itemTokenId, uint8 targetSetId) external returns (uint64 newSeed);
        function ownerOfCharacter(uint256 characterId) external view returns (address);
        function characterLastLevelUpEpoch(uint256 characterId) external view returns (uint32);
        function lootboxCredits(uint256 characterId, uint32 tier) external view returns (uint32);
        function lootboxBoundCredits(uint256 characterId, uint32 tier, uint8 varianceMode) external view returns (uint32);
        function upgradeStoneBalance(uint256 characterId) external view returns (uint32);

        event ActionCommitted(uint256 indexed commitId, uint256 indexed characterId, address indexed actor, uint8 actionType, uint8 varianceMode, uint64 commitBlock);
        event ActionExpired(uint256 indexed commitId, uint256 indexed characterId, uint8 actionType);
        event CharacterCreated(uint256 indexed characterId, address indexed owner, uint8 indexed race, uint8 classType, string name);
        event CharacterLevelUpdated(uint256 indexed characterId, uint32 oldLevel, uint32 newLevel, uint32 lastLevelUpEpoch);
        event LootboxCredited(uint256 indexed characterId, uint32 indexed tier, uint32 amount);
        event LootboxOpened(uint256 indexed characterId, uint256 indexed commitId, uint32 indexed tier, uint16 amount, uint8 varianceMode, bytes32 entropy);
        event LootboxOpenMaxResolved(uint256 indexed characterId, uint256 indexed commitId, uint32 indexed tier, uint16 requestedAmount, uint16 openedAmount, uint8 varianceMode);
        event LootboxItemDropped(uint256 indexed characterId, uint256 indexed commitId, uint256 indexed itemId, uint8 slot, uint32 itemTier, uint64 seed, uint8 varianceMode);
        event ItemEquipped(uint256 indexed characterId, uint256 indexed itemId, uint8 indexed slot);
        event ItemRerolled(uint256 indexed characterId, uint256 indexed itemTokenId, uint32 newNonce);
        event SetPieceForged(uint256 indexed characterId, uint256 indexed itemTokenId, uint8 indexed targetSetId, uint8 stonesSpent, uint256 mmoSpent, uint64 newSeed);
        event DungeonStarted(uint256 indexed characterId, uint256 indexed commitId, uint32 dungeonLevel, uint8 difficulty, uint8 varianceMode, uint8 roomCount);
        event DungeonRoomResolved(uint256 indexed characterId, uint8 indexed roomIndex, bool boss, bool success, uint32 hpAfter, uint32 manaAfter);
        event DungeonFinished(uint256 indexed characterId, uint32 indexed dungeonLevel, bool success, uint8 roomsCleared, uint8 roomCount);
        event UpgradeStoneGranted(uint256 indexed characterId, uint32 amount, uint8 reason);
    }

    #[sol(rpc)]
    interface IFeeVault {
        function quotePremiumPurchase(uint256 characterId, uint8 difficulty, uint16 amount) external view returns (uint256 ethCost, uint256 mmoCost);
        function buyPremiumLootboxes(uint256 characterId, uint8 difficulty, uint16 amount) external payable;
        function finalizeEpoch(uint32 epochId) external;
        function claimPlayer(uint32 epochId, uint256 characterId) external returns (uint256 amount);
        function claimDeployer(uint32 epochId) external returns (uint256 amount);

        event EpochFinalized(uint32 indexed epochId, uint32 cutoffLevel, uint256 feesForPlayers, uint256 feesForDeployer, uint256 totalEligibleWeight);
        event PlayerClaimed(uint32 indexed epochId, uint256 indexed characterId, address indexed owner, uint256 amount);
        event DeployerClaimed(uint32 indexed epochId, address indexed deployer, uint256 amount);
    }

    #[sol(rpc)]
    interface IRfqMarket {
        function createFee() external view returns (uint256);
        function createRFQ(uint8 slot, uint32 minTier, uint256 acceptableSetMask, uint96 mmoOffered, uint40 expiry) external payable returns (uint256 rfqId);
        function fillRFQ(uint256 rfqId, uint256 itemTokenId) external;
        function cancelRFQ(uint256 rfqId) external;

        event RFQCreated(uint256 indexed rfqId, address indexed maker, uint8 slot, uint32 minTier, uint256 setMask, uint96 mmoOffered, uint40 expiry);
        event RFQFilled(uint256 indexed rfqId, address indexed maker, address indexed taker, uint256 itemTokenId);
        event RFQCancelled(uint256 indexed rfqId);
    }

    #[sol(rpc)]
    interface ITradeEscrow {
        function createFee() external view returns (uint256);
        function createOffer(uint256[] memory offeredItemIds, uint256[] memory requestedItemIds, uint96 requestedMmo) external payable returns (uint256 offerId);
        function cancelOffer(uint256 offerId) external;
        function fulfillOffer(uint256 offerId) external;
        function cancelExpiredOffer(uint256 offerId) external;

        event OfferCreated(uint256 indexed offerId, address indexed maker, uint96 requestedMmo, uint256[] offeredItemIds, uint256[] requestedItemIds);
        event OfferCancelled(uint256 indexed offerId, address indexed maker);
        event OfferFulfilled(uint256 indexed offerId, address indexed maker, address indexed taker);
    }
}
