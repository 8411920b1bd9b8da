//! Stable failure taxonomy for chain and transport errors.
//!
//! Raw failure text coming out of the engine or the RPC layer is noisy and
//! provider-specific. `classify` flattens it into a fixed vocabulary of codes
//! so queue rows, metrics and clients all speak the same names. Precedence:
//! known revert reasons first, then infrastructure heuristics, then
//! `INTERNAL_ERROR`.

/// A raw failure normalized into a taxonomy code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFailure {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

/// Revert-reason table, checked in order. The third column marks the
/// time-dependent reverts that resolve themselves and are safe to retry.
const DIRECT_CODE_MAP: &[(&str, &str, bool)] = &[
    ("CharacterNotFound", "PRECHECK_CHARACTER_NOT_FOUND", false),
    ("OnlyCharacterOwner", "PRECHECK_ONLY_CHARACTER_OWNER", false),
    ("RunNotActive", "PRECHECK_RUN_NOT_ACTIVE", false),
    ("RunAlreadyActive", "PRECHECK_RUN_ALREADY_ACTIVE", false),
    ("NotRunOwner", "PRECHECK_NOT_RUN_OWNER", false),
    ("RoomAlreadyResolved", "PRECHECK_ROOM_ALREADY_RESOLVED", false),
    ("AbilityUnavailable", "PRECHECK_ABILITY_UNAVAILABLE", false),
    ("InsufficientMana", "PRECHECK_INSUFFICIENT_MANA", false),
    (
        "InsufficientLootboxCredits",
        "PRECHECK_INSUFFICIENT_LOOTBOX_CREDITS",
        false,
    ),
    ("AmountZero", "PRECHECK_INVALID_AMOUNT", false),
    ("BatchTooLarge", "PRECHECK_BATCH_TOO_LARGE", false),
    ("ArrayLengthMismatch", "PRECHECK_ARRAY_LENGTH_MISMATCH", false),
    ("InvalidDungeonLevel", "PRECHECK_INVALID_DUNGEON_LEVEL", false),
    ("InvalidDifficulty", "PRECHECK_INVALID_DIFFICULTY", false),
    ("InvalidVarianceMode", "PRECHECK_INVALID_VARIANCE_MODE", false),
    ("InvalidActionType", "PRECHECK_INVALID_ACTION_TYPE", false),
    ("InsufficientCommitFee", "CHAIN_INSUFFICIENT_COMMIT_FEE", false),
    ("InsufficientCreateFee", "CHAIN_INSUFFICIENT_CREATE_FEE", false),
    ("InsufficientEth", "CHAIN_INSUFFICIENT_NATIVE_BALANCE", false),
    ("InvalidEpoch", "CHAIN_INVALID_EPOCH", false),
    ("EpochAlreadyFinalized", "CHAIN_EPOCH_ALREADY_FINALIZED", false),
    ("EpochNotFinalized", "CHAIN_EPOCH_NOT_FINALIZED", true),
    ("AlreadyClaimed", "CHAIN_ALREADY_CLAIMED", false),
    ("NotEligible", "CHAIN_NOT_ELIGIBLE", false),
    ("OnlyDeployer", "PRECHECK_ONLY_DEPLOYER", false),
    (
        "PolicyDeployerClaimDisabled",
        "POLICY_DEPLOYER_CLAIM_DISABLED",
        false,
    ),
    ("OfferInactive", "CHAIN_OFFER_INACTIVE", false),
    ("OfferExpired", "CHAIN_OFFER_EXPIRED", false),
    ("OfferNotExpired", "CHAIN_OFFER_NOT_EXPIRED", true),
    ("NotOfferMaker", "CHAIN_NOT_OFFER_MAKER", false),
    ("InvalidOffer", "PRECHECK_INVALID_OFFER", false),
    ("NotItemOwner", "PRECHECK_NOT_ITEM_OWNER", false),
    ("RevealTooEarly", "CHAIN_REVEAL_TOO_EARLY", true),
    ("RevealExpired", "CHAIN_REVEAL_EXPIRED", false),
    (
        "InvalidActionForReveal",
        "CHAIN_INVALID_ACTION_FOR_REVEAL",
        false,
    ),
    ("InvalidCommit", "CHAIN_INVALID_COMMIT", false),
    ("CommitNotExpired", "CHAIN_COMMIT_NOT_EXPIRED", false),
    ("CommitResolved", "CHAIN_COMMIT_RESOLVED", false),
    ("InvalidReveal", "CHAIN_INVALID_REVEAL", false),
    ("RFQInactive", "CHAIN_RFQ_INACTIVE", false),
    ("RFQExpired", "CHAIN_RFQ_EXPIRED", false),
    ("RFQItemMismatch", "CHAIN_RFQ_ITEM_MISMATCH", false),
    ("NotRFQMaker", "CHAIN_NOT_RFQ_MAKER", false),
    ("GearLockedDuringRun", "CHAIN_GEAR_LOCKED_DURING_RUN", false),
    (
        "InsufficientUpgradeStones",
        "CHAIN_INSUFFICIENT_UPGRADE_STONES",
        false,
    ),
    (
        "InsufficientEquippedSlots",
        "PRECHECK_INSUFFICIENT_EQUIPPED_SLOTS",
        false,
    ),
    ("PotionUnavailable", "PRECHECK_POTION_UNAVAILABLE", false),
    ("ItemNotEquipped", "CHAIN_ITEM_NOT_EQUIPPED", false),
];

/// Maps a raw failure string to a stable taxonomy code. Pure and total.
pub fn classify(raw: &str) -> NormalizedFailure {
    let lower = raw.to_lowercase();

    for (needle, code, retryable) in DIRECT_CODE_MAP {
        if raw.contains(needle) || lower.contains(&needle.to_lowercase()) {
            return failure(code, raw, *retryable);
        }
    }

    if contains_any(&lower, &["too many requests", "rate limit", "429"]) {
        return failure("INFRA_RATE_LIMIT", raw, true);
    }

    if contains_any(
        &lower,
        &[
            "nonce too low",
            "replacement transaction underpriced",
            "replacement fee too low",
            "already known",
        ],
    ) {
        return failure("INFRA_NONCE_CONFLICT", raw, true);
    }

    if contains_any(
        &lower,
        &[
            "max fee per gas less than block base fee",
            "maxfeepergas less than block base fee",
            "fee cap too low",
        ],
    ) || (lower.contains("transaction underpriced")
        && !lower.contains("replacement transaction underpriced"))
    {
        return failure("INFRA_FEE_TOO_LOW", raw, true);
    }

    if lower.contains("insufficient funds") {
        return failure("INFRA_INSUFFICIENT_FUNDS", raw, false);
    }

    if contains_any(
        &lower,
        &[
            "timeout", "etimedout", "timed out", "econn", "fetch failed", "socket",
        ],
    ) {
        return failure("INFRA_TRANSIENT_ERROR", raw, true);
    }

    failure("INTERNAL_ERROR", raw, false)
}

fn failure(code: &'static str, message: &str, retryable: bool) -> NormalizedFailure {
    NormalizedFailure {
        code,
        message: message.to_string(),
        retryable,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
