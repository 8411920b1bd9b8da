//! Pre-flight cost estimation for queued actions.
//!
//! `CostEstimator` projects what an action will cost before anything is
//! signed: fee quote, required native value and a simulated gas limit, folded
//! into an affordability verdict against the operator balance. Simulation
//! failures never fail the estimate; they degrade to a static per-action gas
//! table with the classified failure kept as the reason.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::chain::ChainClient;
use crate::errors::{ChainClientError, EstimatorError};
use deeprun_shared::taxonomy::classify;
use deeprun_shared::types::ActionInput;

/// Estimate produced from a live `eth_estimateGas` simulation.
pub const ESTIMATE_OK: &str = "ESTIMATE_OK";
/// Estimate produced from the static gas table after a failed simulation.
pub const ESTIMATE_FALLBACK: &str = "ESTIMATE_FALLBACK";

/// A cost projection for one action, with wei amounts rendered as decimal
/// strings so they survive JSON number precision limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCostEstimate {
    pub action_type: String,
    pub code: String,
    pub reason: String,
    pub estimated_gas: String,
    pub max_fee_per_gas: String,
    pub estimated_tx_cost_wei: String,
    pub required_value_wei: String,
    pub total_estimated_cost_wei: String,
    pub signer_native_balance_wei: String,
    pub can_afford: bool,
}

/// `CostEstimator` is responsible for projecting the native cost of an
/// action before it is executed.
///
/// It reads the fee quote, the operator balance and the action's required
/// value concurrently, then simulates the action's first transaction for a
/// gas limit.
pub struct CostEstimator {
    chain: Arc<dyn ChainClient>,
    signer: Address,
}

impl CostEstimator {
    /// Creates a new `CostEstimator` instance.
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain client used for quotes, reads and simulation.
    /// * `signer` - Operator account whose balance backs the verdict.
    pub fn new(chain: Arc<dyn ChainClient>, signer: Address) -> Self {
        Self { chain, signer }
    }

    /// Produces a cost estimate for one action.
    ///
    /// The fee quote, operator balance and required value are fetched
    /// concurrently. Gas comes from simulation when the chain accepts it and
    /// from the static per-action table otherwise, with the classified
    /// simulation failure recorded in `reason`.
    ///
    /// # Arguments
    ///
    /// * `action` - The action to project costs for.
    ///
    /// # Returns
    ///
    /// The estimate, or an `EstimatorError` if a quote or balance read
    /// fails.
    pub async fn estimate(
        &self,
        action: &ActionInput,
    ) -> Result<ActionCostEstimate, EstimatorError> {
        let (fee, balance, required_value) = tokio::try_join!(
            self.chain.fee_estimate(),
            self.chain.native_balance(self.signer),
            self.resolve_required_value(action),
        )?;

        let (estimated_gas, code, reason) =
            match self.chain.estimate_action_gas(action, required_value).await {
                Ok(gas) => (
                    gas,
                    ESTIMATE_OK,
                    "Estimated via eth_estimateGas".to_string(),
                ),
                Err(err) => {
                    let normalized = classify(&err.to_string());
                    (
                        fallback_gas(action),
                        ESTIMATE_FALLBACK,
                        format!("{}: {}", normalized.code, normalized.message),
                    )
                }
            };

        let tx_cost = U256::from(estimated_gas) * U256::from(fee.max_fee_per_gas);
        let total = tx_cost + required_value;
        let can_afford = balance >= total;

        Ok(ActionCostEstimate {
            action_type: action.kind().to_string(),
            code: code.to_string(),
            reason,
            estimated_gas: estimated_gas.to_string(),
            max_fee_per_gas: fee.max_fee_per_gas.to_string(),
            estimated_tx_cost_wei: tx_cost.to_string(),
            required_value_wei: required_value.to_string(),
            total_estimated_cost_wei: total.to_string(),
            signer_native_balance_wei: balance.to_string(),
            can_afford,
        })
    }

    /// Native value the action's first transaction must carry.
    async fn resolve_required_value(
        &self,
        action: &ActionInput,
    ) -> Result<U256, ChainClientError> {
        match action {
            ActionInput::StartDungeon { .. } | ActionInput::OpenLootboxesMax { .. } => {
                self.chain.commit_fee().await
            }
            ActionInput::BuyPremiumLootboxes {
                character_id,
                difficulty,
                amount,
            } => {
                self.chain
                    .premium_purchase_quote(U256::from(*character_id), *difficulty, *amount)
                    .await
            }
            ActionInput::CreateTradeOffer { .. } => self.chain.trade_escrow_create_fee().await,
            ActionInput::CreateRfq { .. } => self.chain.rfq_create_fee().await,
            _ => Ok(U256::ZERO),
        }
    }
}

/// Static gas limits used when simulation fails or is impossible.
fn fallback_gas(action: &ActionInput) -> u64 {
    match action {
        ActionInput::CreateCharacter { .. } => 550_000,
        ActionInput::StartDungeon { .. } => 250_000,
        ActionInput::NextRoom { .. } => 300_000,
        ActionInput::OpenLootboxesMax { .. } => 250_000,
        ActionInput::EquipBest { .. } => 450_000,
        ActionInput::RerollItem { .. } => 220_000,
        ActionInput::ForgeSetPiece { .. } => 260_000,
        ActionInput::BuyPremiumLootboxes { .. } => 240_000,
        ActionInput::FinalizeEpoch { .. } => 280_000,
        ActionInput::ClaimPlayer { .. } => 180_000,
        ActionInput::ClaimDeployer { .. } => 150_000,
        ActionInput::CreateTradeOffer { .. } => 320_000,
        ActionInput::FulfillTradeOffer { .. } => 240_000,
        ActionInput::CancelTradeOffer { .. } => 140_000,
        ActionInput::CancelExpiredTradeOffer { .. } => 140_000,
        ActionInput::CreateRfq { .. } => 240_000,
        ActionInput::FillRfq { .. } => 220_000,
        ActionInput::CancelRfq { .. } => 120_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{FeeEstimate, FeeSource, RawLog};
    use async_trait::async_trait;
    use deeprun_shared::types::DecodedLog;

    struct StubChain {
        balance: U256,
        max_fee: u128,
        commit_fee: U256,
        escrow_fee: U256,
        rfq_fee: U256,
        premium_quote: U256,
        gas: Option<u64>,
        gas_error: String,
    }

    impl Default for StubChain {
        fn default() -> Self {
            Self {
                balance: U256::from(10_000_000_000_000_000_000u128),
                max_fee: 50_000_000_000,
                commit_fee: U256::from(1_000_000_000_000_000u64),
                escrow_fee: U256::from(2_000_000_000_000_000u64),
                rfq_fee: U256::from(3_000_000_000_000_000u64),
                premium_quote: U256::from(4_000_000_000_000_000u64),
                gas: Some(21_000),
                gas_error: String::new(),
            }
        }
    }

    #[async_trait]
    impl ChainClient for StubChain {
        async fn safe_head(&self) -> Result<u64, ChainClientError> {
            Ok(0)
        }

        async fn fetch_logs(&self, _: u64, _: u64) -> Result<Vec<RawLog>, ChainClientError> {
            Ok(Vec::new())
        }

        fn decode_log(&self, _: &RawLog) -> Option<DecodedLog> {
            None
        }

        async fn fee_estimate(&self) -> Result<FeeEstimate, ChainClientError> {
            Ok(FeeEstimate {
                max_fee_per_gas: self.max_fee,
                source: FeeSource::Eip1559,
            })
        }

        async fn native_balance(&self, _: Address) -> Result<U256, ChainClientError> {
            Ok(self.balance)
        }

        async fn owner_of_character(&self, _: U256) -> Result<Address, ChainClientError> {
            Ok(Address::ZERO)
        }

        async fn character_last_level_up_epoch(&self, _: U256) -> Result<u32, ChainClientError> {
            Ok(0)
        }

        async fn lootbox_credits(&self, _: U256, _: u32) -> Result<u32, ChainClientError> {
            Ok(0)
        }

        async fn lootbox_bound_credits(
            &self,
            _: U256,
            _: u32,
            _: u8,
        ) -> Result<u32, ChainClientError> {
            Ok(0)
        }

        async fn upgrade_stone_balance(&self, _: U256) -> Result<u32, ChainClientError> {
            Ok(0)
        }

        async fn commit_fee(&self) -> Result<U256, ChainClientError> {
            Ok(self.commit_fee)
        }

        async fn premium_purchase_quote(
            &self,
            _: U256,
            _: u8,
            _: u16,
        ) -> Result<U256, ChainClientError> {
            Ok(self.premium_quote)
        }

        async fn trade_escrow_create_fee(&self) -> Result<U256, ChainClientError> {
            Ok(self.escrow_fee)
        }

        async fn rfq_create_fee(&self) -> Result<U256, ChainClientError> {
            Ok(self.rfq_fee)
        }

        async fn estimate_action_gas(
            &self,
            action: &ActionInput,
            _: U256,
        ) -> Result<u64, ChainClientError> {
            if matches!(action, ActionInput::EquipBest { .. }) {
                return Err(ChainClientError::NotEstimable(
                    "dynamic_action_not_estimable:equip_best".to_string(),
                ));
            }
            match self.gas {
                Some(gas) => Ok(gas),
                None => Err(ChainClientError::NotEstimable(self.gas_error.clone())),
            }
        }
    }

    fn estimator(chain: StubChain) -> CostEstimator {
        CostEstimator::new(Arc::new(chain), Address::repeat_byte(0x77))
    }

    fn start_dungeon() -> ActionInput {
        ActionInput::StartDungeon {
            character_id: 9,
            difficulty: 2,
            dungeon_level: 5,
            variance_mode: 1,
        }
    }

    #[tokio::test]
    async fn test_live_estimate_carries_exact_cost_math() {
        let estimate = estimator(StubChain::default())
            .estimate(&start_dungeon())
            .await
            .unwrap();

        // 21_000 gas * 50 gwei = 1.05e15 wei, plus the 1e15 commit fee.
        assert_eq!(estimate.code, ESTIMATE_OK);
        assert_eq!(estimate.reason, "Estimated via eth_estimateGas");
        assert_eq!(estimate.estimated_gas, "21000");
        assert_eq!(estimate.estimated_tx_cost_wei, "1050000000000000");
        assert_eq!(estimate.required_value_wei, "1000000000000000");
        assert_eq!(estimate.total_estimated_cost_wei, "2050000000000000");
        assert!(estimate.can_afford);
    }

    #[tokio::test]
    async fn test_revert_degrades_to_fallback_gas_with_classified_reason() {
        let chain = StubChain {
            gas: None,
            gas_error: "execution reverted: RunAlreadyActive".to_string(),
            ..StubChain::default()
        };

        let estimate = estimator(chain).estimate(&start_dungeon()).await.unwrap();

        assert_eq!(estimate.code, ESTIMATE_FALLBACK);
        assert_eq!(estimate.estimated_gas, "250000");
        assert!(
            estimate.reason.starts_with("PRECHECK_RUN_ALREADY_ACTIVE:"),
            "unexpected reason: {}",
            estimate.reason
        );
    }

    #[tokio::test]
    async fn test_equip_best_never_estimates_live() {
        let estimate = estimator(StubChain::default())
            .estimate(&ActionInput::EquipBest {
                character_id: 4,
                objective: Default::default(),
            })
            .await
            .unwrap();

        assert_eq!(estimate.code, ESTIMATE_FALLBACK);
        assert_eq!(estimate.estimated_gas, "450000");
        assert_eq!(estimate.required_value_wei, "0");
    }

    #[tokio::test]
    async fn test_verdict_flips_when_balance_is_short() {
        let chain = StubChain {
            balance: U256::from(1_000u64),
            ..StubChain::default()
        };

        let estimate = estimator(chain).estimate(&start_dungeon()).await.unwrap();
        assert!(!estimate.can_afford);
    }

    #[tokio::test]
    async fn test_flat_actions_require_no_value() {
        let estimate = estimator(StubChain::default())
            .estimate(&ActionInput::ClaimPlayer {
                epoch_id: 2,
                character_id: 9,
            })
            .await
            .unwrap();

        assert_eq!(estimate.required_value_wei, "0");
        assert_eq!(estimate.action_type, "claim_player");
    }

    #[tokio::test]
    async fn test_premium_purchase_value_comes_from_the_vault_quote() {
        let estimate = estimator(StubChain::default())
            .estimate(&ActionInput::BuyPremiumLootboxes {
                character_id: 3,
                difficulty: 1,
                amount: 5,
            })
            .await
            .unwrap();

        assert_eq!(estimate.required_value_wei, "4000000000000000");
    }

    #[tokio::test]
    async fn test_create_offer_and_rfq_use_their_market_fees() {
        let offer = estimator(StubChain::default())
            .estimate(&ActionInput::CreateTradeOffer {
                offered_item_ids: vec![1],
                requested_item_ids: vec![2],
                requested_mmo: "1000".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(offer.required_value_wei, "2000000000000000");

        let rfq = estimator(StubChain::default())
            .estimate(&ActionInput::CreateRfq {
                slot: 1,
                min_tier: 10,
                acceptable_set_mask: "0".to_string(),
                mmo_offered: "1000".to_string(),
                expiry: None,
            })
            .await
            .unwrap();
        assert_eq!(rfq.required_value_wei, "3000000000000000");
    }
}
