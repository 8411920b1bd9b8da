//! JSON-RPC implementation of the `ChainClient` trait.
//!
//! This module provides `RpcChainClient`, which talks to an EVM endpoint
//! through an erased alloy provider.
//!
//! ## Key Features
//!
//! - **Confirmation-aware head**: `safe_head` subtracts the configured
//!   confirmation depth so the indexer never reads blocks that can reorg.
//! - **Single filter per range**: `fetch_logs` queries all watched contract
//!   addresses in one `eth_getLogs` call.
//! - **Simulation-based gas**: `estimate_action_gas` builds the first
//!   transaction of each action and runs it through `eth_estimateGas` from
//!   the operator account, using deterministic placeholder secrets for
//!   commit-reveal actions.

use std::str::FromStr;

use alloy::primitives::{
    Address, B256, U256,
    aliases::{U40, U96},
};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use async_trait::async_trait;

use super::contracts::{IFeeVault, IGameWorld, IRfqMarket, ITradeEscrow};
use super::{ChainClient, ContractAddresses, FeeEstimate, FeeSource, RawLog, decode};
use crate::errors::ChainClientError;
use deeprun_shared::types::{ActionInput, DecodedLog};

/// On-chain action discriminator for max-mode lootbox opens.
const ACTION_TYPE_LOOTBOX_OPEN: u8 = 1;
/// On-chain action discriminator for dungeon runs.
const ACTION_TYPE_DUNGEON_RUN: u8 = 2;
/// Nonce used for simulated commits. Never submitted, so any value works.
const ESTIMATE_NONCE: u64 = 1;

/// `RpcChainClient` reads chain state and simulates game actions over
/// JSON-RPC.
pub struct RpcChainClient {
    provider: DynProvider,
    signer: Address,
    confirmations: u64,
    addresses: ContractAddresses,
}

impl RpcChainClient {
    /// Connects to the endpoint and returns a ready client.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - HTTP or WebSocket endpoint URL.
    /// * `signer` - Operator account used as `from` in gas simulations.
    /// * `confirmations` - Blocks to subtract from the chain head.
    /// * `addresses` - Deployed game contract addresses.
    ///
    /// # Returns
    ///
    /// A connected `RpcChainClient`, or a `ChainClientError` if the
    /// endpoint cannot be reached.
    pub async fn connect(
        rpc_url: &str,
        signer: Address,
        confirmations: u64,
        addresses: ContractAddresses,
    ) -> Result<Self, ChainClientError> {
        let provider = ProviderBuilder::new().connect(rpc_url).await?.erased();
        Ok(Self {
            provider,
            signer,
            confirmations,
            addresses,
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn safe_head(&self) -> Result<u64, ChainClientError> {
        let head = self.provider.get_block_number().await?;
        Ok(head.saturating_sub(self.confirmations))
    }

    async fn fetch_logs(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainClientError> {
        let filter = Filter::new()
            .address(self.addresses.all().to_vec())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.provider.get_logs(&filter).await?;

        let mut raw = Vec::with_capacity(logs.len());
        for log in logs {
            let (Some(block_number), Some(log_index), Some(block_hash), Some(transaction_hash)) = (
                log.block_number,
                log.log_index,
                log.block_hash,
                log.transaction_hash,
            ) else {
                // Pending logs carry no position and cannot be replay-marked.
                continue;
            };

            raw.push(RawLog {
                address: log.inner.address,
                topics: log.inner.data.topics().to_vec(),
                data: log.inner.data.data.clone(),
                block_number,
                block_hash,
                log_index,
                transaction_hash,
            });
        }

        Ok(raw)
    }

    fn decode_log(&self, log: &RawLog) -> Option<DecodedLog> {
        decode::decode_log(&self.addresses, log)
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, ChainClientError> {
        match self.provider.estimate_eip1559_fees().await {
            Ok(fees) => Ok(FeeEstimate {
                max_fee_per_gas: fees.max_fee_per_gas,
                source: FeeSource::Eip1559,
            }),
            Err(_) => {
                let gas_price = self.provider.get_gas_price().await?;
                Ok(FeeEstimate {
                    max_fee_per_gas: gas_price,
                    source: FeeSource::LegacyGasPrice,
                })
            }
        }
    }

    async fn native_balance(&self, address: Address) -> Result<U256, ChainClientError> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn owner_of_character(&self, character_id: U256) -> Result<Address, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world.ownerOfCharacter(character_id).call().await?)
    }

    async fn character_last_level_up_epoch(
        &self,
        character_id: U256,
    ) -> Result<u32, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world.characterLastLevelUpEpoch(character_id).call().await?)
    }

    async fn lootbox_credits(
        &self,
        character_id: U256,
        tier: u32,
    ) -> Result<u32, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world.lootboxCredits(character_id, tier).call().await?)
    }

    async fn lootbox_bound_credits(
        &self,
        character_id: U256,
        tier: u32,
        variance_mode: u8,
    ) -> Result<u32, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world
            .lootboxBoundCredits(character_id, tier, variance_mode)
            .call()
            .await?)
    }

    async fn upgrade_stone_balance(&self, character_id: U256) -> Result<u32, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world.upgradeStoneBalance(character_id).call().await?)
    }

    async fn commit_fee(&self) -> Result<U256, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        Ok(world.commitFee().call().await?)
    }

    async fn premium_purchase_quote(
        &self,
        character_id: U256,
        difficulty: u8,
        amount: u16,
    ) -> Result<U256, ChainClientError> {
        let vault = IFeeVault::new(self.addresses.fee_vault, &self.provider);
        let quote = vault
            .quotePremiumPurchase(character_id, difficulty, amount)
            .call()
            .await?;
        Ok(quote.ethCost)
    }

    async fn trade_escrow_create_fee(&self) -> Result<U256, ChainClientError> {
        let escrow = ITradeEscrow::new(self.addresses.trade_escrow, &self.provider);
        Ok(escrow.createFee().call().await?)
    }

    async fn rfq_create_fee(&self) -> Result<U256, ChainClientError> {
        let rfq = IRfqMarket::new(self.addresses.rfq_market, &self.provider);
        Ok(rfq.createFee().call().await?)
    }

    async fn estimate_action_gas(
        &self,
        action: &ActionInput,
        value: U256,
    ) -> Result<u64, ChainClientError> {
        let world = IGameWorld::new(self.addresses.game_world, &self.provider);
        let vault = IFeeVault::new(self.addresses.fee_vault, &self.provider);
        let rfq = IRfqMarket::new(self.addresses.rfq_market, &self.provider);
        let escrow = ITradeEscrow::new(self.addresses.trade_escrow, &self.provider);

        let gas = match action {
            ActionInput::CreateCharacter {
                race,
                class_type,
                name,
            } => {
                world
                    .createCharacter(*race, *class_type, name.clone())
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::StartDungeon {
                character_id,
                difficulty,
                dungeon_level,
                variance_mode,
            } => {
                let character = U256::from(*character_id);
                let hash = world
                    .hashDungeonRun(
                        B256::repeat_byte(0x11),
                        self.signer,
                        character,
                        ESTIMATE_NONCE,
                        *difficulty,
                        *dungeon_level,
                        *variance_mode,
                    )
                    .call()
                    .await?;
                world
                    .commitActionWithVariance(
                        character,
                        ACTION_TYPE_DUNGEON_RUN,
                        hash,
                        ESTIMATE_NONCE,
                        *variance_mode,
                    )
                    .from(self.signer)
                    .value(value)
                    .estimate_gas()
                    .await?
            }
            ActionInput::NextRoom {
                character_id,
                potion_choice,
                ability_choice,
                potion_choices,
                ability_choices,
            } => {
                let character = U256::from(*character_id);
                match (potion_choices, ability_choices) {
                    (Some(potions), Some(abilities)) if potions.len() > 1 => {
                        world
                            .resolveRooms(character, potions.clone(), abilities.clone())
                            .from(self.signer)
                            .estimate_gas()
                            .await?
                    }
                    _ => {
                        world
                            .resolveNextRoom(
                                character,
                                potion_choice.unwrap_or(0),
                                ability_choice.unwrap_or(0),
                            )
                            .from(self.signer)
                            .estimate_gas()
                            .await?
                    }
                }
            }
            ActionInput::OpenLootboxesMax {
                character_id,
                tier,
                max_amount,
                variance_mode,
            } => {
                let character = U256::from(*character_id);
                let hash = world
                    .hashLootboxOpen(
                        B256::repeat_byte(0x22),
                        self.signer,
                        character,
                        ESTIMATE_NONCE,
                        *tier,
                        *max_amount,
                        *variance_mode,
                        true,
                    )
                    .call()
                    .await?;
                world
                    .commitActionWithVariance(
                        character,
                        ACTION_TYPE_LOOTBOX_OPEN,
                        hash,
                        ESTIMATE_NONCE,
                        *variance_mode,
                    )
                    .from(self.signer)
                    .value(value)
                    .estimate_gas()
                    .await?
            }
            ActionInput::EquipBest { .. } => {
                // Calldata depends on engine-side gear planning at execution
                // time, so there is nothing meaningful to simulate.
                return Err(ChainClientError::NotEstimable(
                    "dynamic_action_not_estimable:equip_best".to_string(),
                ));
            }
            ActionInput::RerollItem {
                character_id,
                item_id,
            } => {
                world
                    .rerollItemStats(U256::from(*character_id), U256::from(*item_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::ForgeSetPiece {
                character_id,
                item_id,
                target_set_id,
            } => {
                world
                    .forgeSetPiece(
                        U256::from(*character_id),
                        U256::from(*item_id),
                        *target_set_id,
                    )
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::BuyPremiumLootboxes {
                character_id,
                difficulty,
                amount,
            } => {
                vault
                    .buyPremiumLootboxes(U256::from(*character_id), *difficulty, *amount)
                    .from(self.signer)
                    .value(value)
                    .estimate_gas()
                    .await?
            }
            ActionInput::FinalizeEpoch { epoch_id } => {
                vault
                    .finalizeEpoch(*epoch_id)
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::ClaimPlayer {
                epoch_id,
                character_id,
            } => {
                vault
                    .claimPlayer(*epoch_id, U256::from(*character_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::ClaimDeployer { epoch_id } => {
                vault
                    .claimDeployer(*epoch_id)
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::CreateTradeOffer {
                offered_item_ids,
                requested_item_ids,
                requested_mmo,
            } => {
                let offered = offered_item_ids.iter().copied().map(U256::from).collect();
                let requested = requested_item_ids.iter().copied().map(U256::from).collect();
                let mmo = parse_u96(requested_mmo)?;
                escrow
                    .createOffer(offered, requested, mmo)
                    .from(self.signer)
                    .value(value)
                    .estimate_gas()
                    .await?
            }
            ActionInput::FulfillTradeOffer { offer_id } => {
                escrow
                    .fulfillOffer(U256::from(*offer_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::CancelTradeOffer { offer_id } => {
                escrow
                    .cancelOffer(U256::from(*offer_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::CancelExpiredTradeOffer { offer_id } => {
                escrow
                    .cancelExpiredOffer(U256::from(*offer_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::CreateRfq {
                slot,
                min_tier,
                acceptable_set_mask,
                mmo_offered,
                expiry,
            } => {
                let mask = parse_u256(acceptable_set_mask)?;
                let mmo = parse_u96(mmo_offered)?;
                let expiry = expiry_to_u40(expiry.unwrap_or(0))?;
                rfq.createRFQ(*slot, *min_tier, mask, mmo, expiry)
                    .from(self.signer)
                    .value(value)
                    .estimate_gas()
                    .await?
            }
            ActionInput::FillRfq {
                rfq_id,
                item_token_id,
            } => {
                rfq.fillRFQ(U256::from(*rfq_id), U256::from(*item_token_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
            ActionInput::CancelRfq { rfq_id } => {
                rfq.cancelRFQ(U256::from(*rfq_id))
                    .from(self.signer)
                    .estimate_gas()
                    .await?
            }
        };

        Ok(gas)
    }
}

fn parse_u256(value: &str) -> Result<U256, ChainClientError> {
    U256::from_str(value)
        .map_err(|err| ChainClientError::NotEstimable(format!("invalid uint256 `{value}`: {err}")))
}

fn parse_u96(value: &str) -> Result<U96, ChainClientError> {
    U96::from_str(value)
        .map_err(|err| ChainClientError::NotEstimable(format!("invalid uint96 `{value}`: {err}")))
}

fn expiry_to_u40(value: u64) -> Result<U40, ChainClientError> {
    U40::try_from(value)
        .map_err(|err| ChainClientError::NotEstimable(format!("expiry out of range: {err}")))
}
