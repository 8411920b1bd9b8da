//! Chain access module for the deeprun pipeline.
//!
//! Provides the `ChainClient` trait over everything the pipeline needs from an
//! EVM endpoint: confirmation-aware head tracking, log fetching and decoding,
//! fee quotes, contract reads and gas estimation. The `RpcChainClient`
//! implementation talks JSON-RPC through alloy.

use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

use crate::errors::ChainClientError;
use deeprun_shared::types::{ActionInput, DecodedLog};

pub mod contracts;

mod decode;
mod rpc;

pub use rpc::RpcChainClient;

/// Deployed addresses of the game contracts the pipeline watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub game_world: Address,
    pub fee_vault: Address,
    pub items: Address,
    pub rfq_market: Address,
    pub trade_escrow: Address,
}

impl ContractAddresses {
    /// All watched addresses, in the order they are passed to `eth_getLogs`.
    pub fn all(&self) -> [Address; 5] {
        [
            self.game_world,
            self.fee_vault,
            self.items,
            self.rfq_market,
            self.trade_escrow,
        ]
    }
}

/// An undecoded log row as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub log_index: u64,
    pub transaction_hash: B256,
}

/// How a fee quote was obtained from the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    Eip1559,
    LegacyGasPrice,
}

/// A per-gas fee quote used for cost projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub max_fee_per_gas: u128,
    pub source: FeeSource,
}

/// Trait for reading chain state and simulating game actions.
///
/// Provides a unified interface over the RPC endpoint so the indexer, the
/// cost estimator and the worker can be tested against in-memory fakes.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns the highest block the pipeline is allowed to process.
    ///
    /// The configured confirmation depth is subtracted from the chain head;
    /// a head still inside the confirmation window yields block zero.
    ///
    /// # Returns
    ///
    /// The safe head block number, or a `ChainClientError` if the endpoint
    /// cannot be reached.
    async fn safe_head(&self) -> Result<u64, ChainClientError>;

    /// Fetches all logs emitted by the watched contracts in the inclusive
    /// block range.
    ///
    /// # Arguments
    ///
    /// * `from_block` - First block of the range, inclusive.
    /// * `to_block` - Last block of the range, inclusive.
    ///
    /// # Returns
    ///
    /// The matching logs, or a `ChainClientError` if the endpoint rejects
    /// the query. Range-size rejections are surfaced verbatim so the caller
    /// can shrink the window and retry.
    async fn fetch_logs(&self, from_block: u64, to_block: u64)
    -> Result<Vec<RawLog>, ChainClientError>;

    /// Decodes a raw log into a known world event, dispatching on the
    /// emitting address. Logs from unknown addresses or with unknown topics
    /// return `None` and are skipped by the indexer.
    fn decode_log(&self, log: &RawLog) -> Option<DecodedLog>;

    /// Returns the current per-gas fee quote, falling back from EIP-1559
    /// estimation to the legacy gas price when the endpoint lacks fee
    /// history support.
    async fn fee_estimate(&self) -> Result<FeeEstimate, ChainClientError>;

    /// Returns the native balance of an account in wei.
    async fn native_balance(&self, address: Address) -> Result<U256, ChainClientError>;

    /// Returns the owner of a character.
    async fn owner_of_character(&self, character_id: U256) -> Result<Address, ChainClientError>;

    /// Returns the epoch in which a character last levelled up.
    async fn character_last_level_up_epoch(
        &self,
        character_id: U256,
    ) -> Result<u32, ChainClientError>;

    /// Returns the generic lootbox credits of a character at a tier.
    async fn lootbox_credits(
        &self,
        character_id: U256,
        tier: u32,
    ) -> Result<u32, ChainClientError>;

    /// Returns the variance-bound lootbox credits of a character at a tier.
    async fn lootbox_bound_credits(
        &self,
        character_id: U256,
        tier: u32,
        variance_mode: u8,
    ) -> Result<u32, ChainClientError>;

    /// Returns the upgrade stone balance of a character.
    async fn upgrade_stone_balance(&self, character_id: U256) -> Result<u32, ChainClientError>;

    /// Returns the fee attached to a commit transaction.
    async fn commit_fee(&self) -> Result<U256, ChainClientError>;

    /// Returns the native cost of a premium lootbox purchase.
    async fn premium_purchase_quote(
        &self,
        character_id: U256,
        difficulty: u8,
        amount: u16,
    ) -> Result<U256, ChainClientError>;

    /// Returns the fee attached to creating a trade offer.
    async fn trade_escrow_create_fee(&self) -> Result<U256, ChainClientError>;

    /// Returns the fee attached to creating an RFQ.
    async fn rfq_create_fee(&self) -> Result<U256, ChainClientError>;

    /// Simulates the first transaction of an action and returns its gas
    /// limit.
    ///
    /// Commit-reveal actions are simulated through their commit call with a
    /// deterministic placeholder secret. Actions whose calldata depends on
    /// engine-side planning cannot be simulated and return
    /// `ChainClientError::NotEstimable`.
    ///
    /// # Arguments
    ///
    /// * `action` - The queued action to simulate.
    /// * `value` - Native value attached to the simulated transaction.
    ///
    /// # Returns
    ///
    /// The estimated gas limit, or a `ChainClientError` carrying the revert
    /// or transport failure.
    async fn estimate_action_gas(
        &self,
        action: &ActionInput,
        value: U256,
    ) -> Result<u64, ChainClientError>;
}
