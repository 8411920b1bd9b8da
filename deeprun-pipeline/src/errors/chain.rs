//! Error types for the chain client.
//! Defines specific errors that can occur while talking to the RPC node and
//! the game contracts.
use thiserror::Error;

/// Represents errors that can occur within the chain client.
///
/// This enum consolidates transport failures, contract call failures, and
/// requests the client cannot serve, such as gas estimation for actions whose
/// transaction shape is only known at execution time.
#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("Contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("Not estimable: {0}")]
    NotEstimable(String),
}
