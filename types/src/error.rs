//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for values that cross crate boundaries.
#[derive(Debug, Error)]
pub enum CrowdError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex data: {0}")]
    InvalidHex(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unknown deployment status: {0}")]
    UnknownStatus(String),

    #[error("{0}")]
    Other(String),
}
