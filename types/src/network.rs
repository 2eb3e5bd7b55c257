//! Network identifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CrowdError;

/// The EVM networks the toolkit knows explorer links for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Ethereum Sepolia testnet.
    Sepolia,
    /// Flow EVM testnet.
    FlowTestnet,
    /// Local development chain (anvil / hardhat).
    Dev,
}

impl Network {
    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Sepolia => 11_155_111,
            Self::FlowTestnet => 545,
            Self::Dev => 31_337,
        }
    }

    /// Look a network up by chain id.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            11_155_111 => Some(Self::Sepolia),
            545 => Some(Self::FlowTestnet),
            31_337 => Some(Self::Dev),
            _ => None,
        }
    }

    /// Block explorer base URL, if the network has one.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Self::Sepolia => Some("https://sepolia.etherscan.io"),
            Self::FlowTestnet => Some("https://evm-testnet.flowscan.io"),
            Self::Dev => None,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sepolia => "sepolia",
            Self::FlowTestnet => "flow-testnet",
            Self::Dev => "dev",
        }
    }
}

impl FromStr for Network {
    type Err = CrowdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sepolia" => Ok(Self::Sepolia),
            "flow-testnet" | "flow" => Ok(Self::FlowTestnet),
            "dev" | "local" => Ok(Self::Dev),
            other => Err(CrowdError::UnknownNetwork(other.to_string())),
        }
    }
}
