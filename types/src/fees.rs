//! Gas price quotes returned by the bundler.

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// EIP-1559 fee pair attached to a user operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl FeeQuote {
    pub fn new(max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        Self {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }
}

/// The three speed tiers a bundler quotes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceQuotes {
    pub slow: FeeQuote,
    pub standard: FeeQuote,
    pub fast: FeeQuote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bundler_quote_shape() {
        let json = r#"{
            "slow": {"maxFeePerGas": "0x10", "maxPriorityFeePerGas": "0x1"},
            "standard": {"maxFeePerGas": "0x20", "maxPriorityFeePerGas": "0x2"},
            "fast": {"maxFeePerGas": "0x30", "maxPriorityFeePerGas": "0x3"}
        }"#;
        let quotes: GasPriceQuotes = serde_json::from_str(json).unwrap();
        assert_eq!(quotes.fast.max_fee_per_gas, U256::from(0x30));
        assert_eq!(quotes.slow.max_priority_fee_per_gas, U256::from(1));
    }
}
