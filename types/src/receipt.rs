//! User operation receipts as returned by `eth_getUserOperationReceipt`.

use ethers::types::{Address, H256, U256, U64};
use serde::{Deserialize, Serialize};

/// Receipt for an included user operation.
///
/// Only used for display and status transitions; fields the toolkit does not
/// read are kept in `logs` as raw JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: H256,
    #[serde(default)]
    pub entry_point: Address,
    pub sender: Address,
    #[serde(default)]
    pub nonce: U256,
    #[serde(default)]
    pub paymaster: Option<Address>,
    #[serde(default)]
    pub actual_gas_cost: U256,
    #[serde(default)]
    pub actual_gas_used: U256,
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
    pub receipt: TransactionReceiptSummary,
}

/// The bundle transaction that included the user operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceiptSummary {
    pub transaction_hash: H256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
}

impl UserOperationReceipt {
    pub fn transaction_hash(&self) -> H256 {
        self.receipt.transaction_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_bundler_receipt() {
        let json = format!(
            r#"{{
                "userOpHash": "0x{h}",
                "sender": "0x{a}",
                "success": true,
                "actualGasCost": "0x5208",
                "receipt": {{"transactionHash": "0x{h}", "blockNumber": "0x10"}}
            }}"#,
            h = "11".repeat(32),
            a = "22".repeat(20),
        );
        let receipt: UserOperationReceipt = serde_json::from_str(&json).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.actual_gas_cost, U256::from(0x5208));
        assert_eq!(receipt.receipt.block_number, Some(U64::from(16)));
        assert_eq!(receipt.transaction_hash(), H256::repeat_byte(0x11));
        assert!(receipt.paymaster.is_none());
    }
}
