//! Nullable sender: records submissions instead of building user operations.

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::Mutex;

use crowd_account::SmartAccount;
use crowd_bundler::{BundlerError, UserOperationSender};
use crowd_types::{Call, FeeQuote, TransactionReceiptSummary, UserOperationReceipt};

#[derive(Default)]
struct State {
    submissions: Vec<(Address, Vec<Call>)>,
    failure: Option<(i64, String)>,
}

/// Accepts every submission and returns a successful receipt, unless told
/// to fail.
#[derive(Default)]
pub struct NullSender {
    state: Mutex<State>,
}

impl NullSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later submission with this JSON-RPC error.
    pub fn fail_with(&self, code: i64, message: impl Into<String>) {
        self.state.lock().unwrap().failure = Some((code, message.into()));
    }

    pub fn succeed(&self) {
        self.state.lock().unwrap().failure = None;
    }

    /// `(sender, calls)` for every submission, including failed ones.
    pub fn submissions(&self) -> Vec<(Address, Vec<Call>)> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl UserOperationSender for NullSender {
    async fn submit(
        &self,
        account: &SmartAccount,
        calls: &[Call],
        _fees: Option<FeeQuote>,
    ) -> Result<UserOperationReceipt, BundlerError> {
        let mut state = self.state.lock().unwrap();
        state.submissions.push((account.address, calls.to_vec()));
        if let Some((code, message)) = &state.failure {
            return Err(BundlerError::Rpc {
                code: *code,
                message: message.clone(),
                data: None,
            });
        }
        let n = state.submissions.len() as u64;
        Ok(UserOperationReceipt {
            user_op_hash: H256::from_low_u64_be(n),
            entry_point: account.environment.entry_point,
            sender: account.address,
            nonce: U256::from(n - 1),
            paymaster: None,
            actual_gas_cost: U256::zero(),
            actual_gas_used: U256::zero(),
            success: true,
            reason: None,
            logs: Vec::new(),
            receipt: TransactionReceiptSummary {
                transaction_hash: H256::from_low_u64_be(0x1000 + n),
                block_number: Some(n.into()),
                gas_used: None,
            },
        })
    }
}
