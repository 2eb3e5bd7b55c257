//! Nullable bundler: answers JSON-RPC methods from canned values.

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::Mutex;

use crowd_bundler::{Bundler, BundlerError, GasEstimate, Sponsorship, UserOperation};
use crowd_types::{FeeQuote, GasPriceQuotes, TransactionReceiptSummary, UserOperationReceipt};

#[derive(Default)]
struct State {
    sent: Vec<UserOperation>,
    sponsor_policies: Vec<Option<String>>,
    estimates: usize,
    receipt_polls: usize,
    pending_polls: usize,
    send_failure: Option<(i64, String)>,
    revert_reason: Option<String>,
}

/// A bundler that accepts every operation and reports it included.
pub struct NullBundler {
    quotes: GasPriceQuotes,
    state: Mutex<State>,
}

impl NullBundler {
    pub fn new() -> Self {
        let quote = |max: u64, tip: u64| FeeQuote::new(U256::from(max), U256::from(tip));
        Self {
            quotes: GasPriceQuotes {
                slow: quote(1_000_000_000, 100_000_000),
                standard: quote(2_000_000_000, 200_000_000),
                fast: quote(3_000_000_000, 300_000_000),
            },
            state: Mutex::new(State::default()),
        }
    }

    /// Report the receipt as pending for the first `polls` polls.
    pub fn pending_for(&self, polls: usize) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    /// Make every `eth_sendUserOperation` fail with this JSON-RPC error.
    pub fn fail_send(&self, code: i64, message: impl Into<String>) {
        self.state.lock().unwrap().send_failure = Some((code, message.into()));
    }

    /// Report included operations as reverted with `reason`.
    pub fn revert_with(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().revert_reason = Some(reason.into());
    }

    pub fn quotes(&self) -> GasPriceQuotes {
        self.quotes
    }

    /// Every operation accepted so far.
    pub fn sent(&self) -> Vec<UserOperation> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sponsor_policies(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().sponsor_policies.clone()
    }

    pub fn estimates(&self) -> usize {
        self.state.lock().unwrap().estimates
    }

    pub fn receipt_polls(&self) -> usize {
        self.state.lock().unwrap().receipt_polls
    }
}

impl Default for NullBundler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bundler for NullBundler {
    async fn gas_price(&self) -> Result<GasPriceQuotes, BundlerError> {
        Ok(self.quotes)
    }

    async fn estimate_gas(&self, _op: &UserOperation, _entry_point: Address) -> Result<GasEstimate, BundlerError> {
        self.state.lock().unwrap().estimates += 1;
        Ok(GasEstimate {
            pre_verification_gas: U256::from(50_000),
            verification_gas_limit: U256::from(400_000),
            call_gas_limit: U256::from(100_000),
            paymaster_verification_gas_limit: None,
            paymaster_post_op_gas_limit: None,
        })
    }

    async fn sponsor(
        &self,
        _op: &UserOperation,
        _entry_point: Address,
        policy_id: Option<&str>,
    ) -> Result<Sponsorship, BundlerError> {
        self.state
            .lock()
            .unwrap()
            .sponsor_policies
            .push(policy_id.map(str::to_string));
        Ok(Sponsorship {
            paymaster: Address::repeat_byte(0x9a),
            paymaster_data: vec![0x01].into(),
            paymaster_verification_gas_limit: U256::from(60_000),
            paymaster_post_op_gas_limit: U256::from(10_000),
            pre_verification_gas: U256::from(55_000),
            verification_gas_limit: U256::from(450_000),
            call_gas_limit: U256::from(120_000),
        })
    }

    async fn send(&self, op: &UserOperation, _entry_point: Address) -> Result<H256, BundlerError> {
        let mut state = self.state.lock().unwrap();
        if let Some((code, message)) = &state.send_failure {
            return Err(BundlerError::Rpc {
                code: *code,
                message: message.clone(),
                data: None,
            });
        }
        state.sent.push(op.clone());
        Ok(H256::from_low_u64_be(state.sent.len() as u64))
    }

    async fn receipt(&self, hash: H256) -> Result<Option<UserOperationReceipt>, BundlerError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }
        let index = hash.to_low_u64_be() as usize;
        let Some(op) = index.checked_sub(1).and_then(|i| state.sent.get(i)) else {
            return Ok(None);
        };
        Ok(Some(UserOperationReceipt {
            user_op_hash: hash,
            entry_point: Address::zero(),
            sender: op.sender,
            nonce: op.nonce,
            paymaster: op.paymaster,
            actual_gas_cost: U256::from(21_000),
            actual_gas_used: U256::from(21_000),
            success: state.revert_reason.is_none(),
            reason: state.revert_reason.clone(),
            logs: Vec::new(),
            receipt: TransactionReceiptSummary {
                transaction_hash: H256::from_low_u64_be(0x1000 + index as u64),
                block_number: Some((index as u64).into()),
                gas_used: None,
            },
        }))
    }

    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerError> {
        Ok(vec![crowd_types::DelegatorEnvironment::default().entry_point])
    }
}
