//! Build, sign, send and confirm user operations.

use async_trait::async_trait;
use ethers::types::{Bytes, U256};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crowd_account::{encode_execute, SmartAccount};
use crowd_config::AppConfig;
use crowd_types::{Call, FeeQuote, UserOperationReceipt};

use crate::chain::{ChainReader, EthersChain};
use crate::classify::revert_reason;
use crate::client::{Bundler, HttpBundler};
use crate::error::BundlerError;
use crate::user_op::{UserOperation, DUMMY_SIGNATURE};

/// Sends calls from a smart account and waits for them to land.
#[async_trait]
pub trait UserOperationSender: Send + Sync {
    /// Submit `calls` as one user operation from `account`. Uses the
    /// bundler's fast fee quote unless `fees` overrides it. Resolves once the
    /// bundler reports a receipt.
    async fn submit(
        &self,
        account: &SmartAccount,
        calls: &[Call],
        fees: Option<FeeQuote>,
    ) -> Result<UserOperationReceipt, BundlerError>;
}

pub struct UserOperationSubmitter {
    bundler: Arc<dyn Bundler>,
    chain: Arc<dyn ChainReader>,
    chain_id: u64,
    /// Sponsor every operation through the paymaster when set.
    paymaster_policy_id: Option<String>,
    poll_interval: Duration,
    receipt_timeout: Option<Duration>,
}

impl UserOperationSubmitter {
    pub fn new(bundler: Arc<dyn Bundler>, chain: Arc<dyn ChainReader>, chain_id: u64) -> Self {
        Self {
            bundler,
            chain,
            chain_id,
            paymaster_policy_id: None,
            poll_interval: Duration::from_secs(1),
            receipt_timeout: None,
        }
    }

    /// HTTP bundler and `ethers` provider from the configured URLs.
    pub fn from_config(config: &AppConfig) -> Result<Self, BundlerError> {
        let bundler = Arc::new(HttpBundler::new(config.bundler_url.clone()));
        let chain = Arc::new(EthersChain::connect(&config.rpc_url)?);
        let mut submitter = Self::new(bundler, chain, config.chain_id)
            .with_poll_interval(config.submission.poll_interval())
            .with_receipt_timeout(config.submission.receipt_timeout());
        submitter.paymaster_policy_id = config.paymaster_policy_id.clone();
        Ok(submitter)
    }

    pub fn with_paymaster_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.paymaster_policy_id = Some(policy_id.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_receipt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn chain(&self) -> Arc<dyn ChainReader> {
        Arc::clone(&self.chain)
    }

    /// Fill in everything but the signature: nonce, factory fields for a
    /// counterfactual sender, fees and gas limits.
    pub async fn prepare(
        &self,
        account: &SmartAccount,
        calls: &[Call],
        fees: Option<FeeQuote>,
    ) -> Result<UserOperation, BundlerError> {
        let entry_point = account.environment.entry_point;
        let fees = match fees {
            Some(fees) => fees,
            None => self.bundler.gas_price().await?.fast,
        };
        let nonce = self
            .chain
            .entry_point_nonce(entry_point, account.address, U256::zero())
            .await?;

        let mut op = UserOperation {
            sender: account.address,
            nonce,
            call_data: encode_execute(calls)?,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            signature: Bytes::from_str(DUMMY_SIGNATURE)
                .map_err(|e| BundlerError::Encoding(e.to_string()))?,
            ..UserOperation::default()
        };

        if !self.chain.is_deployed(account.address).await? {
            debug!(sender = %account.address, "sender has no code, attaching factory");
            op.factory = Some(account.factory());
            op.factory_data = Some(account.factory_data()?);
        }

        match &self.paymaster_policy_id {
            Some(policy) => {
                let sponsorship = self.bundler.sponsor(&op, entry_point, Some(policy)).await?;
                op.apply_sponsorship(&sponsorship);
            }
            None => {
                let estimate = self.bundler.estimate_gas(&op, entry_point).await?;
                op.apply_estimate(&estimate);
            }
        }
        Ok(op)
    }

    async fn wait_for_receipt(&self, hash: ethers::types::H256) -> Result<UserOperationReceipt, BundlerError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.bundler.receipt(hash).await? {
                return Ok(receipt);
            }
            if let Some(timeout) = self.receipt_timeout {
                if started.elapsed() >= timeout {
                    return Err(BundlerError::ReceiptTimeout(format!("{hash:?}")));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl UserOperationSender for UserOperationSubmitter {
    async fn submit(
        &self,
        account: &SmartAccount,
        calls: &[Call],
        fees: Option<FeeQuote>,
    ) -> Result<UserOperationReceipt, BundlerError> {
        let entry_point = account.environment.entry_point;
        let mut op = self.prepare(account, calls, fees).await?;

        let hash = op.hash(entry_point, self.chain_id);
        op.signature = account.sign_user_operation_hash(hash).await?;

        let sent = self.bundler.send(&op, entry_point).await?;
        if sent != hash {
            warn!(local = ?hash, bundler = ?sent, "bundler returned a different user operation hash");
        }
        info!(user_op = ?sent, sender = %op.sender, calls = calls.len(), "user operation sent");

        let receipt = self.wait_for_receipt(sent).await?;
        if !receipt.success {
            let reason = match receipt.reason.as_deref() {
                Some(raw) => revert_reason(raw).unwrap_or_else(|| raw.to_string()),
                None => "execution reverted".to_string(),
            };
            return Err(BundlerError::Reverted(format!("{sent:?}"), reason));
        }
        info!(
            user_op = ?sent,
            tx = ?receipt.transaction_hash(),
            "user operation included"
        );
        Ok(receipt)
    }
}
