//! Contract writes through a smart account.

use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::info;

use crowd_account::SmartAccount;
use crowd_bundler::UserOperationSender;
use crowd_types::{Call, Notice, Notifier, UserOperationReceipt};

use crate::contract::DaoContract;
use crate::error::DaoError;

/// Packages DAO calls and submits them from a smart account. Success raises
/// a notice; failures are returned for the caller to classify.
pub struct DaoWriter {
    contract: DaoContract,
    sender: Arc<dyn UserOperationSender>,
    notifier: Arc<dyn Notifier>,
}

impl DaoWriter {
    pub fn new(
        contract: DaoContract,
        sender: Arc<dyn UserOperationSender>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            contract,
            sender,
            notifier,
        }
    }

    async fn send(
        &self,
        account: &SmartAccount,
        call: Call,
        success: Notice,
    ) -> Result<UserOperationReceipt, DaoError> {
        let receipt = self.sender.submit(account, &[call], None).await?;
        info!(tx = ?receipt.transaction_hash(), "{}", success.title);
        self.notifier.notify(success);
        Ok(receipt)
    }

    pub async fn create_activity(
        &self,
        account: &SmartAccount,
        description: &str,
        amount: U256,
    ) -> Result<UserOperationReceipt, DaoError> {
        let call = self.contract.create_activity(description, amount)?;
        self.send(account, call, Notice::success("Activity created", description))
            .await
    }

    pub async fn vote(
        &self,
        account: &SmartAccount,
        id: u64,
        support: bool,
    ) -> Result<UserOperationReceipt, DaoError> {
        let call = self.contract.vote(id, support)?;
        let side = if support { "for" } else { "against" };
        self.send(account, call, Notice::success("Vote recorded", format!("Voted {side} activity {id}")))
            .await
    }

    pub async fn transfer(
        &self,
        account: &SmartAccount,
        to: Address,
        amount: U256,
    ) -> Result<UserOperationReceipt, DaoError> {
        let call = self.contract.transfer(to, amount)?;
        self.send(account, call, Notice::success("Transfer sent", format!("{amount} to {to:?}")))
            .await
    }

    /// Plain value transfer from the account, not via the contract.
    pub async fn transfer_native(
        &self,
        account: &SmartAccount,
        to: Address,
        value: U256,
    ) -> Result<UserOperationReceipt, DaoError> {
        let call = Call::new(to).with_value(value);
        self.send(account, call, Notice::success("Transfer sent", format!("{value} wei to {to:?}")))
            .await
    }
}
