//! Deploying a counterfactual account with a no-op user operation.

use std::sync::Arc;
use tracing::{info, warn};

use crowd_account::{DeploymentTracker, SmartAccount};
use crowd_types::{Call, DeploymentStatus, UserOperationReceipt};

use crate::error::BundlerError;
use crate::submitter::UserOperationSender;

/// Deploys accounts by sending their first user operation.
pub struct AccountDeployer {
    sender: Arc<dyn UserOperationSender>,
}

impl AccountDeployer {
    pub fn new(sender: Arc<dyn UserOperationSender>) -> Self {
        Self { sender }
    }

    /// Deploy `account`. Only valid while the tracker says counterfactual;
    /// the status is claimed before any await, so a concurrent second call
    /// fails fast instead of sending a duplicate operation. A failed submit
    /// rolls the status back.
    pub async fn deploy(
        &self,
        account: &SmartAccount,
        tracker: &DeploymentTracker,
    ) -> Result<UserOperationReceipt, BundlerError> {
        tracker.begin()?;
        info!(account = %account.address, "deploying smart account");

        match self.sender.submit(account, &[Call::noop()], None).await {
            Ok(receipt) => {
                tracker.complete();
                info!(
                    account = %account.address,
                    tx = ?receipt.transaction_hash(),
                    "smart account deployed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracker.rollback();
                warn!(account = %account.address, error = %e, "deployment failed, back to {}", DeploymentStatus::Counterfactual);
                Err(e)
            }
        }
    }
}
