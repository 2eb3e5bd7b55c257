//! Contract reads.

use ethers::types::Address;
use std::sync::Arc;
use tracing::debug;

use crowd_bundler::ChainReader;
use crowd_types::Activity;

use crate::contract::{DaoContract, ACTIVITY_COUNT, HAS_VOTED};
use crate::error::DaoError;

#[derive(Clone)]
pub struct DaoReader {
    contract: DaoContract,
    chain: Arc<dyn ChainReader>,
}

impl DaoReader {
    pub fn new(contract: DaoContract, chain: Arc<dyn ChainReader>) -> Self {
        Self { contract, chain }
    }

    pub fn contract(&self) -> DaoContract {
        self.contract
    }

    pub async fn fetch_activity(&self, id: u64) -> Result<Activity, DaoError> {
        let data = self.contract.get_activity_data(id)?;
        let output = self.chain.call(self.contract.address, data).await?;
        let activity = self.contract.decode_activity(id, &output)?;
        debug!(id, creator = %activity.creator, "fetched activity");
        Ok(activity)
    }

    pub async fn activity_count(&self) -> Result<u64, DaoError> {
        let data = self.contract.activity_count_data()?;
        let output = self.chain.call(self.contract.address, data).await?;
        let count = self.contract.decode_uint("activityCount", ACTIVITY_COUNT, &output)?;
        Ok(count.low_u64())
    }

    pub async fn has_voted(&self, id: u64, voter: Address) -> Result<bool, DaoError> {
        let data = self.contract.has_voted_data(id, voter)?;
        let output = self.chain.call(self.contract.address, data).await?;
        self.contract.decode_bool("hasVoted", HAS_VOTED, &output)
    }
}
