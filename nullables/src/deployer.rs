//! Nullable deployer: hands out sequential addresses.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes};
use std::collections::HashSet;
use std::sync::Mutex;

use crowd_deployer::{ArtifactSource, ContractDeployer, DeployError};

#[derive(Default)]
struct State {
    deployed: Vec<(String, Vec<Token>)>,
    fail_on: Option<String>,
}

/// Deploys nothing; the n-th deployment gets address `0x..n`.
#[derive(Default)]
pub struct NullDeployer {
    state: Mutex<State>,
}

impl NullDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when asked to deploy `name`.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.state.lock().unwrap().fail_on = Some(name.into());
    }

    /// Names deployed so far, in order.
    pub fn deployed(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .deployed
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Constructor arguments `name` was deployed with.
    pub fn args_of(&self, name: &str) -> Option<Vec<Token>> {
        self.state
            .lock()
            .unwrap()
            .deployed
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, args)| args.clone())
    }
}

#[async_trait]
impl ContractDeployer for NullDeployer {
    fn deployer_address(&self) -> Address {
        Address::repeat_byte(0xde)
    }

    async fn deploy(&self, name: &str, _bytecode: Bytes, args: Vec<Token>) -> Result<Address, DeployError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on.as_deref() == Some(name) {
            return Err(DeployError::Transaction {
                name: name.to_string(),
                reason: "execution reverted".into(),
            });
        }
        state.deployed.push((name.to_string(), args));
        Ok(Address::from_low_u64_be(state.deployed.len() as u64))
    }
}

/// Artifacts for every name except the ones marked missing.
#[derive(Default)]
pub struct NullArtifacts {
    missing: HashSet<String>,
}

impl NullArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.missing.insert(name.into());
        self
    }
}

impl ArtifactSource for NullArtifacts {
    fn bytecode(&self, name: &str) -> Result<Bytes, DeployError> {
        if self.missing.contains(name) {
            return Err(DeployError::ArtifactNotFound {
                name: name.to_string(),
                root: "memory".into(),
            });
        }
        Ok(Bytes::from(vec![0x60, 0x80, 0x60, 0x40]))
    }
}
