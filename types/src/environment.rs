//! Addresses of a deployed delegation framework.

use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Canonical ERC-4337 v0.7 entry point address.
pub const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";

/// The delegation framework contracts an account or delegation is bound to.
///
/// Produced by the deployer from its address map and consumed by the account
/// and delegation crates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatorEnvironment {
    pub entry_point: Address,
    #[serde(default)]
    pub delegation_manager: Address,
    #[serde(default)]
    pub simple_factory: Address,
    #[serde(default)]
    pub hybrid_implementation: Address,
    #[serde(default)]
    pub multisig_implementation: Address,
    /// Creation code of the ERC-1967 proxy the factory deploys.
    #[serde(default)]
    pub proxy_creation_code: Bytes,
    /// Caveat enforcers keyed by contract name (e.g. `AllowedTargetsEnforcer`).
    #[serde(default)]
    pub caveat_enforcers: BTreeMap<String, Address>,
}

impl DelegatorEnvironment {
    pub fn enforcer(&self, name: &str) -> Option<Address> {
        self.caveat_enforcers.get(name).copied()
    }

    /// Whether the manager, factory and hybrid implementation are all set.
    pub fn is_complete(&self) -> bool {
        !self.delegation_manager.is_zero()
            && !self.simple_factory.is_zero()
            && !self.hybrid_implementation.is_zero()
    }
}

impl Default for DelegatorEnvironment {
    fn default() -> Self {
        Self {
            entry_point: Address::from_str(ENTRY_POINT_V07).unwrap_or_default(),
            delegation_manager: Address::zero(),
            simple_factory: Address::zero(),
            hybrid_implementation: Address::zero(),
            multisig_implementation: Address::zero(),
            proxy_creation_code: Bytes::new(),
            caveat_enforcers: BTreeMap::new(),
        }
    }
}
