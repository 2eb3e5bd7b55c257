//! Deploying the whole framework.

use ethers::abi::Token;
use ethers::types::{Address, Bytes};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crowd_types::DelegatorEnvironment;

use crate::artifact::ArtifactSource;
use crate::deployer::ContractDeployer;
use crate::error::DeployError;
use crate::plan::{deployment_plan, ConstructorArg, ContractSpec};

/// Contract name → deployed address.
pub type AddressMap = BTreeMap<String, Address>;

/// Artifact for the proxy the simple factory deploys accounts behind.
pub const PROXY_ARTIFACT: &str = "ERC1967Proxy";

/// Outcome of a completed run.
#[derive(Clone, Debug)]
pub struct DeploymentReport {
    pub addresses: AddressMap,
    /// Names deployed by this run, in order.
    pub deployed: Vec<String>,
    /// Names taken from the supplied map.
    pub skipped: Vec<String>,
    pub elapsed: Duration,
    pub proxy_creation_code: Bytes,
}

impl DeploymentReport {
    /// The environment accounts and delegations bind to. Enforcers are every
    /// name ending in `Enforcer`.
    pub fn environment(&self) -> DelegatorEnvironment {
        let get = |name: &str| self.addresses.get(name).copied().unwrap_or_default();
        let mut env = DelegatorEnvironment {
            delegation_manager: get("DelegationManager"),
            simple_factory: get("SimpleFactory"),
            hybrid_implementation: get("HybridDeleGatorImpl"),
            multisig_implementation: get("MultiSigDeleGatorImpl"),
            proxy_creation_code: self.proxy_creation_code.clone(),
            caveat_enforcers: self
                .addresses
                .iter()
                .filter(|(name, _)| name.ends_with("Enforcer"))
                .map(|(name, addr)| (name.clone(), *addr))
                .collect(),
            ..DelegatorEnvironment::default()
        };
        if let Some(entry_point) = self.addresses.get("EntryPoint") {
            env.entry_point = *entry_point;
        }
        env
    }
}

pub struct FrameworkDeployer {
    deployer: Arc<dyn ContractDeployer>,
    artifacts: Arc<dyn ArtifactSource>,
    plan: Vec<ContractSpec>,
}

impl FrameworkDeployer {
    pub fn new(deployer: Arc<dyn ContractDeployer>, artifacts: Arc<dyn ArtifactSource>) -> Self {
        Self {
            deployer,
            artifacts,
            plan: deployment_plan(),
        }
    }

    pub fn plan(&self) -> &[ContractSpec] {
        &self.plan
    }

    fn resolve_args(&self, spec: &ContractSpec, addresses: &AddressMap) -> Result<Vec<Token>, DeployError> {
        spec.args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Deployer => Ok(Token::Address(self.deployer.deployer_address())),
                ConstructorArg::Contract(dep) => addresses
                    .get(*dep)
                    .map(|a| Token::Address(*a))
                    .ok_or_else(|| DeployError::MissingDependency {
                        name: spec.name.to_string(),
                        dependency: dep.to_string(),
                    }),
            })
            .collect()
    }

    async fn deploy_one(&self, spec: &ContractSpec, addresses: &AddressMap) -> Result<Address, DeployError> {
        let bytecode = self.artifacts.bytecode(spec.artifact)?;
        let args = self.resolve_args(spec, addresses)?;
        self.deployer.deploy(spec.name, bytecode, args).await
    }

    /// Deploy everything not already in `existing`, in plan order. Entries in
    /// `existing` cost no network call. The first failure aborts the run and
    /// carries the partial map.
    pub async fn deploy_all(&self, existing: AddressMap) -> Result<DeploymentReport, DeployError> {
        let started = Instant::now();
        let mut addresses = existing;
        let mut deployed = Vec::new();
        let mut skipped = Vec::new();

        for spec in &self.plan {
            if addresses.contains_key(spec.name) {
                info!(name = spec.name, "already deployed, skipping");
                skipped.push(spec.name.to_string());
                continue;
            }
            match self.deploy_one(spec, &addresses).await {
                Ok(address) => {
                    addresses.insert(spec.name.to_string(), address);
                    deployed.push(spec.name.to_string());
                }
                Err(e) => {
                    error!(name = spec.name, error = %e, deployed = deployed.len(), "deployment aborted");
                    return Err(DeployError::Aborted {
                        name: spec.name.to_string(),
                        source: Box::new(e),
                        partial: addresses,
                    });
                }
            }
        }

        let proxy_creation_code = self.artifacts.bytecode(PROXY_ARTIFACT).unwrap_or_else(|e| {
            info!(error = %e, "no proxy artifact, environment will lack proxy creation code");
            Bytes::new()
        });

        Ok(DeploymentReport {
            addresses,
            deployed,
            skipped,
            elapsed: started.elapsed(),
            proxy_creation_code,
        })
    }
}
