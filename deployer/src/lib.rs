//! Delegation framework deployment.
//!
//! [`deployment_plan`] lists every contract in dependency order. The
//! [`FrameworkDeployer`] walks it, skipping contracts already present in the
//! supplied address map and aborting on the first failure, and turns the
//! final map into a [`DelegatorEnvironment`].
//!
//! [`DelegatorEnvironment`]: crowd_types::DelegatorEnvironment

pub mod artifact;
pub mod deployer;
pub mod error;
pub mod framework;
pub mod plan;
pub mod report;

pub use artifact::{ArtifactDir, ArtifactSource};
pub use deployer::{ContractDeployer, EthersDeployer};
pub use error::DeployError;
pub use framework::{AddressMap, DeploymentReport, FrameworkDeployer};
pub use plan::{deployment_plan, ConstructorArg, ContractSpec};
pub use report::{format_summary, format_table};
