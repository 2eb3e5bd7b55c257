//! Smart account lifecycle.
//!
//! A smart account's address is derived before any contract exists
//! ("counterfactual"). The first user operation the account sends carries the
//! factory call that deploys it. This crate derives the address, encodes the
//! account's `execute` calls and tracks the deployment status; submitting the
//! deploying operation is the bundler crate's job.

pub mod account;
pub mod error;
pub mod execute;
pub mod salt;
pub mod status;

pub use account::{create_smart_account, DeployParams, SmartAccount};
pub use error::AccountError;
pub use execute::{encode_execute, ExecutionMode};
pub use salt::create_salt;
pub use status::DeploymentTracker;
