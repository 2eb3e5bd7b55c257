//! ERC-4337 user operation submission.
//!
//! A [`UserOperationSubmitter`] turns a list of calls from a smart account
//! into a signed EntryPoint v0.7 user operation, hands it to a [`Bundler`]
//! and polls until the bundler reports a receipt. Failures are classified by
//! [`classify`] into an [`ErrorKind`] with one user-facing notice each.

pub mod chain;
pub mod classify;
pub mod client;
pub mod deploy;
pub mod error;
pub mod submitter;
pub mod user_op;

pub use chain::{ChainReader, EthersChain};
pub use classify::{classify, classify_message, revert_reason, ErrorKind};
pub use client::{Bundler, HttpBundler};
pub use deploy::AccountDeployer;
pub use error::BundlerError;
pub use submitter::{UserOperationSender, UserOperationSubmitter};
pub use user_op::{GasEstimate, Sponsorship, UserOperation, DUMMY_SIGNATURE};
