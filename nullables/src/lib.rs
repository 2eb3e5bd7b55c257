//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator (bundler, chain node, wallet, identity
//! service, contract deployer, notice sink) sits behind a trait. This crate
//! provides test implementations that:
//! - Return deterministic values
//! - Can be steered programmatically (pending polls, scripted failures)
//! - Record what they were asked to do
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod bundler;
pub mod chain;
pub mod deployer;
pub mod notifier;
pub mod sender;
pub mod signatory;
pub mod verifier;

pub use bundler::NullBundler;
pub use chain::NullChain;
pub use deployer::{NullArtifacts, NullDeployer};
pub use notifier::NullNotifier;
pub use sender::NullSender;
pub use signatory::{NullSignatory, SigningHold};
pub use verifier::NullVerifier;
