//! Fundamental types for the CrowdHelping client toolkit.
//!
//! This crate defines the shapes passed between the account, delegation,
//! bundler and DAO crates: calls, deployment status, fee quotes, receipts,
//! activities, networks and the user-facing notices.

pub mod abi;
pub mod activity;
pub mod call;
pub mod environment;
pub mod error;
pub mod fees;
pub mod network;
pub mod notice;
pub mod receipt;
pub mod status;

pub use activity::Activity;
pub use call::Call;
pub use environment::{DelegatorEnvironment, ENTRY_POINT_V07};
pub use error::CrowdError;
pub use fees::{FeeQuote, GasPriceQuotes};
pub use network::Network;
pub use notice::{Notice, NoticeSeverity, Notifier};
pub use receipt::{TransactionReceiptSummary, UserOperationReceipt};
pub use status::DeploymentStatus;

pub use ethers::types::{Address, Bytes, H256, U256};
