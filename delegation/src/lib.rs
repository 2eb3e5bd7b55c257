//! Delegations between smart accounts.
//!
//! A delegator account grants a delegate account the right to act on its
//! behalf, restricted by caveats that on-chain enforcers check at redemption.
//! - [`CaveatBuilder`] assembles the caveat list from the framework's enforcers
//! - [`Delegation`] is the signed grant, hashed per EIP-712
//! - [`encode_redeem`] builds the `DelegationManager.redeemDelegations` call

pub mod caveat;
pub mod delegation;
pub mod error;
pub mod redeem;
pub mod state;

pub use caveat::{Caveat, CaveatBuilder};
pub use delegation::{create_root_delegation, Delegation, DelegationDomain, ROOT_AUTHORITY};
pub use error::DelegationError;
pub use redeem::{encode_permission_context, encode_redeem};
pub use state::{DelegationLifecycle, DelegationState};
