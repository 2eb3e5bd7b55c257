//! Signatory selection.
//!
//! A signatory turns a user-selected mode into a signing capability:
//! - `burner`: a throwaway key generated on every login
//! - `injected-provider`: an external wallet reached over JSON-RPC
//! - `hosted-auth`: a hosted key service that hands out a session key
//!
//! The [`SignatoryRegistry`] builds all three from the [`AppConfig`] once and
//! hands out the selected one by [`SignatoryName`].
//!
//! [`AppConfig`]: crowd_config::AppConfig

pub mod burner;
pub mod error;
pub mod hosted;
pub mod injected;
pub mod registry;
pub mod signer;

pub use burner::BurnerSignatory;
pub use error::SignatoryError;
pub use hosted::HostedAuthSignatory;
pub use injected::InjectedProviderSignatory;
pub use registry::{LoginOutcome, Signatory, SignatoryName, SignatoryRegistry};
pub use signer::{DelegationSigner, LocalSigner};
