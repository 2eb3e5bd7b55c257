use thiserror::Error;

use crate::state::DelegationState;

#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("allowed targets must not be empty")]
    EmptyTargets,

    #[error("allowed methods must not be empty")]
    EmptyMethods,

    #[error("invalid method {0}: expected a function signature or a 4-byte selector")]
    InvalidMethod(String),

    #[error("timestamp window is empty: after {after} >= before {before}")]
    InvalidWindow { after: u128, before: u128 },

    #[error("caveat enforcer {0} is not deployed")]
    MissingEnforcer(&'static str),

    #[error("delegation is {actual}, expected {expected}")]
    WrongState {
        expected: DelegationState,
        actual: DelegationState,
    },

    #[error("delegation chain is empty")]
    EmptyChain,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing error: {0}")]
    Signing(#[from] crowd_signatory::SignatoryError),
}

impl From<crowd_types::CrowdError> for DelegationError {
    fn from(e: crowd_types::CrowdError) -> Self {
        Self::Encoding(e.to_string())
    }
}
