use thiserror::Error;

use crowd_types::DeploymentStatus;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("delegation framework environment is incomplete: {0} is not set")]
    IncompleteEnvironment(&'static str),

    #[error("account is {0}, expected counterfactual")]
    NotCounterfactual(DeploymentStatus),

    #[error("no calls to execute")]
    EmptyCalls,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing error: {0}")]
    Signing(#[from] crowd_signatory::SignatoryError),
}

impl From<crowd_types::CrowdError> for AccountError {
    fn from(e: crowd_types::CrowdError) -> Self {
        Self::Encoding(e.to_string())
    }
}
