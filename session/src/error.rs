use thiserror::Error;

use crowd_bundler::{classify, classify_message, ErrorKind};
use crowd_signatory::SignatoryError;
use crowd_types::Notice;
use crowd_verification::VerificationError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no delegate account, initialize the session first")]
    NoDelegate,

    #[error("no delegator account, create one first")]
    NoDelegator,

    #[error("signatory {0} is not available")]
    SignatoryUnavailable(String),

    #[error("identity verification is not configured")]
    VerificationNotConfigured,

    #[error("the selected signatory changed while the request was running")]
    Superseded,

    #[error("invalid redeem path {0}: expected delegation or direct")]
    InvalidRedeemPath(String),

    #[error(transparent)]
    Signatory(#[from] SignatoryError),

    #[error(transparent)]
    Account(#[from] crowd_account::AccountError),

    #[error(transparent)]
    Delegation(#[from] crowd_delegation::DelegationError),

    #[error(transparent)]
    Bundler(#[from] crowd_bundler::BundlerError),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Bundler(e) => classify(e),
            Self::Signatory(SignatoryError::UserRejected(_))
            | Self::Account(crowd_account::AccountError::Signing(SignatoryError::UserRejected(_)))
            | Self::Delegation(crowd_delegation::DelegationError::Signing(SignatoryError::UserRejected(_))) => {
                ErrorKind::UserRejected
            }
            Self::Verification(VerificationError::NotVerified) => ErrorKind::UnverifiedUser,
            other => classify_message(None, &other.to_string()),
        }
    }

    /// The single notice raised for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            Self::Verification(VerificationError::Rejected(detail)) => {
                Notice::error("Verification failed", detail.clone())
            }
            Self::NoDelegate
            | Self::NoDelegator
            | Self::SignatoryUnavailable(_)
            | Self::VerificationNotConfigured
            | Self::Superseded => Notice::error("Not ready", self.to_string()),
            _ => self.kind().notice(),
        }
    }
}
