use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("identity not verified")]
    NotVerified,

    #[error("Verification failed: {0}")]
    Rejected(String),

    #[error("identity verification is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("unknown verification level: {0}")]
    UnknownLevel(String),

    #[error("verifier unreachable: {0}")]
    Unreachable(String),

    #[error("invalid response from verifier: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}
