use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatoryError {
    #[error("signatory {0} is disabled")]
    Disabled(&'static str),

    #[error("unknown signatory: {0}")]
    UnknownName(String),

    #[error("signatory {0} does not support logout")]
    LogoutUnsupported(&'static str),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("wallet RPC error: {0}")]
    Rpc(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}
