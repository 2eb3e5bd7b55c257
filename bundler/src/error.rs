use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundlerError {
    /// The bundler or node answered with a JSON-RPC error object.
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("chain read failed: {0}")]
    Chain(String),

    #[error("no receipt for user operation {0} within the timeout")]
    ReceiptTimeout(String),

    #[error("user operation {0} reverted: {1}")]
    Reverted(String, String),

    #[error("{0}")]
    Account(#[from] crowd_account::AccountError),

    #[error("{0}")]
    Signing(#[from] crowd_signatory::SignatoryError),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<crowd_types::CrowdError> for BundlerError {
    fn from(e: crowd_types::CrowdError) -> Self {
        Self::Encoding(e.to_string())
    }
}

impl BundlerError {
    /// JSON-RPC error code, when the failure carried one.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}
