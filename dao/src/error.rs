use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("activity {0} does not exist")]
    NotFound(u64),

    #[error("could not decode {0} result: {1}")]
    Decode(&'static str, String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Bundler(#[from] crowd_bundler::BundlerError),
}

impl From<crowd_types::CrowdError> for DaoError {
    fn from(e: crowd_types::CrowdError) -> Self {
        Self::Encoding(e.to_string())
    }
}
