use thiserror::Error;

use crate::framework::AddressMap;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("artifact for {name} not found under {root}")]
    ArtifactNotFound { name: String, root: String },

    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact { path: String, reason: String },

    #[error("{name} constructor needs {dependency}, which is not deployed")]
    MissingDependency { name: String, dependency: String },

    #[error("deploying {name} failed: {reason}")]
    Transaction { name: String, reason: String },

    /// The run stopped at `name`; `partial` holds everything deployed or
    /// supplied before it.
    #[error("deployment aborted at {name}: {source}")]
    Aborted {
        name: String,
        #[source]
        source: Box<DeployError>,
        partial: AddressMap,
    },

    #[error("provider error: {0}")]
    Provider(String),
}

impl DeployError {
    /// Addresses known when the run aborted.
    pub fn partial(&self) -> Option<&AddressMap> {
        match self {
            Self::Aborted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
