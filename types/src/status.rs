//! Smart account deployment status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CrowdError;

/// Where a smart account is in its deployment lifecycle.
///
/// `Counterfactual -> DeploymentInProgress -> Deployed`, with a rollback to
/// `Counterfactual` when the deploying user operation fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Address is derived but no contract exists yet.
    #[default]
    Counterfactual,
    /// The deploying user operation has been submitted.
    DeploymentInProgress,
    /// The account contract exists on chain.
    Deployed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counterfactual => "counterfactual",
            Self::DeploymentInProgress => "deployment in progress",
            Self::Deployed => "deployed",
        }
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = CrowdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counterfactual" => Ok(Self::Counterfactual),
            "deployment in progress" => Ok(Self::DeploymentInProgress),
            "deployed" => Ok(Self::Deployed),
            other => Err(CrowdError::UnknownStatus(other.to_string())),
        }
    }
}
