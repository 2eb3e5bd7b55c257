//! Deployment status with an in-flight guard.

use std::sync::Mutex;

use crowd_types::DeploymentStatus;

use crate::error::AccountError;

/// Tracks one account's deployment status.
///
/// [`DeploymentTracker::begin`] checks and sets the status under one lock, so
/// a second deploy attempt while the first is in flight is rejected instead
/// of double-submitting.
#[derive(Debug, Default)]
pub struct DeploymentTracker {
    status: Mutex<DeploymentStatus>,
}

impl DeploymentTracker {
    pub fn new(status: DeploymentStatus) -> Self {
        Self {
            status: Mutex::new(status),
        }
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }

    /// Counterfactual → in progress. Any other status is an error.
    pub fn begin(&self) -> Result<(), AccountError> {
        let mut status = self
            .status
            .lock()
            .map_err(|_| AccountError::NotCounterfactual(DeploymentStatus::DeploymentInProgress))?;
        if *status != DeploymentStatus::Counterfactual {
            return Err(AccountError::NotCounterfactual(*status));
        }
        *status = DeploymentStatus::DeploymentInProgress;
        Ok(())
    }

    /// In progress → deployed.
    pub fn complete(&self) {
        self.set(DeploymentStatus::Deployed);
    }

    /// In progress → counterfactual, after a failed deploy.
    pub fn rollback(&self) {
        if let Ok(mut status) = self.status.lock() {
            if *status == DeploymentStatus::DeploymentInProgress {
                *status = DeploymentStatus::Counterfactual;
            }
        }
    }

    /// Force a status, e.g. when an account turns out to already have code.
    pub fn set(&self, value: DeploymentStatus) {
        if let Ok(mut status) = self.status.lock() {
            *status = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_only_from_counterfactual() {
        let tracker = DeploymentTracker::default();
        tracker.begin().unwrap();
        assert_eq!(tracker.status(), DeploymentStatus::DeploymentInProgress);
        assert!(matches!(
            tracker.begin(),
            Err(AccountError::NotCounterfactual(
                DeploymentStatus::DeploymentInProgress
            ))
        ));
        tracker.complete();
        assert!(tracker.begin().is_err());
        assert!(tracker.status().is_deployed());
    }

    #[test]
    fn rollback_only_undoes_in_progress() {
        let tracker = DeploymentTracker::default();
        tracker.begin().unwrap();
        tracker.rollback();
        assert_eq!(tracker.status(), DeploymentStatus::Counterfactual);

        tracker.set(DeploymentStatus::Deployed);
        tracker.rollback();
        assert_eq!(tracker.status(), DeploymentStatus::Deployed);
    }
}
