//! Gate that only opens after a successful proof verification.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::client::ProofVerifier;
use crate::error::VerificationError;
use crate::proof::{ProofPayload, VerificationLevel, VerifyRequest};

/// A holder whose proof the verifier accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub nullifier_hash: String,
    pub level: VerificationLevel,
}

/// Forwards proofs to a verifier and remembers who passed.
///
/// Account writes call [`IdentityGate::require_verified`] first.
pub struct IdentityGate {
    verifier: Arc<dyn ProofVerifier>,
    action: String,
    current: Mutex<Option<VerifiedIdentity>>,
    seen_nullifiers: Mutex<HashSet<String>>,
}

impl IdentityGate {
    pub fn new(verifier: Arc<dyn ProofVerifier>, action: impl Into<String>) -> Self {
        Self {
            verifier,
            action: action.into(),
            current: Mutex::new(None),
            seen_nullifiers: Mutex::new(HashSet::new()),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Verify a proof and open the gate on success.
    pub async fn verify(
        &self,
        payload: &ProofPayload,
        signal: Option<&[u8]>,
    ) -> Result<VerifiedIdentity, VerificationError> {
        let request = VerifyRequest::new(payload, &self.action, signal);
        tracing::info!(
            nullifier = %payload.nullifier_hash,
            level = %payload.verification_level,
            "proof received, sending to verifier"
        );

        let reply = self.verifier.verify(&request).await?;
        if !reply.success {
            let detail = reply.detail.unwrap_or_else(|| "unknown reason".to_string());
            tracing::warn!(%detail, "verification rejected");
            return Err(VerificationError::Rejected(detail));
        }

        let identity = VerifiedIdentity {
            nullifier_hash: payload.nullifier_hash.clone(),
            level: payload.verification_level,
        };
        self.seen_nullifiers
            .lock()
            .map_err(|_| VerificationError::Other("gate state poisoned".into()))?
            .insert(identity.nullifier_hash.clone());
        *self
            .current
            .lock()
            .map_err(|_| VerificationError::Other("gate state poisoned".into()))? =
            Some(identity.clone());
        tracing::info!(nullifier = %identity.nullifier_hash, "identity verified");
        Ok(identity)
    }

    pub fn is_verified(&self) -> bool {
        self.current.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Fails with [`VerificationError::NotVerified`] until a proof passed.
    pub fn require_verified(&self) -> Result<VerifiedIdentity, VerificationError> {
        self.current
            .lock()
            .ok()
            .and_then(|c| c.clone())
            .ok_or(VerificationError::NotVerified)
    }

    /// Whether this nullifier already passed through the gate.
    pub fn has_seen(&self, nullifier_hash: &str) -> bool {
        self.seen_nullifiers
            .lock()
            .map(|s| s.contains(nullifier_hash))
            .unwrap_or(false)
    }

    /// Close the gate again (e.g. on logout).
    pub fn reset(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
    }
}
