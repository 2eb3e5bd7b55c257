//! Nullable identity verifier: a scripted yes or no.

use async_trait::async_trait;
use std::sync::Mutex;

use crowd_verification::{ProofVerifier, VerificationError, VerifyReply, VerifyRequest};

#[derive(Default)]
pub struct NullVerifier {
    rejection: Mutex<Option<String>>,
    requests: Mutex<Vec<VerifyRequest>>,
}

impl NullVerifier {
    /// Accepts every proof.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Rejects every proof with `detail`.
    pub fn rejecting(detail: impl Into<String>) -> Self {
        Self {
            rejection: Mutex::new(Some(detail.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<VerifyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProofVerifier for NullVerifier {
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, VerificationError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(match self.rejection.lock().unwrap().as_ref() {
            Some(detail) => VerifyReply::failed(detail.clone()),
            None => VerifyReply::ok(),
        })
    }
}
