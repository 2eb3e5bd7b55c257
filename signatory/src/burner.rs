//! Burner signatory: a fresh in-memory key per login.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SignatoryError;
use crate::registry::{LoginOutcome, Signatory, SignatoryName};
use crate::signer::{DelegationSigner, LocalSigner};

#[derive(Debug, Default)]
pub struct BurnerSignatory;

impl BurnerSignatory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Signatory for BurnerSignatory {
    fn name(&self) -> SignatoryName {
        SignatoryName::Burner
    }

    async fn login(&self) -> Result<LoginOutcome, SignatoryError> {
        let signer = LocalSigner::random();
        let owner = signer.address();
        tracing::debug!(%owner, "generated burner key");
        Ok(LoginOutcome {
            owner,
            signer: Arc::new(signer),
        })
    }
}
