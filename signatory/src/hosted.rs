//! Hosted-auth signatory: a hosted key service issues a session key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

use crowd_config::SignatoryConfig;

use crate::error::SignatoryError;
use crate::registry::{LoginOutcome, Signatory, SignatoryName};
use crate::signer::{DelegationSigner, LocalSigner};

const AUTH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    client_id: &'a str,
    network: &'a str,
    chain_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    private_key: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest<'a> {
    client_id: &'a str,
    session_id: Option<&'a str>,
}

struct Session {
    id: Option<String>,
}

pub struct HostedAuthSignatory {
    http: reqwest::Client,
    client_id: Option<String>,
    network: String,
    endpoint: Option<String>,
    chain_id: u64,
    session: Mutex<Option<Session>>,
}

impl HostedAuthSignatory {
    pub fn new(
        client_id: Option<String>,
        network: impl Into<String>,
        endpoint: Option<String>,
        chain_id: u64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(AUTH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            client_id,
            network: network.into(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            chain_id,
            session: Mutex::new(None),
        }
    }

    pub fn from_config(config: &SignatoryConfig, chain_id: u64) -> Self {
        Self::new(
            config.hosted_auth_client_id.clone(),
            config.hosted_auth_network.clone(),
            config.hosted_auth_url.clone(),
            chain_id,
        )
    }

    fn settings(&self) -> Result<(&str, &str), SignatoryError> {
        match (self.client_id.as_deref(), self.endpoint.as_deref()) {
            (Some(client_id), Some(endpoint)) => Ok((client_id, endpoint)),
            _ => Err(SignatoryError::Disabled("hosted-auth")),
        }
    }

    fn has_session(&self) -> bool {
        self.session.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl Signatory for HostedAuthSignatory {
    fn name(&self) -> SignatoryName {
        SignatoryName::HostedAuth
    }

    async fn login(&self) -> Result<LoginOutcome, SignatoryError> {
        let (client_id, endpoint) = self.settings()?;
        let request = LoginRequest {
            client_id,
            network: &self.network,
            chain_id: self.chain_id,
        };
        let response = self
            .http
            .post(format!("{endpoint}/login"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SignatoryError::Rpc(format!("hosted login failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SignatoryError::Rpc(format!(
                "hosted login returned HTTP {}",
                response.status()
            )));
        }
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| SignatoryError::Rpc(format!("invalid hosted login response: {e}")))?;

        let key = Zeroizing::new(body.private_key);
        let signer = LocalSigner::from_hex(&key)?;
        let owner = signer.address();
        if let Ok(mut session) = self.session.lock() {
            *session = Some(Session {
                id: body.session_id,
            });
        }
        tracing::info!(%owner, network = %self.network, "hosted-auth session started");
        Ok(LoginOutcome {
            owner,
            signer: Arc::new(signer),
        })
    }

    async fn logout(&self) -> Result<(), SignatoryError> {
        let (client_id, endpoint) = self.settings()?;
        let session_id = self
            .session
            .lock()
            .map_err(|_| SignatoryError::NotLoggedIn)?
            .take()
            .ok_or(SignatoryError::NotLoggedIn)?
            .id;
        let request = LogoutRequest {
            client_id,
            session_id: session_id.as_deref(),
        };
        self.http
            .post(format!("{endpoint}/logout"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SignatoryError::Rpc(format!("hosted logout failed: {e}")))?;
        tracing::info!("hosted-auth session ended");
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.settings().is_err()
    }

    fn can_logout(&self) -> bool {
        !self.is_disabled() && self.has_session()
    }
}
