//! HTTP client for the cloud proof verifier.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::VerificationError;
use crate::proof::{VerifyReply, VerifyRequest};

/// Default timeout for verification requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can check a proof-of-personhood proof.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Validate the proof. A rejected proof is `Ok` with `success == false`;
    /// `Err` is reserved for transport failures.
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, VerificationError>;
}

/// Client for the cloud verification endpoint.
///
/// Sends `POST {verify_url}/{app_id}` with the proof and maps the reply.
pub struct CloudVerifier {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    endpoint: String,
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl CloudVerifier {
    pub fn new(verify_url: &str, app_id: &str) -> Result<Self, VerificationError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| VerificationError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            endpoint: format!("{}/{}", verify_url.trim_end_matches('/'), app_id),
        })
    }

    /// Build from the identity section of the app config.
    pub fn from_config(config: &crowd_config::IdentityConfig) -> Result<Self, VerificationError> {
        let app_id = config
            .app_id
            .as_deref()
            .ok_or(VerificationError::NotConfigured("identity app id"))?;
        Self::new(&config.verify_url, app_id)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProofVerifier for CloudVerifier {
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyReply, VerificationError> {
        tracing::debug!(endpoint = %self.endpoint, action = %request.action, "forwarding proof");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerificationError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    VerificationError::Unreachable(format!("connection failed: {e}"))
                } else {
                    VerificationError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(VerifyReply::ok());
        }

        let body = response.text().await.map_err(|e| {
            VerificationError::InvalidResponse(format!("failed to read verifier response: {e}"))
        })?;
        Ok(VerifyReply::failed(rejection_detail(status.as_u16(), &body)))
    }
}

/// Pick the most useful explanation out of a rejection body.
fn rejection_detail(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ErrorBody {
            code: Some(code), ..
        }) => code,
        _ => format!("HTTP status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_app_id() {
        let verifier = CloudVerifier::new("https://verify.example/api/v2/verify/", "app_123").unwrap();
        assert_eq!(
            verifier.endpoint(),
            "https://verify.example/api/v2/verify/app_123"
        );
    }

    #[test]
    fn from_config_builds_a_client_for_the_app() {
        let config = crowd_config::IdentityConfig {
            app_id: Some("app_456".into()),
            ..Default::default()
        };
        let verifier = CloudVerifier::from_config(&config).unwrap();
        assert!(verifier.endpoint().ends_with("/app_456"));
    }

    #[test]
    fn from_config_requires_app_id() {
        let config = crowd_config::IdentityConfig::default();
        assert!(matches!(
            CloudVerifier::from_config(&config),
            Err(VerificationError::NotConfigured(_))
        ));
    }

    #[test]
    fn rejection_prefers_detail_then_code() {
        let body = r#"{"code": "max_verifications_reached", "detail": "already verified"}"#;
        assert_eq!(rejection_detail(400, body), "already verified");
        let body = r#"{"code": "invalid_proof"}"#;
        assert_eq!(rejection_detail(400, body), "invalid_proof");
        assert_eq!(rejection_detail(502, "<html>"), "HTTP status 502");
    }
}
