//! Bundler and paymaster JSON-RPC client.

use async_trait::async_trait;
use ethers::types::{Address, H256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

use crowd_types::{GasPriceQuotes, UserOperationReceipt};

use crate::error::BundlerError;
use crate::user_op::{GasEstimate, Sponsorship, UserOperation};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The bundler and paymaster methods a submission needs.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// `pimlico_getUserOperationGasPrice`.
    async fn gas_price(&self) -> Result<GasPriceQuotes, BundlerError>;

    /// `eth_estimateUserOperationGas`.
    async fn estimate_gas(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<GasEstimate, BundlerError>;

    /// `pm_sponsorUserOperation`.
    async fn sponsor(
        &self,
        op: &UserOperation,
        entry_point: Address,
        policy_id: Option<&str>,
    ) -> Result<Sponsorship, BundlerError>;

    /// `eth_sendUserOperation`, returning the user operation hash.
    async fn send(&self, op: &UserOperation, entry_point: Address) -> Result<H256, BundlerError>;

    /// `eth_getUserOperationReceipt`. `None` while the operation is pending.
    async fn receipt(&self, hash: H256) -> Result<Option<UserOperationReceipt>, BundlerError>;

    /// `eth_supportedEntryPoints`.
    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerError>;
}

/// [`Bundler`] over HTTP. The same endpoint serves the paymaster methods.
#[derive(Clone)]
pub struct HttpBundler {
    http: reqwest::Client,
    url: String,
}

impl HttpBundler {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and decode its `result`.
    async fn rpc_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, BundlerError> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        trace!(method, %body, "bundler request");

        let response = self.http.post(&self.url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                BundlerError::Transport(format!("{method} timed out: {e}"))
            } else if e.is_connect() {
                BundlerError::Transport(format!("connection failed: {e}"))
            } else {
                BundlerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let json: Value = response.json().await.map_err(|e| {
            BundlerError::InvalidResponse(format!("{method}: HTTP {status}, invalid JSON: {e}"))
        })?;

        if let Some(err) = json.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(BundlerError::Transport(format!("{method}: HTTP status {status}")));
        }

        let result = json.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| BundlerError::InvalidResponse(format!("{method}: {e}")))
    }
}

/// Turn a JSON-RPC error object into [`BundlerError::Rpc`]. `data` may be a
/// string (revert data) or an object; either way it is kept as text for
/// classification.
pub(crate) fn rpc_error(err: &Value) -> BundlerError {
    let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown bundler error")
        .to_string();
    let data = match err.get("data") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    BundlerError::Rpc { code, message, data }
}

#[async_trait]
impl Bundler for HttpBundler {
    async fn gas_price(&self) -> Result<GasPriceQuotes, BundlerError> {
        self.rpc_call("pimlico_getUserOperationGasPrice", json!([])).await
    }

    async fn estimate_gas(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<GasEstimate, BundlerError> {
        self.rpc_call("eth_estimateUserOperationGas", json!([op, entry_point]))
            .await
    }

    async fn sponsor(
        &self,
        op: &UserOperation,
        entry_point: Address,
        policy_id: Option<&str>,
    ) -> Result<Sponsorship, BundlerError> {
        let params = match policy_id {
            Some(policy) => json!([op, entry_point, { "sponsorshipPolicyId": policy }]),
            None => json!([op, entry_point]),
        };
        self.rpc_call("pm_sponsorUserOperation", params).await
    }

    async fn send(&self, op: &UserOperation, entry_point: Address) -> Result<H256, BundlerError> {
        let hash: H256 = self
            .rpc_call("eth_sendUserOperation", json!([op, entry_point]))
            .await?;
        debug!(%hash, sender = %op.sender, "user operation accepted by bundler");
        Ok(hash)
    }

    async fn receipt(&self, hash: H256) -> Result<Option<UserOperationReceipt>, BundlerError> {
        self.rpc_call("eth_getUserOperationReceipt", json!([hash]))
            .await
    }

    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerError> {
        self.rpc_call("eth_supportedEntryPoints", json!([])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_keeps_code_and_data() {
        let err = rpc_error(&json!({
            "code": -32500,
            "message": "UserOperation reverted during simulation",
            "data": { "reason": "AA25 invalid account nonce" }
        }));
        match err {
            BundlerError::Rpc { code, message, data } => {
                assert_eq!(code, -32500);
                assert!(message.contains("reverted"));
                assert!(data.unwrap().contains("AA25"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rpc_error_without_fields_has_defaults() {
        let err = rpc_error(&json!({}));
        assert_eq!(err.rpc_code(), Some(0));
        assert_eq!(err.to_string(), "unknown bundler error");
    }

    #[tokio::test]
    async fn unreachable_bundler_is_a_transport_error() {
        let bundler = HttpBundler::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(matches!(
            bundler.supported_entry_points().await,
            Err(BundlerError::Transport(_))
        ));
    }
}
