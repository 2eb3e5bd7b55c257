//! Injected-provider signatory: an external wallet reached over JSON-RPC.
//!
//! The wallet keeps the key; this side only asks for accounts and signatures.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crowd_config::SignatoryConfig;

use crate::error::SignatoryError;
use crate::registry::{LoginOutcome, Signatory, SignatoryName};
use crate::signer::DelegationSigner;

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

/// Signing is interactive, so allow the user time to confirm.
const WALLET_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
struct WalletRpc {
    http: reqwest::Client,
    url: String,
}

impl WalletRpc {
    fn new(url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(WALLET_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, url }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SignatoryError> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SignatoryError::Rpc(format!("request failed: {e}")))?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| SignatoryError::Rpc(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown wallet error")
                .to_string();
            return Err(if code == USER_REJECTED_CODE {
                SignatoryError::UserRejected(message)
            } else {
                SignatoryError::Rpc(message)
            });
        }

        let result = json.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| SignatoryError::Rpc(format!("unexpected {method} result: {e}")))
    }
}

/// Signer that forwards every signature request to the wallet.
struct WalletSigner {
    rpc: WalletRpc,
    account: Address,
}

#[async_trait]
impl DelegationSigner for WalletSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn sign_hash(&self, hash: H256) -> Result<Bytes, SignatoryError> {
        self.rpc.call("eth_sign", json!([self.account, hash])).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignatoryError> {
        self.rpc
            .call(
                "personal_sign",
                json!([Bytes::from(message.to_vec()), self.account]),
            )
            .await
    }
}

pub struct InjectedProviderSignatory {
    rpc: Option<WalletRpc>,
}

impl InjectedProviderSignatory {
    pub fn new(wallet_url: Option<String>) -> Self {
        Self {
            rpc: wallet_url.map(WalletRpc::new),
        }
    }

    pub fn from_config(config: &SignatoryConfig) -> Self {
        Self::new(config.injected_wallet_url.clone())
    }
}

#[async_trait]
impl Signatory for InjectedProviderSignatory {
    fn name(&self) -> SignatoryName {
        SignatoryName::InjectedProvider
    }

    async fn login(&self) -> Result<LoginOutcome, SignatoryError> {
        let rpc = self
            .rpc
            .clone()
            .ok_or(SignatoryError::Disabled("injected-provider"))?;
        let accounts: Vec<Address> = rpc.call("eth_requestAccounts", json!([])).await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| SignatoryError::Rpc("wallet returned no accounts".into()))?;
        tracing::info!(%account, "connected external wallet");
        Ok(LoginOutcome {
            owner: account,
            signer: Arc::new(WalletSigner { rpc, account }),
        })
    }

    fn is_disabled(&self) -> bool {
        self.rpc.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_without_wallet_is_disabled() {
        let signatory = InjectedProviderSignatory::new(None);
        assert!(signatory.is_disabled());
        assert!(matches!(
            signatory.login().await,
            Err(SignatoryError::Disabled("injected-provider"))
        ));
    }
}
