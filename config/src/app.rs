//! Application configuration with environment and TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crowd_types::{Address, DelegatorEnvironment, Network};

use crate::ConfigError;

/// Configuration for every CrowdHelping component.
///
/// Can be loaded from the process environment via [`AppConfig::from_env`],
/// from a TOML file via [`AppConfig::from_toml_file`], or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// EIP-155 chain id of the target chain.
    pub chain_id: u64,

    /// JSON-RPC endpoint of the chain.
    pub rpc_url: String,

    /// Bundler / paymaster JSON-RPC endpoint (usually embeds an API key).
    pub bundler_url: String,

    /// Paymaster sponsorship policy. Without one, operations are not sponsored.
    #[serde(default)]
    pub paymaster_policy_id: Option<String>,

    /// The DAO / activity contract.
    pub dao_contract: Address,

    /// Delegation framework the accounts and delegations are bound to.
    #[serde(default)]
    pub environment: DelegatorEnvironment,

    #[serde(default)]
    pub signatory: SignatoryConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Settings for the signatory factories.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SignatoryConfig {
    /// Hosted-auth client id. The hosted-auth signatory is disabled without it.
    #[serde(default)]
    pub hosted_auth_client_id: Option<String>,

    /// Hosted-auth network name (e.g. "sapphire_devnet").
    #[serde(default = "default_hosted_auth_network")]
    pub hosted_auth_network: String,

    /// Base URL of the hosted key service.
    #[serde(default)]
    pub hosted_auth_url: Option<String>,

    /// JSON-RPC URL of an external wallet. The injected-provider signatory is
    /// disabled without it.
    #[serde(default)]
    pub injected_wallet_url: Option<String>,
}

/// Proof-of-personhood settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default = "default_identity_action")]
    pub action: String,

    /// "orb" or "device".
    #[serde(default = "default_verification_level")]
    pub verification_level: String,

    /// Base URL of the cloud verification endpoint; the app id is appended.
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

/// User operation submission settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Delay between `eth_getUserOperationReceipt` polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a receipt after this many seconds. Unset means wait
    /// until the bundler answers or errors.
    #[serde(default)]
    pub receipt_timeout_secs: Option<u64>,

    /// Which redeem flow the session uses: "delegation" or "direct".
    #[serde(default = "default_redeem_path")]
    pub redeem_path: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hosted_auth_network() -> String {
    "sapphire_devnet".to_string()
}

fn default_identity_action() -> String {
    "verify-human".to_string()
}

fn default_verification_level() -> String {
    "device".to_string()
}

fn default_verify_url() -> String {
    "https://developer.worldcoin.org/api/v2/verify".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_redeem_path() -> String {
    "delegation".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            action: default_identity_action(),
            verification_level: default_verification_level(),
            verify_url: default_verify_url(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            receipt_timeout_secs: None,
            redeem_path: default_redeem_path(),
        }
    }
}

impl SubmissionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.receipt_timeout_secs.map(Duration::from_secs)
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// A config with every optional section defaulted.
    pub fn new(chain_id: u64, rpc_url: &str, bundler_url: &str, dao_contract: Address) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.to_string(),
            bundler_url: bundler_url.to_string(),
            paymaster_policy_id: None,
            dao_contract,
            environment: DelegatorEnvironment::default(),
            signatory: SignatoryConfig::default(),
            identity: IdentityConfig::default(),
            submission: SubmissionConfig::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source.
    ///
    /// Required: `CROWD_CHAIN_ID`, `CROWD_RPC_URL`, `CROWD_BUNDLER_URL`,
    /// `CROWD_DAO_CONTRACT`. A missing one fails immediately.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let chain_id = parse_chain_id(&require("CROWD_CHAIN_ID")?)?;
        let rpc_url = require("CROWD_RPC_URL")?;
        let bundler_url = require("CROWD_BUNDLER_URL")?;
        let dao_contract = parse_address("CROWD_DAO_CONTRACT", &require("CROWD_DAO_CONTRACT")?)?;

        let mut config = Self::new(chain_id, &rpc_url, &bundler_url, dao_contract);
        config.paymaster_policy_id = get("CROWD_PAYMASTER_POLICY_ID");

        if let Some(path) = get("CROWD_ENVIRONMENT_FILE") {
            config.environment = load_environment_file(&path)?;
        }
        if let Some(entry_point) = get("CROWD_ENTRY_POINT") {
            config.environment.entry_point = parse_address("CROWD_ENTRY_POINT", &entry_point)?;
        }

        config.signatory.hosted_auth_client_id = get("CROWD_HOSTED_AUTH_CLIENT_ID");
        if let Some(network) = get("CROWD_HOSTED_AUTH_NETWORK") {
            config.signatory.hosted_auth_network = network;
        }
        config.signatory.hosted_auth_url = get("CROWD_HOSTED_AUTH_URL");
        config.signatory.injected_wallet_url = get("CROWD_INJECTED_WALLET_URL");

        config.identity.app_id = get("CROWD_IDENTITY_APP_ID");
        if let Some(action) = get("CROWD_IDENTITY_ACTION") {
            config.identity.action = action;
        }
        if let Some(level) = get("CROWD_VERIFICATION_LEVEL") {
            config.identity.verification_level = level;
        }

        if let Some(ms) = get("CROWD_POLL_INTERVAL_MS") {
            config.submission.poll_interval_ms =
                ms.parse().map_err(|e| ConfigError::Invalid {
                    key: "CROWD_POLL_INTERVAL_MS",
                    reason: format!("{e}"),
                })?;
        }
        if let Some(secs) = get("CROWD_RECEIPT_TIMEOUT_SECS") {
            config.submission.receipt_timeout_secs =
                Some(secs.parse().map_err(|e| ConfigError::Invalid {
                    key: "CROWD_RECEIPT_TIMEOUT_SECS",
                    reason: format!("{e}"),
                })?);
        }
        if let Some(path) = get("CROWD_REDEEM_PATH") {
            config.submission.redeem_path = path;
        }
        if let Some(level) = get("CROWD_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = get("CROWD_LOG_FORMAT") {
            config.log_format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The known network for this chain id, if any.
    pub fn network(&self) -> Option<Network> {
        Network::from_chain_id(self.chain_id)
    }
}

fn parse_chain_id(raw: &str) -> Result<u64, ConfigError> {
    if let Ok(id) = raw.parse::<u64>() {
        return Ok(id);
    }
    raw.parse::<Network>()
        .map(|n| n.chain_id())
        .map_err(|e| ConfigError::Invalid {
            key: "CROWD_CHAIN_ID",
            reason: e.to_string(),
        })
}

fn parse_address(key: &'static str, raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw}: {e}"),
    })
}

fn load_environment_file(path: &str) -> Result<DelegatorEnvironment, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse(format!("{path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CROWD_CHAIN_ID", "11155111"),
            ("CROWD_RPC_URL", "https://rpc.example"),
            ("CROWD_BUNDLER_URL", "https://bundler.example/rpc?apikey=x"),
            (
                "CROWD_DAO_CONTRACT",
                "0xE2B2919105BF77a64B9cf87342dA523A6ca76b22",
            ),
        ]
    }

    #[test]
    fn loads_required_values() {
        let config = AppConfig::from_lookup(lookup(&required())).expect("should load");
        assert_eq!(config.chain_id, 11_155_111);
        assert_eq!(config.network(), Some(Network::Sepolia));
        assert!(config.paymaster_policy_id.is_none());
        assert_eq!(config.submission.poll_interval(), Duration::from_secs(1));
        assert!(config.submission.receipt_timeout().is_none());
    }

    #[test]
    fn each_missing_required_variable_fails() {
        for skip in [
            "CROWD_CHAIN_ID",
            "CROWD_RPC_URL",
            "CROWD_BUNDLER_URL",
            "CROWD_DAO_CONTRACT",
        ] {
            let pairs: Vec<_> = required().into_iter().filter(|(k, _)| *k != skip).collect();
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(k) if k == skip));
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "CROWD_RPC_URL");
        pairs.push(("CROWD_RPC_URL", "  "));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CROWD_RPC_URL")));
    }

    #[test]
    fn network_name_is_accepted_as_chain_id() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "CROWD_CHAIN_ID");
        pairs.push(("CROWD_CHAIN_ID", "flow-testnet"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.chain_id, 545);
    }

    #[test]
    fn bad_address_is_invalid() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "CROWD_DAO_CONTRACT");
        pairs.push(("CROWD_DAO_CONTRACT", "not-an-address"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "CROWD_DAO_CONTRACT",
                ..
            }
        ));
    }

    #[test]
    fn optional_values_are_applied() {
        let mut pairs = required();
        pairs.push(("CROWD_PAYMASTER_POLICY_ID", "sp_policy"));
        pairs.push(("CROWD_HOSTED_AUTH_CLIENT_ID", "client-1"));
        pairs.push(("CROWD_RECEIPT_TIMEOUT_SECS", "90"));
        pairs.push(("CROWD_REDEEM_PATH", "direct"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.paymaster_policy_id.as_deref(), Some("sp_policy"));
        assert_eq!(
            config.signatory.hosted_auth_client_id.as_deref(),
            Some("client-1")
        );
        assert_eq!(
            config.submission.receipt_timeout(),
            Some(Duration::from_secs(90))
        );
        assert_eq!(config.submission.redeem_path, "direct");
    }

    #[test]
    fn environment_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environment.json");
        let json = format!(
            r#"{{"entryPoint": "0x{}", "delegationManager": "0x{}"}}"#,
            "11".repeat(20),
            "22".repeat(20)
        );
        std::fs::write(&path, json).unwrap();

        let mut pairs = required();
        let path_str = path.to_string_lossy().to_string();
        pairs.push(("CROWD_ENVIRONMENT_FILE", path_str.as_str()));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.environment.entry_point, Address::repeat_byte(0x11));
        assert_eq!(
            config.environment.delegation_manager,
            Address::repeat_byte(0x22)
        );
    }

    #[test]
    fn toml_round_trip_keeps_values() {
        let config = AppConfig::new(
            545,
            "https://testnet.evm.nodes.onflow.org",
            "https://bundler.example",
            Address::repeat_byte(7),
        );
        let text = config.to_toml_string().expect("serializable");
        let parsed = AppConfig::from_toml_str(&text).expect("should parse");
        assert_eq!(parsed.chain_id, 545);
        assert_eq!(parsed.dao_contract, Address::repeat_byte(7));
        assert_eq!(parsed.identity.verification_level, "device");
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = AppConfig::from_toml_file("/nonexistent/crowd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
