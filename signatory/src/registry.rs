//! Signatory trait and the name → signatory registry.

use async_trait::async_trait;
use ethers::types::Address;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crowd_config::AppConfig;

use crate::burner::BurnerSignatory;
use crate::error::SignatoryError;
use crate::hosted::HostedAuthSignatory;
use crate::injected::InjectedProviderSignatory;
use crate::signer::DelegationSigner;

/// The fixed set of signatory modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignatoryName {
    #[default]
    Burner,
    InjectedProvider,
    HostedAuth,
}

impl SignatoryName {
    pub const ALL: [SignatoryName; 3] = [Self::Burner, Self::InjectedProvider, Self::HostedAuth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burner => "burner",
            Self::InjectedProvider => "injected-provider",
            Self::HostedAuth => "hosted-auth",
        }
    }
}

impl fmt::Display for SignatoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatoryName {
    type Err = SignatoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "burner" | "burnerSignatoryFactory" => Ok(Self::Burner),
            "injected-provider" | "injected" | "injectedProviderSignatoryFactory" => {
                Ok(Self::InjectedProvider)
            }
            "hosted-auth" | "hosted" | "web3AuthSignatoryFactory" => Ok(Self::HostedAuth),
            other => Err(SignatoryError::UnknownName(other.to_string())),
        }
    }
}

/// Result of a successful login: who owns the account and how to sign for it.
#[derive(Clone)]
pub struct LoginOutcome {
    pub owner: Address,
    pub signer: Arc<dyn DelegationSigner>,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A selectable signing capability.
#[async_trait]
pub trait Signatory: Send + Sync {
    fn name(&self) -> SignatoryName;

    /// Obtain an owner address and a signer for it.
    async fn login(&self) -> Result<LoginOutcome, SignatoryError>;

    /// End the session. Only meaningful when [`Signatory::can_logout`] is true.
    async fn logout(&self) -> Result<(), SignatoryError> {
        Err(SignatoryError::LogoutUnsupported(self.name().as_str()))
    }

    /// A disabled signatory cannot be selected for login.
    fn is_disabled(&self) -> bool {
        false
    }

    fn can_logout(&self) -> bool {
        false
    }
}

/// All configured signatories, keyed by name.
pub struct SignatoryRegistry {
    signatories: HashMap<SignatoryName, Arc<dyn Signatory>>,
}

impl SignatoryRegistry {
    /// Build every factory from the configuration.
    pub fn new(config: &AppConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(BurnerSignatory::new()));
        registry.register(Arc::new(InjectedProviderSignatory::from_config(
            &config.signatory,
        )));
        registry.register(Arc::new(HostedAuthSignatory::from_config(
            &config.signatory,
            config.chain_id,
        )));
        registry
    }

    pub fn empty() -> Self {
        Self {
            signatories: HashMap::new(),
        }
    }

    /// Register (or replace) a signatory under its own name.
    pub fn register(&mut self, signatory: Arc<dyn Signatory>) {
        self.signatories.insert(signatory.name(), signatory);
    }

    pub fn get(&self, name: SignatoryName) -> Option<Arc<dyn Signatory>> {
        self.signatories.get(&name).cloned()
    }

    /// Names with a registered signatory, in the fixed enumeration order.
    pub fn names(&self) -> Vec<SignatoryName> {
        SignatoryName::ALL
            .into_iter()
            .filter(|n| self.signatories.contains_key(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            11_155_111,
            "http://localhost:8545",
            "http://localhost:4337",
            Address::repeat_byte(1),
        )
    }

    #[test]
    fn parses_names_and_legacy_aliases() {
        assert_eq!(
            "burnerSignatoryFactory".parse::<SignatoryName>().unwrap(),
            SignatoryName::Burner
        );
        assert_eq!(
            "hosted-auth".parse::<SignatoryName>().unwrap(),
            SignatoryName::HostedAuth
        );
        assert!("ledger".parse::<SignatoryName>().is_err());
        for name in SignatoryName::ALL {
            assert_eq!(name.as_str().parse::<SignatoryName>().unwrap(), name);
        }
    }

    #[test]
    fn registry_holds_all_three() {
        let registry = SignatoryRegistry::new(&config());
        assert_eq!(registry.names(), SignatoryName::ALL.to_vec());
        for name in SignatoryName::ALL {
            assert_eq!(registry.get(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unconfigured_external_signatories_are_disabled() {
        let registry = SignatoryRegistry::new(&config());
        assert!(!registry.get(SignatoryName::Burner).unwrap().is_disabled());
        assert!(registry
            .get(SignatoryName::InjectedProvider)
            .unwrap()
            .is_disabled());
        assert!(registry.get(SignatoryName::HostedAuth).unwrap().is_disabled());
    }

    #[test]
    fn configured_external_signatories_are_enabled() {
        let mut config = config();
        config.signatory.injected_wallet_url = Some("http://localhost:1248".into());
        config.signatory.hosted_auth_client_id = Some("client".into());
        config.signatory.hosted_auth_url = Some("https://auth.example".into());
        let registry = SignatoryRegistry::new(&config);
        assert!(!registry
            .get(SignatoryName::InjectedProvider)
            .unwrap()
            .is_disabled());
        assert!(!registry.get(SignatoryName::HostedAuth).unwrap().is_disabled());
    }
}
