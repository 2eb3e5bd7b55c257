//! Caveats and the builder that assembles them.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crowd_types::abi::selector;
use crowd_types::DelegatorEnvironment;

use crate::error::DelegationError;

pub const ALLOWED_TARGETS: &str = "AllowedTargetsEnforcer";
pub const ALLOWED_METHODS: &str = "AllowedMethodsEnforcer";
pub const VALUE_LTE: &str = "ValueLteEnforcer";
pub const TIMESTAMP: &str = "TimestampEnforcer";
pub const LIMITED_CALLS: &str = "LimitedCallsEnforcer";
pub const NATIVE_TOKEN_TRANSFER_AMOUNT: &str = "NativeTokenTransferAmountEnforcer";

/// One restriction on a delegation: the enforcer contract, its static terms
/// and per-redemption args (empty for every caveat built here).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caveat {
    pub enforcer: Address,
    pub terms: Bytes,
    #[serde(default)]
    pub args: Bytes,
}

impl Caveat {
    pub fn new(enforcer: Address, terms: impl Into<Bytes>) -> Self {
        Self {
            enforcer,
            terms: terms.into(),
            args: Bytes::new(),
        }
    }

    pub(crate) fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.enforcer),
            Token::Bytes(self.terms.to_vec()),
            Token::Bytes(self.args.to_vec()),
        ])
    }
}

/// Builds a caveat list against a deployed framework.
///
/// ```ignore
/// let caveats = CaveatBuilder::new(&env)
///     .allowed_targets(&[dao])?
///     .allowed_methods(&["vote(uint256,bool)"])?
///     .limited_calls(1)?
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct CaveatBuilder<'a> {
    environment: &'a DelegatorEnvironment,
    caveats: Vec<Caveat>,
}

impl<'a> CaveatBuilder<'a> {
    pub fn new(environment: &'a DelegatorEnvironment) -> Self {
        Self {
            environment,
            caveats: Vec::new(),
        }
    }

    fn push(mut self, name: &'static str, terms: Vec<u8>) -> Result<Self, DelegationError> {
        let enforcer = self
            .environment
            .enforcer(name)
            .ok_or(DelegationError::MissingEnforcer(name))?;
        self.caveats.push(Caveat::new(enforcer, terms));
        Ok(self)
    }

    /// Only these contracts may be called. Terms: packed addresses.
    pub fn allowed_targets(self, targets: &[Address]) -> Result<Self, DelegationError> {
        if targets.is_empty() {
            return Err(DelegationError::EmptyTargets);
        }
        let terms = targets.iter().flat_map(|t| t.as_bytes().to_vec()).collect();
        self.push(ALLOWED_TARGETS, terms)
    }

    /// Only these functions may be called. Each entry is either a Solidity
    /// signature (`vote(uint256,bool)`) or a hex selector (`0xc9d27afe`).
    /// Terms: packed 4-byte selectors.
    pub fn allowed_methods(self, methods: &[&str]) -> Result<Self, DelegationError> {
        if methods.is_empty() {
            return Err(DelegationError::EmptyMethods);
        }
        let mut terms = Vec::with_capacity(methods.len() * 4);
        for method in methods {
            terms.extend_from_slice(&method_selector(method)?);
        }
        self.push(ALLOWED_METHODS, terms)
    }

    /// Cap on the native value of each call. Terms: uint256.
    pub fn value_lte(self, max: U256) -> Result<Self, DelegationError> {
        self.push(VALUE_LTE, ethers::abi::encode(&[Token::Uint(max)]))
    }

    /// Valid strictly after `after` and strictly before `before` (unix
    /// seconds, 0 disables that bound). Terms: packed uint128 pair.
    pub fn timestamp(self, after: u128, before: u128) -> Result<Self, DelegationError> {
        if after != 0 && before != 0 && after >= before {
            return Err(DelegationError::InvalidWindow { after, before });
        }
        let mut terms = Vec::with_capacity(32);
        terms.extend_from_slice(&after.to_be_bytes());
        terms.extend_from_slice(&before.to_be_bytes());
        self.push(TIMESTAMP, terms)
    }

    /// Total number of redemptions. Terms: uint256.
    pub fn limited_calls(self, limit: u64) -> Result<Self, DelegationError> {
        self.push(LIMITED_CALLS, ethers::abi::encode(&[Token::Uint(U256::from(limit))]))
    }

    /// Total native value that may be moved. Terms: uint256.
    pub fn native_token_transfer_amount(self, allowance: U256) -> Result<Self, DelegationError> {
        self.push(
            NATIVE_TOKEN_TRANSFER_AMOUNT,
            ethers::abi::encode(&[Token::Uint(allowance)]),
        )
    }

    pub fn build(self) -> Vec<Caveat> {
        self.caveats
    }
}

fn method_selector(method: &str) -> Result<[u8; 4], DelegationError> {
    let method = method.trim();
    if let Some(raw) = method.strip_prefix("0x") {
        let bytes = hex::decode(raw).map_err(|_| DelegationError::InvalidMethod(method.to_string()))?;
        return bytes
            .try_into()
            .map_err(|_| DelegationError::InvalidMethod(method.to_string()));
    }
    let signature = if method.starts_with("function ") {
        method.to_string()
    } else {
        format!("function {method}")
    };
    selector(&signature).map_err(|_| DelegationError::InvalidMethod(method.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment() -> DelegatorEnvironment {
        let mut env = DelegatorEnvironment::default();
        for (i, name) in [
            ALLOWED_TARGETS,
            ALLOWED_METHODS,
            VALUE_LTE,
            TIMESTAMP,
            LIMITED_CALLS,
            NATIVE_TOKEN_TRANSFER_AMOUNT,
        ]
        .into_iter()
        .enumerate()
        {
            env.caveat_enforcers
                .insert(name.to_string(), Address::repeat_byte(0x10 + i as u8));
        }
        env
    }

    #[test]
    fn targets_and_methods_are_packed() {
        let env = environment();
        let caveats = CaveatBuilder::new(&env)
            .allowed_targets(&[Address::repeat_byte(0xaa), Address::repeat_byte(0xbb)])
            .unwrap()
            .allowed_methods(&["transfer(address,uint256)", "0xdeadbeef"])
            .unwrap()
            .build();

        assert_eq!(caveats.len(), 2);
        assert_eq!(caveats[0].enforcer, Address::repeat_byte(0x10));
        assert_eq!(caveats[0].terms.len(), 40);
        assert_eq!(&caveats[0].terms[20..], Address::repeat_byte(0xbb).as_bytes());
        assert_eq!(caveats[1].terms.as_ref(), &[0xa9, 0x05, 0x9c, 0xbb, 0xde, 0xad, 0xbe, 0xef]);
        assert!(caveats.iter().all(|c| c.args.is_empty()));
    }

    #[test]
    fn empty_lists_are_rejected() {
        let env = environment();
        assert!(matches!(
            CaveatBuilder::new(&env).allowed_targets(&[]),
            Err(DelegationError::EmptyTargets)
        ));
        assert!(matches!(
            CaveatBuilder::new(&env).allowed_methods(&[]),
            Err(DelegationError::EmptyMethods)
        ));
    }

    #[test]
    fn timestamp_terms_are_two_uint128() {
        let env = environment();
        let caveats = CaveatBuilder::new(&env).timestamp(1, 2).unwrap().build();
        let terms = &caveats[0].terms;
        assert_eq!(terms.len(), 32);
        assert_eq!(terms[15], 1);
        assert_eq!(terms[31], 2);
        assert!(matches!(
            CaveatBuilder::new(&env).timestamp(5, 5),
            Err(DelegationError::InvalidWindow { .. })
        ));
        assert!(CaveatBuilder::new(&env).timestamp(0, 5).is_ok());
    }

    #[test]
    fn numeric_terms_are_uint256() {
        let env = environment();
        let caveats = CaveatBuilder::new(&env)
            .value_lte(U256::from(100))
            .unwrap()
            .limited_calls(3)
            .unwrap()
            .native_token_transfer_amount(U256::exp10(18))
            .unwrap()
            .build();
        assert!(caveats.iter().all(|c| c.terms.len() == 32));
        assert_eq!(caveats[1].terms[31], 3);
        assert_eq!(U256::from_big_endian(&caveats[2].terms), U256::exp10(18));
    }

    #[test]
    fn missing_enforcer_is_reported() {
        let env = DelegatorEnvironment::default();
        assert!(matches!(
            CaveatBuilder::new(&env).limited_calls(1),
            Err(DelegationError::MissingEnforcer(LIMITED_CALLS))
        ));
    }

    #[test]
    fn bad_selector_is_rejected() {
        let env = environment();
        assert!(matches!(
            CaveatBuilder::new(&env).allowed_methods(&["0x1234"]),
            Err(DelegationError::InvalidMethod(_))
        ));
    }
}
