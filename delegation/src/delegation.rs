//! Delegation records and their EIP-712 digest.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crowd_signatory::DelegationSigner;

use crate::caveat::Caveat;
use crate::error::DelegationError;

/// Authority of a root delegation: no parent.
pub const ROOT_AUTHORITY: H256 = H256([0xff; 32]);

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const DELEGATION_TYPE: &str = "Delegation(address delegate,address delegator,bytes32 authority,Caveat[] caveats,uint256 salt)Caveat(address enforcer,bytes terms)";
const CAVEAT_TYPE: &str = "Caveat(address enforcer,bytes terms)";

/// The delegation manager's EIP-712 domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegationDomain {
    pub chain_id: u64,
    pub delegation_manager: Address,
}

impl DelegationDomain {
    pub fn new(chain_id: u64, delegation_manager: Address) -> Self {
        Self {
            chain_id,
            delegation_manager,
        }
    }

    pub fn separator(&self) -> H256 {
        H256(keccak256(ethers::abi::encode(&[
            Token::FixedBytes(keccak256(DOMAIN_TYPE).to_vec()),
            Token::FixedBytes(keccak256("DelegationManager").to_vec()),
            Token::FixedBytes(keccak256("1").to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.delegation_manager),
        ])))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub delegate: Address,
    pub delegator: Address,
    pub authority: H256,
    pub caveats: Vec<Caveat>,
    pub salt: U256,
    #[serde(default)]
    pub signature: Bytes,
}

/// An unsigned root delegation with a random salt.
pub fn create_root_delegation(delegate: Address, delegator: Address, caveats: Vec<Caveat>) -> Delegation {
    let mut salt = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut salt);
    Delegation {
        delegate,
        delegator,
        authority: ROOT_AUTHORITY,
        caveats,
        salt: U256::from_big_endian(&salt),
        signature: Bytes::new(),
    }
}

impl Delegation {
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.authority == ROOT_AUTHORITY
    }

    /// EIP-712 struct hash. Caveat args and the signature are not covered.
    pub fn struct_hash(&self) -> H256 {
        let caveat_type = keccak256(CAVEAT_TYPE);
        let caveat_hashes: Vec<u8> = self
            .caveats
            .iter()
            .flat_map(|c| {
                keccak256(ethers::abi::encode(&[
                    Token::FixedBytes(caveat_type.to_vec()),
                    Token::Address(c.enforcer),
                    Token::FixedBytes(keccak256(&c.terms).to_vec()),
                ]))
            })
            .collect();

        H256(keccak256(ethers::abi::encode(&[
            Token::FixedBytes(keccak256(DELEGATION_TYPE).to_vec()),
            Token::Address(self.delegate),
            Token::Address(self.delegator),
            Token::FixedBytes(self.authority.as_bytes().to_vec()),
            Token::FixedBytes(keccak256(caveat_hashes).to_vec()),
            Token::Uint(self.salt),
        ])))
    }

    /// `keccak256(0x1901 ‖ domainSeparator ‖ structHash)`.
    pub fn typed_data_hash(&self, domain: &DelegationDomain) -> H256 {
        let mut payload = Vec::with_capacity(66);
        payload.extend_from_slice(&[0x19, 0x01]);
        payload.extend_from_slice(domain.separator().as_bytes());
        payload.extend_from_slice(self.struct_hash().as_bytes());
        H256(keccak256(payload))
    }

    /// Sign with the delegator's owner key. Re-signing overwrites.
    pub async fn sign(
        &mut self,
        signer: &dyn DelegationSigner,
        domain: &DelegationDomain,
    ) -> Result<(), DelegationError> {
        let digest = self.typed_data_hash(domain);
        self.signature = signer.sign_hash(digest).await?;
        debug!(delegator = %self.delegator, delegate = %self.delegate, %digest, "signed delegation");
        Ok(())
    }

    /// The `Delegation` struct as an ABI tuple.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.delegate),
            Token::Address(self.delegator),
            Token::FixedBytes(self.authority.as_bytes().to_vec()),
            Token::Array(self.caveats.iter().map(Caveat::to_token).collect()),
            Token::Uint(self.salt),
            Token::Bytes(self.signature.to_vec()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowd_signatory::LocalSigner;
    use ethers::types::{RecoveryMessage, Signature};

    fn domain() -> DelegationDomain {
        DelegationDomain::new(11155111, Address::repeat_byte(0xdd))
    }

    #[test]
    fn root_delegation_is_unsigned_with_random_salt() {
        let a = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        let b = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        assert!(a.is_root());
        assert!(!a.is_signed());
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn digest_depends_on_domain_and_caveats() {
        let mut d = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        let base = d.typed_data_hash(&domain());
        assert_ne!(base, d.typed_data_hash(&DelegationDomain::new(545, Address::repeat_byte(0xdd))));

        d.caveats.push(Caveat::new(Address::repeat_byte(3), vec![1u8]));
        let with_caveat = d.typed_data_hash(&domain());
        assert_ne!(base, with_caveat);

        d.caveats[0].args = Bytes::from(vec![9u8]);
        assert_eq!(with_caveat, d.typed_data_hash(&domain()));
    }

    #[tokio::test]
    async fn signature_recovers_owner_and_resign_overwrites() {
        let signer = LocalSigner::random();
        let mut d = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        d.sign(&signer, &domain()).await.unwrap();
        assert!(d.is_signed());

        let digest = d.typed_data_hash(&domain());
        let sig = Signature::try_from(d.signature.as_ref()).unwrap();
        assert_eq!(sig.recover(RecoveryMessage::Hash(digest)).unwrap(), signer.address());

        let other = LocalSigner::random();
        d.sign(&other, &domain()).await.unwrap();
        let sig = Signature::try_from(d.signature.as_ref()).unwrap();
        assert_eq!(sig.recover(RecoveryMessage::Hash(digest)).unwrap(), other.address());
    }

    #[test]
    fn serializes_camel_case() {
        let d = create_root_delegation(Address::repeat_byte(1), Address::repeat_byte(2), vec![]);
        let json = serde_json::to_value(&d).unwrap();
        assert!(json.get("delegator").is_some());
        let back: Delegation = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
