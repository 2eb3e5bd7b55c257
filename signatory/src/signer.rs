//! Signing capability handed out by a signatory login.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256};

use crate::error::SignatoryError;

/// Signs on behalf of a smart account owner.
#[async_trait]
pub trait DelegationSigner: Send + Sync {
    /// The owner address the signatures recover to.
    fn address(&self) -> Address;

    /// Sign a 32-byte digest as-is (EIP-712 digests).
    async fn sign_hash(&self, hash: H256) -> Result<Bytes, SignatoryError>;

    /// Sign an EIP-191 personal message (user operation hashes).
    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignatoryError>;
}

/// A signer backed by a key held in process memory.
#[derive(Clone, Debug)]
pub struct LocalSigner {
    wallet: LocalWallet,
}

impl LocalSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        Self::new(LocalWallet::new(&mut rand::thread_rng()))
    }

    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self, SignatoryError> {
        key.trim()
            .parse::<LocalWallet>()
            .map(Self::new)
            .map_err(|e| SignatoryError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl DelegationSigner for LocalSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_hash(&self, hash: H256) -> Result<Bytes, SignatoryError> {
        let signature = self
            .wallet
            .sign_hash(hash)
            .map_err(|e| SignatoryError::Signing(e.to_string()))?;
        Ok(Bytes::from(signature.to_vec()))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, SignatoryError> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| SignatoryError::Signing(e.to_string()))?;
        Ok(Bytes::from(signature.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Signature;
    use ethers::utils::hash_message;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn hash_signature_recovers_to_owner() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let hash = H256::repeat_byte(0x42);
        let raw = signer.sign_hash(hash).await.unwrap();
        assert_eq!(raw.len(), 65);
        let signature = Signature::try_from(raw.as_ref()).unwrap();
        assert_eq!(signature.recover(hash).unwrap(), signer.address());
    }

    #[tokio::test]
    async fn message_signature_uses_personal_prefix() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let raw = signer.sign_message(b"hello").await.unwrap();
        let signature = Signature::try_from(raw.as_ref()).unwrap();
        assert_eq!(
            signature.recover(hash_message(b"hello")).unwrap(),
            signer.address()
        );
    }

    #[test]
    fn random_keys_differ() {
        assert_ne!(LocalSigner::random().address(), LocalSigner::random().address());
    }

    #[test]
    fn rejects_garbage_key() {
        assert!(matches!(
            LocalSigner::from_hex("0x1234"),
            Err(SignatoryError::InvalidKey(_))
        ));
    }
}
