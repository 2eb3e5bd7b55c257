//! Deploy salts.

use ethers::types::H256;
use rand::RngCore;

/// A fresh deploy salt: eight random bytes written as hex text, left-padded
/// to 32 bytes. A new salt means a new address even for the same owner.
pub fn create_salt() -> H256 {
    let mut random = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut random);
    salt_from_text(&hex::encode(random))
}

/// Left-pad the bytes of `text` into a 32-byte word.
pub(crate) fn salt_from_text(text: &str) -> H256 {
    let bytes = text.as_bytes();
    let len = bytes.len().min(32);
    let mut word = [0u8; 32];
    word[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    H256::from(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_left_padded_text() {
        let salt = salt_from_text("00ff");
        assert_eq!(&salt.as_bytes()[..28], &[0u8; 28]);
        assert_eq!(&salt.as_bytes()[28..], b"00ff");
    }

    #[test]
    fn fresh_salts_differ() {
        let a = create_salt();
        assert_ne!(a, create_salt());
        assert_eq!(&a.as_bytes()[..16], &[0u8; 16]);
    }
}
