//! Proof payloads exchanged with the widget and the cloud verifier.

use ethers::types::U256;
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::VerificationError;

/// How strongly the holder was verified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    Orb,
    #[default]
    Device,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationLevel {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "orb" => Ok(Self::Orb),
            "device" => Ok(Self::Device),
            other => Err(VerificationError::UnknownLevel(other.to_string())),
        }
    }
}

/// What the widget hands back after the user completes the flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
}

/// Body of the cloud verification request.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyRequest {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_hash: Option<String>,
}

impl VerifyRequest {
    pub fn new(payload: &ProofPayload, action: &str, signal: Option<&[u8]>) -> Self {
        Self {
            merkle_root: payload.merkle_root.clone(),
            nullifier_hash: payload.nullifier_hash.clone(),
            proof: payload.proof.clone(),
            verification_level: payload.verification_level,
            action: action.to_string(),
            signal_hash: signal.map(signal_hash),
        }
    }
}

/// Outcome reported back to the caller: `{success, detail?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReply {
    pub success: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

impl VerifyReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
        }
    }
}

/// Hash a signal into the field the circuit commits to:
/// `keccak256(signal) >> 8`, hex encoded.
pub fn signal_hash(signal: &[u8]) -> String {
    let hashed = U256::from_big_endian(&keccak256(signal)) >> 8;
    let mut out = [0u8; 32];
    hashed.to_big_endian(&mut out);
    format!("0x{}", hex::encode(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("ORB".parse::<VerificationLevel>().unwrap(), VerificationLevel::Orb);
        assert!("passport".parse::<VerificationLevel>().is_err());
    }

    #[test]
    fn signal_hash_fits_in_field() {
        let hash = signal_hash(b"");
        assert!(hash.starts_with("0x00"));
        assert_eq!(hash.len(), 66);
    }

    #[test]
    fn request_omits_missing_signal() {
        let payload = ProofPayload {
            merkle_root: "0x1".into(),
            nullifier_hash: "0x2".into(),
            proof: "0x3".into(),
            verification_level: VerificationLevel::Device,
        };
        let body = serde_json::to_value(VerifyRequest::new(&payload, "vote", None)).unwrap();
        assert_eq!(body["verification_level"], "device");
        assert_eq!(body["action"], "vote");
        assert!(body.get("signal_hash").is_none());
    }
}
