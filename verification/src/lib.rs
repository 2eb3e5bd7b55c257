//! Identity verification gateway.
//!
//! The proof-of-personhood widget produces a zero-knowledge proof. This crate
//! forwards that proof to the cloud verifier, interprets the reply, and keeps
//! a record of verified nullifiers so that voting and posting can be gated on
//! a successful verification.
//!
//! The verifier is pluggable ([`ProofVerifier`]); the HTTP implementation is
//! [`CloudVerifier`].

pub mod client;
pub mod error;
pub mod gate;
pub mod proof;

pub use client::{CloudVerifier, ProofVerifier};
pub use error::VerificationError;
pub use gate::{IdentityGate, VerifiedIdentity};
pub use proof::{ProofPayload, VerificationLevel, VerifyReply, VerifyRequest};
