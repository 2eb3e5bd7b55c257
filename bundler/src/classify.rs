//! Failure classification into user-facing notices.
//!
//! Structured signals are checked first: the EIP-1193 "user rejected" code,
//! a signatory rejection and the EntryPoint's `AA25` nonce code. Anything
//! else falls back to a fixed table of revert-reason substrings, matched
//! case-insensitively with separators ignored, so `AlreadyVoted()`,
//! `already voted` and `ALREADY_VOTED` all land on the same kind.

use std::fmt;

use ethers::abi::{decode, ParamType};
use ethers::utils::id;

use crowd_signatory::SignatoryError;
use crowd_types::{Notice, NoticeSeverity};

use crate::error::BundlerError;

const USER_REJECTED_CODE: i64 = 4001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UserRejected,
    UnverifiedUser,
    IntervalNotElapsed,
    TargetNotAllowed,
    MethodNotAllowed,
    CallLimitReached,
    InsufficientBalance,
    ValueTooHigh,
    BadNonce,
    AlreadyVoted,
    Unknown,
}

/// Substring table, first match wins. Patterns are lowercase alphanumerics.
const PATTERNS: &[(&str, ErrorKind)] = &[
    ("userrejected", ErrorKind::UserRejected),
    ("userdenied", ErrorKind::UserRejected),
    ("rejectedtherequest", ErrorKind::UserRejected),
    ("unverifieduser", ErrorKind::UnverifiedUser),
    ("usernotverified", ErrorKind::UnverifiedUser),
    ("intervalnotelapsed", ErrorKind::IntervalNotElapsed),
    ("earlydelegation", ErrorKind::IntervalNotElapsed),
    ("targetaddressnotallowed", ErrorKind::TargetNotAllowed),
    ("targetnotallowed", ErrorKind::TargetNotAllowed),
    ("methodnotallowed", ErrorKind::MethodNotAllowed),
    ("limitedcallsenforcer", ErrorKind::CallLimitReached),
    ("calllimitreached", ErrorKind::CallLimitReached),
    ("insufficientbalance", ErrorKind::InsufficientBalance),
    ("insufficientfunds", ErrorKind::InsufficientBalance),
    ("didntpayprefund", ErrorKind::InsufficientBalance),
    ("valuetoohigh", ErrorKind::ValueTooHigh),
    ("allowanceexceeded", ErrorKind::ValueTooHigh),
    ("invalidaccountnonce", ErrorKind::BadNonce),
    ("badnonce", ErrorKind::BadNonce),
    ("alreadyvoted", ErrorKind::AlreadyVoted),
];

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRejected => "user rejected",
            Self::UnverifiedUser => "unverified user",
            Self::IntervalNotElapsed => "interval not elapsed",
            Self::TargetNotAllowed => "target not allowed",
            Self::MethodNotAllowed => "method not allowed",
            Self::CallLimitReached => "call limit reached",
            Self::InsufficientBalance => "insufficient balance",
            Self::ValueTooHigh => "value too high",
            Self::BadNonce => "bad nonce",
            Self::AlreadyVoted => "already voted",
            Self::Unknown => "unknown",
        }
    }

    /// The one notice shown for this kind.
    pub fn notice(&self) -> Notice {
        match self {
            Self::UserRejected => Notice::info("Request cancelled", "You rejected the signature request."),
            Self::UnverifiedUser => Notice::new(
                NoticeSeverity::Warning,
                "Verification required",
                "Verify your identity before taking this action.",
            ),
            Self::IntervalNotElapsed => Notice::new(
                NoticeSeverity::Warning,
                "Too early",
                "The delegation's time window does not allow this yet.",
            ),
            Self::TargetNotAllowed => Notice::error(
                "Target not allowed",
                "The delegation does not permit calls to this contract.",
            ),
            Self::MethodNotAllowed => Notice::error(
                "Method not allowed",
                "The delegation does not permit this function.",
            ),
            Self::CallLimitReached => Notice::error(
                "Call limit reached",
                "The delegation has been used the maximum number of times.",
            ),
            Self::InsufficientBalance => Notice::error(
                "Insufficient balance",
                "The account cannot cover the value or the gas.",
            ),
            Self::ValueTooHigh => Notice::error(
                "Value too high",
                "The amount exceeds what the delegation allows.",
            ),
            Self::BadNonce => Notice::error(
                "Nonce mismatch",
                "Another operation from this account landed first. Try again.",
            ),
            Self::AlreadyVoted => Notice::new(
                NoticeSeverity::Warning,
                "Already voted",
                "This account has already voted on the activity.",
            ),
            Self::Unknown => Notice::error("Transaction failed", "Something went wrong. Please try again."),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom errors the DAO contract reverts with, decoded by selector.
const CUSTOM_ERRORS: &[&str] = &[
    "AlreadyVoted()",
    "UnverifiedUser()",
    "IntervalNotElapsed()",
    "InsufficientBalance()",
    "ValueTooHigh()",
    "TargetNotAllowed()",
    "MethodNotAllowed()",
];

/// Decode hex revert data into readable text: `Error(string)` payloads give
/// their message, known custom errors give their signature.
pub fn revert_reason(data: &str) -> Option<String> {
    let bytes = hex::decode(data.trim().trim_start_matches("0x")).ok()?;
    if bytes.len() < 4 {
        return None;
    }
    let (selector, payload) = bytes.split_at(4);
    if selector == &id("Error(string)")[..] {
        return decode(&[ParamType::String], payload)
            .ok()?
            .into_iter()
            .next()?
            .into_string();
    }
    CUSTOM_ERRORS
        .iter()
        .find(|sig| &id(sig)[..] == selector)
        .map(|sig| sig.to_string())
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classify an error by its optional JSON-RPC code and its text.
pub fn classify_message(code: Option<i64>, text: &str) -> ErrorKind {
    if code == Some(USER_REJECTED_CODE) {
        return ErrorKind::UserRejected;
    }
    if text.contains("AA25") {
        return ErrorKind::BadNonce;
    }
    let normalized = normalize(text);
    PATTERNS
        .iter()
        .find(|(pattern, _)| normalized.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

pub fn classify(error: &BundlerError) -> ErrorKind {
    match error {
        BundlerError::Signing(SignatoryError::UserRejected(_))
        | BundlerError::Account(crowd_account::AccountError::Signing(SignatoryError::UserRejected(_))) => {
            ErrorKind::UserRejected
        }
        BundlerError::Rpc { code, message, data } => {
            let text = match data {
                Some(data) => {
                    let decoded = revert_reason(data).unwrap_or_default();
                    format!("{message} {data} {decoded}")
                }
                None => message.clone(),
            };
            classify_message(Some(*code), &text)
        }
        other => classify_message(None, &other.to_string()),
    }
}
