//! Application configuration.
//!
//! [`AppConfig`] is built exactly once, at process start, from environment
//! variables or a TOML file, and then passed by reference (or `Arc`) to every
//! component that needs it. Nothing else in the workspace reads process
//! environment variables.

pub mod app;
pub mod error;

pub use app::{AppConfig, IdentityConfig, SignatoryConfig, SubmissionConfig};
pub use error::ConfigError;
