//! Shared utilities for the CrowdHelping toolkit.

pub mod logging;
pub mod time;

pub use logging::{init_tracing, LogFormat};
pub use time::format_elapsed;
