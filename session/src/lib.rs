//! The session controller.
//!
//! [`DaoSession`] holds what one user is working with: a throwaway delegate
//! account, a delegator account owned by the selected signatory, the
//! delegation between them and the last receipt. Every operation checks its
//! preconditions, runs, and raises exactly one notice on failure.

pub mod error;
pub mod notify;
pub mod session;

pub use error::SessionError;
pub use notify::TracingNotifier;
pub use session::{DaoSession, RedeemPath, SessionServices, SessionSnapshot};
