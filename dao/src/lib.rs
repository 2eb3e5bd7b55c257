//! DAO activity contract glue.
//!
//! Reads go straight to the chain through a [`ChainReader`]; writes are
//! packaged as calls and handed to a [`UserOperationSender`].
//!
//! [`ChainReader`]: crowd_bundler::ChainReader
//! [`UserOperationSender`]: crowd_bundler::UserOperationSender

pub mod cache;
pub mod contract;
pub mod error;
pub mod queries;
pub mod reader;
pub mod writer;

pub use cache::ActivityCache;
pub use contract::DaoContract;
pub use error::DaoError;
pub use queries::{ActivityQueries, BatchResult, BatchStatus};
pub use reader::DaoReader;
pub use writer::DaoWriter;
