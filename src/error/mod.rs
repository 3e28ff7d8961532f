//! Error handling module for MongoDB operations.
//!
//! This module provides:
//! - The crate-wide [`OperationError`] taxonomy (invalid argument, unexpected
//!   server reply, unacknowledged write access, collaborator failures)
//! - Structured server command errors that serialize to JSON for logging
//!
//! # Example
//!
//! ```rust
//! use mongo_ops::error::{OperationError, Result};
//!
//! fn check_limit(limit: i64) -> Result<()> {
//!     if limit != 0 && limit != 1 {
//!         return Err(OperationError::invalid_type("limit", limit, "0 or 1"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_limit(2).unwrap_err().is_invalid_argument());
//! ```

pub mod kinds;
pub mod server;

// Re-export commonly used types
pub use kinds::{ConfigError, OperationError, Result};
pub use server::{
    DATABASE_NOT_FOUND, NAMESPACE_NOT_FOUND, NS_NOT_FOUND_MESSAGE, ServerError, UNKNOWN_ERROR_CODE,
};

impl OperationError {
    /// The server command error behind this error, whether it was reported
    /// by a `Server` implementation directly or wrapped in a driver error.
    pub fn as_server_error(&self) -> Option<ServerError> {
        match self {
            OperationError::Server(e) => Some(e.clone()),
            OperationError::Driver(e) => ServerError::from_driver_error(e),
            _ => None,
        }
    }
}
