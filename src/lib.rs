//! MongoDB Operation Library
//!
//! This library turns a high-level CRUD, aggregation and administration API
//! into commands, write batches and queries sent through a MongoDB driver.
//! Each call picks between the modern command protocol and the legacy
//! protocol from the selected server's wire version, and merges read
//! concern, read preference and write concern defaults with per-call options.
//!
//! # Modules
//!
//! - `client`, `database`, `collection`: Facades holding defaults and namespaces
//! - `config`: Configuration management
//! - `connection`: The `Server`/`Manager` seam implemented by a driver
//! - `error`: Error types and handling
//! - `functions`: Helpers shared by operations
//! - `logging`: Subscriber setup for `tracing` output
//! - `model`: Index specifications and typed list results
//! - `operation`: One executable value per MongoDB verb
//! - `result`: Acknowledgment-aware write results
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bson::doc;
//! use mongo_ops::connection::Manager;
//! use mongo_ops::operation::{FindOptions, InsertOneOptions};
//! use mongo_ops::{Client, CollectionOptions};
//!
//! async fn run(manager: Arc<dyn Manager>) -> mongo_ops::Result<()> {
//!     let client = Client::new(manager);
//!     let users = client.select_collection("app", "users", CollectionOptions::default())?;
//!
//!     let inserted = users
//!         .insert_one(doc! { "name": "ada" }, InsertOneOptions::default())
//!         .await?;
//!     println!("Inserted {}", inserted.inserted_id());
//!
//!     let found = users
//!         .find_one(doc! { "name": "ada" }, FindOptions::default())
//!         .await?;
//!     println!("Found {:?}", found);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod functions;
pub mod logging;
pub mod model;
pub mod operation;
pub mod result;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use client::Client;
pub use collection::{Collection, CollectionOptions};
pub use config::Config;
pub use connection::{Cursor, Manager, Server, ServerInfo, TypeMap};
pub use database::Database;
pub use error::{OperationError, Result};
pub use operation::Executable;
pub use result::{BulkWriteResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
