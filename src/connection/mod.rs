//! Seam between the operation layer and the MongoDB driver
//!
//! This module defines what the operation layer needs from a driver:
//! - [`Server`]: a selected server that runs commands, bulk writes and queries
//! - [`Manager`]: server selection plus client-wide default options
//! - [`WriteBatch`], [`Query`], [`Cursor`] and [`WriteOutcome`]: the plain
//!   data exchanged with a server
//!
//! Connection pooling, topology and BSON encoding live behind these traits.

pub mod bulk;
pub mod cursor;

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use mongodb::options::{ReadPreference, WriteConcern};

use crate::collection::CollectionOptions;
use crate::error::Result;

pub use bulk::{BatchOperation, WriteBatch, WriteOutcome};
pub use cursor::{Cursor, TypeMap};

/// Wire version range reported by a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    pub min_wire_version: i32,
    pub max_wire_version: i32,
}

impl ServerInfo {
    pub fn new(min_wire_version: i32, max_wire_version: i32) -> Self {
        Self {
            min_wire_version,
            max_wire_version,
        }
    }

    /// Whether a feature introduced at `wire_version` is usable on this server
    pub fn supports(&self, wire_version: i32) -> bool {
        self.min_wire_version <= wire_version && wire_version <= self.max_wire_version
    }
}

/// A legacy query sent directly to a namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Query filter
    pub filter: Document,

    /// Query options (projection, skip, limit, modifiers, cursor flags)
    pub options: Document,
}

impl Query {
    pub fn new(filter: Document, options: Document) -> Self {
        Self { filter, options }
    }
}

/// A selected MongoDB server.
///
/// Implementations must be safe to share between concurrently running
/// operations; the operation layer adds no locking of its own.
#[async_trait]
pub trait Server: Send + Sync {
    /// Wire version range this server speaks
    fn info(&self) -> ServerInfo;

    /// Run a database command
    ///
    /// # Arguments
    /// * `database` - Database the command runs against
    /// * `command` - Command document, command name first
    /// * `read_preference` - Read preference sent with the command, if any
    ///
    /// # Errors
    /// A command failure may be returned either as `Err` carrying a
    /// [`ServerError`](crate::error::ServerError) or as an `ok: 0` reply
    /// document. Operations that read a single reply treat both the same.
    /// Commands that answer with a cursor (`listCollections`, `listIndexes`,
    /// aggregate with a cursor) must report failures as `Err`.
    async fn execute_command(
        &self,
        database: &str,
        command: Document,
        read_preference: Option<&ReadPreference>,
    ) -> Result<Cursor>;

    /// Send a batch of writes to `namespace` (`"<db>.<collection>"`)
    async fn execute_bulk_write(
        &self,
        namespace: &str,
        batch: WriteBatch,
        write_concern: Option<&WriteConcern>,
    ) -> Result<WriteOutcome>;

    /// Run a legacy query against `namespace` (`"<db>.<collection>"`)
    async fn execute_query(
        &self,
        namespace: &str,
        query: Query,
        read_preference: Option<&ReadPreference>,
    ) -> Result<Cursor>;
}

/// Selects servers and carries client-wide default options.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Select a server suitable for the given read preference
    async fn select_server(&self, read_preference: &ReadPreference) -> Result<Arc<dyn Server>>;

    /// Defaults inherited by databases and collections created from this manager
    fn defaults(&self) -> CollectionOptions {
        CollectionOptions::default()
    }
}
