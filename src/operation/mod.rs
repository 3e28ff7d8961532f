//! Executable MongoDB operations
//!
//! Every verb is a value that validates its arguments on construction and
//! runs against a selected [`Server`] through [`Executable::execute`]:
//! - Reads: aggregate, count, distinct, find, findOne
//! - Writes: insert, update, replace, delete, bulkWrite
//! - findAndModify and its findOneAnd* derivatives
//! - Index, collection and database management
//!
//! Operations with a legacy fallback choose between the command path and the
//! legacy path once per call, based on the server's wire version range.

pub mod aggregate;
pub mod bulk_write;
pub mod count;
pub mod create_collection;
pub mod create_indexes;
pub mod database_command;
pub mod delete;
pub mod distinct;
pub mod drop_collection;
pub mod drop_database;
pub mod drop_indexes;
pub mod find;
pub mod find_and_modify;
pub mod insert;
pub mod list_collections;
pub mod list_databases;
pub mod list_indexes;
pub mod update;

use async_trait::async_trait;
use bson::Document;
use mongodb::options::ReadPreference;

use crate::connection::{Cursor, Manager, Server};
use crate::error::{OperationError, Result, ServerError};

pub use aggregate::{Aggregate, AggregateOptions};
pub use bulk_write::{BulkWrite, BulkWriteOptions, WriteModel};
pub use count::{Count, CountOptions, Hint};
pub use create_collection::{CreateCollection, CreateCollectionOptions};
pub use create_indexes::{CreateIndexes, CreateIndexesOptions};
pub use database_command::{DatabaseCommand, DatabaseCommandOptions};
pub use delete::{Delete, DeleteMany, DeleteOne, DeleteOptions};
pub use distinct::{Distinct, DistinctOptions};
pub use drop_collection::{DropCollection, DropCollectionOptions};
pub use drop_database::{DropDatabase, DropDatabaseOptions};
pub use drop_indexes::{DropIndexes, DropIndexesOptions};
pub use find::{CursorType, Find, FindOne, FindOptions};
pub use find_and_modify::{
    FindAndModify, FindAndModifyOptions, FindOneAndDelete, FindOneAndDeleteOptions,
    FindOneAndReplace, FindOneAndReplaceOptions, FindOneAndUpdate, FindOneAndUpdateOptions,
    ReturnDocument,
};
pub use insert::{InsertMany, InsertManyOptions, InsertOne, InsertOneOptions};
pub use list_collections::{CollectionInfoStream, ListCollections, ListCollectionsOptions};
pub use list_databases::{ListDatabases, ListDatabasesOptions};
pub use list_indexes::{IndexInfoStream, ListIndexes, ListIndexesOptions};
pub use update::{ReplaceOne, Update, UpdateMany, UpdateOne, UpdateOptions};

/// Wire version introducing the aggregate cursor and the createIndexes command
pub const WIRE_VERSION_FOR_CURSOR: i32 = 2;

/// Wire version introducing the listCollections and listIndexes commands
pub const WIRE_VERSION_FOR_LIST_COMMANDS: i32 = 3;

/// Wire version introducing read concern
pub const WIRE_VERSION_FOR_READ_CONCERN: i32 = 4;

/// Wire version introducing document validation bypass
pub const WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION: i32 = 4;

/// Wire version introducing write concern on findAndModify
pub const WIRE_VERSION_FOR_FIND_AND_MODIFY_WRITE_CONCERN: i32 = 4;

/// Wire version introducing collation and write concern on index and drop commands
pub const WIRE_VERSION_FOR_COLLATION: i32 = 5;

/// Wire version introducing write concern on index and drop commands
pub const WIRE_VERSION_FOR_WRITE_CONCERN: i32 = 5;

/// An operation that can be run against a selected server.
///
/// Operations hold no server state and may be executed more than once.
#[async_trait]
pub trait Executable: Send + Sync {
    /// Value produced by a successful execution
    type Output;

    async fn execute(&self, server: &dyn Server) -> Result<Self::Output>;
}

/// Render a `"<db>.<collection>"` namespace
pub(crate) fn namespace(database_name: &str, collection_name: &str) -> String {
    format!("{database_name}.{collection_name}")
}

/// Reject an empty collection name
pub(crate) fn check_collection_name(collection_name: &str) -> Result<()> {
    if collection_name.is_empty() {
        return Err(OperationError::InvalidArgument(
            "$collectionName is invalid: collection name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Read the single reply document of a command
///
/// A reply with `ok: 0` is returned as [`OperationError::Server`].
pub(crate) async fn command_reply(cursor: Cursor, command: &str) -> Result<Document> {
    let reply = cursor.first().await?.ok_or_else(|| {
        OperationError::UnexpectedValue(format!("{command} command returned no reply"))
    })?;

    match ServerError::from_reply(&reply) {
        Some(error) => Err(error.into()),
        None => Ok(reply),
    }
}

/// Select a server for `read_preference` and execute an operation on it
pub(crate) async fn execute_with<E: Executable>(
    manager: &dyn Manager,
    operation: &E,
    read_preference: &ReadPreference,
) -> Result<E::Output> {
    let server = manager.select_server(read_preference).await?;
    operation.execute(server.as_ref()).await
}
