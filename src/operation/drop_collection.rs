//! DropCollection operation
//!
//! Dropping a collection that does not exist is not an error: the server's
//! "ns not found" failure is turned into an `{ok: 0}` reply.

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_WRITE_CONCERN, check_collection_name, command_reply};
use crate::connection::{Server, ServerInfo, TypeMap};
use crate::error::{NS_NOT_FOUND_MESSAGE, Result};
use crate::functions::write_concern_as_document;

/// Options for [`DropCollection`]
#[derive(Debug, Clone, Default)]
pub struct DropCollectionOptions {
    pub type_map: Option<TypeMap>,

    /// Write concern (server 3.4+)
    pub write_concern: Option<WriteConcern>,
}

/// Drop a collection
#[derive(Debug, Clone)]
pub struct DropCollection {
    database_name: String,
    collection_name: String,
    options: DropCollectionOptions,
}

impl DropCollection {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: DropCollectionOptions,
    ) -> Result<Self> {
        let collection_name = collection_name.into();
        check_collection_name(&collection_name)?;

        Ok(Self {
            database_name: database_name.into(),
            collection_name,
            options,
        })
    }

    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! { "drop": self.collection_name.as_str() };

        if let Some(write_concern) = &self.options.write_concern
            && info.supports(WIRE_VERSION_FOR_WRITE_CONCERN)
        {
            command.insert("writeConcern", write_concern_as_document(write_concern)?);
        }

        Ok(command)
    }

    async fn run_drop(&self, server: &dyn Server, command: Document) -> Result<Document> {
        let mut cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }
        command_reply(cursor, "drop").await
    }
}

#[async_trait]
impl Executable for DropCollection {
    type Output = Document;

    async fn execute(&self, server: &dyn Server) -> Result<Document> {
        let command = self.create_command(&server.info())?;
        debug!(
            "Dropping collection '{}.{}'",
            self.database_name, self.collection_name
        );

        let err = match self.run_drop(server, command).await {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };

        match err.as_server_error() {
            Some(error) if error.is_ns_not_found() => {
                info!(
                    "Collection '{}.{}' does not exist; nothing to drop: {}",
                    self.database_name,
                    self.collection_name,
                    error.to_json_compact().unwrap_or_default()
                );
                Ok(doc! { "ok": 0, "errmsg": NS_NOT_FOUND_MESSAGE })
            }
            _ => Err(err),
        }
    }
}
