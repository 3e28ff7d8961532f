//! ListIndexes operation

use async_trait::async_trait;
use bson::{Document, doc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_LIST_COMMANDS, namespace};
use crate::connection::{Query, Server};
use crate::error::Result;
use crate::functions::server_supports_feature;
use crate::model::IndexInfo;

/// Stream of index descriptions
pub type IndexInfoStream = BoxStream<'static, Result<IndexInfo>>;

/// Options for [`ListIndexes`]
#[derive(Debug, Clone, Default)]
pub struct ListIndexesOptions {
    pub max_time_ms: Option<i64>,
}

/// List the indexes of a collection
#[derive(Debug, Clone)]
pub struct ListIndexes {
    database_name: String,
    collection_name: String,
    options: ListIndexesOptions,
}

impl ListIndexes {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: ListIndexesOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            options,
        })
    }

    pub fn create_command(&self) -> Document {
        let mut command = doc! { "listIndexes": self.collection_name.as_str() };
        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }
        command
    }

    async fn execute_command(&self, server: &dyn Server) -> Result<IndexInfoStream> {
        let command = self.create_command();
        debug!("Listing indexes with command: {}", command);

        let err = match server
            .execute_command(&self.database_name, command, None)
            .await
        {
            Ok(cursor) => return Ok(cursor.map_ok(IndexInfo::new).boxed()),
            Err(err) => err,
        };

        match err.as_server_error() {
            Some(error) if error.is_namespace_or_database_not_found() => {
                info!(
                    "'{}.{}' does not exist; no indexes to list: {}",
                    self.database_name,
                    self.collection_name,
                    error.to_json_compact().unwrap_or_default()
                );
                Ok(stream::empty().boxed())
            }
            _ => Err(err),
        }
    }

    async fn execute_legacy(&self, server: &dyn Server) -> Result<IndexInfoStream> {
        let mut options = Document::new();
        if let Some(max_time_ms) = self.options.max_time_ms {
            options.insert("modifiers", doc! { "$maxTimeMS": max_time_ms });
        }
        let filter = doc! { "ns": namespace(&self.database_name, &self.collection_name) };

        let system_indexes = namespace(&self.database_name, "system.indexes");
        debug!("Listing indexes through '{}'", system_indexes);

        let cursor = server
            .execute_query(&system_indexes, Query::new(filter, options), None)
            .await?;
        Ok(cursor.map_ok(IndexInfo::new).boxed())
    }
}

#[async_trait]
impl Executable for ListIndexes {
    type Output = IndexInfoStream;

    async fn execute(&self, server: &dyn Server) -> Result<IndexInfoStream> {
        if server_supports_feature(server, WIRE_VERSION_FOR_LIST_COMMANDS) {
            self.execute_command(server).await
        } else {
            self.execute_legacy(server).await
        }
    }
}
