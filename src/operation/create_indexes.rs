//! CreateIndexes operation
//!
//! Servers that support the `createIndexes` command get one command holding
//! every specification. Older servers get the specifications inserted into
//! `<db>.system.indexes` with an acknowledged write concern.

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::{Acknowledgment, WriteConcern};
use tracing::{debug, info};

use super::{
    Executable, WIRE_VERSION_FOR_CURSOR, WIRE_VERSION_FOR_WRITE_CONCERN, command_reply, namespace,
};
use crate::connection::{Server, ServerInfo, WriteBatch};
use crate::error::{OperationError, Result};
use crate::functions::{server_supports_feature, write_concern_as_document};
use crate::model::IndexInput;

/// Options for [`CreateIndexes`]
#[derive(Debug, Clone, Default)]
pub struct CreateIndexesOptions {
    /// Server-side time limit in milliseconds
    pub max_time_ms: Option<i64>,

    /// Write concern (server 3.4+)
    pub write_concern: Option<WriteConcern>,
}

/// Create one or more indexes on a collection
#[derive(Debug, Clone)]
pub struct CreateIndexes {
    database_name: String,
    collection_name: String,
    indexes: Vec<IndexInput>,
    options: CreateIndexesOptions,
}

impl CreateIndexes {
    /// Validate index specifications
    ///
    /// # Arguments
    /// * `indexes` - Non-empty list of documents, each with a `key` document
    ///   and optional index options
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        indexes: Vec<Document>,
        options: CreateIndexesOptions,
    ) -> Result<Self> {
        let database_name = database_name.into();
        let collection_name = collection_name.into();

        if indexes.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$indexes is empty".to_string(),
            ));
        }

        let namespace = namespace(&database_name, &collection_name);
        let indexes = indexes
            .into_iter()
            .map(|spec| IndexInput::new(spec, &namespace))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            database_name,
            collection_name,
            indexes,
            options,
        })
    }

    pub fn indexes(&self) -> &[IndexInput] {
        &self.indexes
    }

    fn index_names(&self) -> Vec<String> {
        self.indexes.iter().map(|index| index.name().to_string()).collect()
    }

    /// Build the `createIndexes` command for a server
    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let indexes: Vec<Document> = self
            .indexes
            .iter()
            .map(|index| index.as_document().clone())
            .collect();

        let mut command = doc! {
            "createIndexes": self.collection_name.as_str(),
            "indexes": indexes,
        };

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }

        if let Some(write_concern) = &self.options.write_concern
            && info.supports(WIRE_VERSION_FOR_WRITE_CONCERN)
        {
            command.insert("writeConcern", write_concern_as_document(write_concern)?);
        }

        Ok(command)
    }

    async fn execute_command(&self, server: &dyn Server) -> Result<()> {
        let command = self.create_command(&server.info())?;
        debug!("Creating indexes with command: {}", command);

        let cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        command_reply(cursor, "createIndexes").await?;
        Ok(())
    }

    async fn execute_legacy(&self, server: &dyn Server) -> Result<()> {
        let mut batch = WriteBatch::new(true);
        for index in &self.indexes {
            batch.insert(index.as_document().clone());
        }

        let namespace = namespace(&self.database_name, "system.indexes");
        debug!("Creating {} indexes through '{}'", batch.len(), namespace);

        let write_concern = WriteConcern::builder().w(Acknowledgment::Nodes(1)).build();
        server
            .execute_bulk_write(&namespace, batch, Some(&write_concern))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Executable for CreateIndexes {
    type Output = Vec<String>;

    async fn execute(&self, server: &dyn Server) -> Result<Vec<String>> {
        if server_supports_feature(server, WIRE_VERSION_FOR_CURSOR) {
            self.execute_command(server).await?;
        } else {
            self.execute_legacy(server).await?;
        }

        let names = self.index_names();
        info!(
            "Created indexes {:?} on '{}.{}'",
            names, self.database_name, self.collection_name
        );
        Ok(names)
    }
}
