//! Aggregate operation
//!
//! Runs an aggregation pipeline through the `aggregate` command. Servers
//! that predate aggregate cursors return the results inline in a `result`
//! array, which is exposed as an in-memory cursor.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::options::{ReadConcern, ReadPreference};
use tracing::{debug, warn};

use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_CURSOR,
    WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION, WIRE_VERSION_FOR_READ_CONCERN, command_reply,
};
use crate::connection::{Cursor, Server, ServerInfo, TypeMap};
use crate::error::{OperationError, Result};
use crate::functions::{
    is_last_pipeline_operator_out, is_majority_read_concern, read_concern_as_document,
    server_supports_feature,
};

/// Options for [`Aggregate`]
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Allow stages to write temporary files
    pub allow_disk_use: Option<bool>,

    /// Documents per cursor batch; requires a cursor
    pub batch_size: Option<i32>,

    /// Skip document validation for `$out` (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    /// Server-side time limit in milliseconds
    pub max_time_ms: Option<i64>,

    /// Read concern (server 3.2+)
    pub read_concern: Option<ReadConcern>,

    pub read_preference: Option<ReadPreference>,

    /// Type map applied to the returned cursor; requires a cursor
    pub type_map: Option<TypeMap>,

    /// Request a server-side cursor (default: true)
    pub use_cursor: Option<bool>,
}

/// Aggregation pipeline against a collection
#[derive(Debug, Clone)]
pub struct Aggregate {
    database_name: String,
    collection_name: String,
    pipeline: Vec<Document>,
    options: AggregateOptions,
    use_cursor: bool,
}

impl Aggregate {
    /// Validate an aggregation
    ///
    /// A pipeline ending in `$out` always runs on the primary and never with
    /// a majority read concern.
    ///
    /// # Arguments
    /// * `database_name` - Database name
    /// * `collection_name` - Collection name
    /// * `pipeline` - Non-empty list of stages
    /// * `options` - Aggregate options
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        pipeline: Vec<Document>,
        mut options: AggregateOptions,
    ) -> Result<Self> {
        if pipeline.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$pipeline is empty".to_string(),
            ));
        }

        let use_cursor = options.use_cursor.unwrap_or(true);

        if options.batch_size.is_some() && !use_cursor {
            return Err(OperationError::InvalidArgument(
                "\"batchSize\" option should not be used if \"useCursor\" is false".to_string(),
            ));
        }

        if options.type_map.is_some() && !use_cursor {
            return Err(OperationError::InvalidArgument(
                "\"typeMap\" option should not be used if \"useCursor\" is false".to_string(),
            ));
        }

        if is_last_pipeline_operator_out(&pipeline) {
            if options
                .read_concern
                .as_ref()
                .is_some_and(is_majority_read_concern)
            {
                debug!("Dropping majority read concern for pipeline ending in $out");
                options.read_concern = None;
            }
            options.read_preference = Some(ReadPreference::Primary);
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            pipeline,
            options,
            use_cursor,
        })
    }

    pub fn pipeline(&self) -> &[Document] {
        &self.pipeline
    }

    /// Read preference the command is sent with
    pub fn read_preference(&self) -> Option<&ReadPreference> {
        self.options.read_preference.as_ref()
    }

    /// Build the `aggregate` command for a server
    ///
    /// Options the server cannot handle are left out.
    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! {
            "aggregate": self.collection_name.as_str(),
            "pipeline": self.pipeline.clone(),
        };

        if let Some(allow_disk_use) = self.options.allow_disk_use {
            command.insert("allowDiskUse", allow_disk_use);
        }

        if info.supports(WIRE_VERSION_FOR_CURSOR) && self.use_cursor {
            let cursor = match self.options.batch_size {
                Some(batch_size) => doc! { "batchSize": batch_size },
                None => Document::new(),
            };
            command.insert("cursor", cursor);
        }

        if let Some(bypass) = self.options.bypass_document_validation {
            if info.supports(WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION) {
                command.insert("bypassDocumentValidation", bypass);
            } else {
                warn!("Server does not support bypassDocumentValidation; option ignored");
            }
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }

        if let Some(read_concern) = &self.options.read_concern
            && info.supports(WIRE_VERSION_FOR_READ_CONCERN)
        {
            command.insert("readConcern", read_concern_as_document(read_concern)?);
        }

        if let Some(collation) = &self.options.collation {
            if info.supports(WIRE_VERSION_FOR_COLLATION) {
                command.insert("collation", collation.clone());
            } else {
                warn!("Server does not support collation; option ignored");
            }
        }

        Ok(command)
    }
}

#[async_trait]
impl Executable for Aggregate {
    type Output = Cursor;

    async fn execute(&self, server: &dyn Server) -> Result<Cursor> {
        let is_cursor_supported = server_supports_feature(server, WIRE_VERSION_FOR_CURSOR);
        let command = self.create_command(&server.info())?;

        debug!(
            "Executing aggregate on '{}.{}' with {} pipeline stages",
            self.database_name,
            self.collection_name,
            self.pipeline.len()
        );

        let mut cursor = server
            .execute_command(&self.database_name, command, self.read_preference())
            .await?;

        if is_cursor_supported && self.use_cursor {
            if let Some(type_map) = &self.options.type_map {
                cursor.set_type_map(type_map.clone());
            }
            return Ok(cursor);
        }

        let reply = command_reply(cursor, "aggregate").await?;
        let documents = match reply.get("result") {
            Some(Bson::Array(result)) => result
                .iter()
                .map(|value| match value {
                    Bson::Document(document) => Ok(document.clone()),
                    _ => Err(OperationError::UnexpectedValue(
                        "aggregate command returned a non-document in its \"result\" array"
                            .to_string(),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(OperationError::UnexpectedValue(
                    "aggregate command did not return a \"result\" array".to_string(),
                ));
            }
        };

        let mut cursor = Cursor::from_documents(documents);
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }
        Ok(cursor)
    }
}
