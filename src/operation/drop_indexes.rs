//! DropIndexes operation

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_WRITE_CONCERN, command_reply};
use crate::connection::{Server, ServerInfo, TypeMap};
use crate::error::{OperationError, Result};
use crate::functions::write_concern_as_document;

/// Options for [`DropIndexes`]
#[derive(Debug, Clone, Default)]
pub struct DropIndexesOptions {
    pub max_time_ms: Option<i64>,

    /// Type map applied to the command reply
    pub type_map: Option<TypeMap>,

    /// Write concern (server 3.4+)
    pub write_concern: Option<WriteConcern>,
}

/// Drop one index by name, or every index with `"*"`
#[derive(Debug, Clone)]
pub struct DropIndexes {
    database_name: String,
    collection_name: String,
    index_name: String,
    options: DropIndexesOptions,
}

impl DropIndexes {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        index_name: impl Into<String>,
        options: DropIndexesOptions,
    ) -> Result<Self> {
        let index_name = index_name.into();
        if index_name.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$indexName cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            index_name,
            options,
        })
    }

    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! {
            "dropIndexes": self.collection_name.as_str(),
            "index": self.index_name.as_str(),
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
}

#[async_trait]
impl Executable for DropIndexes {
    type Output = Document;

    async fn execute(&self, server: &dyn Server) -> Result<Document> {
        let command = self.create_command(&server.info())?;
        debug!(
            "Dropping index '{}' on '{}.{}'",
            self.index_name, self.database_name, self.collection_name
        );

        let mut cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }

        let reply = command_reply(cursor, "dropIndexes").await?;
        info!("Dropped index '{}'", self.index_name);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockServer, assert_invalid_argument};

    #[test]
    fn test_empty_name_rejected() {
        assert_invalid_argument(DropIndexes::new("db", "c", "", DropIndexesOptions::default()));
    }

    #[tokio::test]
    async fn test_drop_all_indexes() {
        let op = DropIndexes::new("db", "c", "*", DropIndexesOptions::default()).unwrap();
        let server = MockServer::modern().reply(vec![doc! { "nIndexesWas": 3, "ok": 1 }]);

        let reply = op.execute(&server).await.unwrap();
        assert_eq!(reply.get_i32("nIndexesWas").unwrap(), 3);

        let recorded = server.last_command();
        assert_eq!(recorded.database, "db");
        assert_eq!(recorded.command, doc! { "dropIndexes": "c", "index": "*" });
    }

    #[tokio::test]
    async fn test_failure_reply_is_an_error() {
        let op = DropIndexes::new("db", "c", "missing_1", DropIndexesOptions::default()).unwrap();
        let server = MockServer::modern().reply(vec![doc! {
            "ok": 0,
            "errmsg": "index not found with name [missing_1]",
            "code": 27,
        }]);

        let err = op.execute(&server).await.unwrap_err();
        let error = err.server_error().unwrap();
        assert_eq!(error.code, 27);
        assert_eq!(error.code_name.as_deref(), Some("IndexNotFound"));
    }
}
