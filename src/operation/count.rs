//! Count operation

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::{ReadConcern, ReadPreference};
use tracing::debug;

use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_READ_CONCERN, command_reply,
};
use crate::connection::{Server, ServerInfo};
use crate::error::{OperationError, Result};
use crate::functions::{bson_as_i64, generate_index_name, read_concern_as_document};

/// Index hint, by name or by key pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    Name(String),
    Keys(Document),
}

impl Hint {
    /// Resolve the hint to an index name
    ///
    /// Key patterns are converted with the same rule used to name new indexes.
    pub fn to_index_name(&self) -> Result<String> {
        match self {
            Hint::Name(name) => Ok(name.clone()),
            Hint::Keys(keys) => generate_index_name(keys),
        }
    }
}

impl From<&str> for Hint {
    fn from(name: &str) -> Self {
        Hint::Name(name.to_string())
    }
}

impl From<Document> for Hint {
    fn from(keys: Document) -> Self {
        Hint::Keys(keys)
    }
}

/// Options for [`Count`]
#[derive(Debug, Clone, Default)]
pub struct CountOptions {
    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    pub hint: Option<Hint>,

    /// Maximum number of documents to count
    pub limit: Option<i64>,

    /// Server-side time limit in milliseconds
    pub max_time_ms: Option<i64>,

    /// Read concern (server 3.2+)
    pub read_concern: Option<ReadConcern>,

    pub read_preference: Option<ReadPreference>,

    /// Number of matching documents to skip before counting
    pub skip: Option<i64>,
}

/// Count the documents matching a filter
#[derive(Debug, Clone)]
pub struct Count {
    database_name: String,
    collection_name: String,
    filter: Document,
    hint: Option<String>,
    options: CountOptions,
}

impl Count {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: CountOptions,
    ) -> Result<Self> {
        let hint = options.hint.as_ref().map(Hint::to_index_name).transpose()?;

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            filter,
            hint,
            options,
        })
    }

    /// Build the `count` command for a server
    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! { "count": self.collection_name.as_str() };

        if !self.filter.is_empty() {
            command.insert("query", self.filter.clone());
        }

        if let Some(hint) = &self.hint {
            command.insert("hint", hint.as_str());
        }

        if let Some(limit) = self.options.limit {
            command.insert("limit", limit);
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }

        if let Some(skip) = self.options.skip {
            command.insert("skip", skip);
        }

        if let Some(read_concern) = &self.options.read_concern
            && info.supports(WIRE_VERSION_FOR_READ_CONCERN)
        {
            command.insert("readConcern", read_concern_as_document(read_concern)?);
        }

        if let Some(collation) = &self.options.collation
            && info.supports(WIRE_VERSION_FOR_COLLATION)
        {
            command.insert("collation", collation.clone());
        }

        Ok(command)
    }
}

#[async_trait]
impl Executable for Count {
    type Output = i64;

    async fn execute(&self, server: &dyn Server) -> Result<i64> {
        let command = self.create_command(&server.info())?;
        debug!(
            "Executing count on '{}.{}' with filter: {:?}",
            self.database_name, self.collection_name, self.filter
        );

        let cursor = server
            .execute_command(
                &self.database_name,
                command,
                self.options.read_preference.as_ref(),
            )
            .await?;
        let reply = command_reply(cursor, "count").await?;

        reply.get("n").and_then(bson_as_i64).ok_or_else(|| {
            OperationError::UnexpectedValue(
                "count command did not return a numeric \"n\" value".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockServer;

    #[tokio::test]
    async fn test_double_count_is_accepted() {
        let count =
            Count::new("db", "coll", doc! { "status": "A" }, CountOptions::default()).unwrap();
        let server = MockServer::modern().reply(vec![doc! { "n": 3.0, "ok": 1 }]);

        assert_eq!(count.execute(&server).await.unwrap(), 3);
        assert_eq!(
            server.last_command().command,
            doc! { "count": "coll", "query": { "status": "A" } }
        );
    }

    #[tokio::test]
    async fn test_missing_count_is_unexpected() {
        let count = Count::new("db", "coll", doc! {}, CountOptions::default()).unwrap();
        let server = MockServer::modern().reply(vec![doc! { "ok": 1 }]);
        assert!(count.execute(&server).await.unwrap_err().is_unexpected_value());

        let server = MockServer::modern().reply(vec![doc! { "n": "3", "ok": 1 }]);
        assert!(count.execute(&server).await.unwrap_err().is_unexpected_value());
    }

    #[test]
    fn test_hint_document_becomes_index_name() {
        let options = CountOptions {
            hint: Some(Hint::from(doc! { "status": 1, "created": -1 })),
            limit: Some(10),
            skip: Some(2),
            max_time_ms: Some(500),
            read_concern: Some(ReadConcern::majority()),
            ..Default::default()
        };
        let count = Count::new("db", "coll", doc! {}, options).unwrap();

        let command = count.create_command(&ServerInfo::new(0, 4)).unwrap();
        assert_eq!(command.get_str("hint").unwrap(), "status_1_created_-1");
        assert_eq!(command.get_i64("limit").unwrap(), 10);
        assert_eq!(command.get_i64("skip").unwrap(), 2);
        assert!(command.contains_key("readConcern"));

        let command = count.create_command(&ServerInfo::new(0, 3)).unwrap();
        assert!(!command.contains_key("readConcern"));
    }

    #[test]
    fn test_invalid_hint_document() {
        let options = CountOptions {
            hint: Some(Hint::Keys(doc! { "a": true })),
            ..Default::default()
        };
        assert!(Count::new("db", "coll", doc! {}, options).is_err());
    }
}
