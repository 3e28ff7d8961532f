//! Distinct operation

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::options::{ReadConcern, ReadPreference};
use tracing::debug;

use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_READ_CONCERN, command_reply,
};
use crate::connection::{Server, ServerInfo};
use crate::error::{OperationError, Result};
use crate::functions::read_concern_as_document;

/// Options for [`Distinct`]
#[derive(Debug, Clone, Default)]
pub struct DistinctOptions {
    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    /// Server-side time limit in milliseconds
    pub max_time_ms: Option<i64>,

    /// Read concern (server 3.2+)
    pub read_concern: Option<ReadConcern>,

    pub read_preference: Option<ReadPreference>,
}

/// Distinct values of a field across matching documents
#[derive(Debug, Clone)]
pub struct Distinct {
    database_name: String,
    collection_name: String,
    field_name: String,
    filter: Document,
    options: DistinctOptions,
}

impl Distinct {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        field_name: impl Into<String>,
        filter: Document,
        options: DistinctOptions,
    ) -> Result<Self> {
        let field_name = field_name.into();
        if field_name.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$fieldName is empty".to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            field_name,
            filter,
            options,
        })
    }

    /// Build the `distinct` command for a server
    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! {
            "distinct": self.collection_name.as_str(),
            "key": self.field_name.as_str(),
        };

        if !self.filter.is_empty() {
            command.insert("query", self.filter.clone());
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
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
impl Executable for Distinct {
    type Output = Vec<Bson>;

    async fn execute(&self, server: &dyn Server) -> Result<Vec<Bson>> {
        let command = self.create_command(&server.info())?;
        debug!(
            "Executing distinct '{}' on '{}.{}'",
            self.field_name, self.database_name, self.collection_name
        );

        let cursor = server
            .execute_command(
                &self.database_name,
                command,
                self.options.read_preference.as_ref(),
            )
            .await?;
        let reply = command_reply(cursor, "distinct").await?;

        match reply.get("values") {
            Some(Bson::Array(values)) => Ok(values.clone()),
            _ => Err(OperationError::UnexpectedValue(
                "distinct command did not return a \"values\" array".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockServer, assert_invalid_argument};

    #[tokio::test]
    async fn test_distinct_values() {
        let options = DistinctOptions {
            read_preference: Some(ReadPreference::Secondary {
                options: Default::default(),
            }),
            ..Default::default()
        };
        let distinct = Distinct::new("db", "coll", "tag", doc! { "x": 1 }, options).unwrap();
        let server = MockServer::modern().reply(vec![doc! { "values": ["a", "b"], "ok": 1 }]);

        let values = distinct.execute(&server).await.unwrap();
        assert_eq!(values, vec![Bson::from("a"), Bson::from("b")]);

        let recorded = server.last_command();
        assert_eq!(
            recorded.command,
            doc! { "distinct": "coll", "key": "tag", "query": { "x": 1 } }
        );
        assert!(matches!(
            recorded.read_preference,
            Some(ReadPreference::Secondary { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_values_is_unexpected() {
        let distinct =
            Distinct::new("db", "coll", "tag", doc! {}, DistinctOptions::default()).unwrap();
        let server = MockServer::modern().reply(vec![doc! { "ok": 1 }]);
        assert!(distinct.execute(&server).await.unwrap_err().is_unexpected_value());
    }

    #[test]
    fn test_empty_field_name() {
        assert_invalid_argument(Distinct::new(
            "db",
            "coll",
            "",
            doc! {},
            DistinctOptions::default(),
        ));
    }
}
