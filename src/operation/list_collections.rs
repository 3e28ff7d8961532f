//! ListCollections operation
//!
//! Uses the `listCollections` command when available. Older servers are
//! queried through `<db>.system.namespaces`, whose entries carry the full
//! namespace and include index namespaces (names containing `$`).

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use super::{Executable, WIRE_VERSION_FOR_LIST_COMMANDS, namespace};
use crate::connection::{Cursor, Query, Server};
use crate::error::{OperationError, Result};
use crate::functions::server_supports_feature;
use crate::model::CollectionInfo;

/// Stream of collection descriptions
pub type CollectionInfoStream = BoxStream<'static, Result<CollectionInfo>>;

/// Options for [`ListCollections`]
#[derive(Debug, Clone, Default)]
pub struct ListCollectionsOptions {
    /// Filter applied to collection descriptions
    pub filter: Option<Document>,

    pub max_time_ms: Option<i64>,
}

/// List the collections of a database
#[derive(Debug, Clone)]
pub struct ListCollections {
    database_name: String,
    options: ListCollectionsOptions,
}

impl ListCollections {
    pub fn new(database_name: impl Into<String>, options: ListCollectionsOptions) -> Result<Self> {
        Ok(Self {
            database_name: database_name.into(),
            options,
        })
    }

    pub fn create_command(&self) -> Document {
        let mut command = doc! { "listCollections": 1 };

        if let Some(filter) = &self.options.filter
            && !filter.is_empty()
        {
            command.insert("filter", filter.clone());
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }

        command
    }

    /// Build the `system.namespaces` query for legacy servers
    pub fn create_legacy_query(&self) -> Query {
        let mut filter = self.options.filter.clone().unwrap_or_default();
        if let Ok(name) = filter.get_str("name") {
            let full_name = namespace(&self.database_name, name);
            filter.insert("name", full_name);
        }

        let mut options = Document::new();
        if let Some(max_time_ms) = self.options.max_time_ms {
            options.insert("modifiers", doc! { "$maxTimeMS": max_time_ms });
        }

        Query::new(filter, options)
    }

    async fn execute_command(&self, server: &dyn Server) -> Result<Cursor> {
        let command = self.create_command();
        debug!("Listing collections with command: {}", command);
        server
            .execute_command(&self.database_name, command, None)
            .await
    }

    /// Query `system.namespaces` on servers without `listCollections`
    ///
    /// A `name` criterion in the filter must be a string here, since it is
    /// rewritten into the full namespace.
    async fn execute_legacy(&self, server: &dyn Server) -> Result<CollectionInfoStream> {
        if let Some(filter) = &self.options.filter
            && let Some(name) = filter.get("name")
            && !matches!(name, Bson::String(_))
        {
            return Err(OperationError::invalid_type("filter name", name, "string"));
        }

        let query = self.create_legacy_query();
        let namespace = namespace(&self.database_name, "system.namespaces");
        debug!("Listing collections through '{}'", namespace);

        let cursor = server.execute_query(&namespace, query, None).await?;
        let prefix = format!("{}.", self.database_name);

        let stream = cursor.try_filter_map(move |mut info| {
            let name = info.get_str("name").ok().map(str::to_string);
            let result = match name {
                Some(name) if name.contains('$') => None,
                Some(name) => {
                    let short = name.strip_prefix(&prefix).unwrap_or(&name).to_string();
                    info.insert("name", short);
                    Some(CollectionInfo::new(info))
                }
                None => Some(CollectionInfo::new(info)),
            };
            futures::future::ready(Ok(result))
        });

        Ok(stream.boxed())
    }
}

#[async_trait]
impl Executable for ListCollections {
    type Output = CollectionInfoStream;

    async fn execute(&self, server: &dyn Server) -> Result<CollectionInfoStream> {
        if server_supports_feature(server, WIRE_VERSION_FOR_LIST_COMMANDS) {
            let cursor = self.execute_command(server).await?;
            Ok(cursor.map_ok(CollectionInfo::new).boxed())
        } else {
            self.execute_legacy(server).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockServer, assert_invalid_argument};

    #[tokio::test]
    async fn test_regex_name_filter() {
        let options = ListCollectionsOptions {
            filter: Some(doc! { "name": { "$regex": "^user" } }),
            ..Default::default()
        };
        let op = ListCollections::new("db", options).unwrap();

        let server = MockServer::modern().reply(vec![doc! { "name": "users" }]);
        let infos: Vec<CollectionInfo> =
            op.execute(&server).await.unwrap().try_collect().await.unwrap();
        assert_eq!(infos[0].name(), Some("users"));
        assert_eq!(
            server.last_command().command,
            doc! { "listCollections": 1, "filter": { "name": { "$regex": "^user" } } }
        );

        let legacy = MockServer::new(2);
        assert_invalid_argument(op.execute(&legacy).await.map(|_| ()));
        assert!(legacy.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_command_path() {
        let options = ListCollectionsOptions {
            filter: Some(doc! { "options.capped": true }),
            max_time_ms: Some(1000),
        };
        let op = ListCollections::new("db", options).unwrap();
        let server = MockServer::modern().reply(vec![
            doc! { "name": "log", "options": { "capped": true, "size": 1024 } },
        ]);

        let infos: Vec<CollectionInfo> =
            op.execute(&server).await.unwrap().try_collect().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name(), Some("log"));
        assert!(infos[0].is_capped());

        let expected = doc! {
            "listCollections": 1,
            "filter": { "options.capped": true },
            "maxTimeMS": 1000_i64,
        };
        assert_eq!(server.last_command().command, expected);
    }

    #[tokio::test]
    async fn test_legacy_path_rewrites_names() {
        let options = ListCollectionsOptions {
            filter: Some(doc! { "name": "users" }),
            max_time_ms: Some(50),
        };
        let op = ListCollections::new("app", options).unwrap();
        let server = MockServer::new(2).reply(vec![
            doc! { "name": "app.users" },
            doc! { "name": "app.users.$_id_" },
        ]);

        let infos: Vec<CollectionInfo> =
            op.execute(&server).await.unwrap().try_collect().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name(), Some("users"));

        let recorded = server.last_query();
        assert_eq!(recorded.namespace, "app.system.namespaces");
        assert_eq!(recorded.query.filter, doc! { "name": "app.users" });
        assert_eq!(
            recorded.query.options,
            doc! { "modifiers": { "$maxTimeMS": 50_i64 } }
        );
    }
}
