//! Find and FindOne operations
//!
//! Finds are sent as queries. Structured options are folded into the query
//! option document, and the legacy `modifiers` document is merged with the
//! structured `comment`, `max_time_ms` and `sort` options.

use async_trait::async_trait;
use bson::{Bson, Document};
use mongodb::options::{ReadConcern, ReadPreference};
use tracing::debug;

use super::{Executable, WIRE_VERSION_FOR_READ_CONCERN, namespace};
use crate::connection::{Cursor, Query, Server, ServerInfo, TypeMap};
use crate::error::Result;
use crate::functions::read_concern_as_document;

/// Cursor behaviour once the last result has been returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorType {
    /// Cursor closes after the last result
    #[default]
    NonTailable,

    /// Cursor stays open for new documents on capped collections
    Tailable,

    /// Tailable cursor that blocks briefly waiting for new documents
    TailableAwait,
}

/// Options for [`Find`] and [`FindOne`]
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Return partial results when some shards are unavailable
    pub allow_partial_results: Option<bool>,

    pub batch_size: Option<i32>,

    /// Comment attached to the query; overrides `modifiers.$comment`
    pub comment: Option<String>,

    pub cursor_type: Option<CursorType>,

    pub limit: Option<i64>,

    /// Server-side time limit in milliseconds; overrides `modifiers.$maxTimeMS`
    pub max_time_ms: Option<i64>,

    /// Legacy query modifiers such as `$comment`, `$maxTimeMS` and `$orderby`
    pub modifiers: Option<Document>,

    pub no_cursor_timeout: Option<bool>,

    pub oplog_replay: Option<bool>,

    pub projection: Option<Document>,

    /// Read concern (server 3.2+)
    pub read_concern: Option<ReadConcern>,

    pub read_preference: Option<ReadPreference>,

    pub skip: Option<i64>,

    /// Sort order; overrides `modifiers.$orderby`
    pub sort: Option<Document>,

    /// Type map applied to the returned cursor
    pub type_map: Option<TypeMap>,
}

/// Query documents in a collection
#[derive(Debug, Clone)]
pub struct Find {
    database_name: String,
    collection_name: String,
    filter: Document,
    options: FindOptions,
}

impl Find {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: FindOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            filter,
            options,
        })
    }

    /// Merged modifiers; structured options win over their modifier spelling
    fn modifiers(&self) -> Document {
        let mut modifiers = self.options.modifiers.clone().unwrap_or_default();

        if let Some(comment) = &self.options.comment {
            modifiers.insert("$comment", comment.as_str());
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            modifiers.insert("$maxTimeMS", max_time_ms);
        }

        if let Some(sort) = &self.options.sort {
            modifiers.insert("$orderby", sort.clone());
        }

        modifiers
    }

    /// Build the query sent to a server
    pub fn create_query(&self, info: &ServerInfo) -> Result<Query> {
        let mut options = Document::new();

        let flags = [
            ("allowPartialResults", self.options.allow_partial_results),
            ("noCursorTimeout", self.options.no_cursor_timeout),
            ("oplogReplay", self.options.oplog_replay),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                options.insert(key, value);
            }
        }

        if let Some(batch_size) = self.options.batch_size {
            options.insert("batchSize", batch_size);
        }

        if let Some(limit) = self.options.limit {
            options.insert("limit", limit);
        }

        if let Some(skip) = self.options.skip {
            options.insert("skip", skip);
        }

        if let Some(projection) = &self.options.projection {
            options.insert("projection", projection.clone());
        }

        match self.options.cursor_type.unwrap_or_default() {
            CursorType::NonTailable => {}
            CursorType::Tailable => {
                options.insert("tailable", true);
            }
            CursorType::TailableAwait => {
                options.insert("tailable", true);
                options.insert("awaitData", true);
            }
        }

        if let Some(read_concern) = &self.options.read_concern
            && info.supports(WIRE_VERSION_FOR_READ_CONCERN)
        {
            options.insert("readConcern", read_concern_as_document(read_concern)?);
        }

        let modifiers = self.modifiers();
        if !modifiers.is_empty() {
            options.insert("modifiers", Bson::Document(modifiers));
        }

        Ok(Query::new(self.filter.clone(), options))
    }
}

#[async_trait]
impl Executable for Find {
    type Output = Cursor;

    async fn execute(&self, server: &dyn Server) -> Result<Cursor> {
        let query = self.create_query(&server.info())?;
        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!("Executing find on '{}' with filter {}", namespace, query.filter);

        let mut cursor = server
            .execute_query(&namespace, query, self.options.read_preference.as_ref())
            .await?;

        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }

        Ok(cursor)
    }
}

/// Query a single document
#[derive(Debug, Clone)]
pub struct FindOne {
    find: Find,
}

impl FindOne {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: FindOptions,
    ) -> Result<Self> {
        let options = FindOptions {
            limit: Some(1),
            ..options
        };

        Ok(Self {
            find: Find::new(database_name, collection_name, filter, options)?,
        })
    }
}

#[async_trait]
impl Executable for FindOne {
    type Output = Option<Document>;

    async fn execute(&self, server: &dyn Server) -> Result<Option<Document>> {
        self.find.execute(server).await?.first().await
    }
}
