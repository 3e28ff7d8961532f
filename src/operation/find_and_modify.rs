//! FindAndModify operations for atomic find-then-mutate semantics
//!
//! This module contains:
//! - findAndModify, the shared primitive
//! - findOneAndDelete
//! - findOneAndReplace
//! - findOneAndUpdate

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::options::WriteConcern;
use tracing::debug;

use super::update::{require_operator, require_replacement};
use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION,
    WIRE_VERSION_FOR_FIND_AND_MODIFY_WRITE_CONCERN, command_reply,
};
use crate::connection::{Server, ServerInfo};
use crate::error::{OperationError, Result};
use crate::functions::write_concern_as_document;

/// Options for [`FindAndModify`]
#[derive(Debug, Clone, Default)]
pub struct FindAndModifyOptions {
    /// Skip document validation (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    /// Projection applied to the returned document
    pub fields: Option<Document>,

    /// Server-side time limit in milliseconds
    pub max_time_ms: Option<i64>,

    /// Return the modified document instead of the original (default: false)
    pub new: Option<bool>,

    /// Filter selecting the document
    pub query: Option<Document>,

    /// Remove the selected document (default: false)
    pub remove: Option<bool>,

    /// Sort order deciding which document is selected
    pub sort: Option<Document>,

    /// Update or replacement document
    pub update: Option<Document>,

    /// Insert a document when nothing matches (default: false)
    pub upsert: Option<bool>,

    /// Write concern (server 3.2+)
    pub write_concern: Option<WriteConcern>,
}

/// Raw `findAndModify` command
#[derive(Debug, Clone)]
pub struct FindAndModify {
    database_name: String,
    collection_name: String,
    new: bool,
    remove: bool,
    upsert: bool,
    options: FindAndModifyOptions,
}

impl FindAndModify {
    /// Validate a findAndModify
    ///
    /// Exactly one of `remove = true` and an `update` document must be given.
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: FindAndModifyOptions,
    ) -> Result<Self> {
        let new = options.new.unwrap_or(false);
        let remove = options.remove.unwrap_or(false);
        let upsert = options.upsert.unwrap_or(false);

        if remove == options.update.is_some() {
            return Err(OperationError::InvalidArgument(
                concat!(
                    "The \"remove\" option must be true or an \"update\" document must be ",
                    "specified, but not both",
                )
                .to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            new,
            remove,
            upsert,
            options,
        })
    }

    /// Build the `findAndModify` command for a server
    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! { "findAndModify": self.collection_name.as_str() };

        if self.remove {
            command.insert("remove", true);
        } else {
            command.insert("new", self.new);
            command.insert("upsert", self.upsert);
        }

        let documents = [
            ("fields", &self.options.fields),
            ("query", &self.options.query),
            ("sort", &self.options.sort),
            ("update", &self.options.update),
        ];
        for (key, value) in documents {
            if let Some(value) = value {
                command.insert(key, value.clone());
            }
        }

        if let Some(max_time_ms) = self.options.max_time_ms {
            command.insert("maxTimeMS", max_time_ms);
        }

        if let Some(bypass) = self.options.bypass_document_validation
            && info.supports(WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION)
        {
            command.insert("bypassDocumentValidation", bypass);
        }

        if let Some(write_concern) = &self.options.write_concern
            && info.supports(WIRE_VERSION_FOR_FIND_AND_MODIFY_WRITE_CONCERN)
        {
            command.insert("writeConcern", write_concern_as_document(write_concern)?);
        }

        if let Some(collation) = &self.options.collation
            && info.supports(WIRE_VERSION_FOR_COLLATION)
        {
            command.insert("collation", collation.clone());
        }

        Ok(command)
    }

    /// Pick the returned document out of a command reply
    fn value_from_reply(&self, reply: &Document) -> Result<Option<Document>> {
        let value = match reply.get("value") {
            None | Some(Bson::Null) => return Ok(None),
            Some(value) => value,
        };

        // Servers before 3.0 return an empty document instead of null when an
        // upsert inserted and the original document was requested.
        if self.upsert && !self.new {
            let updated_existing = reply
                .get_document("lastErrorObject")
                .ok()
                .and_then(|last_error| last_error.get_bool("updatedExisting").ok());
            if updated_existing == Some(false) {
                return Ok(None);
            }
        }

        match value {
            Bson::Document(document) => Ok(Some(document.clone())),
            _ => Err(OperationError::UnexpectedValue(
                "findAndModify command did not return a \"value\" document".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Executable for FindAndModify {
    type Output = Option<Document>;

    async fn execute(&self, server: &dyn Server) -> Result<Option<Document>> {
        let command = self.create_command(&server.info())?;
        debug!(
            "Executing findAndModify on '{}.{}' (remove: {}, new: {})",
            self.database_name, self.collection_name, self.remove, self.new
        );

        let cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        let reply = command_reply(cursor, "findAndModify").await?;

        self.value_from_reply(&reply)
    }
}

/// Which version of the document findOneAndReplace/Update returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    /// The document as it was before the modification
    #[default]
    Before,

    /// The document as it is after the modification
    After,
}

/// Options for [`FindOneAndDelete`]
#[derive(Debug, Clone, Default)]
pub struct FindOneAndDeleteOptions {
    pub collation: Option<Document>,
    pub max_time_ms: Option<i64>,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub write_concern: Option<WriteConcern>,
}

/// Delete one document and return it
#[derive(Debug, Clone)]
pub struct FindOneAndDelete {
    find_and_modify: FindAndModify,
}

impl FindOneAndDelete {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: FindOneAndDeleteOptions,
    ) -> Result<Self> {
        let options = FindAndModifyOptions {
            collation: options.collation,
            fields: options.projection,
            max_time_ms: options.max_time_ms,
            query: Some(filter),
            remove: Some(true),
            sort: options.sort,
            write_concern: options.write_concern,
            ..Default::default()
        };

        Ok(Self {
            find_and_modify: FindAndModify::new(database_name, collection_name, options)?,
        })
    }
}

#[async_trait]
impl Executable for FindOneAndDelete {
    type Output = Option<Document>;

    async fn execute(&self, server: &dyn Server) -> Result<Option<Document>> {
        self.find_and_modify.execute(server).await
    }
}

/// Options for [`FindOneAndReplace`]
#[derive(Debug, Clone, Default)]
pub struct FindOneAndReplaceOptions {
    pub bypass_document_validation: Option<bool>,
    pub collation: Option<Document>,
    pub max_time_ms: Option<i64>,
    pub projection: Option<Document>,
    pub return_document: Option<ReturnDocument>,
    pub sort: Option<Document>,
    pub upsert: Option<bool>,
    pub write_concern: Option<WriteConcern>,
}

/// Replace one document and return it
#[derive(Debug, Clone)]
pub struct FindOneAndReplace {
    find_and_modify: FindAndModify,
}

impl FindOneAndReplace {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        replacement: Document,
        options: FindOneAndReplaceOptions,
    ) -> Result<Self> {
        require_replacement(&replacement)?;

        let options = FindAndModifyOptions {
            bypass_document_validation: options.bypass_document_validation,
            collation: options.collation,
            fields: options.projection,
            max_time_ms: options.max_time_ms,
            new: Some(options.return_document.unwrap_or_default() == ReturnDocument::After),
            query: Some(filter),
            sort: options.sort,
            update: Some(replacement),
            upsert: options.upsert,
            write_concern: options.write_concern,
            ..Default::default()
        };

        Ok(Self {
            find_and_modify: FindAndModify::new(database_name, collection_name, options)?,
        })
    }
}

#[async_trait]
impl Executable for FindOneAndReplace {
    type Output = Option<Document>;

    async fn execute(&self, server: &dyn Server) -> Result<Option<Document>> {
        self.find_and_modify.execute(server).await
    }
}

/// Options for [`FindOneAndUpdate`]
#[derive(Debug, Clone, Default)]
pub struct FindOneAndUpdateOptions {
    pub bypass_document_validation: Option<bool>,
    pub collation: Option<Document>,
    pub max_time_ms: Option<i64>,
    pub projection: Option<Document>,
    pub return_document: Option<ReturnDocument>,
    pub sort: Option<Document>,
    pub upsert: Option<bool>,
    pub write_concern: Option<WriteConcern>,
}

/// Update one document and return it
#[derive(Debug, Clone)]
pub struct FindOneAndUpdate {
    find_and_modify: FindAndModify,
}

impl FindOneAndUpdate {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Self> {
        require_operator(&update)?;

        let options = FindAndModifyOptions {
            bypass_document_validation: options.bypass_document_validation,
            collation: options.collation,
            fields: options.projection,
            max_time_ms: options.max_time_ms,
            new: Some(options.return_document.unwrap_or_default() == ReturnDocument::After),
            query: Some(filter),
            sort: options.sort,
            update: Some(update),
            upsert: options.upsert,
            write_concern: options.write_concern,
            ..Default::default()
        };

        Ok(Self {
            find_and_modify: FindAndModify::new(database_name, collection_name, options)?,
        })
    }
}

#[async_trait]
impl Executable for FindOneAndUpdate {
    type Output = Option<Document>;

    async fn execute(&self, server: &dyn Server) -> Result<Option<Document>> {
        self.find_and_modify.execute(server).await
    }
}
