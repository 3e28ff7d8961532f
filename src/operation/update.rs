//! Update operations
//!
//! [`Update`] is the shared primitive. [`UpdateOne`], [`UpdateMany`] and
//! [`ReplaceOne`] fix the `multi` flag and check that the payload is an
//! operator document (updates) or a plain document (replacements).

use async_trait::async_trait;
use bson::Document;
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION,
    namespace,
};
use crate::connection::{Server, WriteBatch};
use crate::error::{OperationError, Result};
use crate::functions::{is_first_key_operator, server_supports_feature};
use crate::result::UpdateResult;

/// Options for update operations
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Skip document validation (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    /// Update every matching document; ignored by the one/replace variants
    pub multi: Option<bool>,

    /// Insert a document when nothing matches
    pub upsert: Option<bool>,

    pub write_concern: Option<WriteConcern>,
}

/// Update or replace documents matching a filter
#[derive(Debug, Clone)]
pub struct Update {
    database_name: String,
    collection_name: String,
    filter: Document,
    update: Document,
    multi: bool,
    upsert: bool,
    options: UpdateOptions,
}

impl Update {
    /// Validate an update
    ///
    /// `multi` is rejected for replacement documents. An operator document
    /// with `multi` unset is an ordinary single-document update.
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<Self> {
        let multi = options.multi.unwrap_or(false);
        let upsert = options.upsert.unwrap_or(false);

        if multi && !is_first_key_operator(&update) {
            return Err(OperationError::InvalidArgument(
                "\"multi\" option cannot be true if $update is a replacement document".to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            filter,
            update,
            multi,
            upsert,
            options,
        })
    }

    fn batch_for(&self, server: &dyn Server) -> WriteBatch {
        let mut batch = WriteBatch::new(true);
        if let Some(bypass) = self.options.bypass_document_validation
            && server_supports_feature(server, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION)
        {
            batch = batch.with_bypass_document_validation(bypass);
        }

        let collation = self
            .options
            .collation
            .clone()
            .filter(|_| server_supports_feature(server, WIRE_VERSION_FOR_COLLATION));

        batch.update(
            self.filter.clone(),
            self.update.clone(),
            self.multi,
            self.upsert,
            collation,
        );
        batch
    }
}

#[async_trait]
impl Executable for Update {
    type Output = UpdateResult;

    async fn execute(&self, server: &dyn Server) -> Result<UpdateResult> {
        let batch = self.batch_for(server);
        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!(
            "Executing update on '{}' (multi: {}, upsert: {})",
            namespace, self.multi, self.upsert
        );

        let outcome = server
            .execute_bulk_write(&namespace, batch, self.options.write_concern.as_ref())
            .await?;
        info!("Update on '{}' completed", namespace);

        Ok(UpdateResult::new(outcome))
    }
}

pub(crate) fn require_operator(update: &Document) -> Result<()> {
    if is_first_key_operator(update) {
        Ok(())
    } else {
        Err(OperationError::InvalidArgument(
            "First key in $update argument is not an update operator".to_string(),
        ))
    }
}

pub(crate) fn require_replacement(replacement: &Document) -> Result<()> {
    if is_first_key_operator(replacement) {
        Err(OperationError::InvalidArgument(
            "First key in $replacement argument is an update operator".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Update at most one document with an operator document
#[derive(Debug, Clone)]
pub struct UpdateOne {
    update: Update,
}

impl UpdateOne {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<Self> {
        require_operator(&update)?;
        let options = UpdateOptions {
            multi: Some(false),
            ..options
        };

        Ok(Self {
            update: Update::new(database_name, collection_name, filter, update, options)?,
        })
    }
}

#[async_trait]
impl Executable for UpdateOne {
    type Output = UpdateResult;

    async fn execute(&self, server: &dyn Server) -> Result<UpdateResult> {
        self.update.execute(server).await
    }
}

/// Update every matching document with an operator document
#[derive(Debug, Clone)]
pub struct UpdateMany {
    update: Update,
}

impl UpdateMany {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<Self> {
        require_operator(&update)?;
        let options = UpdateOptions {
            multi: Some(true),
            ..options
        };

        Ok(Self {
            update: Update::new(database_name, collection_name, filter, update, options)?,
        })
    }
}

#[async_trait]
impl Executable for UpdateMany {
    type Output = UpdateResult;

    async fn execute(&self, server: &dyn Server) -> Result<UpdateResult> {
        self.update.execute(server).await
    }
}

/// Replace at most one document
#[derive(Debug, Clone)]
pub struct ReplaceOne {
    update: Update,
}

impl ReplaceOne {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> Result<Self> {
        require_replacement(&replacement)?;
        let options = UpdateOptions {
            multi: Some(false),
            ..options
        };

        Ok(Self {
            update: Update::new(database_name, collection_name, filter, replacement, options)?,
        })
    }
}

#[async_trait]
impl Executable for ReplaceOne {
    type Output = UpdateResult;

    async fn execute(&self, server: &dyn Server) -> Result<UpdateResult> {
        self.update.execute(server).await
    }
}
