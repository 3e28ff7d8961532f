//! BulkWrite operation
//!
//! Sends a mixed list of inserts, updates, replacements and deletes in one
//! write batch. Each model is validated the same way as the standalone
//! operation it mirrors.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::Document;
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::insert::queue_insert;
use super::update::{require_operator, require_replacement};
use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION,
    namespace,
};
use crate::connection::{Server, WriteBatch};
use crate::error::{OperationError, Result};
use crate::result::BulkWriteResult;

/// One write in a bulk write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteModel {
    InsertOne {
        document: Document,
    },
    DeleteOne {
        filter: Document,
        collation: Option<Document>,
    },
    DeleteMany {
        filter: Document,
        collation: Option<Document>,
    },
    ReplaceOne {
        filter: Document,
        replacement: Document,
        upsert: Option<bool>,
        collation: Option<Document>,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: Option<bool>,
        collation: Option<Document>,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        upsert: Option<bool>,
        collation: Option<Document>,
    },
}

impl WriteModel {
    fn name(&self) -> &'static str {
        match self {
            WriteModel::InsertOne { .. } => "insertOne",
            WriteModel::DeleteOne { .. } => "deleteOne",
            WriteModel::DeleteMany { .. } => "deleteMany",
            WriteModel::ReplaceOne { .. } => "replaceOne",
            WriteModel::UpdateOne { .. } => "updateOne",
            WriteModel::UpdateMany { .. } => "updateMany",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            WriteModel::ReplaceOne { replacement, .. } => require_replacement(replacement),
            WriteModel::UpdateOne { update, .. } | WriteModel::UpdateMany { update, .. } => {
                require_operator(update)
            }
            _ => Ok(()),
        }
    }
}

/// Options for [`BulkWrite`]
#[derive(Debug, Clone, Default)]
pub struct BulkWriteOptions {
    /// Skip document validation (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    /// Stop at the first failed write (default: true)
    pub ordered: Option<bool>,

    pub write_concern: Option<WriteConcern>,
}

/// Several writes against one collection in a single batch
#[derive(Debug, Clone)]
pub struct BulkWrite {
    database_name: String,
    collection_name: String,
    operations: Vec<WriteModel>,
    options: BulkWriteOptions,
}

impl BulkWrite {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        operations: Vec<WriteModel>,
        options: BulkWriteOptions,
    ) -> Result<Self> {
        if operations.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$operations is empty".to_string(),
            ));
        }

        for (position, operation) in operations.iter().enumerate() {
            operation.validate().map_err(|err| {
                OperationError::InvalidArgument(format!(
                    "Invalid {} at $operations[{position}]: {err}",
                    operation.name()
                ))
            })?;
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            operations,
            options,
        })
    }

    pub fn operations(&self) -> &[WriteModel] {
        &self.operations
    }
}

#[async_trait]
impl Executable for BulkWrite {
    type Output = BulkWriteResult;

    async fn execute(&self, server: &dyn Server) -> Result<BulkWriteResult> {
        let info = server.info();
        let supports_collation = info.supports(WIRE_VERSION_FOR_COLLATION);
        let collation =
            |collation: &Option<Document>| collation.clone().filter(|_| supports_collation);

        let mut batch = WriteBatch::new(self.options.ordered.unwrap_or(true));
        if let Some(bypass) = self.options.bypass_document_validation
            && info.supports(WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION)
        {
            batch = batch.with_bypass_document_validation(bypass);
        }

        let mut inserted_ids = BTreeMap::new();
        for (position, operation) in self.operations.iter().enumerate() {
            match operation {
                WriteModel::InsertOne { document } => {
                    inserted_ids.insert(position, queue_insert(&mut batch, document)?);
                }
                WriteModel::DeleteOne { filter, collation: c } => {
                    batch.delete(filter.clone(), 1, collation(c));
                }
                WriteModel::DeleteMany { filter, collation: c } => {
                    batch.delete(filter.clone(), 0, collation(c));
                }
                WriteModel::ReplaceOne {
                    filter,
                    replacement,
                    upsert,
                    collation: c,
                } => {
                    batch.update(
                        filter.clone(),
                        replacement.clone(),
                        false,
                        upsert.unwrap_or(false),
                        collation(c),
                    );
                }
                WriteModel::UpdateOne {
                    filter,
                    update,
                    upsert,
                    collation: c,
                } => {
                    batch.update(
                        filter.clone(),
                        update.clone(),
                        false,
                        upsert.unwrap_or(false),
                        collation(c),
                    );
                }
                WriteModel::UpdateMany {
                    filter,
                    update,
                    upsert,
                    collation: c,
                } => {
                    batch.update(
                        filter.clone(),
                        update.clone(),
                        true,
                        upsert.unwrap_or(false),
                        collation(c),
                    );
                }
            }
        }

        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!(
            "Executing bulkWrite on '{}' with {} operations (ordered: {})",
            namespace,
            batch.len(),
            batch.is_ordered()
        );

        let outcome = server
            .execute_bulk_write(&namespace, batch, self.options.write_concern.as_ref())
            .await?;
        info!("Bulk write on '{}' completed", namespace);

        Ok(BulkWriteResult::new(outcome, inserted_ids))
    }
}
