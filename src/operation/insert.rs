//! Insert operations
//!
//! Both operations report one id per input document: the id generated by
//! the write batch when the document had no `_id`, otherwise the caller's.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::{Bson, Document};
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION, namespace};
use crate::connection::{Server, WriteBatch};
use crate::error::{OperationError, Result};
use crate::functions::{extract_id_from_inserted_document, server_supports_feature};
use crate::result::{InsertManyResult, InsertOneResult};

/// Queue a document and return the id it will be stored under
pub(crate) fn queue_insert(batch: &mut WriteBatch, document: &Document) -> Result<Bson> {
    match batch.insert(document.clone()) {
        Some(generated) => Ok(generated),
        None => extract_id_from_inserted_document(document),
    }
}

fn new_batch(ordered: bool, bypass: Option<bool>, server: &dyn Server) -> WriteBatch {
    let batch = WriteBatch::new(ordered);
    match bypass {
        Some(bypass)
            if server_supports_feature(server, WIRE_VERSION_FOR_DOCUMENT_LEVEL_VALIDATION) =>
        {
            batch.with_bypass_document_validation(bypass)
        }
        _ => batch,
    }
}

/// Options for [`InsertOne`]
#[derive(Debug, Clone, Default)]
pub struct InsertOneOptions {
    /// Skip document validation (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    pub write_concern: Option<WriteConcern>,
}

/// Insert a single document
#[derive(Debug, Clone)]
pub struct InsertOne {
    database_name: String,
    collection_name: String,
    document: Document,
    options: InsertOneOptions,
}

impl InsertOne {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        document: Document,
        options: InsertOneOptions,
    ) -> Result<Self> {
        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            document,
            options,
        })
    }
}

#[async_trait]
impl Executable for InsertOne {
    type Output = InsertOneResult;

    async fn execute(&self, server: &dyn Server) -> Result<InsertOneResult> {
        let mut batch = new_batch(true, self.options.bypass_document_validation, server);
        let inserted_id = queue_insert(&mut batch, &self.document)?;

        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!("Executing insertOne on '{}'", namespace);

        let outcome = server
            .execute_bulk_write(&namespace, batch, self.options.write_concern.as_ref())
            .await?;
        info!("Inserted document into '{}'", namespace);

        Ok(InsertOneResult::new(outcome, inserted_id))
    }
}

/// Options for [`InsertMany`]
#[derive(Debug, Clone, Default)]
pub struct InsertManyOptions {
    /// Skip document validation (server 3.2+)
    pub bypass_document_validation: Option<bool>,

    /// Stop at the first failed insert (default: true)
    pub ordered: Option<bool>,

    pub write_concern: Option<WriteConcern>,
}

/// Insert several documents in one batch
#[derive(Debug, Clone)]
pub struct InsertMany {
    database_name: String,
    collection_name: String,
    documents: Vec<Document>,
    options: InsertManyOptions,
}

impl InsertMany {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        documents: Vec<Document>,
        options: InsertManyOptions,
    ) -> Result<Self> {
        if documents.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$documents is empty".to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            documents,
            options,
        })
    }
}

#[async_trait]
impl Executable for InsertMany {
    type Output = InsertManyResult;

    async fn execute(&self, server: &dyn Server) -> Result<InsertManyResult> {
        let ordered = self.options.ordered.unwrap_or(true);
        let mut batch = new_batch(ordered, self.options.bypass_document_validation, server);

        let mut inserted_ids = BTreeMap::new();
        for (position, document) in self.documents.iter().enumerate() {
            inserted_ids.insert(position, queue_insert(&mut batch, document)?);
        }

        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!(
            "Executing insertMany on '{}' with {} documents",
            namespace,
            self.documents.len()
        );

        let outcome = server
            .execute_bulk_write(&namespace, batch, self.options.write_concern.as_ref())
            .await?;
        info!("Inserted {} documents into '{}'", inserted_ids.len(), namespace);

        Ok(InsertManyResult::new(outcome, inserted_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::BatchOperation;
    use crate::testing::{MockServer, assert_invalid_argument};
    use bson::doc;

    #[test]
    fn test_empty_documents_rejected() {
        assert_invalid_argument(InsertMany::new("db", "c", vec![], InsertManyOptions::default()));
    }

    #[tokio::test]
    async fn test_insert_many_mixes_supplied_and_generated_ids() {
        let op = InsertMany::new(
            "db",
            "c",
            vec![doc! { "_id": 1, "x": "a" }, doc! { "x": "b" }],
            InsertManyOptions::default(),
        )
        .unwrap();
        let server = MockServer::modern();

        let result = op.execute(&server).await.unwrap();
        assert_eq!(result.inserted_count().unwrap(), 2);

        let ids = result.inserted_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[&0], Bson::Int32(1));
        assert!(matches!(ids[&1], Bson::ObjectId(_)));

        let batch = server.last_bulk_write().batch;
        assert!(batch.is_ordered());
        match &batch.operations()[1] {
            BatchOperation::Insert(document) => assert_eq!(document.get("_id"), Some(&ids[&1])),
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_one_with_supplied_id() {
        let options = InsertOneOptions {
            bypass_document_validation: Some(false),
            ..Default::default()
        };
        let op = InsertOne::new("db", "c", doc! { "_id": "k", "v": 1 }, options).unwrap();
        let server = MockServer::modern();

        let result = op.execute(&server).await.unwrap();
        assert_eq!(result.inserted_id(), &Bson::String("k".to_string()));
        assert_eq!(result.inserted_count().unwrap(), 1);
        assert_eq!(server.last_bulk_write().batch.bypass_document_validation(), Some(false));
    }

    #[tokio::test]
    async fn test_unordered_insert_on_old_server() {
        let options = InsertManyOptions {
            ordered: Some(false),
            bypass_document_validation: Some(true),
            ..Default::default()
        };
        let op = InsertMany::new("db", "c", vec![doc! { "a": 1 }], options).unwrap();
        let server = MockServer::new(3).unacknowledged();

        let result = op.execute(&server).await.unwrap();
        assert!(!result.is_acknowledged());
        assert_eq!(result.inserted_ids().len(), 1);

        let batch = server.last_bulk_write().batch;
        assert!(!batch.is_ordered());
        assert_eq!(batch.bypass_document_validation(), None);
    }
}
