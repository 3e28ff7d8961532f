//! Delete operations
//!
//! [`Delete`] is the shared primitive; [`DeleteOne`] and [`DeleteMany`] fix
//! its limit to 1 and 0.

use async_trait::async_trait;
use bson::Document;
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_COLLATION, namespace};
use crate::connection::{Server, WriteBatch};
use crate::error::{OperationError, Result};
use crate::result::DeleteResult;

/// Options for delete operations
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    pub write_concern: Option<WriteConcern>,
}

/// Delete documents matching a filter
#[derive(Debug, Clone)]
pub struct Delete {
    database_name: String,
    collection_name: String,
    filter: Document,
    limit: i64,
    options: DeleteOptions,
}

impl Delete {
    /// Validate a delete
    ///
    /// # Arguments
    /// * `limit` - 1 deletes at most one document, 0 deletes all matches
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        limit: i64,
        options: DeleteOptions,
    ) -> Result<Self> {
        if limit != 0 && limit != 1 {
            return Err(OperationError::InvalidArgument(format!(
                "$limit must be 0 or 1, {limit} given"
            )));
        }

        Ok(Self {
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            filter,
            limit,
            options,
        })
    }
}

#[async_trait]
impl Executable for Delete {
    type Output = DeleteResult;

    async fn execute(&self, server: &dyn Server) -> Result<DeleteResult> {
        let collation = self
            .options
            .collation
            .clone()
            .filter(|_| server.info().supports(WIRE_VERSION_FOR_COLLATION));

        let mut batch = WriteBatch::new(true);
        batch.delete(self.filter.clone(), self.limit, collation);

        let namespace = namespace(&self.database_name, &self.collection_name);
        debug!("Executing delete on '{}' with limit {}", namespace, self.limit);

        let outcome = server
            .execute_bulk_write(&namespace, batch, self.options.write_concern.as_ref())
            .await?;
        info!("Delete on '{}' completed", namespace);

        Ok(DeleteResult::new(outcome))
    }
}

/// Delete at most one document
#[derive(Debug, Clone)]
pub struct DeleteOne {
    delete: Delete,
}

impl DeleteOne {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: DeleteOptions,
    ) -> Result<Self> {
        Ok(Self {
            delete: Delete::new(database_name, collection_name, filter, 1, options)?,
        })
    }
}

#[async_trait]
impl Executable for DeleteOne {
    type Output = DeleteResult;

    async fn execute(&self, server: &dyn Server) -> Result<DeleteResult> {
        self.delete.execute(server).await
    }
}

/// Delete every matching document
#[derive(Debug, Clone)]
pub struct DeleteMany {
    delete: Delete,
}

impl DeleteMany {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        filter: Document,
        options: DeleteOptions,
    ) -> Result<Self> {
        Ok(Self {
            delete: Delete::new(database_name, collection_name, filter, 0, options)?,
        })
    }
}

#[async_trait]
impl Executable for DeleteMany {
    type Output = DeleteResult;

    async fn execute(&self, server: &dyn Server) -> Result<DeleteResult> {
        self.delete.execute(server).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{BatchOperation, WriteOutcome};
    use crate::testing::{MockServer, assert_invalid_argument};
    use bson::doc;
    use mongodb::options::Acknowledgment;

    #[test]
    fn test_limit_must_be_zero_or_one() {
        for limit in [-1, 2, 100] {
            assert_invalid_argument(Delete::new(
                "db",
                "coll",
                doc! {},
                limit,
                DeleteOptions::default(),
            ));
        }
        assert!(Delete::new("db", "coll", doc! {}, 0, DeleteOptions::default()).is_ok());
        assert!(Delete::new("db", "coll", doc! {}, 1, DeleteOptions::default()).is_ok());
    }

    #[tokio::test]
    async fn test_delete_one_sends_limit_one() {
        let server = MockServer::modern().outcome(WriteOutcome {
            acknowledged: true,
            deleted_count: 1,
            ..Default::default()
        });
        let op = DeleteOne::new("db", "coll", doc! { "x": 1 }, DeleteOptions::default()).unwrap();

        let result = op.execute(&server).await.unwrap();
        assert_eq!(result.deleted_count().unwrap(), 1);

        let recorded = server.last_bulk_write();
        assert_eq!(recorded.namespace, "db.coll");
        assert_eq!(
            recorded.batch.operations(),
            &[BatchOperation::Delete {
                filter: doc! { "x": 1 },
                limit: 1,
                collation: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_unacknowledged_delete_many() {
        let options = DeleteOptions {
            write_concern: Some(WriteConcern::builder().w(Acknowledgment::Nodes(0)).build()),
            ..Default::default()
        };
        let server = MockServer::modern().unacknowledged();
        let op = DeleteMany::new("db", "coll", doc! {}, options).unwrap();

        let result = op.execute(&server).await.unwrap();
        assert!(!result.is_acknowledged());
        assert!(result.deleted_count().unwrap_err().is_bad_method_call());

        let recorded = server.last_bulk_write();
        assert!(matches!(
            recorded.write_concern.and_then(|wc| wc.w),
            Some(Acknowledgment::Nodes(0))
        ));
    }

    #[tokio::test]
    async fn test_collation_dropped_on_old_server() {
        let options = DeleteOptions {
            collation: Some(doc! { "locale": "en" }),
            ..Default::default()
        };
        let op = DeleteMany::new("db", "coll", doc! {}, options).unwrap();

        let server = MockServer::new(4);
        op.execute(&server).await.unwrap();
        match &server.last_bulk_write().batch.operations()[0] {
            BatchOperation::Delete { collation, .. } => assert!(collation.is_none()),
            other => panic!("unexpected operation {other:?}"),
        }
    }
}
