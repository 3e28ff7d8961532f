//! Write result types
//!
//! This module wraps raw [`WriteOutcome`]s into per-verb results:
//! - DeleteResult, UpdateResult
//! - InsertOneResult, InsertManyResult
//! - BulkWriteResult
//!
//! Counts reported for an unacknowledged write are undefined, so every
//! accessor except `is_acknowledged` and the inserted-id accessors returns
//! [`OperationError::BadMethodCall`] in that case.

use std::collections::BTreeMap;

use bson::Bson;

use crate::connection::WriteOutcome;
use crate::error::{OperationError, Result};

fn ensure_acknowledged(outcome: &WriteOutcome, method: &str) -> Result<()> {
    if outcome.acknowledged {
        Ok(())
    } else {
        Err(OperationError::unacknowledged_write_result_access(method))
    }
}

/// Result of a delete operation
#[derive(Debug, Clone)]
pub struct DeleteResult {
    outcome: WriteOutcome,
}

impl DeleteResult {
    pub fn new(outcome: WriteOutcome) -> Self {
        Self { outcome }
    }

    /// Number of deleted documents
    pub fn deleted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "deleted_count")?;
        Ok(self.outcome.deleted_count)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.acknowledged
    }
}

/// Result of an insertOne operation
#[derive(Debug, Clone)]
pub struct InsertOneResult {
    outcome: WriteOutcome,
    inserted_id: Bson,
}

impl InsertOneResult {
    pub fn new(outcome: WriteOutcome, inserted_id: Bson) -> Self {
        Self {
            outcome,
            inserted_id,
        }
    }

    /// Number of inserted documents
    pub fn inserted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "inserted_count")?;
        Ok(self.outcome.inserted_count)
    }

    /// Id of the inserted document, generated or caller-supplied
    ///
    /// Available even when the write was not acknowledged.
    pub fn inserted_id(&self) -> &Bson {
        &self.inserted_id
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.acknowledged
    }
}

/// Result of an insertMany operation
#[derive(Debug, Clone)]
pub struct InsertManyResult {
    outcome: WriteOutcome,
    inserted_ids: BTreeMap<usize, Bson>,
}

impl InsertManyResult {
    pub fn new(outcome: WriteOutcome, inserted_ids: BTreeMap<usize, Bson>) -> Self {
        Self {
            outcome,
            inserted_ids,
        }
    }

    /// Number of inserted documents
    pub fn inserted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "inserted_count")?;
        Ok(self.outcome.inserted_count)
    }

    /// Ids of the inserted documents keyed by their position in the input
    ///
    /// Available even when the write was not acknowledged.
    pub fn inserted_ids(&self) -> &BTreeMap<usize, Bson> {
        &self.inserted_ids
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.acknowledged
    }
}

/// Result of an update or replace operation
#[derive(Debug, Clone)]
pub struct UpdateResult {
    outcome: WriteOutcome,
}

impl UpdateResult {
    pub fn new(outcome: WriteOutcome) -> Self {
        Self { outcome }
    }

    /// Number of documents matched by the filter
    pub fn matched_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "matched_count")?;
        Ok(self.outcome.matched_count)
    }

    /// Number of documents modified
    ///
    /// `None` when the server cannot report it (legacy write path).
    pub fn modified_count(&self) -> Result<Option<u64>> {
        ensure_acknowledged(&self.outcome, "modified_count")?;
        Ok(self.outcome.modified_count)
    }

    /// Number of documents upserted (0 or 1)
    pub fn upserted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "upserted_count")?;
        Ok(self.outcome.upserted_count)
    }

    /// Id of the upserted document, if an upsert took place
    pub fn upserted_id(&self) -> Result<Option<&Bson>> {
        ensure_acknowledged(&self.outcome, "upserted_id")?;
        Ok(self.outcome.upserted_ids.get(&0))
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.acknowledged
    }
}

/// Result of a bulkWrite operation
#[derive(Debug, Clone)]
pub struct BulkWriteResult {
    outcome: WriteOutcome,
    inserted_ids: BTreeMap<usize, Bson>,
}

impl BulkWriteResult {
    pub fn new(outcome: WriteOutcome, inserted_ids: BTreeMap<usize, Bson>) -> Self {
        Self {
            outcome,
            inserted_ids,
        }
    }

    pub fn deleted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "deleted_count")?;
        Ok(self.outcome.deleted_count)
    }

    pub fn inserted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "inserted_count")?;
        Ok(self.outcome.inserted_count)
    }

    /// Ids of inserted documents keyed by the position of their insert
    /// operation in the bulk request
    pub fn inserted_ids(&self) -> &BTreeMap<usize, Bson> {
        &self.inserted_ids
    }

    pub fn matched_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "matched_count")?;
        Ok(self.outcome.matched_count)
    }

    pub fn modified_count(&self) -> Result<Option<u64>> {
        ensure_acknowledged(&self.outcome, "modified_count")?;
        Ok(self.outcome.modified_count)
    }

    pub fn upserted_count(&self) -> Result<u64> {
        ensure_acknowledged(&self.outcome, "upserted_count")?;
        Ok(self.outcome.upserted_count)
    }

    /// Upserted ids keyed by the position of their operation in the bulk request
    pub fn upserted_ids(&self) -> Result<&BTreeMap<usize, Bson>> {
        ensure_acknowledged(&self.outcome, "upserted_ids")?;
        Ok(&self.outcome.upserted_ids)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.acknowledged
    }
}
