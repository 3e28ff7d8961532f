//! Bulk write batches and their raw outcomes
//!
//! A [`WriteBatch`] accumulates insert, update and delete statements that a
//! [`Server`](super::Server) sends in one round trip. The server answers with
//! a [`WriteOutcome`], which result types in [`crate::result`] wrap.

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use bson::{Bson, Document};

/// A single statement queued in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    /// Insert a document
    Insert(Document),

    /// Update or replace matching documents
    Update {
        filter: Document,
        update: Document,
        multi: bool,
        upsert: bool,
        collation: Option<Document>,
    },

    /// Delete matching documents; a limit of 0 deletes all matches
    Delete {
        filter: Document,
        limit: i64,
        collation: Option<Document>,
    },
}

/// Ordered list of write statements sent to the server together.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    ordered: bool,
    bypass_document_validation: Option<bool>,
    operations: Vec<BatchOperation>,
}

impl WriteBatch {
    /// Create an empty batch
    ///
    /// # Arguments
    /// * `ordered` - Stop at the first failing statement
    pub fn new(ordered: bool) -> Self {
        Self {
            ordered,
            bypass_document_validation: None,
            operations: Vec::new(),
        }
    }

    /// Ask the server to skip document validation for this batch
    pub fn with_bypass_document_validation(mut self, bypass: bool) -> Self {
        self.bypass_document_validation = Some(bypass);
        self
    }

    /// Queue an insert
    ///
    /// A document without `_id` gets a fresh `ObjectId` prepended.
    ///
    /// # Returns
    /// * `Option<Bson>` - The generated id, or `None` if the document carried one
    pub fn insert(&mut self, mut document: Document) -> Option<Bson> {
        let generated = if document.contains_key("_id") {
            None
        } else {
            let id = Bson::ObjectId(ObjectId::new());
            let mut with_id = Document::new();
            with_id.insert("_id", id.clone());
            for (key, value) in document {
                with_id.insert(key, value);
            }
            document = with_id;
            Some(id)
        };

        self.operations.push(BatchOperation::Insert(document));
        generated
    }

    /// Queue an update or replacement
    pub fn update(
        &mut self,
        filter: Document,
        update: Document,
        multi: bool,
        upsert: bool,
        collation: Option<Document>,
    ) {
        self.operations.push(BatchOperation::Update {
            filter,
            update,
            multi,
            upsert,
            collation,
        });
    }

    /// Queue a delete
    pub fn delete(&mut self, filter: Document, limit: i64, collation: Option<Document>) {
        self.operations.push(BatchOperation::Delete {
            filter,
            limit,
            collation,
        });
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn bypass_document_validation(&self) -> Option<bool> {
        self.bypass_document_validation
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Raw result of executing a [`WriteBatch`].
///
/// Counts are meaningless when `acknowledged` is false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOutcome {
    /// Whether the server confirmed the write
    pub acknowledged: bool,

    pub inserted_count: u64,

    pub matched_count: u64,

    /// `None` when the server cannot report modified counts
    pub modified_count: Option<u64>,

    pub deleted_count: u64,

    pub upserted_count: u64,

    /// Upserted ids keyed by statement position in the batch
    pub upserted_ids: BTreeMap<usize, Bson>,
}

impl WriteOutcome {
    /// Outcome of a write sent with an unacknowledged write concern
    pub fn unacknowledged() -> Self {
        Self::default()
    }
}
