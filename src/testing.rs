//! In-memory server and manager used by unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::Document;
use mongodb::options::{ReadPreference, WriteConcern};

use crate::collection::CollectionOptions;
use crate::connection::{
    BatchOperation, Cursor, Manager, Query, Server, ServerInfo, WriteBatch, WriteOutcome,
};
use crate::error::{OperationError, Result, ServerError};

/// Wire version of a server that supports every feature the crate gates on
pub const MODERN_WIRE_VERSION: i32 = 6;

#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub database: String,
    pub command: Document,
    pub read_preference: Option<ReadPreference>,
}

#[derive(Debug, Clone)]
pub struct RecordedBulkWrite {
    pub namespace: String,
    pub batch: WriteBatch,
    pub write_concern: Option<WriteConcern>,
}

#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub namespace: String,
    pub query: Query,
    pub read_preference: Option<ReadPreference>,
}

/// Scripted server: replies are consumed in order, requests are recorded.
pub struct MockServer {
    info: ServerInfo,
    acknowledged: bool,
    replies: Mutex<VecDeque<Result<Vec<Document>>>>,
    outcomes: Mutex<VecDeque<WriteOutcome>>,
    pub commands: Mutex<Vec<RecordedCommand>>,
    pub bulk_writes: Mutex<Vec<RecordedBulkWrite>>,
    pub queries: Mutex<Vec<RecordedQuery>>,
}

impl MockServer {
    pub fn new(max_wire_version: i32) -> Self {
        Self {
            info: ServerInfo::new(0, max_wire_version),
            acknowledged: true,
            replies: Mutex::new(VecDeque::new()),
            outcomes: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
            bulk_writes: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn modern() -> Self {
        Self::new(MODERN_WIRE_VERSION)
    }

    /// Server whose synthesized write outcomes are unacknowledged
    pub fn unacknowledged(mut self) -> Self {
        self.acknowledged = false;
        self
    }

    /// Queue the documents returned by the next command or query
    pub fn reply(self, documents: Vec<Document>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(documents));
        self
    }

    /// Queue a server error for the next command or query
    pub fn fail(self, code: i32, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ServerError::new(code, message).into()));
        self
    }

    /// Queue the outcome of the next bulk write
    pub fn outcome(self, outcome: WriteOutcome) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn last_command(&self) -> RecordedCommand {
        self.commands.lock().unwrap().last().cloned().expect("no command recorded")
    }

    pub fn last_bulk_write(&self) -> RecordedBulkWrite {
        self.bulk_writes.lock().unwrap().last().cloned().expect("no bulk write recorded")
    }

    pub fn last_query(&self) -> RecordedQuery {
        self.queries.lock().unwrap().last().cloned().expect("no query recorded")
    }

    fn next_reply(&self) -> Result<Cursor> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![bson::doc! { "ok": 1 }]));
        reply.map(Cursor::from_documents)
    }

    fn synthesize_outcome(&self, batch: &WriteBatch) -> WriteOutcome {
        if !self.acknowledged {
            return WriteOutcome::unacknowledged();
        }
        let inserted = batch
            .operations()
            .iter()
            .filter(|op| matches!(op, BatchOperation::Insert(_)))
            .count();
        WriteOutcome {
            acknowledged: true,
            inserted_count: inserted as u64,
            modified_count: Some(0),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Server for MockServer {
    fn info(&self) -> ServerInfo {
        self.info
    }

    async fn execute_command(
        &self,
        database: &str,
        command: Document,
        read_preference: Option<&ReadPreference>,
    ) -> Result<Cursor> {
        self.commands.lock().unwrap().push(RecordedCommand {
            database: database.to_string(),
            command,
            read_preference: read_preference.cloned(),
        });
        self.next_reply()
    }

    async fn execute_bulk_write(
        &self,
        namespace: &str,
        batch: WriteBatch,
        write_concern: Option<&WriteConcern>,
    ) -> Result<WriteOutcome> {
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.synthesize_outcome(&batch));
        self.bulk_writes.lock().unwrap().push(RecordedBulkWrite {
            namespace: namespace.to_string(),
            batch,
            write_concern: write_concern.cloned(),
        });
        Ok(outcome)
    }

    async fn execute_query(
        &self,
        namespace: &str,
        query: Query,
        read_preference: Option<&ReadPreference>,
    ) -> Result<Cursor> {
        self.queries.lock().unwrap().push(RecordedQuery {
            namespace: namespace.to_string(),
            query,
            read_preference: read_preference.cloned(),
        });
        self.next_reply()
    }
}

/// Manager that always selects the same mock server
pub struct MockManager {
    pub server: Arc<MockServer>,
    defaults: CollectionOptions,
    pub selections: Mutex<Vec<ReadPreference>>,
}

impl MockManager {
    pub fn new(server: MockServer) -> Arc<Self> {
        Self::with_defaults(server, CollectionOptions::default())
    }

    pub fn with_defaults(server: MockServer, defaults: CollectionOptions) -> Arc<Self> {
        Arc::new(Self {
            server: Arc::new(server),
            defaults,
            selections: Mutex::new(Vec::new()),
        })
    }

    pub fn last_selection(&self) -> ReadPreference {
        self.selections.lock().unwrap().last().cloned().expect("no server selected")
    }
}

#[async_trait]
impl Manager for MockManager {
    async fn select_server(&self, read_preference: &ReadPreference) -> Result<Arc<dyn Server>> {
        self.selections.lock().unwrap().push(read_preference.clone());
        Ok(self.server.clone())
    }

    fn defaults(&self) -> CollectionOptions {
        self.defaults.clone()
    }
}

/// Unwrap an error that is expected to be an invalid-argument error
pub fn assert_invalid_argument<T: std::fmt::Debug>(result: Result<T>) {
    match result {
        Err(OperationError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument error, got {other:?}"),
    }
}
