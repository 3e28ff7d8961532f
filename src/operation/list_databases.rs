//! ListDatabases operation

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use tracing::debug;

use super::{Executable, command_reply};
use crate::connection::Server;
use crate::error::{OperationError, Result};
use crate::model::DatabaseInfo;

/// Options for [`ListDatabases`]
#[derive(Debug, Clone, Default)]
pub struct ListDatabasesOptions {
    /// Filter applied to database descriptions
    pub filter: Option<Document>,

    pub max_time_ms: Option<i64>,
}

/// List the databases of a deployment
#[derive(Debug, Clone, Default)]
pub struct ListDatabases {
    options: ListDatabasesOptions,
}

impl ListDatabases {
    pub fn new(options: ListDatabasesOptions) -> Result<Self> {
        Ok(Self { options })
    }

    pub fn create_command(&self) -> Document {
        let mut command = doc! { "listDatabases": 1 };

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
}

#[async_trait]
impl Executable for ListDatabases {
    type Output = Vec<DatabaseInfo>;

    async fn execute(&self, server: &dyn Server) -> Result<Vec<DatabaseInfo>> {
        let command = self.create_command();
        debug!("Listing databases with command: {}", command);

        let cursor = server.execute_command("admin", command, None).await?;
        let reply = command_reply(cursor, "listDatabases").await?;

        let databases = match reply.get("databases") {
            Some(Bson::Array(databases)) => databases,
            _ => {
                return Err(OperationError::UnexpectedValue(
                    "listDatabases command did not return a \"databases\" array".to_string(),
                ));
            }
        };

        databases
            .iter()
            .map(|database| match database {
                Bson::Document(info) => Ok(DatabaseInfo::new(info.clone())),
                _ => Err(OperationError::UnexpectedValue(
                    "listDatabases command returned a non-document database entry".to_string(),
                )),
            })
            .collect()
    }
}
