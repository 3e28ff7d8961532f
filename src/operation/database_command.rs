//! Arbitrary database command

use async_trait::async_trait;
use bson::Document;
use mongodb::options::ReadPreference;
use tracing::debug;

use super::Executable;
use crate::connection::{Cursor, Server, TypeMap};
use crate::error::{OperationError, Result};

/// Options for [`DatabaseCommand`]
#[derive(Debug, Clone, Default)]
pub struct DatabaseCommandOptions {
    pub read_preference: Option<ReadPreference>,

    pub type_map: Option<TypeMap>,
}

/// Run a caller-built command against a database
#[derive(Debug, Clone)]
pub struct DatabaseCommand {
    database_name: String,
    command: Document,
    options: DatabaseCommandOptions,
}

impl DatabaseCommand {
    pub fn new(
        database_name: impl Into<String>,
        command: Document,
        options: DatabaseCommandOptions,
    ) -> Result<Self> {
        if command.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$command is empty".to_string(),
            ));
        }

        Ok(Self {
            database_name: database_name.into(),
            command,
            options,
        })
    }

    pub fn read_preference(&self) -> Option<&ReadPreference> {
        self.options.read_preference.as_ref()
    }
}

#[async_trait]
impl Executable for DatabaseCommand {
    type Output = Cursor;

    async fn execute(&self, server: &dyn Server) -> Result<Cursor> {
        debug!(
            "Running command on '{}': {}",
            self.database_name, self.command
        );

        let mut cursor = server
            .execute_command(&self.database_name, self.command.clone(), self.read_preference())
            .await?;
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }

        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockServer, assert_invalid_argument};
    use bson::doc;

    #[test]
    fn test_empty_command_rejected() {
        assert_invalid_argument(DatabaseCommand::new(
            "db",
            doc! {},
            DatabaseCommandOptions::default(),
        ));
    }

    #[tokio::test]
    async fn test_runs_command_verbatim() {
        let options = DatabaseCommandOptions {
            read_preference: Some(ReadPreference::SecondaryPreferred {
                options: Default::default(),
            }),
            type_map: Some(TypeMap::default()),
        };
        let op = DatabaseCommand::new("db", doc! { "ping": 1 }, options).unwrap();
        let server = MockServer::modern();

        let cursor = op.execute(&server).await.unwrap();
        assert!(cursor.type_map().is_some());
        assert_eq!(cursor.first().await.unwrap(), Some(doc! { "ok": 1 }));

        let recorded = server.last_command();
        assert_eq!(recorded.command, doc! { "ping": 1 });
        assert!(matches!(
            recorded.read_preference,
            Some(ReadPreference::SecondaryPreferred { .. })
        ));
    }
}
