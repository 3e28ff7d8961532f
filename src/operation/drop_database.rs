//! DropDatabase operation

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{Executable, WIRE_VERSION_FOR_WRITE_CONCERN, command_reply};
use crate::connection::{Server, ServerInfo, TypeMap};
use crate::error::Result;
use crate::functions::write_concern_as_document;

/// Options for [`DropDatabase`]
#[derive(Debug, Clone, Default)]
pub struct DropDatabaseOptions {
    pub type_map: Option<TypeMap>,

    /// Write concern (server 3.4+)
    pub write_concern: Option<WriteConcern>,
}

/// Drop a database and every collection in it
#[derive(Debug, Clone)]
pub struct DropDatabase {
    database_name: String,
    options: DropDatabaseOptions,
}

impl DropDatabase {
    pub fn new(database_name: impl Into<String>, options: DropDatabaseOptions) -> Result<Self> {
        Ok(Self {
            database_name: database_name.into(),
            options,
        })
    }

    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let mut command = doc! { "dropDatabase": 1 };

        if let Some(write_concern) = &self.options.write_concern
            && info.supports(WIRE_VERSION_FOR_WRITE_CONCERN)
        {
            command.insert("writeConcern", write_concern_as_document(write_concern)?);
        }

        Ok(command)
    }
}

#[async_trait]
impl Executable for DropDatabase {
    type Output = Document;

    async fn execute(&self, server: &dyn Server) -> Result<Document> {
        let command = self.create_command(&server.info())?;
        debug!("Dropping database '{}'", self.database_name);

        let mut cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }

        let reply = command_reply(cursor, "dropDatabase").await?;
        info!("Dropped database '{}'", self.database_name);
        Ok(reply)
    }
}
