//! CreateCollection operation

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::options::WriteConcern;
use tracing::{debug, info};

use super::{
    Executable, WIRE_VERSION_FOR_COLLATION, WIRE_VERSION_FOR_WRITE_CONCERN, check_collection_name,
    command_reply,
};
use crate::connection::{Server, ServerInfo, TypeMap};
use crate::error::Result;
use crate::functions::write_concern_as_document;

/// Options for [`CreateCollection`]
#[derive(Debug, Clone, Default)]
pub struct CreateCollectionOptions {
    pub auto_index_id: Option<bool>,

    /// Create a fixed-size collection; requires `size`
    pub capped: Option<bool>,

    /// Collation document (server 3.4+)
    pub collation: Option<Document>,

    /// Storage flags bit field (MMAPv1 only)
    pub flags: Option<i32>,

    /// Default options for indexes created on the collection
    pub index_option_defaults: Option<Document>,

    /// Maximum number of documents in a capped collection
    pub max: Option<i64>,

    pub max_time_ms: Option<i64>,

    /// Maximum size in bytes of a capped collection
    pub size: Option<i64>,

    pub storage_engine: Option<Document>,

    pub type_map: Option<TypeMap>,

    /// `"error"` or `"warn"`
    pub validation_action: Option<String>,

    /// `"off"`, `"strict"` or `"moderate"`
    pub validation_level: Option<String>,

    pub validator: Option<Document>,

    /// Write concern (server 3.4+)
    pub write_concern: Option<WriteConcern>,
}

/// Explicitly create a collection
#[derive(Debug, Clone)]
pub struct CreateCollection {
    database_name: String,
    collection_name: String,
    options: CreateCollectionOptions,
}

impl CreateCollection {
    pub fn new(
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: CreateCollectionOptions,
    ) -> Result<Self> {
        let collection_name = collection_name.into();
        check_collection_name(&collection_name)?;

        Ok(Self {
            database_name: database_name.into(),
            collection_name,
            options,
        })
    }

    pub fn create_command(&self, info: &ServerInfo) -> Result<Document> {
        let options = &self.options;
        let mut command = doc! { "create": self.collection_name.as_str() };

        let fields: [(&str, Option<Bson>); 12] = [
            ("autoIndexId", options.auto_index_id.map(Bson::from)),
            ("capped", options.capped.map(Bson::from)),
            ("flags", options.flags.map(Bson::from)),
            ("indexOptionDefaults", options.index_option_defaults.clone().map(Bson::from)),
            ("max", options.max.map(Bson::from)),
            ("maxTimeMS", options.max_time_ms.map(Bson::from)),
            ("size", options.size.map(Bson::from)),
            ("storageEngine", options.storage_engine.clone().map(Bson::from)),
            ("validationAction", options.validation_action.clone().map(Bson::from)),
            ("validationLevel", options.validation_level.clone().map(Bson::from)),
            ("validator", options.validator.clone().map(Bson::from)),
            (
                "collation",
                options
                    .collation
                    .clone()
                    .filter(|_| info.supports(WIRE_VERSION_FOR_COLLATION))
                    .map(Bson::from),
            ),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                command.insert(key, value);
            }
        }

        if let Some(write_concern) = &options.write_concern
            && info.supports(WIRE_VERSION_FOR_WRITE_CONCERN)
        {
            command.insert("writeConcern", write_concern_as_document(write_concern)?);
        }

        Ok(command)
    }
}

#[async_trait]
impl Executable for CreateCollection {
    type Output = Document;

    async fn execute(&self, server: &dyn Server) -> Result<Document> {
        let command = self.create_command(&server.info())?;
        debug!("Creating collection with command: {}", command);

        let mut cursor = server
            .execute_command(&self.database_name, command, None)
            .await?;
        if let Some(type_map) = &self.options.type_map {
            cursor.set_type_map(type_map.clone());
        }

        let reply = command_reply(cursor, "create").await?;
        info!(
            "Created collection '{}.{}'",
            self.database_name, self.collection_name
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockServer, assert_invalid_argument};

    #[test]
    fn test_empty_collection_name_rejected() {
        assert_invalid_argument(CreateCollection::new(
            "db",
            "",
            CreateCollectionOptions::default(),
        ));
    }

    #[tokio::test]
    async fn test_capped_collection_command() {
        let options = CreateCollectionOptions {
            capped: Some(true),
            size: Some(4096),
            max: Some(100),
            validator: Some(doc! { "x": { "$exists": true } }),
            validation_level: Some("moderate".to_string()),
            collation: Some(doc! { "locale": "en" }),
            ..Default::default()
        };
        let op = CreateCollection::new("db", "log", options).unwrap();
        let server = MockServer::new(4);

        op.execute(&server).await.unwrap();
        assert_eq!(
            server.last_command().command,
            doc! {
                "create": "log",
                "capped": true,
                "max": 100_i64,
                "size": 4096_i64,
                "validationLevel": "moderate",
                "validator": { "x": { "$exists": true } },
            }
        );
    }
}
