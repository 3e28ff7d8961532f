//! Database facade

use std::fmt;
use std::sync::Arc;

use bson::Document;
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};

use crate::collection::{Collection, CollectionOptions};
use crate::connection::{Cursor, Manager, TypeMap};
use crate::error::{OperationError, Result};
use crate::operation::{
    CollectionInfoStream, CreateCollection, CreateCollectionOptions, DatabaseCommand,
    DatabaseCommandOptions, DropCollection, DropCollectionOptions, DropDatabase,
    DropDatabaseOptions, ListCollections, ListCollectionsOptions, execute_with,
};

/// A MongoDB database bound to a manager
#[derive(Clone)]
pub struct Database {
    manager: Arc<dyn Manager>,
    database_name: String,
    options: CollectionOptions,
}

impl Database {
    /// Create a database facade
    ///
    /// Options left unset are inherited from the manager's defaults.
    pub fn new(
        manager: Arc<dyn Manager>,
        database_name: impl Into<String>,
        options: CollectionOptions,
    ) -> Result<Self> {
        let database_name = database_name.into();
        if database_name.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$databaseName is invalid: database name cannot be empty".to_string(),
            ));
        }

        let mut options = manager.defaults().merge(&options);
        if options.read_preference.is_none() {
            options.read_preference = Some(ReadPreference::Primary);
        }

        Ok(Self {
            manager,
            database_name,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.database_name
    }

    pub fn read_concern(&self) -> Option<&ReadConcern> {
        self.options.read_concern.as_ref()
    }

    pub fn read_preference(&self) -> Option<&ReadPreference> {
        self.options.read_preference.as_ref()
    }

    pub fn type_map(&self) -> Option<&TypeMap> {
        self.options.type_map.as_ref()
    }

    pub fn write_concern(&self) -> Option<&WriteConcern> {
        self.options.write_concern.as_ref()
    }

    /// Clone this database with some options replaced
    pub fn with_options(&self, options: CollectionOptions) -> Result<Database> {
        Database::new(
            self.manager.clone(),
            self.database_name.clone(),
            self.options.merge(&options),
        )
    }

    /// Select a collection that inherits this database's options
    pub fn select_collection(
        &self,
        collection_name: impl Into<String>,
        options: CollectionOptions,
    ) -> Result<Collection> {
        Collection::new(
            self.manager.clone(),
            self.database_name.clone(),
            collection_name,
            self.options.merge(&options),
        )
    }

    /// Run a command against this database
    ///
    /// The database's read preference and type map apply unless overridden.
    pub async fn command(
        &self,
        command: Document,
        mut options: DatabaseCommandOptions,
    ) -> Result<Cursor> {
        if options.type_map.is_none() {
            options.type_map = self.options.type_map.clone();
        }
        let read_preference = options
            .read_preference
            .get_or_insert_with(|| {
                self.options
                    .read_preference
                    .clone()
                    .unwrap_or(ReadPreference::Primary)
            })
            .clone();

        let operation = DatabaseCommand::new(&self.database_name, command, options)?;
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    pub async fn create_collection(
        &self,
        collection_name: &str,
        mut options: CreateCollectionOptions,
    ) -> Result<Document> {
        if options.type_map.is_none() {
            options.type_map = self.options.type_map.clone();
        }
        if options.write_concern.is_none() {
            options.write_concern = self.options.write_concern.clone();
        }

        let operation = CreateCollection::new(&self.database_name, collection_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    /// Drop this database
    pub async fn drop(&self, mut options: DropDatabaseOptions) -> Result<Document> {
        if options.type_map.is_none() {
            options.type_map = self.options.type_map.clone();
        }
        if options.write_concern.is_none() {
            options.write_concern = self.options.write_concern.clone();
        }

        let operation = DropDatabase::new(&self.database_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn drop_collection(
        &self,
        collection_name: &str,
        mut options: DropCollectionOptions,
    ) -> Result<Document> {
        if options.type_map.is_none() {
            options.type_map = self.options.type_map.clone();
        }
        if options.write_concern.is_none() {
            options.write_concern = self.options.write_concern.clone();
        }

        let operation = DropCollection::new(&self.database_name, collection_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn list_collections(
        &self,
        options: ListCollectionsOptions,
    ) -> Result<CollectionInfoStream> {
        let operation = ListCollections::new(&self.database_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.database_name)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.database_name)
    }
}
