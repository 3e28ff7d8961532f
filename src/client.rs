//! Client facade
//!
//! Entry point that hands out [`Database`] and [`Collection`] facades sharing
//! one [`Manager`].

use std::sync::Arc;

use bson::Document;
use mongodb::options::ReadPreference;

use crate::collection::{Collection, CollectionOptions};
use crate::connection::Manager;
use crate::database::Database;
use crate::error::Result;
use crate::model::DatabaseInfo;
use crate::operation::{
    DropDatabase, DropDatabaseOptions, ListDatabases, ListDatabasesOptions, execute_with,
};

/// A MongoDB deployment reached through a manager
#[derive(Clone)]
pub struct Client {
    manager: Arc<dyn Manager>,
}

impl Client {
    pub fn new(manager: Arc<dyn Manager>) -> Self {
        Self { manager }
    }

    /// Manager shared by every facade created from this client
    pub fn manager(&self) -> &Arc<dyn Manager> {
        &self.manager
    }

    /// Options inherited by databases and collections
    pub fn default_options(&self) -> CollectionOptions {
        self.manager.defaults()
    }

    pub async fn list_databases(&self, options: ListDatabasesOptions) -> Result<Vec<DatabaseInfo>> {
        let operation = ListDatabases::new(options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn drop_database(
        &self,
        database_name: &str,
        mut options: DropDatabaseOptions,
    ) -> Result<Document> {
        let defaults = self.manager.defaults();
        if options.type_map.is_none() {
            options.type_map = defaults.type_map;
        }
        if options.write_concern.is_none() {
            options.write_concern = defaults.write_concern;
        }

        let operation = DropDatabase::new(database_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub fn select_database(
        &self,
        database_name: impl Into<String>,
        options: CollectionOptions,
    ) -> Result<Database> {
        Database::new(self.manager.clone(), database_name, options)
    }

    pub fn select_collection(
        &self,
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: CollectionOptions,
    ) -> Result<Collection> {
        Collection::new(self.manager.clone(), database_name, collection_name, options)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockManager, MockServer};
    use bson::doc;
    use mongodb::options::{Acknowledgment, WriteConcern};

    #[tokio::test]
    async fn test_list_databases() {
        let manager = MockManager::new(MockServer::modern().reply(vec![doc! {
            "databases": [{ "name": "app", "sizeOnDisk": 4096_i64, "empty": false }],
            "ok": 1,
        }]));
        let client = Client::new(manager.clone());

        let databases = client.list_databases(ListDatabasesOptions::default()).await.unwrap();
        assert_eq!(databases[0].name(), Some("app"));
        assert_eq!(manager.server.last_command().database, "admin");
    }

    #[tokio::test]
    async fn test_drop_database_uses_default_write_concern() {
        let defaults = CollectionOptions {
            write_concern: Some(WriteConcern::builder().w(Acknowledgment::Majority).build()),
            ..Default::default()
        };
        let manager = MockManager::with_defaults(MockServer::modern(), defaults);
        let client = Client::new(manager.clone());

        client
            .drop_database("scratch", DropDatabaseOptions::default())
            .await
            .unwrap();
        let recorded = manager.server.last_command();
        assert_eq!(recorded.database, "scratch");
        assert!(recorded.command.contains_key("writeConcern"));
    }

    #[test]
    fn test_select_collection() {
        let client = Client::new(MockManager::new(MockServer::modern()));
        let coll = client
            .select_collection("app", "users", CollectionOptions::default())
            .unwrap();
        assert_eq!(coll.namespace(), "app.users");

        assert!(client.select_database("", CollectionOptions::default()).is_err());
    }
}
