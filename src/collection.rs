//! Collection facade
//!
//! A [`Collection`] holds a namespace and a set of default options. Every
//! verb layers its per-call options over those defaults, selects a server
//! through the [`Manager`] and executes the matching operation.

use std::fmt;
use std::sync::Arc;

use bson::{Bson, Document};
use mongodb::options::{ReadConcern, ReadPreference, WriteConcern};

use crate::connection::{Cursor, Manager, TypeMap};
use crate::error::{OperationError, Result};
use crate::functions::{is_last_pipeline_operator_out, is_majority_read_concern};
use crate::operation::{
    Aggregate, AggregateOptions, BulkWrite, BulkWriteOptions, Count, CountOptions, CreateIndexes,
    CreateIndexesOptions, DeleteMany, DeleteOne, DeleteOptions, Distinct, DistinctOptions,
    DropCollection, DropCollectionOptions, DropIndexes, DropIndexesOptions, Find, FindOne,
    FindOneAndDelete, FindOneAndDeleteOptions, FindOneAndReplace, FindOneAndReplaceOptions,
    FindOneAndUpdate, FindOneAndUpdateOptions, FindOptions, IndexInfoStream, InsertMany,
    InsertManyOptions, InsertOne, InsertOneOptions, ListIndexes, ListIndexesOptions, ReplaceOne,
    UpdateMany, UpdateOne, UpdateOptions, WriteModel, check_collection_name, execute_with,
};
use crate::result::{BulkWriteResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

/// Default options carried by clients, databases and collections
#[derive(Debug, Clone, Default)]
pub struct CollectionOptions {
    pub read_concern: Option<ReadConcern>,
    pub read_preference: Option<ReadPreference>,
    pub type_map: Option<TypeMap>,
    pub write_concern: Option<WriteConcern>,
}

impl CollectionOptions {
    /// Layer `overrides` over these options
    ///
    /// # Arguments
    /// * `overrides` - Options that take precedence where set
    ///
    /// # Returns
    /// * `CollectionOptions` - Merged options
    pub fn merge(&self, overrides: &CollectionOptions) -> CollectionOptions {
        CollectionOptions {
            read_concern: overrides.read_concern.clone().or_else(|| self.read_concern.clone()),
            read_preference: overrides
                .read_preference
                .clone()
                .or_else(|| self.read_preference.clone()),
            type_map: overrides.type_map.clone().or_else(|| self.type_map.clone()),
            write_concern: overrides
                .write_concern
                .clone()
                .or_else(|| self.write_concern.clone()),
        }
    }
}

/// A MongoDB collection bound to a manager
#[derive(Clone)]
pub struct Collection {
    manager: Arc<dyn Manager>,
    database_name: String,
    collection_name: String,
    read_concern: Option<ReadConcern>,
    read_preference: ReadPreference,
    type_map: Option<TypeMap>,
    write_concern: Option<WriteConcern>,
}

impl Collection {
    /// Create a collection facade
    ///
    /// Options left unset are inherited from the manager's defaults; the read
    /// preference finally defaults to primary.
    ///
    /// # Arguments
    /// * `manager` - Manager used for server selection
    /// * `database_name` - Non-empty database name
    /// * `collection_name` - Non-empty collection name
    /// * `options` - Collection defaults
    pub fn new(
        manager: Arc<dyn Manager>,
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        options: CollectionOptions,
    ) -> Result<Self> {
        let database_name = database_name.into();
        let collection_name = collection_name.into();

        if database_name.is_empty() {
            return Err(OperationError::InvalidArgument(
                "$databaseName is invalid: database name cannot be empty".to_string(),
            ));
        }
        check_collection_name(&collection_name)?;

        let options = manager.defaults().merge(&options);

        Ok(Self {
            manager,
            database_name,
            collection_name,
            read_concern: options.read_concern,
            read_preference: options.read_preference.unwrap_or(ReadPreference::Primary),
            type_map: options.type_map,
            write_concern: options.write_concern,
        })
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Namespace in `"<db>.<collection>"` form
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database_name, self.collection_name)
    }

    pub fn read_concern(&self) -> Option<&ReadConcern> {
        self.read_concern.as_ref()
    }

    pub fn read_preference(&self) -> &ReadPreference {
        &self.read_preference
    }

    pub fn type_map(&self) -> Option<&TypeMap> {
        self.type_map.as_ref()
    }

    pub fn write_concern(&self) -> Option<&WriteConcern> {
        self.write_concern.as_ref()
    }

    /// Options currently in effect for this collection
    pub fn options(&self) -> CollectionOptions {
        CollectionOptions {
            read_concern: self.read_concern.clone(),
            read_preference: Some(self.read_preference.clone()),
            type_map: self.type_map.clone(),
            write_concern: self.write_concern.clone(),
        }
    }

    /// Clone this collection with some options replaced
    pub fn with_options(&self, options: CollectionOptions) -> Result<Collection> {
        Collection::new(
            self.manager.clone(),
            self.database_name.clone(),
            self.collection_name.clone(),
            self.options().merge(&options),
        )
    }

    fn default_write_concern(&self, write_concern: Option<WriteConcern>) -> Option<WriteConcern> {
        write_concern.or_else(|| self.write_concern.clone())
    }

    /// Run an aggregation pipeline
    ///
    /// A pipeline ending in `$out` runs on the primary and does not inherit a
    /// majority read concern from the collection.
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        mut options: AggregateOptions,
    ) -> Result<Cursor> {
        let has_out_stage = is_last_pipeline_operator_out(&pipeline);

        if options.read_preference.is_none() {
            options.read_preference = Some(self.read_preference.clone());
        }

        if options.read_concern.is_none()
            && let Some(read_concern) = &self.read_concern
            && !(has_out_stage && is_majority_read_concern(read_concern))
        {
            options.read_concern = Some(read_concern.clone());
        }

        if options.type_map.is_none() && options.use_cursor.unwrap_or(true) {
            options.type_map = self.type_map.clone();
        }

        let operation = Aggregate::new(
            &self.database_name,
            &self.collection_name,
            pipeline,
            options,
        )?;
        let read_preference = operation
            .read_preference()
            .cloned()
            .unwrap_or(ReadPreference::Primary);
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    /// Run several writes in one batch
    pub async fn bulk_write(
        &self,
        operations: Vec<WriteModel>,
        mut options: BulkWriteOptions,
    ) -> Result<BulkWriteResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = BulkWrite::new(
            &self.database_name,
            &self.collection_name,
            operations,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    /// Count the documents matching a filter
    pub async fn count(&self, filter: Document, mut options: CountOptions) -> Result<i64> {
        if options.read_concern.is_none() {
            options.read_concern = self.read_concern.clone();
        }
        let read_preference = options
            .read_preference
            .get_or_insert_with(|| self.read_preference.clone())
            .clone();

        let operation = Count::new(&self.database_name, &self.collection_name, filter, options)?;
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    /// Distinct values of a field across matching documents
    pub async fn distinct(
        &self,
        field_name: &str,
        filter: Document,
        mut options: DistinctOptions,
    ) -> Result<Vec<Bson>> {
        if options.read_concern.is_none() {
            options.read_concern = self.read_concern.clone();
        }
        let read_preference = options
            .read_preference
            .get_or_insert_with(|| self.read_preference.clone())
            .clone();

        let operation = Distinct::new(
            &self.database_name,
            &self.collection_name,
            field_name,
            filter,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    pub async fn delete_one(
        &self,
        filter: Document,
        mut options: DeleteOptions,
    ) -> Result<DeleteResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = DeleteOne::new(
            &self.database_name,
            &self.collection_name,
            filter,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn delete_many(
        &self,
        filter: Document,
        mut options: DeleteOptions,
    ) -> Result<DeleteResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = DeleteMany::new(
            &self.database_name,
            &self.collection_name,
            filter,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    fn find_defaults(&self, options: &mut FindOptions) -> ReadPreference {
        if options.read_concern.is_none() {
            options.read_concern = self.read_concern.clone();
        }
        if options.type_map.is_none() {
            options.type_map = self.type_map.clone();
        }
        options
            .read_preference
            .get_or_insert_with(|| self.read_preference.clone())
            .clone()
    }

    /// Query documents
    pub async fn find(&self, filter: Document, mut options: FindOptions) -> Result<Cursor> {
        let read_preference = self.find_defaults(&mut options);
        let operation = Find::new(&self.database_name, &self.collection_name, filter, options)?;
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    /// Query the first matching document
    pub async fn find_one(
        &self,
        filter: Document,
        mut options: FindOptions,
    ) -> Result<Option<Document>> {
        let read_preference = self.find_defaults(&mut options);
        let operation = FindOne::new(&self.database_name, &self.collection_name, filter, options)?;
        execute_with(self.manager.as_ref(), &operation, &read_preference).await
    }

    pub async fn find_one_and_delete(
        &self,
        filter: Document,
        mut options: FindOneAndDeleteOptions,
    ) -> Result<Option<Document>> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = FindOneAndDelete::new(
            &self.database_name,
            &self.collection_name,
            filter,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
        mut options: FindOneAndReplaceOptions,
    ) -> Result<Option<Document>> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = FindOneAndReplace::new(
            &self.database_name,
            &self.collection_name,
            filter,
            replacement,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        mut options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = FindOneAndUpdate::new(
            &self.database_name,
            &self.collection_name,
            filter,
            update,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn insert_one(
        &self,
        document: Document,
        mut options: InsertOneOptions,
    ) -> Result<InsertOneResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = InsertOne::new(
            &self.database_name,
            &self.collection_name,
            document,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
        mut options: InsertManyOptions,
    ) -> Result<InsertManyResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = InsertMany::new(
            &self.database_name,
            &self.collection_name,
            documents,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        mut options: UpdateOptions,
    ) -> Result<UpdateResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = ReplaceOne::new(
            &self.database_name,
            &self.collection_name,
            filter,
            replacement,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        mut options: UpdateOptions,
    ) -> Result<UpdateResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = UpdateOne::new(
            &self.database_name,
            &self.collection_name,
            filter,
            update,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        mut options: UpdateOptions,
    ) -> Result<UpdateResult> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = UpdateMany::new(
            &self.database_name,
            &self.collection_name,
            filter,
            update,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    /// Create a single index and return its name
    ///
    /// # Arguments
    /// * `key` - Key pattern, e.g. `{ "a": 1 }`
    /// * `index_options` - Index options such as `unique` or `name`
    pub async fn create_index(
        &self,
        key: Document,
        index_options: Document,
        options: CreateIndexesOptions,
    ) -> Result<String> {
        let mut spec = index_options;
        spec.insert("key", key);

        let names = self.create_indexes(vec![spec], options).await?;
        names.into_iter().next().ok_or_else(|| {
            OperationError::UnexpectedValue("createIndexes returned no index name".to_string())
        })
    }

    /// Create several indexes and return their names
    pub async fn create_indexes(
        &self,
        indexes: Vec<Document>,
        mut options: CreateIndexesOptions,
    ) -> Result<Vec<String>> {
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = CreateIndexes::new(
            &self.database_name,
            &self.collection_name,
            indexes,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    /// Drop this collection
    pub async fn drop(&self, mut options: DropCollectionOptions) -> Result<Document> {
        if options.type_map.is_none() {
            options.type_map = self.type_map.clone();
        }
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = DropCollection::new(&self.database_name, &self.collection_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    /// Drop a single index by name
    ///
    /// `"*"` is rejected; use [`Collection::drop_indexes`] to drop every index.
    pub async fn drop_index(
        &self,
        index_name: &str,
        options: DropIndexesOptions,
    ) -> Result<Document> {
        if index_name == "*" {
            return Err(OperationError::InvalidArgument(
                "dropIndexes() must be used to drop multiple indexes".to_string(),
            ));
        }
        self.run_drop_indexes(index_name, options).await
    }

    /// Drop every index except `_id`
    pub async fn drop_indexes(&self, options: DropIndexesOptions) -> Result<Document> {
        self.run_drop_indexes("*", options).await
    }

    async fn run_drop_indexes(
        &self,
        index_name: &str,
        mut options: DropIndexesOptions,
    ) -> Result<Document> {
        if options.type_map.is_none() {
            options.type_map = self.type_map.clone();
        }
        options.write_concern = self.default_write_concern(options.write_concern);
        let operation = DropIndexes::new(
            &self.database_name,
            &self.collection_name,
            index_name,
            options,
        )?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }

    pub async fn list_indexes(&self, options: ListIndexesOptions) -> Result<IndexInfoStream> {
        let operation = ListIndexes::new(&self.database_name, &self.collection_name, options)?;
        execute_with(self.manager.as_ref(), &operation, &ReadPreference::Primary).await
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("namespace", &self.namespace())
            .field("read_concern", &self.read_concern)
            .field("read_preference", &self.read_preference)
            .field("type_map", &self.type_map)
            .field("write_concern", &self.write_concern)
            .finish()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database_name, self.collection_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockManager, MockServer, assert_invalid_argument};
    use bson::doc;
    use mongodb::options::Acknowledgment;

    fn collection(manager: Arc<MockManager>, options: CollectionOptions) -> Collection {
        Collection::new(manager, "db", "coll", options).unwrap()
    }

    fn majority_write() -> WriteConcern {
        WriteConcern::builder().w(Acknowledgment::Majority).build()
    }

    #[test]
    fn test_empty_names_rejected() {
        let manager = MockManager::new(MockServer::modern());
        assert_invalid_argument(Collection::new(
            manager.clone(),
            "",
            "c",
            CollectionOptions::default(),
        ));
        assert_invalid_argument(Collection::new(manager, "db", "", CollectionOptions::default()));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = CollectionOptions {
            read_concern: Some(ReadConcern::local()),
            write_concern: Some(majority_write()),
            ..Default::default()
        };
        let overrides = CollectionOptions {
            read_concern: Some(ReadConcern::majority()),
            ..Default::default()
        };

        let merged = base.merge(&overrides);
        assert!(merged.read_concern.as_ref().is_some_and(is_majority_read_concern));
        assert!(merged.write_concern.is_some());
        assert!(merged.read_preference.is_none());
    }

    #[test]
    fn test_defaults_inherited_from_manager() {
        let defaults = CollectionOptions {
            read_preference: Some(ReadPreference::Secondary {
                options: Default::default(),
            }),
            write_concern: Some(majority_write()),
            ..Default::default()
        };
        let manager = MockManager::with_defaults(MockServer::modern(), defaults);

        let coll = collection(manager.clone(), CollectionOptions::default());
        assert!(matches!(coll.read_preference(), ReadPreference::Secondary { .. }));
        assert!(coll.write_concern().is_some());
        assert_eq!(coll.namespace(), "db.coll");

        let plain = collection(
            MockManager::new(MockServer::modern()),
            CollectionOptions::default(),
        );
        assert!(matches!(plain.read_preference(), ReadPreference::Primary));
        assert!(plain.read_concern().is_none());
    }

    #[test]
    fn test_with_options_returns_new_collection() {
        let manager = MockManager::new(MockServer::modern());
        let coll = collection(manager, CollectionOptions::default());

        let nearest = coll
            .with_options(CollectionOptions {
                read_preference: Some(ReadPreference::Nearest {
                    options: Default::default(),
                }),
                ..Default::default()
            })
            .unwrap();
        assert!(matches!(nearest.read_preference(), ReadPreference::Nearest { .. }));
        assert!(matches!(coll.read_preference(), ReadPreference::Primary));
        assert_eq!(nearest.to_string(), "db.coll");
    }

    #[tokio::test]
    async fn test_reads_use_collection_read_preference() {
        let server = MockServer::modern().reply(vec![doc! { "n": 3.0, "ok": 1 }]);
        let manager = MockManager::new(server);
        let coll = collection(
            manager.clone(),
            CollectionOptions {
                read_concern: Some(ReadConcern::local()),
                read_preference: Some(ReadPreference::SecondaryPreferred {
                    options: Default::default(),
                }),
                ..Default::default()
            },
        );

        assert_eq!(coll.count(doc! {}, CountOptions::default()).await.unwrap(), 3);
        assert!(matches!(
            manager.last_selection(),
            ReadPreference::SecondaryPreferred { .. }
        ));

        let recorded = manager.server.last_command();
        assert!(matches!(
            recorded.read_preference,
            Some(ReadPreference::SecondaryPreferred { .. })
        ));
        assert_eq!(
            recorded.command.get_document("readConcern").unwrap(),
            &doc! { "level": "local" },
        );
    }

    #[tokio::test]
    async fn test_per_call_options_win() {
        let server = MockServer::modern().reply(vec![doc! { "values": [], "ok": 1 }]);
        let manager = MockManager::new(server);
        let coll = collection(
            manager.clone(),
            CollectionOptions {
                read_concern: Some(ReadConcern::local()),
                ..Default::default()
            },
        );

        let options = DistinctOptions {
            read_concern: Some(ReadConcern::majority()),
            read_preference: Some(ReadPreference::Nearest {
                options: Default::default(),
            }),
            ..Default::default()
        };
        coll.distinct("x", doc! {}, options).await.unwrap();

        assert!(matches!(manager.last_selection(), ReadPreference::Nearest { .. }));
        let command = manager.server.last_command().command;
        assert_eq!(command.get_document("readConcern").unwrap(), &doc! { "level": "majority" });
    }

    #[tokio::test]
    async fn test_writes_select_primary_with_default_write_concern() {
        let manager = MockManager::new(MockServer::modern());
        let coll = collection(
            manager.clone(),
            CollectionOptions {
                read_preference: Some(ReadPreference::Secondary {
                    options: Default::default(),
                }),
                write_concern: Some(majority_write()),
                ..Default::default()
            },
        );

        let result = coll
            .insert_one(doc! { "x": 1 }, InsertOneOptions::default())
            .await
            .unwrap();
        assert!(matches!(result.inserted_id(), Bson::ObjectId(_)));
        assert!(matches!(manager.last_selection(), ReadPreference::Primary));

        let recorded = manager.server.last_bulk_write();
        assert_eq!(recorded.namespace, "db.coll");
        assert!(matches!(
            recorded.write_concern.and_then(|wc| wc.w),
            Some(Acknowledgment::Majority)
        ));
    }

    #[tokio::test]
    async fn test_aggregate_out_skips_default_majority() {
        let manager = MockManager::new(MockServer::modern());
        let coll = collection(
            manager.clone(),
            CollectionOptions {
                read_concern: Some(ReadConcern::majority()),
                read_preference: Some(ReadPreference::Secondary {
                    options: Default::default(),
                }),
                ..Default::default()
            },
        );

        coll.aggregate(
            vec![doc! { "$match": {} }, doc! { "$out": "copy" }],
            AggregateOptions::default(),
        )
        .await
        .unwrap();
        assert!(matches!(manager.last_selection(), ReadPreference::Primary));
        assert!(!manager.server.last_command().command.contains_key("readConcern"));

        coll.aggregate(vec![doc! { "$match": {} }], AggregateOptions::default())
            .await
            .unwrap();
        assert!(matches!(manager.last_selection(), ReadPreference::Secondary { .. }));
        assert!(manager.server.last_command().command.contains_key("readConcern"));
    }

    #[tokio::test]
    async fn test_aggregate_without_cursor_skips_default_type_map() {
        let server = MockServer::modern().reply(vec![doc! { "result": [], "ok": 1 }]);
        let manager = MockManager::new(server);
        let coll = collection(
            manager,
            CollectionOptions {
                type_map: Some(TypeMap::default()),
                ..Default::default()
            },
        );

        let options = AggregateOptions {
            use_cursor: Some(false),
            ..Default::default()
        };
        let cursor = coll.aggregate(vec![doc! { "$match": {} }], options).await.unwrap();
        assert!(cursor.type_map().is_none());
    }

    #[tokio::test]
    async fn test_drop_index_rejects_wildcard() {
        let manager = MockManager::new(MockServer::modern());
        let coll = collection(manager.clone(), CollectionOptions::default());

        let err = coll.drop_index("*", DropIndexesOptions::default()).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(manager.selections.lock().unwrap().is_empty());

        coll.drop_indexes(DropIndexesOptions::default()).await.unwrap();
        assert_eq!(manager.server.last_command().command.get_str("index").unwrap(), "*");
    }

    #[tokio::test]
    async fn test_create_index_returns_generated_name() {
        let manager = MockManager::new(MockServer::modern());
        let coll = collection(manager.clone(), CollectionOptions::default());

        let name = coll
            .create_index(
                doc! { "a": 1, "b": -1 },
                doc! { "unique": true },
                CreateIndexesOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(name, "a_1_b_-1");

        let command = manager.server.last_command().command;
        let index = command.get_array("indexes").unwrap()[0].as_document().unwrap().clone();
        assert!(index.get_bool("unique").unwrap());
        assert_eq!(index.get_str("ns").unwrap(), "db.coll");
    }

    #[tokio::test]
    async fn test_find_one_and_update_selects_primary() {
        let server = MockServer::modern().reply(vec![doc! { "value": null, "ok": 1 }]);
        let manager = MockManager::new(server);
        let coll = collection(manager.clone(), CollectionOptions::default());

        let value = coll
            .find_one_and_update(
                doc! { "_id": 1 },
                doc! { "$set": { "x": 1 } },
                FindOneAndUpdateOptions::default(),
            )
            .await
            .unwrap();
        assert!(value.is_none());
        assert!(matches!(manager.last_selection(), ReadPreference::Primary));
    }

    #[tokio::test]
    async fn test_unacknowledged_delete_many() {
        let manager = MockManager::new(MockServer::modern().unacknowledged());
        let coll = collection(
            manager,
            CollectionOptions {
                write_concern: Some(WriteConcern::builder().w(Acknowledgment::Nodes(0)).build()),
                ..Default::default()
            },
        );

        let result = coll.delete_many(doc! {}, DeleteOptions::default()).await.unwrap();
        assert!(!result.is_acknowledged());
        assert!(result.deleted_count().unwrap_err().is_bad_method_call());
    }
}
