//! Typed views over index, collection and database descriptions
//!
//! - [`IndexInput`]: validated index specification for index creation
//! - [`IndexInfo`], [`CollectionInfo`], [`DatabaseInfo`]: documents returned
//!   by the list operations, with accessors for the common fields

pub mod index_input;

use bson::{Bson, Document};

use crate::functions::bson_as_i64;

pub use index_input::IndexInput;

/// Description of an index as returned by `listIndexes` or `system.indexes`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    info: Document,
}

impl IndexInfo {
    pub fn new(info: Document) -> Self {
        Self { info }
    }

    pub fn name(&self) -> Option<&str> {
        self.info.get_str("name").ok()
    }

    pub fn key(&self) -> Option<&Document> {
        self.info.get_document("key").ok()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.info.get_str("ns").ok()
    }

    pub fn version(&self) -> Option<i64> {
        self.info.get("v").and_then(bson_as_i64)
    }

    pub fn is_unique(&self) -> bool {
        self.info.get_bool("unique").unwrap_or(false)
    }

    pub fn is_sparse(&self) -> bool {
        self.info.get_bool("sparse").unwrap_or(false)
    }

    /// Whether documents expire through this index
    pub fn is_ttl(&self) -> bool {
        self.info.contains_key("expireAfterSeconds")
    }

    pub fn as_document(&self) -> &Document {
        &self.info
    }

    pub fn into_document(self) -> Document {
        self.info
    }
}

/// Description of a collection as returned by `listCollections`
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    info: Document,
}

impl CollectionInfo {
    pub fn new(info: Document) -> Self {
        Self { info }
    }

    pub fn name(&self) -> Option<&str> {
        self.info.get_str("name").ok()
    }

    /// Collection options; empty when the server reported none
    pub fn options(&self) -> Document {
        self.info.get_document("options").cloned().unwrap_or_default()
    }

    pub fn is_capped(&self) -> bool {
        self.info
            .get_document("options")
            .ok()
            .and_then(|options| options.get_bool("capped").ok())
            .unwrap_or(false)
    }

    /// Maximum number of documents for a capped collection
    pub fn capped_max(&self) -> Option<i64> {
        self.option_i64("max")
    }

    /// Maximum size in bytes for a capped collection
    pub fn capped_size(&self) -> Option<i64> {
        self.option_i64("size")
    }

    fn option_i64(&self, key: &str) -> Option<i64> {
        self.info
            .get_document("options")
            .ok()
            .and_then(|options| options.get(key))
            .and_then(bson_as_i64)
    }

    pub fn as_document(&self) -> &Document {
        &self.info
    }

    pub fn into_document(self) -> Document {
        self.info
    }
}

/// Description of a database as returned by `listDatabases`
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    info: Document,
}

impl DatabaseInfo {
    pub fn new(info: Document) -> Self {
        Self { info }
    }

    pub fn name(&self) -> Option<&str> {
        self.info.get_str("name").ok()
    }

    pub fn size_on_disk(&self) -> Option<i64> {
        self.info.get("sizeOnDisk").and_then(bson_as_i64)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.info.get("empty"), Some(Bson::Boolean(true)))
    }

    pub fn as_document(&self) -> &Document {
        &self.info
    }

    pub fn into_document(self) -> Document {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_index_info() {
        let info = IndexInfo::new(doc! {
            "v": 1,
            "key": { "created": 1 },
            "name": "created_1",
            "ns": "db.events",
            "expireAfterSeconds": 3600,
        });
        assert_eq!(info.name(), Some("created_1"));
        assert_eq!(info.namespace(), Some("db.events"));
        assert_eq!(info.version(), Some(1));
        assert!(info.is_ttl());
        assert!(!info.is_unique());
        assert!(!info.is_sparse());
    }

    #[test]
    fn test_collection_info() {
        let info = CollectionInfo::new(doc! {
            "name": "log",
            "options": { "capped": true, "size": 4096.0, "max": 100 },
        });
        assert_eq!(info.name(), Some("log"));
        assert!(info.is_capped());
        assert_eq!(info.capped_size(), Some(4096));
        assert_eq!(info.capped_max(), Some(100));

        let plain = CollectionInfo::new(doc! { "name": "users" });
        assert!(!plain.is_capped());
        assert!(plain.options().is_empty());
    }

    #[test]
    fn test_database_info() {
        let info =
            DatabaseInfo::new(doc! { "name": "local", "sizeOnDisk": 65536.0, "empty": false });
        assert_eq!(info.name(), Some("local"));
        assert_eq!(info.size_on_disk(), Some(65536));
        assert!(!info.is_empty());
    }
}
