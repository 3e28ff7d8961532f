use std::fmt;

use bson::{Bson, Document};

use crate::error::{OperationError, Result};
use crate::functions::generate_index_name;

/// Index specification sent to `createIndexes` or `system.indexes`.
///
/// A missing `name` is generated from the key pattern and a missing `ns`
/// defaults to the owning collection's namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInput {
    spec: Document,
}

impl IndexInput {
    /// Validate an index specification
    ///
    /// # Arguments
    /// * `spec` - Document holding `key` plus index options
    /// * `namespace` - Namespace used when `spec` has no `ns`
    pub fn new(spec: Document, namespace: &str) -> Result<Self> {
        let key = match spec.get("key") {
            Some(Bson::Document(key)) => key.clone(),
            Some(other) => {
                return Err(OperationError::invalid_type("\"key\" option", other, "document"));
            }
            None => {
                return Err(OperationError::InvalidArgument(
                    "Required \"key\" document is missing from index specification".to_string(),
                ));
            }
        };
        if key.is_empty() {
            return Err(OperationError::InvalidArgument(
                "Index key pattern must not be empty".to_string(),
            ));
        }

        let name = match spec.get("name") {
            Some(Bson::String(name)) => name.clone(),
            Some(other) => {
                return Err(OperationError::invalid_type("\"name\" option", other, "string"));
            }
            None => generate_index_name(&key)?,
        };

        let ns = match spec.get("ns") {
            Some(Bson::String(ns)) => ns.clone(),
            Some(other) => {
                return Err(OperationError::invalid_type("\"ns\" option", other, "string"));
            }
            None => namespace.to_string(),
        };

        // key, name and ns lead the document; the remaining options follow in order
        let mut normalized = Document::new();
        normalized.insert("key", key);
        normalized.insert("name", name);
        normalized.insert("ns", ns);
        for (field, value) in spec {
            if !matches!(field.as_str(), "key" | "name" | "ns") {
                normalized.insert(field, value);
            }
        }

        Ok(Self { spec: normalized })
    }

    pub fn name(&self) -> &str {
        self.spec.get_str("name").unwrap_or_default()
    }

    pub fn key(&self) -> Option<&Document> {
        self.spec.get_document("key").ok()
    }

    pub fn namespace(&self) -> &str {
        self.spec.get_str("ns").unwrap_or_default()
    }

    pub fn as_document(&self) -> &Document {
        &self.spec
    }

    pub fn into_document(self) -> Document {
        self.spec
    }
}

impl fmt::Display for IndexInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_defaults_name_and_namespace() {
        let input = IndexInput::new(doc! { "key": { "a": 1, "b": -1 }, "unique": true }, "db.coll")
            .unwrap();
        assert_eq!(input.name(), "a_1_b_-1");
        assert_eq!(input.namespace(), "db.coll");
        let expected = doc! {
            "key": { "a": 1, "b": -1 },
            "name": "a_1_b_-1",
            "ns": "db.coll",
            "unique": true,
        };
        assert_eq!(input.as_document(), &expected);
    }

    #[test]
    fn test_explicit_name_and_namespace_win() {
        let input = IndexInput::new(
            doc! { "key": { "x": 1 }, "name": "by_x", "ns": "other.coll" },
            "db.coll",
        )
        .unwrap();
        assert_eq!(input.to_string(), "by_x");
        assert_eq!(input.namespace(), "other.coll");
    }

    #[test]
    fn test_missing_or_invalid_key() {
        assert!(IndexInput::new(doc! { "name": "x" }, "db.c").unwrap_err().is_invalid_argument());
        assert!(IndexInput::new(doc! { "key": 1 }, "db.c").unwrap_err().is_invalid_argument());
        assert!(IndexInput::new(doc! { "key": {} }, "db.c").unwrap_err().is_invalid_argument());
        assert!(
            IndexInput::new(doc! { "key": { "x": 1 }, "name": 5 }, "db.c")
                .unwrap_err()
                .is_invalid_argument()
        );
    }
}
