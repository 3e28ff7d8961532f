//! Cursor over documents returned by the server
//!
//! A [`Cursor`] is a stream of decoded documents. Server implementations
//! build one from whatever transport they use; the operation layer also
//! builds in-memory cursors when a legacy command returns its documents
//! inline.

use std::pin::Pin;
use std::task::{Context, Poll};

use bson::Document;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Describes how the driver should decode BSON documents and arrays.
///
/// The values are opaque to this crate and interpreted by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMap {
    /// Type used for top-level documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Type used for embedded documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    /// Type used for embedded arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<String>,
}

impl TypeMap {
    /// Type map decoding every level with the given type names.
    pub fn new(
        root: impl Into<String>,
        document: impl Into<String>,
        array: impl Into<String>,
    ) -> Self {
        Self {
            root: Some(root.into()),
            document: Some(document.into()),
            array: Some(array.into()),
        }
    }
}

/// Stream of documents produced by a command or query.
pub struct Cursor {
    /// Underlying document stream
    inner: BoxStream<'static, Result<Document>>,

    /// Type map applied to decoded documents
    type_map: Option<TypeMap>,
}

impl Cursor {
    /// Create a cursor over a driver-provided stream
    pub fn new(inner: BoxStream<'static, Result<Document>>) -> Self {
        Self {
            inner,
            type_map: None,
        }
    }

    /// Create a cursor over documents already held in memory
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::new(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    /// Create a cursor that yields nothing
    pub fn empty() -> Self {
        Self::from_documents(Vec::new())
    }

    /// Apply a type map to documents decoded by this cursor
    pub fn set_type_map(&mut self, type_map: TypeMap) {
        self.type_map = Some(type_map);
    }

    /// Type map applied to this cursor, if any
    pub fn type_map(&self) -> Option<&TypeMap> {
        self.type_map.as_ref()
    }

    /// Read the first document and discard the rest
    pub async fn first(mut self) -> Result<Option<Document>> {
        self.inner.next().await.transpose()
    }

    /// Drain the cursor into a vector
    pub async fn to_vec(self) -> Result<Vec<Document>> {
        let documents: Vec<Result<Document>> = self.inner.collect().await;
        documents.into_iter().collect()
    }
}

impl Stream for Cursor {
    type Item = Result<Document>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("type_map", &self.type_map)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_in_memory_cursor() {
        let cursor = Cursor::from_documents(vec![doc! { "a": 1 }, doc! { "a": 2 }]);
        let docs: Vec<Document> = cursor.try_collect().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].get_i32("a").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_first_on_empty_cursor() {
        assert!(Cursor::empty().first().await.unwrap().is_none());
    }

    #[test]
    fn test_type_map_is_recorded() {
        let mut cursor = Cursor::empty();
        assert!(cursor.type_map().is_none());
        cursor.set_type_map(TypeMap::new("document", "document", "array"));
        assert_eq!(cursor.type_map().unwrap().array.as_deref(), Some("array"));
    }
}
