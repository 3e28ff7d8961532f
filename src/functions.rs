//! Stateless helpers shared by operations

use bson::{Bson, Document};
use mongodb::options::{ReadConcern, ReadConcernLevel, WriteConcern};

use crate::connection::Server;
use crate::error::{OperationError, Result};

/// Generate an index name from a key pattern
///
/// `{a: 1, b: -1}` becomes `"a_1_b_-1"`; string types such as `"text"` or
/// `"2dsphere"` are used as-is.
pub fn generate_index_name(keys: &Document) -> Result<String> {
    let mut parts = Vec::with_capacity(keys.len());

    for (field, value) in keys {
        let order = match value {
            Bson::Int32(v) => v.to_string(),
            Bson::Int64(v) => v.to_string(),
            Bson::Double(v) if v.fract() == 0.0 => format!("{}", *v as i64),
            Bson::Double(v) => v.to_string(),
            Bson::String(s) => s.clone(),
            other => {
                return Err(OperationError::invalid_type(
                    &format!("key pattern value for \"{field}\""),
                    other,
                    "number or string",
                ));
            }
        };
        parts.push(format!("{field}_{order}"));
    }

    Ok(parts.join("_"))
}

/// Whether the first key of a document is an update operator (`$set`, `$inc`, ...)
///
/// Update documents start with an operator; replacement documents do not.
pub fn is_first_key_operator(document: &Document) -> bool {
    document
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

/// Whether the last stage of an aggregation pipeline is `$out`
pub fn is_last_pipeline_operator_out(pipeline: &[Document]) -> bool {
    pipeline
        .last()
        .and_then(|stage| stage.keys().next())
        .is_some_and(|key| key == "$out")
}

/// Convert a read concern to the document embedded in commands
pub fn read_concern_as_document(read_concern: &ReadConcern) -> Result<Document> {
    Ok(bson::to_document(read_concern)?)
}

/// Convert a write concern to the document embedded in commands
pub fn write_concern_as_document(write_concern: &WriteConcern) -> Result<Document> {
    Ok(bson::to_document(write_concern)?)
}

/// Whether a read concern requests majority-committed data
pub fn is_majority_read_concern(read_concern: &ReadConcern) -> bool {
    matches!(read_concern.level, ReadConcernLevel::Majority)
}

/// Whether a server supports a feature introduced at `wire_version`
pub fn server_supports_feature(server: &dyn Server, wire_version: i32) -> bool {
    server.info().supports(wire_version)
}

/// Read an integer from a numeric BSON value
///
/// Servers report counts as int32, int64 or double depending on version.
pub fn bson_as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.is_finite() => Some(*v as i64),
        _ => None,
    }
}

/// Read the `_id` of a document that was inserted with a caller-supplied id
pub fn extract_id_from_inserted_document(document: &Document) -> Result<Bson> {
    document.get("_id").cloned().ok_or_else(|| {
        OperationError::UnexpectedValue("inserted document has no \"_id\" field".to_string())
    })
}
