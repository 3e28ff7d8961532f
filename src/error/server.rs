use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Error message a server returns when dropping a collection that does not exist.
pub const NS_NOT_FOUND_MESSAGE: &str = "ns not found";

/// Server error code for a missing collection.
pub const NAMESPACE_NOT_FOUND: i32 = 26;

/// Server error code for a missing database.
pub const DATABASE_NOT_FOUND: i32 = 60;

/// Code recorded when a reply carries no usable error code.
pub const UNKNOWN_ERROR_CODE: i32 = 0;

/// A command failure reported by the server.
///
/// This is intended to be serialized to JSON and consumed by other
/// components (e.g. logging, APIs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    pub code: i32,
    #[serde(rename = "codeName", skip_serializing_if = "Option::is_none")]
    pub code_name: Option<String>,
    #[serde(rename = "errmsg")]
    pub message: String,
}

impl ServerError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            code_name: get_error_name(code),
            message: message.into(),
        }
    }

    /// Build a server error from a command reply with `ok: 0`.
    ///
    /// Returns `None` when the reply reports success.
    pub fn from_reply(reply: &Document) -> Option<Self> {
        let ok = match reply.get("ok") {
            Some(Bson::Double(v)) => *v != 0.0,
            Some(Bson::Int32(v)) => *v != 0,
            Some(Bson::Int64(v)) => *v != 0,
            Some(Bson::Boolean(v)) => *v,
            _ => return None,
        };
        if ok {
            return None;
        }

        let code = match reply.get("code") {
            Some(Bson::Int32(c)) => *c,
            Some(Bson::Int64(c)) => i32::try_from(*c).unwrap_or(UNKNOWN_ERROR_CODE),
            Some(Bson::Double(c)) if c.fract() == 0.0 => {
                i32::try_from(*c as i64).unwrap_or(UNKNOWN_ERROR_CODE)
            }
            _ => UNKNOWN_ERROR_CODE,
        };
        let message = reply.get_str("errmsg").unwrap_or_default().to_string();
        let mut error = Self::new(code, message);
        if let Ok(name) = reply.get_str("codeName") {
            error.code_name = Some(name.to_string());
        }
        Some(error)
    }

    /// Extract a command error from a MongoDB driver error using the driver API.
    pub fn from_driver_error(error: &mongodb::error::Error) -> Option<Self> {
        use mongodb::error::ErrorKind;

        match error.kind.as_ref() {
            ErrorKind::Command(command_error) => Some(Self {
                code: command_error.code,
                code_name: Some(command_error.code_name.clone()),
                message: command_error.message.clone(),
            }),
            _ => None,
        }
    }

    /// Whether the server reported dropping a collection that does not exist.
    pub fn is_ns_not_found(&self) -> bool {
        self.message == NS_NOT_FOUND_MESSAGE
    }

    /// Whether the server reported a missing collection or database.
    pub fn is_namespace_or_database_not_found(&self) -> bool {
        self.code == NAMESPACE_NOT_FOUND || self.code == DATABASE_NOT_FOUND
    }

    /// Convert to compact JSON string (single line).
    pub fn to_json_compact(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code_name {
            Some(name) => write!(f, "{} ({name}, code {})", self.message, self.code),
            None => write!(f, "{} (code {})", self.message, self.code),
        }
    }
}

impl std::error::Error for ServerError {}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        26 => "NamespaceNotFound",
        27 => "IndexNotFound",
        48 => "NamespaceExists",
        50 => "MaxTimeMSExpired",
        60 => "DatabaseNotFound",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_from_reply_failure() {
        let reply = doc! { "ok": 0.0, "errmsg": "ns not found", "code": 26 };
        let error = ServerError::from_reply(&reply).unwrap();
        assert_eq!(error.code, 26);
        assert_eq!(error.code_name.as_deref(), Some("NamespaceNotFound"));
        assert!(error.is_ns_not_found());
        assert!(error.is_namespace_or_database_not_found());
    }

    #[test]
    fn test_from_reply_out_of_range_code() {
        let reply = doc! { "ok": 0, "errmsg": "odd", "code": 4_294_967_322_i64 };
        assert_eq!(ServerError::from_reply(&reply).unwrap().code, UNKNOWN_ERROR_CODE);

        let reply = doc! { "ok": 0, "errmsg": "odd", "code": 27.5 };
        assert_eq!(ServerError::from_reply(&reply).unwrap().code, UNKNOWN_ERROR_CODE);

        let reply = doc! { "ok": 0, "errmsg": "index not found", "code": 27_i64 };
        let error = ServerError::from_reply(&reply).unwrap();
        assert_eq!(error.code, 27);
        assert_eq!(error.code_name.as_deref(), Some("IndexNotFound"));
    }

    #[test]
    fn test_from_reply_success() {
        assert!(ServerError::from_reply(&doc! { "ok": 1 }).is_none());
        assert!(ServerError::from_reply(&doc! { "n": 3 }).is_none());
    }

    #[test]
    fn test_to_json_compact() {
        let error = ServerError::new(60, "database not found");
        let json = error.to_json_compact().unwrap();
        assert_eq!(
            json,
            r#"{"code":60,"codeName":"DatabaseNotFound","errmsg":"database not found"}"#
        );
    }

    #[test]
    fn test_display_without_code_name() {
        let error = ServerError::new(9999, "boom");
        assert_eq!(error.to_string(), "boom (code 9999)");
    }
}
