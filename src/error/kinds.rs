use std::{fmt, io};

use crate::error::server::ServerError;

/// Crate-wide `Result` type using [`OperationError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Top-level error type for MongoDB operations.
///
/// The first three variants are raised by this crate; the rest wrap
/// errors coming from the driver collaborator or from ambient concerns.
#[derive(Debug)]
pub enum OperationError {
    /// Malformed caller input, detected before any server interaction.
    InvalidArgument(String),

    /// The server replied but the reply does not have the expected shape.
    UnexpectedValue(String),

    /// A write result accessor was called on an unacknowledged write.
    BadMethodCall(String),

    /// The server reported a command failure.
    Server(ServerError),

    /// MongoDB driver errors.
    Driver(mongodb::error::Error),

    /// BSON serialization errors.
    BsonSerialization(bson::ser::Error),

    /// BSON deserialization errors.
    BsonDeserialization(bson::de::Error),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl OperationError {
    /// Invalid-argument error for an option or argument of the wrong type.
    pub fn invalid_type(name: &str, value: impl fmt::Debug, expected: &str) -> Self {
        OperationError::InvalidArgument(format!(
            "Expected {name} to have type \"{expected}\" but found {value:?}"
        ))
    }

    /// Access error for a write result accessor that needs acknowledgment.
    pub fn unacknowledged_write_result_access(method: &str) -> Self {
        OperationError::BadMethodCall(format!(
            "{method} should not be called for an unacknowledged write result"
        ))
    }

    /// Whether this error reports malformed caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, OperationError::InvalidArgument(_))
    }

    /// Whether this error reports a malformed server reply.
    pub fn is_unexpected_value(&self) -> bool {
        matches!(self, OperationError::UnexpectedValue(_))
    }

    /// Whether this error reports access to an unacknowledged write result.
    pub fn is_bad_method_call(&self) -> bool {
        matches!(self, OperationError::BadMethodCall(_))
    }

    /// The server error carried by this error, if any.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            OperationError::Server(e) => Some(e),
            _ => None,
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            OperationError::UnexpectedValue(msg) => write!(f, "Unexpected value: {msg}"),
            OperationError::BadMethodCall(msg) => write!(f, "{msg}"),
            OperationError::Server(e) => write!(f, "Server error: {e}"),
            OperationError::Driver(e) => write!(f, "Driver error: {e}"),
            OperationError::BsonSerialization(e) => write!(f, "BSON serialization error: {e}"),
            OperationError::BsonDeserialization(e) => {
                write!(f, "BSON deserialization error: {e}")
            }
            OperationError::Config(e) => write!(f, "Configuration error: {e}"),
            OperationError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OperationError::Server(e) => Some(e),
            OperationError::Driver(e) => Some(e),
            OperationError::BsonSerialization(e) => Some(e),
            OperationError::BsonDeserialization(e) => Some(e),
            OperationError::Config(e) => Some(e),
            OperationError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}

/* ========================= Conversions to OperationError ========================= */

impl From<io::Error> for OperationError {
    fn from(err: io::Error) -> Self {
        OperationError::Io(err)
    }
}

impl From<mongodb::error::Error> for OperationError {
    fn from(err: mongodb::error::Error) -> Self {
        OperationError::Driver(err)
    }
}

impl From<bson::ser::Error> for OperationError {
    fn from(err: bson::ser::Error) -> Self {
        OperationError::BsonSerialization(err)
    }
}

impl From<bson::de::Error> for OperationError {
    fn from(err: bson::de::Error) -> Self {
        OperationError::BsonDeserialization(err)
    }
}

impl From<ServerError> for OperationError {
    fn from(err: ServerError) -> Self {
        OperationError::Server(err)
    }
}

impl From<ConfigError> for OperationError {
    fn from(err: ConfigError) -> Self {
        OperationError::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unacknowledged_access_message() {
        let err = OperationError::unacknowledged_write_result_access("deleted_count");
        assert!(err.is_bad_method_call());
        assert_eq!(
            err.to_string(),
            "deleted_count should not be called for an unacknowledged write result"
        );
    }

    #[test]
    fn test_invalid_type_message() {
        let err = OperationError::invalid_type("$filter", 5, "document");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("\"document\""));
    }

    #[test]
    fn test_server_error_conversion() {
        let err: OperationError = ServerError::new(26, "ns not found").into();
        assert_eq!(err.server_error().map(|e| e.code), Some(26));
        assert!(!err.is_unexpected_value());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "defaults.read_preference".to_string(),
            value: "sometimes".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'sometimes' for field 'defaults.read_preference'"
        );
    }
}
