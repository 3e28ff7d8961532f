//! Configuration management for mongo-ops
//!
//! This module loads the client-wide defaults handed out by a `Manager`:
//! - Default read concern, read preference and write concern
//! - Logging level and format
//!
//! Configuration is read from a TOML file; every field has a default, so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mongodb::options::{Acknowledgment, ReadConcern, ReadPreference, WriteConcern};

use crate::collection::CollectionOptions;
use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default concerns for clients, databases and collections
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default concerns inherited by every facade
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Read concern level (local, majority, linearizable, available, snapshot)
    #[serde(default)]
    pub read_concern: Option<String>,

    /// Read preference mode (primary, primaryPreferred, secondary, secondaryPreferred, nearest)
    #[serde(default)]
    pub read_preference: Option<String>,

    /// Write concern
    #[serde(default)]
    pub write_concern: Option<WriteConcernConfig>,
}

/// Write concern settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteConcernConfig {
    /// Number of nodes, `"majority"` or a custom tag set name
    #[serde(default)]
    pub w: Option<WriteAcknowledgment>,

    /// Wait for the journal commit
    #[serde(default)]
    pub journal: Option<bool>,

    /// Acknowledgment timeout in milliseconds
    #[serde(default)]
    pub w_timeout_ms: Option<u64>,
}

/// The `w` field of a write concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WriteAcknowledgment {
    Nodes(u32),
    Tag(String),
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded and validated configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mongo-ops")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        self.defaults.to_collection_options().map(|_| ())
    }
}

impl DefaultsConfig {
    /// Convert the configured defaults into facade options
    ///
    /// # Returns
    /// * `Result<CollectionOptions>` - Options for `Manager::defaults`, or an
    ///   invalid-value error naming the offending field
    pub fn to_collection_options(&self) -> Result<CollectionOptions> {
        let read_concern = self
            .read_concern
            .as_deref()
            .map(parse_read_concern)
            .transpose()?;

        let read_preference = self
            .read_preference
            .as_deref()
            .map(parse_read_preference)
            .transpose()?;

        let write_concern = self
            .write_concern
            .as_ref()
            .map(WriteConcernConfig::to_write_concern)
            .transpose()?;

        Ok(CollectionOptions {
            read_concern,
            read_preference,
            type_map: None,
            write_concern,
        })
    }
}

impl WriteConcernConfig {
    pub fn to_write_concern(&self) -> Result<WriteConcern> {
        let w = match &self.w {
            None => None,
            Some(WriteAcknowledgment::Nodes(n)) => Some(Acknowledgment::Nodes(*n)),
            Some(WriteAcknowledgment::Tag(tag)) if tag == "majority" => {
                Some(Acknowledgment::Majority)
            }
            Some(WriteAcknowledgment::Tag(tag)) if tag.is_empty() => {
                return Err(invalid_value("defaults.write_concern.w", tag));
            }
            Some(WriteAcknowledgment::Tag(tag)) => Some(Acknowledgment::Custom(tag.clone())),
        };

        let mut write_concern = WriteConcern::default();
        write_concern.w = w;
        write_concern.journal = self.journal;
        write_concern.w_timeout = self.w_timeout_ms.map(Duration::from_millis);
        Ok(write_concern)
    }
}

fn invalid_value(field: &str, value: &str) -> crate::error::OperationError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn parse_read_concern(level: &str) -> Result<ReadConcern> {
    match level {
        "local" => Ok(ReadConcern::local()),
        "majority" => Ok(ReadConcern::majority()),
        "linearizable" => Ok(ReadConcern::linearizable()),
        "available" => Ok(ReadConcern::available()),
        "snapshot" => Ok(ReadConcern::snapshot()),
        other => Err(invalid_value("defaults.read_concern", other)),
    }
}

fn parse_read_preference(mode: &str) -> Result<ReadPreference> {
    match mode {
        "primary" => Ok(ReadPreference::Primary),
        "primaryPreferred" => Ok(ReadPreference::PrimaryPreferred {
            options: Default::default(),
        }),
        "secondary" => Ok(ReadPreference::Secondary {
            options: Default::default(),
        }),
        "secondaryPreferred" => Ok(ReadPreference::SecondaryPreferred {
            options: Default::default(),
        }),
        "nearest" => Ok(ReadPreference::Nearest {
            options: Default::default(),
        }),
        other => Err(invalid_value("defaults.read_preference", other)),
    }
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
