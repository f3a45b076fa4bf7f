//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::model::ModelError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Schema definitions could not be loaded
    SchemaError,
    /// Store could not be opened or failed
    StoreError,
    /// Entity not defined in the schema directory
    UnknownEntity,
    /// Accessor not generated for the entity
    UnknownAccessor,
    /// Record rejected or lookup failed
    RecordError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "KVMODEL_CLI_CONFIG_ERROR",
            Self::IoError => "KVMODEL_CLI_IO_ERROR",
            Self::SchemaError => "KVMODEL_CLI_SCHEMA_ERROR",
            Self::StoreError => "KVMODEL_CLI_STORE_ERROR",
            Self::UnknownEntity => "KVMODEL_CLI_UNKNOWN_ENTITY",
            Self::UnknownAccessor => "KVMODEL_CLI_UNKNOWN_ACCESSOR",
            Self::RecordError => "KVMODEL_CLI_RECORD_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn unknown_entity(entity: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownEntity,
            format!("No schema defines entity '{}'", entity),
        )
    }

    pub fn unknown_accessor(entity: &str, accessor: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownAccessor,
            format!("Entity '{}' has no accessor '{}'", entity, accessor),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

impl From<ModelError> for CliError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Store(inner) => inner.into(),
            other => Self::new(
                CliErrorCode::RecordError,
                format!("{}: {}", other.code(), other),
            ),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
