//! Schema error types
//!
//! Every schema error is a configuration error: it is raised while a schema
//! is being defined and is not recoverable at runtime.
//!
//! Error codes:
//! - KVMODEL_SCHEMA_MALFORMED
//! - KVMODEL_SCHEMA_DUPLICATE_FIELD
//! - KVMODEL_SCHEMA_RESERVED_FIELD
//! - KVMODEL_SCHEMA_INVALID_NAME
//! - KVMODEL_SCHEMA_UNKNOWN_DEFAULT
//! - KVMODEL_SCHEMA_IO

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Field configuration is not an object or has bad options
    Malformed,
    /// Same field key declared twice
    DuplicateField,
    /// Caller declared the implicit `id` field
    ReservedField,
    /// Empty name or name containing the key separator
    InvalidName,
    /// Named default provider does not exist
    UnknownDefault,
    /// Schema file could not be read
    Io,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::Malformed => "KVMODEL_SCHEMA_MALFORMED",
            SchemaErrorCode::DuplicateField => "KVMODEL_SCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::ReservedField => "KVMODEL_SCHEMA_RESERVED_FIELD",
            SchemaErrorCode::InvalidName => "KVMODEL_SCHEMA_INVALID_NAME",
            SchemaErrorCode::UnknownDefault => "KVMODEL_SCHEMA_UNKNOWN_DEFAULT",
            SchemaErrorCode::Io => "KVMODEL_SCHEMA_IO",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Configuration error raised while defining a schema
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    entity: Option<String>,
    field: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            entity: None,
            field: None,
        }
    }

    fn on(mut self, entity: &str, field: Option<&str>) -> Self {
        self.entity = Some(entity.to_string());
        self.field = field.map(str::to_string);
        self
    }

    /// Bad field configuration
    pub fn malformed(entity: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let message = match field {
            Some(f) => format!("Field '{}' of '{}' is malformed: {}", f, entity, reason),
            None => format!("Schema '{}' is malformed: {}", entity, reason),
        };
        Self::new(SchemaErrorCode::Malformed, message).on(entity, field)
    }

    /// Field declared twice
    pub fn duplicate_field(entity: &str, field: &str) -> Self {
        Self::new(
            SchemaErrorCode::DuplicateField,
            format!("Field '{}' is declared twice in '{}'", field, entity),
        )
        .on(entity, Some(field))
    }

    /// Caller declared a reserved field
    pub fn reserved_field(entity: &str, field: &str) -> Self {
        Self::new(
            SchemaErrorCode::ReservedField,
            format!("Field '{}' of '{}' is reserved and added implicitly", field, entity),
        )
        .on(entity, Some(field))
    }

    /// Entity or field name cannot be used as a key token
    pub fn invalid_name(entity: &str, field: Option<&str>, reason: impl Into<String>) -> Self {
        let name = field.unwrap_or(entity);
        Self::new(
            SchemaErrorCode::InvalidName,
            format!("Name '{}' is invalid: {}", name, reason.into()),
        )
        .on(entity, field)
    }

    /// Named default provider not found
    pub fn unknown_default(entity: &str, field: &str, name: &str) -> Self {
        Self::new(
            SchemaErrorCode::UnknownDefault,
            format!("Field '{}' of '{}' names unknown default '{}'", field, entity, name),
        )
        .on(entity, Some(field))
    }

    /// Schema file could not be read or parsed
    pub fn io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::Io,
            format!("Schema file '{}': {}", path.into(), reason.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Entity the error refers to, if known
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Field the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Schema errors are always fatal at definition time
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
