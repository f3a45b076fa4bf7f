//! Model error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for record operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors from constructing, validating, saving, deleting or looking up records
#[derive(Debug, Error)]
pub enum ModelError {
    // ==================
    // Validation
    // ==================
    /// A required field is blank
    #[error(".{0} required")]
    MissingField(String),

    /// A unique field value is already taken
    #[error(".{0} not unique")]
    NotUnique(String),

    /// A value would be split by the key separator
    #[error("value of .{field} contains the key separator")]
    InvalidKeyToken { field: String },

    /// Arrays and objects have no key form
    #[error("value of .{0} cannot be used in a key")]
    UnindexableValue(String),

    // ==================
    // Record shape
    // ==================
    /// Key not declared by the schema
    #[error("'{field}' is not a field of '{entity}'")]
    UnknownField { entity: String, field: String },

    /// Record data must be a JSON object
    #[error("record data for '{entity}' must be an object")]
    NotAnObject { entity: String },

    /// The id of a persisted record was changed
    #[error("id of a persisted '{entity}' cannot change")]
    ImmutableId { entity: String },

    /// Record handed to the model of another entity
    #[error("record of '{actual}' passed to model of '{expected}'")]
    SchemaMismatch { expected: String, actual: String },

    /// Delete of a record that was never saved
    #[error("'{entity}' record has never been saved")]
    NotPersisted { entity: String },

    /// No accessor is generated for this field and lookup shape
    #[error("'{entity}' has no {shape} accessor for .{field}")]
    NoAccessor {
        entity: String,
        field: String,
        shape: &'static str,
    },

    // ==================
    // Store
    // ==================
    /// A store entry does not have the expected shape
    #[error("corrupt entry at '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },

    /// The store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::MissingField(_) => "KVMODEL_MISSING_FIELD",
            ModelError::NotUnique(_) => "KVMODEL_NOT_UNIQUE",
            ModelError::InvalidKeyToken { .. } => "KVMODEL_INVALID_KEY_TOKEN",
            ModelError::UnindexableValue(_) => "KVMODEL_UNINDEXABLE_VALUE",
            ModelError::UnknownField { .. } => "KVMODEL_UNKNOWN_FIELD",
            ModelError::NotAnObject { .. } => "KVMODEL_NOT_AN_OBJECT",
            ModelError::ImmutableId { .. } => "KVMODEL_IMMUTABLE_ID",
            ModelError::SchemaMismatch { .. } => "KVMODEL_SCHEMA_MISMATCH",
            ModelError::NotPersisted { .. } => "KVMODEL_NOT_PERSISTED",
            ModelError::NoAccessor { .. } => "KVMODEL_NO_ACCESSOR",
            ModelError::CorruptEntry { .. } => "KVMODEL_CORRUPT_ENTRY",
            ModelError::Store(e) => e.code().code(),
        }
    }

    /// Whether the record itself was rejected (as opposed to a store failure)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModelError::MissingField(_)
                | ModelError::NotUnique(_)
                | ModelError::InvalidKeyToken { .. }
                | ModelError::UnindexableValue(_)
        )
    }

    /// Field the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ModelError::MissingField(f)
            | ModelError::NotUnique(f)
            | ModelError::UnindexableValue(f) => Some(f.as_str()),
            ModelError::InvalidKeyToken { field }
            | ModelError::UnknownField { field, .. }
            | ModelError::NoAccessor { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}
