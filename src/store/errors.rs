//! Store error types
//!
//! Error codes:
//! - KVMODEL_STORE_IO_ERROR (ERROR)
//! - KVMODEL_STORE_WRITE_FAILED (ERROR)
//! - KVMODEL_STORE_READ_FAILED (ERROR)
//! - KVMODEL_STORE_UNAVAILABLE (ERROR)
//! - KVMODEL_STORE_CODEC (ERROR)
//! - KVMODEL_DATA_CORRUPTION (FATAL)

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller may retry
    Error,
    /// Store contents cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Disk I/O failure
    IoError,
    /// Batch commit failed
    WriteFailed,
    /// Store cannot serve requests (poisoned lock, closed handle)
    Unavailable,
    /// Value could not be encoded or decoded
    Codec,
    /// Checksum or framing failure in persisted data
    DataCorruption,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::IoError => "KVMODEL_STORE_IO_ERROR",
            StoreErrorCode::WriteFailed => "KVMODEL_STORE_WRITE_FAILED",
            StoreErrorCode::Unavailable => "KVMODEL_STORE_UNAVAILABLE",
            StoreErrorCode::Codec => "KVMODEL_STORE_CODEC",
            StoreErrorCode::DataCorruption => "KVMODEL_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Disk I/O failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StoreErrorCode::IoError, message)
        }
    }

    /// Batch commit failed with an I/O cause
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StoreErrorCode::WriteFailed, message)
        }
    }

    /// Batch commit failed without an I/O cause
    pub fn write_failed_no_source(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::WriteFailed, message)
    }

    /// Store cannot serve requests
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unavailable, message)
    }

    /// Encoding or decoding failure
    pub fn codec(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Codec, message)
    }

    /// Corruption at a byte offset of a persisted log (FATAL)
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("byte_offset: {}", offset)),
            ..Self::new(StoreErrorCode::DataCorruption, reason)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional details if present
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " caused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
