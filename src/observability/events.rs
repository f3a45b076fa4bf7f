//! Observable events
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of a log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in kvmodel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema
    /// Field descriptor set built for an entity
    SchemaBuilt,
    /// Schema definitions loaded from disk
    SchemasLoaded,
    /// Field option key not recognised; ignored
    UnknownFieldOption,

    // Records
    /// Record constructed in memory
    RecordCreated,
    /// Save begins
    SaveStart,
    /// Save committed
    SaveComplete,
    /// Save rejected by validation or the store
    SaveRejected,
    /// Unique index entries removed
    DeleteComplete,
    /// Accessor lookup executed
    Lookup,

    // Store
    /// Write batch committed
    BatchCommitted,
    /// Store opened (and replayed, for file stores)
    StoreOpened,
    /// Torn trailing batch discarded during replay
    StoreTailTruncated,
    /// Checksum failure during replay
    StoreCorruption,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaBuilt => "SCHEMA_BUILT",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::UnknownFieldOption => "UNKNOWN_FIELD_OPTION",
            Event::RecordCreated => "RECORD_CREATED",
            Event::SaveStart => "SAVE_BEGIN",
            Event::SaveComplete => "SAVE_COMPLETE",
            Event::SaveRejected => "SAVE_REJECTED",
            Event::DeleteComplete => "DELETE_COMPLETE",
            Event::Lookup => "LOOKUP",
            Event::BatchCommitted => "BATCH_COMMITTED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreTailTruncated => "STORE_TAIL_TRUNCATED",
            Event::StoreCorruption => "STORE_CORRUPTION",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreOpened | Event::SchemasLoaded => Severity::Info,
            Event::StoreTailTruncated | Event::UnknownFieldOption => Severity::Warn,
            Event::StoreCorruption => Severity::Fatal,
            _ => Severity::Trace,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
