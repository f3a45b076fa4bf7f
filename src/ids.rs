//! Opaque identifier generation
//!
//! Identifiers are used for record ids and for the disambiguator token of
//! non-unique index entries. They must never contain the key separator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of collision-resistant opaque identifiers
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh identifier
    fn generate(&self) -> String;
}

/// Random v4 UUIDs rendered as 32 lowercase hex characters
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic `<prefix><n>` identifiers, for tests and fixtures
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
