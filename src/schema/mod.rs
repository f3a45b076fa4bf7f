//! Schema definition
//!
//! Turns caller field configuration into an ordered field descriptor set,
//! once per entity, at definition time. Every schema gains an implicit `id`
//! field (unique, indexed, defaulting to a fresh opaque id).
//!
//! # Design Principles
//!
//! - Explicit construction: schemas are values held by the caller, there is
//!   no process-wide registry
//! - Fail at definition time: malformed configuration never reaches a save
//! - Names are key tokens: entity and field names may not contain the key
//!   separator

mod defaults;
mod errors;
mod loader;
mod types;

pub use defaults::DefaultValue;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{FieldDescriptor, FieldOptions, Schema, SchemaBuilder};
