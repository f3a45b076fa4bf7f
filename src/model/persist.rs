//! Save and delete batch construction
//!
//! For a record with id `I`, a save writes one entry per indexed field:
//!
//! ```text
//! id              <entity>!id!I                -> canonical record
//! unique field    <entity>!<field>!<value>     -> I
//! other indexed   <entity>!<field>!<value>!<d> -> I   (d fresh per save)
//! ```
//!
//! A delete removes the secondary entries of indexed unique fields only.
//! The primary entry and non-unique entries stay behind, so `byId` and
//! non-unique lookups still resolve a deleted record.

use std::sync::Arc;

use serde_json::Value;

use super::errors::{ModelError, ModelResult};
use super::record::Record;
use super::value::{is_blank, key_token};
use crate::keys::{self, ID_FIELD};
use crate::store::WriteBatch;

/// Fills blank fields that carry a default, in schema order.
///
/// Each provider sees the record with the defaults of earlier fields already
/// applied. Non-blank values are never overwritten.
pub fn apply_defaults(record: &mut Record) {
    let schema = Arc::clone(record.schema());
    for field in schema.fields() {
        let Some(default) = &field.default else {
            continue;
        };
        if is_blank(record.get(&field.key)) {
            let value = default.provide(record);
            record.assign(&field.key, value);
        }
    }
}

/// Batch writing every indexed entry of `record`.
///
/// Defaults must already be applied; a record without an id is refused.
pub fn save_batch(record: &Record) -> ModelResult<WriteBatch> {
    let schema = record.schema();
    let entity = schema.entity();

    let id_value = record.get(ID_FIELD).cloned().unwrap_or(Value::Null);
    if key_token(ID_FIELD, &id_value)?.is_none() {
        return Err(ModelError::MissingField(ID_FIELD.to_string()));
    }

    let mut batch = WriteBatch::new();
    for field in schema.indexed_fields() {
        let Some(value) = record.get(&field.key) else {
            continue;
        };
        let Some(token) = key_token(&field.key, value)? else {
            continue;
        };

        if field.is_id() {
            batch.put(
                keys::primary_key(entity, &token),
                Value::Object(record.to_canonical()),
            );
        } else if field.unique {
            batch.put(
                keys::unique_key(entity, &field.key, &token),
                id_value.clone(),
            );
        } else {
            let disambiguator = schema.generate_id();
            batch.put(
                keys::non_unique_key(entity, &field.key, &token, &disambiguator),
                id_value.clone(),
            );
        }
    }
    Ok(batch)
}

/// Batch removing the unique secondary entries of `record`.
pub fn delete_batch(record: &Record) -> ModelResult<WriteBatch> {
    let schema = record.schema();
    let entity = schema.entity();

    let mut batch = WriteBatch::new();
    for field in schema.indexed_fields().filter(|f| f.unique && !f.is_id()) {
        let Some(value) = record.get(&field.key) else {
            continue;
        };
        if let Some(token) = key_token(&field.key, value)? {
            batch.delete(keys::unique_key(entity, &field.key, &token));
        }
    }
    Ok(batch)
}
