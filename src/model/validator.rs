//! Record validation
//!
//! Two phases, in order:
//!
//! 1. Required: every `required` field must be non-blank. Fields are checked
//!    in schema order and the first blank one is reported. No store access.
//! 2. Uniqueness (new records only): one point lookup per `unique` field,
//!    indexed or not, against `<entity>!<field>!<value>`. All lookups are
//!    issued together and awaited together; results are then inspected in
//!    schema order and the first taken value is reported.
//!
//! Persisted records skip phase 2, so an update never fails on uniqueness.

use futures_util::future::join_all;

use super::errors::{ModelError, ModelResult};
use super::record::Record;
use super::value::{is_blank, key_token};
use crate::keys;
use crate::schema::Schema;
use crate::store::KvStore;

/// Validates records of one schema against one store
pub struct Validator<'a> {
    schema: &'a Schema,
    store: &'a dyn KvStore,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a Schema, store: &'a dyn KvStore) -> Self {
        Self { schema, store }
    }

    /// Runs both phases.
    pub async fn validate(&self, record: &Record) -> ModelResult<()> {
        self.check_required(record)?;
        if record.is_new() {
            self.check_unique(record).await?;
        }
        Ok(())
    }

    /// Phase 1.
    pub fn check_required(&self, record: &Record) -> ModelResult<()> {
        for field in self.schema.fields().iter().filter(|f| f.required) {
            if is_blank(record.get(&field.key)) {
                return Err(ModelError::MissingField(field.key.clone()));
            }
        }
        Ok(())
    }

    /// Phase 2, regardless of whether the record is new.
    pub async fn check_unique(&self, record: &Record) -> ModelResult<()> {
        let entity = self.schema.entity();

        // Tokenize everything first so a bad value fails before any I/O.
        let mut probes: Vec<(&str, String)> = Vec::new();
        for field in self.schema.unique_fields() {
            let Some(value) = record.get(&field.key) else {
                continue;
            };
            if let Some(token) = key_token(&field.key, value)? {
                probes.push((field.key.as_str(), keys::unique_key(entity, &field.key, &token)));
            }
        }

        let results = join_all(probes.iter().map(|(_, key)| self.store.get(key))).await;

        for ((field, _), result) in probes.iter().zip(results) {
            if result?.is_some() {
                return Err(ModelError::NotUnique(field.to_string()));
            }
        }
        Ok(())
    }
}
