//! Generated lookups
//!
//! Every indexed field gets one accessor named `by<Field>`:
//!
//! - `id`: point read of the primary entry
//! - unique field: point read of `<entity>!<field>!<value>`, then the primary
//! - other indexed field: prefix scan of `<entity>!<field>!<value>!`, then one
//!   primary read per distinct id, issued together
//!
//! Ids whose primary entry is missing are skipped. A `null` lookup value has
//! no key form and matches nothing.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;

use super::entity::Model;
use super::errors::{ModelError, ModelResult};
use super::record::Record;
use super::value::key_token;
use crate::keys;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Schema;
use crate::store::KvStore;

/// Result of an accessor call
#[derive(Debug, Clone)]
pub enum Lookup {
    /// `id` and unique accessors resolve to at most one record
    One(Option<Record>),
    /// Non-unique accessors resolve to every matching record, in key order
    Many(Vec<Record>),
}

impl Lookup {
    pub fn into_many(self) -> Vec<Record> {
        match self {
            Lookup::One(record) => record.into_iter().collect(),
            Lookup::Many(records) => records,
        }
    }

    /// Number of records found
    pub fn len(&self) -> usize {
        match self {
            Lookup::One(record) => usize::from(record.is_some()),
            Lookup::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lookup by one indexed field
#[derive(Clone)]
pub struct Accessor {
    model: Model,
    name: String,
    field: String,
    unique: bool,
}

impl Accessor {
    pub(crate) fn new(model: Model, name: String, field: String, unique: bool) -> Self {
        Self {
            model,
            name,
            field,
            unique,
        }
    }

    /// `by<Field>`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether the accessor resolves to at most one record
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Runs the lookup for `value`.
    pub async fn call(&self, value: &Value) -> ModelResult<Lookup> {
        let schema = self.model.schema();
        let store: &dyn KvStore = self.model.store().as_ref();

        let lookup = if self.unique {
            Lookup::One(lookup_unique(schema, store, &self.field, value).await?)
        } else {
            Lookup::Many(lookup_many(schema, store, &self.field, value).await?)
        };

        self.model.metrics().record_lookup(lookup.len() as u64);
        log_event_with_fields(
            Event::Lookup,
            &[
                ("entity", schema.entity()),
                ("accessor", &self.name),
                ("found", &lookup.len().to_string()),
            ],
        );
        Ok(lookup)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("entity", &self.model.entity())
            .field("name", &self.name)
            .field("unique", &self.unique)
            .finish()
    }
}

/// Reads the primary entry for `id`.
pub async fn lookup_primary(
    schema: &Arc<Schema>,
    store: &dyn KvStore,
    id: &str,
) -> ModelResult<Option<Record>> {
    let key = keys::primary_key(schema.entity(), id);
    match store.get(&key).await? {
        None => Ok(None),
        Some(Value::Object(data)) => Ok(Some(Record::new(Arc::clone(schema), data))),
        Some(other) => Err(ModelError::CorruptEntry {
            key,
            reason: format!("expected a record object, found {}", kind_of(&other)),
        }),
    }
}

/// Resolves a unique field value (or an id) to its record.
pub async fn lookup_unique(
    schema: &Arc<Schema>,
    store: &dyn KvStore,
    field: &str,
    value: &Value,
) -> ModelResult<Option<Record>> {
    let Some(token) = key_token(field, value)? else {
        return Ok(None);
    };
    if field == keys::ID_FIELD {
        return lookup_primary(schema, store, &token).await;
    }

    let key = keys::unique_key(schema.entity(), field, &token);
    let Some(id) = store.get(&key).await? else {
        return Ok(None);
    };
    let id = id_token(&key, &id)?;
    lookup_primary(schema, store, &id).await
}

/// Resolves a non-unique field value to every matching record.
pub async fn lookup_many(
    schema: &Arc<Schema>,
    store: &dyn KvStore,
    field: &str,
    value: &Value,
) -> ModelResult<Vec<Record>> {
    let Some(token) = key_token(field, value)? else {
        return Ok(Vec::new());
    };

    let prefix = keys::scan_prefix(schema.entity(), field, &token);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for id in store.scan(&prefix).await? {
        let id = id_token(&prefix, &id)?;
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    let results = join_all(ids.iter().map(|id| lookup_primary(schema, store, id))).await;
    let mut records = Vec::with_capacity(results.len());
    for result in results {
        if let Some(record) = result? {
            records.push(record);
        }
    }
    Ok(records)
}

fn id_token(key: &str, value: &Value) -> ModelResult<String> {
    match key_token(keys::ID_FIELD, value) {
        Ok(Some(id)) => Ok(id),
        _ => Err(ModelError::CorruptEntry {
            key: key.to_string(),
            reason: format!("expected a record id, found {}", kind_of(value)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldOptions;
    use crate::store::{MemoryStore, WriteBatch};
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("user")
                .field("name", FieldOptions::new().unique().index())
                .field("team", FieldOptions::new().index())
                .build()
                .unwrap(),
        )
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch
            .put("user!id!u1", json!({"name": "ann", "team": "red", "id": "u1"}))
            .put("user!name!ann", json!("u1"))
            .put("user!team!red!d1", json!("u1"))
            .put("user!id!u2", json!({"name": "bob", "team": "red", "id": "u2"}))
            .put("user!team!red!d2", json!("u2"))
            // Left behind by a delete
            .put("user!team!red!d3", json!("u3"))
            // Different value sharing a prefix
            .put("user!team!redder!d4", json!("u1"));
        store.commit(batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_primary_and_unique() {
        let schema = schema();
        let store = seeded().await;

        let by_id = lookup_unique(&schema, &store, "id", &json!("u2")).await.unwrap();
        assert_eq!(by_id.unwrap().get("name"), Some(&json!("bob")));

        let by_name = lookup_unique(&schema, &store, "name", &json!("ann")).await.unwrap().unwrap();
        assert_eq!(by_name.id(), Some("u1"));
        assert!(!by_name.is_new());

        assert!(lookup_unique(&schema, &store, "name", &json!("zed")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_many_skips_missing_and_other_values() {
        let schema = schema();
        let store = seeded().await;

        let records = lookup_many(&schema, &store, "team", &json!("red")).await.unwrap();
        let ids: Vec<_> = records.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_many_dedupes_ids() {
        let schema = schema();
        let store = seeded().await;
        let mut batch = WriteBatch::new();
        batch.put("user!team!red!d0", json!("u1"));
        store.commit(batch).await.unwrap();

        let records = lookup_many(&schema, &store, "team", &json!("red")).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_null_value_matches_nothing() {
        let schema = schema();
        let store = seeded().await;
        assert!(lookup_unique(&schema, &store, "name", &Value::Null).await.unwrap().is_none());
        assert!(lookup_many(&schema, &store, "team", &Value::Null).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_primary_reported() {
        let schema = schema();
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put("user!id!u1", json!("not a record"));
        store.commit(batch).await.unwrap();

        let err = lookup_primary(&schema, &store, "u1").await.unwrap_err();
        assert!(matches!(err, ModelError::CorruptEntry { key, .. } if key == "user!id!u1"));
    }

    #[test]
    fn test_lookup_shapes() {
        assert_eq!(Lookup::One(None).len(), 0);
        assert!(Lookup::Many(Vec::new()).is_empty());
        assert!(Lookup::One(None).into_many().is_empty());
    }
}
