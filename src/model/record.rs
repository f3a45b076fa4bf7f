//! Records
//!
//! A record is a value mapping bound to a schema. It holds only declared
//! fields and knows whether it has ever been persisted: a record is new iff
//! it was constructed without a non-blank `id`, and stops being new after
//! its first successful save.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::errors::{ModelError, ModelResult};
use super::value::is_blank;
use crate::keys::ID_FIELD;
use crate::schema::Schema;

/// An entity instance
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    data: Map<String, Value>,
    is_new: bool,
}

impl Record {
    /// Binds `data` to `schema`, dropping keys the schema does not declare.
    pub fn new(schema: Arc<Schema>, mut data: Map<String, Value>) -> Self {
        data.retain(|key, _| schema.declares(key));
        let is_new = is_blank(data.get(ID_FIELD));
        Self {
            schema,
            data,
            is_new,
        }
    }

    /// Entity name of the bound schema
    pub fn entity(&self) -> &str {
        self.schema.entity()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Value of a declared field; `None` when absent or undeclared
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Id as a string, when present and a string
    pub fn id(&self) -> Option<&str> {
        self.data.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Whether the record has never been saved
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Every declared field with its value, in schema order
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.schema
            .keys()
            .map(move |key| (key, self.data.get(key)))
    }

    /// Sets a declared field.
    ///
    /// Changing the id of a persisted record is refused: its index entries
    /// point at the old id.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ModelResult<()> {
        if !self.schema.declares(field) {
            return Err(ModelError::UnknownField {
                entity: self.entity().to_string(),
                field: field.to_string(),
            });
        }

        let value = value.into();
        if field == ID_FIELD && !self.is_new && self.data.get(ID_FIELD) != Some(&value) {
            return Err(ModelError::ImmutableId {
                entity: self.entity().to_string(),
            });
        }

        self.data.insert(field.to_string(), value);
        Ok(())
    }

    /// Exactly the declared keys, in schema order; absent values are `null`.
    pub fn to_canonical(&self) -> Map<String, Value> {
        self.schema
            .keys()
            .map(|key| {
                let value = self.data.get(key).cloned().unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect()
    }

    pub(crate) fn assign(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_string(), value);
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.is_new = false;
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_canonical().serialize(serializer)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_canonical()))
    }
}
