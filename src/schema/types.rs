//! Field descriptors and schemas
//!
//! A schema is the ordered field descriptor set of one entity. Caller fields
//! keep their declaration order; the implicit `id` field is always last:
//!
//! ```text
//! id: required=false, unique=true, index=true, default=<fresh opaque id>
//! ```

use std::sync::Arc;

use serde_json::Value;

use super::defaults::DefaultValue;
use super::errors::{SchemaError, SchemaResult};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::keys::{self, ID_FIELD, KEY_SEPARATOR};
use crate::model::Record;
use crate::observability::{log_event_with_fields, Event};

/// Per-field configuration supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub required: bool,
    pub unique: bool,
    pub index: bool,
    pub default: Option<DefaultValue>,
}

impl FieldOptions {
    /// All flags off, no default
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Use `default` when the value is blank at save time
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Use a closure as the default provider
    pub fn default_with<F>(self, f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.default_value(DefaultValue::from_fn(f))
    }
}

/// Normalized metadata for one field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: String,
    pub required: bool,
    pub unique: bool,
    pub index: bool,
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    fn from_options(key: String, options: FieldOptions) -> Self {
        Self {
            key,
            required: options.required,
            unique: options.unique,
            index: options.index,
            default: options.default,
        }
    }

    /// Whether this is the implicit identity field
    pub fn is_id(&self) -> bool {
        self.key == ID_FIELD
    }

    /// Name of the generated lookup: `by` + capitalized key
    pub fn accessor_name(&self) -> String {
        let mut chars = self.key.chars();
        match chars.next() {
            Some(first) => format!("by{}{}", first.to_uppercase(), chars.as_str()),
            None => "by".to_string(),
        }
    }
}

/// Field descriptor set of one entity
#[derive(Debug, Clone)]
pub struct Schema {
    entity: String,
    fields: Vec<FieldDescriptor>,
    ids: Arc<dyn IdGenerator>,
}

impl Schema {
    /// Start defining a schema for `entity`
    pub fn builder(entity: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(entity)
    }

    /// Entity name, the first token of every key
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Descriptors in schema order, `id` last
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor for `key`
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Whether `key` is declared (including `id`)
    pub fn declares(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Declared keys in schema order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Descriptors with `index=true`
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.index)
    }

    /// Descriptors with `unique=true`, indexed or not
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// A fresh opaque identifier
    pub fn generate_id(&self) -> String {
        self.ids.generate()
    }
}

/// Builds a [`Schema`], validating names and appending the `id` field
#[derive(Debug)]
pub struct SchemaBuilder {
    entity: String,
    fields: Vec<(String, FieldOptions)>,
    ids: Arc<dyn IdGenerator>,
}

impl SchemaBuilder {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Declare a field; declaration order is schema order
    pub fn field(mut self, key: impl Into<String>, options: FieldOptions) -> Self {
        self.fields.push((key.into(), options));
        self
    }

    /// Replace the identifier source (UUIDs by default)
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        check_name(&self.entity, None, &self.entity)?;

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(self.fields.len() + 1);
        for (key, options) in self.fields {
            check_name(&self.entity, Some(&key), &key)?;
            if key == ID_FIELD {
                return Err(SchemaError::reserved_field(&self.entity, &key));
            }
            if fields.iter().any(|f| f.key == key) {
                return Err(SchemaError::duplicate_field(&self.entity, &key));
            }
            fields.push(FieldDescriptor::from_options(key, options));
        }

        fields.push(FieldDescriptor {
            key: ID_FIELD.to_string(),
            required: false,
            unique: true,
            index: true,
            default: Some(DefaultValue::id(Arc::clone(&self.ids))),
        });

        log_event_with_fields(
            Event::SchemaBuilt,
            &[
                ("entity", &self.entity),
                ("fields", &fields.len().to_string()),
            ],
        );

        Ok(Schema {
            entity: self.entity,
            fields,
            ids: self.ids,
        })
    }
}

fn check_name(entity: &str, field: Option<&str>, name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::invalid_name(entity, field, "must not be empty"));
    }
    if !keys::is_valid_token(name) {
        return Err(SchemaError::invalid_name(
            entity,
            field,
            format!("must not contain the key separator '{}'", KEY_SEPARATOR),
        ));
    }
    Ok(())
}
