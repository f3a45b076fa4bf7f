//! Schema definitions from JSON
//!
//! A field configuration is a JSON object mapping field names to option
//! objects; all options are optional and default to off:
//!
//! ```json
//! {
//!   "name":      { "required": true, "unique": true, "index": true },
//!   "createdAt": { "default": "now" },
//!   "role":      { "index": true, "default": { "value": "member" } }
//! }
//! ```
//!
//! Named defaults: `now`, `now_millis`, `id`. An entity definition file
//! wraps this as `{ "entity": "user", "fields": { ... } }`. Unknown option
//! keys are ignored with a warning, so a misspelt `"require"` leaves the
//! field optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::defaults::DefaultValue;
use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldOptions, Schema, SchemaBuilder};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::observability::{log_event_with_fields, Event};

const FIELD_OPTIONS: [&str; 4] = ["required", "unique", "index", "default"];

#[derive(Debug, Deserialize)]
struct FieldSpec {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    index: bool,
    #[serde(default)]
    default: Option<DefaultSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultSpec {
    Named(String),
    Literal { value: Value },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDefinition {
    entity: String,
    fields: Value,
}

/// Builds schemas from JSON field configurations and definition files
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    ids: Arc<dyn IdGenerator>,
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLoader {
    /// Loader whose schemas generate UUID identifiers
    pub fn new() -> Self {
        Self {
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Loader whose schemas use `ids`
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Builds the schema of `entity` from a field configuration object.
    pub fn from_fields(&self, entity: &str, fields: &Value) -> SchemaResult<Schema> {
        let map = fields.as_object().ok_or_else(|| {
            SchemaError::malformed(entity, None, "field configuration must be an object")
        })?;

        let mut builder = SchemaBuilder::new(entity).id_generator(Arc::clone(&self.ids));
        for (key, config) in map {
            let options = self.parse_options(entity, key, config)?;
            builder = builder.field(key.clone(), options);
        }
        builder.build()
    }

    /// Builds a schema from `{ "entity": ..., "fields": { ... } }`.
    pub fn from_definition(&self, definition: &Value) -> SchemaResult<Schema> {
        let def: EntityDefinition = serde_json::from_value(definition.clone()).map_err(|e| {
            SchemaError::malformed("<definition>", None, format!("invalid definition: {}", e))
        })?;
        self.from_fields(&def.entity, &def.fields)
    }

    /// Loads one definition file.
    pub fn load_file(&self, path: &Path) -> SchemaResult<Schema> {
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::io(path.display().to_string(), e.to_string()))?;
        let definition: Value = serde_json::from_str(&content).map_err(|e| {
            SchemaError::io(path.display().to_string(), format!("invalid JSON: {}", e))
        })?;
        self.from_definition(&definition)
    }

    /// Loads every `*.json` definition in `dir`, in file name order.
    ///
    /// A missing directory yields no schemas. Two files defining the same
    /// entity are a configuration error.
    pub fn load_dir(&self, dir: &Path) -> SchemaResult<Vec<Schema>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| SchemaError::io(dir.display().to_string(), e.to_string()))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| SchemaError::io(dir.display().to_string(), e.to_string()))?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut schemas: Vec<Schema> = Vec::with_capacity(paths.len());
        for path in &paths {
            let schema = self.load_file(path)?;
            if schemas.iter().any(|s| s.entity() == schema.entity()) {
                return Err(SchemaError::malformed(
                    schema.entity(),
                    None,
                    format!("entity defined again in {}", path.display()),
                ));
            }
            schemas.push(schema);
        }

        log_event_with_fields(
            Event::SchemasLoaded,
            &[
                ("dir", &dir.display().to_string()),
                ("count", &schemas.len().to_string()),
            ],
        );
        Ok(schemas)
    }

    fn parse_options(&self, entity: &str, key: &str, config: &Value) -> SchemaResult<FieldOptions> {
        let options = config.as_object().ok_or_else(|| {
            SchemaError::malformed(entity, Some(key), "field options must be an object")
        })?;

        for option in options.keys() {
            if !FIELD_OPTIONS.contains(&option.as_str()) {
                log_event_with_fields(
                    Event::UnknownFieldOption,
                    &[("entity", entity), ("field", key), ("option", option.as_str())],
                );
            }
        }

        let spec: FieldSpec = serde_json::from_value(config.clone())
            .map_err(|e| SchemaError::malformed(entity, Some(key), e.to_string()))?;

        let default = match spec.default {
            None => None,
            Some(DefaultSpec::Literal { value }) => Some(DefaultValue::constant(value)),
            Some(DefaultSpec::Named(name)) => Some(
                DefaultValue::named(&name, &self.ids)
                    .ok_or_else(|| SchemaError::unknown_default(entity, key, &name))?,
            ),
        };

        Ok(FieldOptions {
            required: spec.required,
            unique: spec.unique,
            index: spec.index,
            default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_from_fields_keeps_declaration_order() {
        let schema = SchemaLoader::new()
            .from_fields(
                "user",
                &json!({
                    "name": { "required": true, "unique": true, "index": true },
                    "createdAt": { "default": "now" },
                    "age": {}
                }),
            )
            .unwrap();

        let keys: Vec<_> = schema.keys().collect();
        assert_eq!(keys, vec!["name", "createdAt", "age", "id"]);
        let name = schema.field("name").unwrap();
        assert!(name.required && name.unique && name.index);
        assert_eq!(schema.field("createdAt").unwrap().default.as_ref().unwrap().name(), "now");
    }

    #[test]
    fn test_literal_default() {
        let schema = SchemaLoader::new()
            .from_fields("user", &json!({ "role": { "default": { "value": "member" } } }))
            .unwrap();
        assert_eq!(schema.field("role").unwrap().default.as_ref().unwrap().name(), "value");
    }

    #[test]
    fn test_non_object_configuration_is_malformed() {
        let loader = SchemaLoader::new();

        let err = loader.from_fields("user", &json!(["name"])).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);

        let err = loader.from_fields("user", &json!({ "name": true })).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_unknown_option_is_ignored() {
        let schema = SchemaLoader::new()
            .from_fields(
                "user",
                &json!({
                    "name": { "required": true, "unique": true, "index": true },
                    "createdAt": { "require": true, "default": "now_millis" }
                }),
            )
            .unwrap();
        let created = schema.field("createdAt").unwrap();
        assert!(!created.required);
        assert_eq!(created.default.as_ref().unwrap().name(), "now_millis");
    }

    #[test]
    fn test_wrong_option_type_is_malformed() {
        let err = SchemaLoader::new()
            .from_fields("user", &json!({ "name": { "unique": "yes" } }))
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);
    }

    #[test]
    fn test_unknown_named_default() {
        let err = SchemaLoader::new()
            .from_fields("user", &json!({ "at": { "default": "yesterday" } }))
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownDefault);
    }

    #[test]
    fn test_load_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("b_post.json"),
            r#"{ "entity": "post", "fields": { "title": { "index": true } } }"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("a_user.json"),
            r#"{ "entity": "user", "fields": { "name": { "unique": true, "index": true } } }"#,
        )
        .unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let schemas = SchemaLoader::new().load_dir(tmp.path()).unwrap();
        let entities: Vec<_> = schemas.iter().map(|s| s.entity()).collect();
        assert_eq!(entities, vec!["user", "post"]);
    }

    #[test]
    fn test_load_dir_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let schemas = SchemaLoader::new().load_dir(&tmp.path().join("none")).unwrap();
        assert!(schemas.is_empty());
    }

    #[test]
    fn test_load_dir_rejects_duplicate_entity() {
        let tmp = TempDir::new().unwrap();
        let def = r#"{ "entity": "user", "fields": {} }"#;
        fs::write(tmp.path().join("one.json"), def).unwrap();
        fs::write(tmp.path().join("two.json"), def).unwrap();

        assert!(SchemaLoader::new().load_dir(tmp.path()).is_err());
    }

    #[test]
    fn test_bad_json_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SchemaLoader::new().load_file(&path).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Io);
    }
}
