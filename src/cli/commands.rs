//! CLI command implementations
//!
//! Every command loads the configuration, opens the log store under
//! `data_dir`, loads the schema definitions, runs one operation and writes a
//! single JSON response line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ModelConfig;
use crate::model::{Lookup, Model, Record};
use crate::observability::{Logger, Severity};
use crate::schema::{DefaultValue, FieldOptions, Schema, SchemaLoader};
use crate::store::{KvStore, LogStore, MemoryStore};

use super::args::Command;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{parse_lookup_value, parse_request, read_request, write_response};

/// File name of the log store inside `data_dir`
pub const STORE_FILE: &str = "kv.log";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Directory of `*.json` entity definitions (default `<data_dir>/schemas`)
    #[serde(default)]
    pub schema_dir: Option<String>,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Model behaviour switches
    #[serde(flatten)]
    pub model: ModelConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Schema directory, defaulting to `<data_dir>/schemas`
    pub fn schema_path(&self) -> PathBuf {
        match &self.schema_dir {
            Some(dir) => PathBuf::from(dir),
            None => self.data_path().join("schemas"),
        }
    }

    /// Path of the log store file
    pub fn store_path(&self) -> PathBuf {
        self.data_path().join(STORE_FILE)
    }

    /// Minimum log severity
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }
}

/// Opened store plus one model per loaded entity
pub struct Workspace {
    store: Arc<dyn KvStore>,
    models: BTreeMap<String, Model>,
}

impl Workspace {
    /// Opens the configured store and loads every schema definition.
    pub fn open(config: &Config) -> CliResult<Self> {
        Logger::set_min_severity(config.severity());

        let store: Arc<dyn KvStore> = Arc::new(LogStore::open(config.store_path())?);
        let schemas = SchemaLoader::new().load_dir(&config.schema_path())?;

        let models = schemas
            .into_iter()
            .map(|schema| {
                let entity = schema.entity().to_string();
                (entity, Model::with_config(schema, Arc::clone(&store), config.model))
            })
            .collect();

        Ok(Self { store, models })
    }

    /// Model for `entity`
    pub fn model(&self, entity: &str) -> CliResult<&Model> {
        self.models
            .get(entity)
            .ok_or_else(|| CliError::unknown_entity(entity))
    }

    /// Loaded entity names, sorted
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }
}

/// Run a CLI command
pub async fn run_command(command: Command) -> CliResult<()> {
    let data = match command {
        Command::Save {
            config,
            entity,
            data,
        } => {
            let workspace = Workspace::open(&Config::load(&config)?)?;
            let data = match data {
                Some(raw) => parse_request(&raw)?,
                None => read_request()?,
            };
            save(&workspace, &entity, data).await?
        }
        Command::Get {
            config,
            entity,
            accessor,
            value,
        } => {
            let workspace = Workspace::open(&Config::load(&config)?)?;
            get(&workspace, &entity, &accessor, &parse_lookup_value(&value)).await?
        }
        Command::Delete { config, entity, id } => {
            let workspace = Workspace::open(&Config::load(&config)?)?;
            delete(&workspace, &entity, &id).await?
        }
        Command::Accessors { config, entity } => {
            let workspace = Workspace::open(&Config::load(&config)?)?;
            accessors(&workspace, &entity)?
        }
        Command::Demo { config } => {
            let store: Arc<dyn KvStore> = match config {
                Some(path) => {
                    let config = Config::load(&path)?;
                    Logger::set_min_severity(config.severity());
                    Arc::new(LogStore::open(config.store_path())?)
                }
                None => Arc::new(MemoryStore::new()),
            };
            demo(store).await?
        }
    };

    write_response(data)
}

/// Create, validate and save one record; returns its canonical form.
pub async fn save(workspace: &Workspace, entity: &str, data: Value) -> CliResult<Value> {
    let model = workspace.model(entity)?;
    let mut record = model.try_create(data)?;
    model.save(&mut record).await?;
    Ok(serde_json::to_value(&record)?)
}

/// Run the accessor `accessor` of `entity` for `value`.
pub async fn get(
    workspace: &Workspace,
    entity: &str,
    accessor: &str,
    value: &Value,
) -> CliResult<Value> {
    let model = workspace.model(entity)?;
    let accessor = model
        .accessor(accessor)
        .ok_or_else(|| CliError::unknown_accessor(entity, accessor))?;

    Ok(match accessor.call(value).await? {
        Lookup::One(record) => record.map_or(Value::Null, |r| Value::Object(r.to_canonical())),
        Lookup::Many(records) => Value::Array(
            records
                .iter()
                .map(|r| Value::Object(r.to_canonical()))
                .collect(),
        ),
    })
}

/// Delete the record with `id`.
pub async fn delete(workspace: &Workspace, entity: &str, id: &str) -> CliResult<Value> {
    let model = workspace.model(entity)?;
    let record = model.by_id(id).await?.ok_or_else(|| {
        CliError::new(
            CliErrorCode::RecordError,
            format!("No '{}' record with id '{}'", entity, id),
        )
    })?;
    model.delete(&record).await?;
    Ok(json!({ "entity": entity, "id": id, "deleted": true }))
}

/// Describe the generated accessors of `entity`.
pub fn accessors(workspace: &Workspace, entity: &str) -> CliResult<Value> {
    let model = workspace.model(entity)?;
    Ok(Value::Array(
        model
            .accessors()
            .iter()
            .map(|a| json!({ "name": a.name(), "field": a.field(), "unique": a.is_unique() }))
            .collect(),
    ))
}

/// The `user`/`julian` walkthrough.
pub async fn demo(store: Arc<dyn KvStore>) -> CliResult<Value> {
    let schema = Schema::builder("user")
        .field("name", FieldOptions::new().required().unique().index())
        .field(
            "createdAt",
            FieldOptions::new().default_value(DefaultValue::now_millis()),
        )
        .build()?;
    let users = Model::new(schema, store);

    let mut julian = users.try_create(json!({ "name": "julian" }))?;
    users.save(&mut julian).await?;

    let found: Option<Record> = users.find_one("name", &json!("julian")).await?;

    let mut again = users.try_create(json!({ "name": "julian" }))?;
    let duplicate = match users.save(&mut again).await {
        Ok(()) => Value::Null,
        Err(e) => json!({ "code": e.code(), "message": e.to_string() }),
    };

    Ok(json!({
        "saved": julian,
        "byName": found,
        "duplicate": duplicate,
        "metrics": users.metrics().snapshot(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        let schemas = dir.path().join("schemas");
        fs::create_dir_all(&schemas).unwrap();
        fs::write(
            schemas.join("user.json"),
            r#"{"entity": "user", "fields": {
                "name": {"required": true, "unique": true, "index": true},
                "team": {"index": true}
            }}"#,
        )
        .unwrap();

        let config = Config::parse(&format!(
            r#"{{"data_dir": {}, "log_level": "error"}}"#,
            serde_json::to_string(&dir.path().to_string_lossy()).unwrap()
        ))
        .unwrap();
        Workspace::open(&config).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::parse(r#"{"data_dir": "/tmp/kv"}"#).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.schema_path(), PathBuf::from("/tmp/kv/schemas"));
        assert_eq!(config.store_path(), PathBuf::from("/tmp/kv/kv.log"));
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn test_config_flattens_model_config() {
        let config =
            Config::parse(r#"{"data_dir": "d", "uniqueness": "serialized"}"#).unwrap();
        assert_eq!(config.model, ModelConfig::serialized());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(Config::parse(r#"{"data_dir": ""}"#).is_err());
        assert!(Config::parse(r#"{"data_dir": "d", "log_level": "loud"}"#).is_err());
        assert!(Config::parse(r#"{}"#).is_err());
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        assert_eq!(workspace.entities().collect::<Vec<_>>(), vec!["user"]);

        let saved = save(&workspace, "user", json!({"name": "ann", "team": "red"}))
            .await
            .unwrap();
        let id = saved["id"].as_str().unwrap().to_string();

        let found = get(&workspace, "user", "byName", &json!("ann")).await.unwrap();
        assert_eq!(found, saved);
        let team = get(&workspace, "user", "byTeam", &json!("red")).await.unwrap();
        assert_eq!(team, json!([saved]));

        delete(&workspace, "user", &id).await.unwrap();
        let gone = get(&workspace, "user", "byName", &json!("ann")).await.unwrap();
        assert_eq!(gone, Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_entity_and_accessor() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);

        let err = save(&workspace, "post", json!({})).await.unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::UnknownEntity);

        let err = get(&workspace, "user", "byBio", &json!("x")).await.unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::UnknownAccessor);
    }

    #[tokio::test]
    async fn test_demo_reports_duplicate() {
        let result = demo(Arc::new(MemoryStore::new())).await.unwrap();
        assert_eq!(result["byName"]["name"], json!("julian"));
        assert_eq!(result["duplicate"]["code"], json!("KVMODEL_NOT_UNIQUE"));
        assert_eq!(result["metrics"]["saves"], json!(1));
    }
}
