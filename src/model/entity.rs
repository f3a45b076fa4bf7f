//! Model handles
//!
//! A `Model` ties one schema to one store. It constructs records, runs the
//! save/delete protocols and hands out the generated accessors. Handles are
//! cheap to clone and share one set of counters.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::accessor::{lookup_many, lookup_primary, lookup_unique, Accessor};
use super::errors::{ModelError, ModelResult};
use super::persist::{apply_defaults, delete_batch, save_batch};
use super::record::Record;
use super::validator::Validator;
use crate::config::{ModelConfig, UndeclaredFields, UniquenessMode};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::Schema;
use crate::store::KvStore;

struct ModelInner {
    schema: Arc<Schema>,
    store: Arc<dyn KvStore>,
    config: ModelConfig,
    metrics: MetricsRegistry,
    /// Held from validation to commit of new records in serialized mode
    unique_lock: Mutex<()>,
}

/// Schema bound to a store
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Model with the default configuration
    pub fn new(schema: Schema, store: Arc<dyn KvStore>) -> Self {
        Self::with_config(schema, store, ModelConfig::default())
    }

    pub fn with_config(schema: Schema, store: Arc<dyn KvStore>, config: ModelConfig) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                schema: Arc::new(schema),
                store,
                config,
                metrics: MetricsRegistry::new(),
                unique_lock: Mutex::new(()),
            }),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn entity(&self) -> &str {
        self.inner.schema.entity()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.inner.metrics
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.inner.store
    }

    // ==================
    // Construction
    // ==================

    /// Record from `data`, dropping undeclared keys.
    pub fn create(&self, data: Map<String, Value>) -> Record {
        let record = Record::new(Arc::clone(&self.inner.schema), data);
        log_event_with_fields(
            Event::RecordCreated,
            &[
                ("entity", self.entity()),
                ("new", if record.is_new() { "true" } else { "false" }),
            ],
        );
        record
    }

    /// Record from arbitrary JSON, honouring the undeclared-field policy.
    pub fn try_create(&self, data: Value) -> ModelResult<Record> {
        let Value::Object(data) = data else {
            return Err(ModelError::NotAnObject {
                entity: self.entity().to_string(),
            });
        };

        if self.inner.config.undeclared_fields == UndeclaredFields::Reject {
            if let Some(key) = data.keys().find(|k| !self.inner.schema.declares(k)) {
                return Err(ModelError::UnknownField {
                    entity: self.entity().to_string(),
                    field: key.clone(),
                });
            }
        }
        Ok(self.create(data))
    }

    // ==================
    // Instance operations
    // ==================

    /// Required check, then uniqueness check for new records.
    pub async fn validate(&self, record: &Record) -> ModelResult<()> {
        self.check_owner(record)?;
        Validator::new(&self.inner.schema, self.inner.store.as_ref())
            .validate(record)
            .await
    }

    /// Applies defaults, validates, and commits the primary and secondary
    /// entries as one batch.
    ///
    /// On failure `record` is left exactly as it was. On success it holds the
    /// applied defaults and is no longer new.
    pub async fn save(&self, record: &mut Record) -> ModelResult<()> {
        self.check_owner(record)?;
        log_event_with_fields(Event::SaveStart, &[("entity", self.entity())]);

        let result = if record.is_new()
            && self.inner.config.uniqueness == UniquenessMode::Serialized
        {
            let _guard = self.inner.unique_lock.lock().await;
            self.stage_and_commit(record).await
        } else {
            self.stage_and_commit(record).await
        };

        match result {
            Ok(staged) => {
                *record = staged;
                record.mark_persisted();
                self.inner.metrics.increment_saves();
                log_event_with_fields(
                    Event::SaveComplete,
                    &[("entity", self.entity()), ("id", record.id().unwrap_or(""))],
                );
                Ok(())
            }
            Err(err) => {
                self.inner.metrics.increment_saves_rejected();
                log_event_with_fields(
                    Event::SaveRejected,
                    &[
                        ("entity", self.entity()),
                        ("code", err.code()),
                        ("reason", &err.to_string()),
                    ],
                );
                Err(err)
            }
        }
    }

    async fn stage_and_commit(&self, record: &Record) -> ModelResult<Record> {
        let mut staged = record.clone();
        apply_defaults(&mut staged);

        Validator::new(&self.inner.schema, self.inner.store.as_ref())
            .validate(&staged)
            .await?;

        let batch = save_batch(&staged)?;
        self.inner.store.commit(batch).await?;
        Ok(staged)
    }

    /// Removes the unique secondary entries of a saved record.
    pub async fn delete(&self, record: &Record) -> ModelResult<()> {
        self.check_owner(record)?;
        if record.is_new() {
            return Err(ModelError::NotPersisted {
                entity: self.entity().to_string(),
            });
        }

        let batch = delete_batch(record)?;
        let removed = batch.len();
        self.inner.store.commit(batch).await?;

        self.inner.metrics.increment_deletes();
        log_event_with_fields(
            Event::DeleteComplete,
            &[
                ("entity", self.entity()),
                ("id", record.id().unwrap_or("")),
                ("removed", &removed.to_string()),
            ],
        );
        Ok(())
    }

    fn check_owner(&self, record: &Record) -> ModelResult<()> {
        if Arc::ptr_eq(record.schema(), &self.inner.schema) {
            Ok(())
        } else {
            Err(ModelError::SchemaMismatch {
                expected: self.entity().to_string(),
                actual: record.entity().to_string(),
            })
        }
    }

    // ==================
    // Lookups
    // ==================

    /// One accessor per indexed field, in schema order
    pub fn accessors(&self) -> Vec<Accessor> {
        self.inner
            .schema
            .indexed_fields()
            .map(|field| {
                Accessor::new(
                    self.clone(),
                    field.accessor_name(),
                    field.key.clone(),
                    field.unique,
                )
            })
            .collect()
    }

    /// Accessor by generated name, e.g. `byName`
    pub fn accessor(&self, name: &str) -> Option<Accessor> {
        self.accessors().into_iter().find(|a| a.name() == name)
    }

    /// Record whose primary entry is `<entity>!id!<id>`
    pub async fn by_id(&self, id: &str) -> ModelResult<Option<Record>> {
        let record = lookup_primary(&self.inner.schema, self.inner.store.as_ref(), id).await?;
        self.inner.metrics.record_lookup(u64::from(record.is_some()));
        Ok(record)
    }

    /// Lookup through the unique accessor of `field`.
    pub async fn find_one(&self, field: &str, value: &Value) -> ModelResult<Option<Record>> {
        self.require_accessor(field, true)?;
        let record =
            lookup_unique(&self.inner.schema, self.inner.store.as_ref(), field, value).await?;
        self.inner.metrics.record_lookup(u64::from(record.is_some()));
        Ok(record)
    }

    /// Lookup through the non-unique accessor of `field`.
    pub async fn find_many(&self, field: &str, value: &Value) -> ModelResult<Vec<Record>> {
        self.require_accessor(field, false)?;
        let records =
            lookup_many(&self.inner.schema, self.inner.store.as_ref(), field, value).await?;
        self.inner.metrics.record_lookup(records.len() as u64);
        Ok(records)
    }

    fn require_accessor(&self, field: &str, unique: bool) -> ModelResult<()> {
        match self.inner.schema.field(field) {
            Some(f) if f.index && f.unique == unique => Ok(()),
            _ => Err(ModelError::NoAccessor {
                entity: self.entity().to_string(),
                field: field.to_string(),
                shape: if unique { "unique" } else { "non-unique" },
            }),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("entity", &self.entity())
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .finish()
    }
}
