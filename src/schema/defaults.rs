//! Default value providers
//!
//! A provider computes a field value at save time when the record holds a
//! blank value for that field. Providers see the record being saved, with
//! the defaults of earlier fields already applied.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::ids::IdGenerator;
use crate::model::Record;

type ProviderFn = dyn Fn(&Record) -> Value + Send + Sync;

/// A named default value provider
#[derive(Clone)]
pub struct DefaultValue {
    name: String,
    provider: Arc<ProviderFn>,
}

impl DefaultValue {
    /// Provider backed by a closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self {
            name: "custom".into(),
            provider: Arc::new(f),
        }
    }

    /// Always the same value
    pub fn constant(value: Value) -> Self {
        Self {
            name: "value".into(),
            provider: Arc::new(move |_| value.clone()),
        }
    }

    /// Current UTC time as an RFC 3339 string
    pub fn now() -> Self {
        Self {
            name: "now".into(),
            provider: Arc::new(|_| Value::String(Utc::now().to_rfc3339())),
        }
    }

    /// Current UTC time in milliseconds since the Unix epoch
    pub fn now_millis() -> Self {
        Self {
            name: "now_millis".into(),
            provider: Arc::new(|_| Value::from(Utc::now().timestamp_millis())),
        }
    }

    /// A fresh opaque identifier
    pub fn id(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            name: "id".into(),
            provider: Arc::new(move |_| Value::String(ids.generate())),
        }
    }

    /// Resolves a provider by the name used in JSON schema definitions.
    pub fn named(name: &str, ids: &Arc<dyn IdGenerator>) -> Option<Self> {
        match name {
            "now" => Some(Self::now()),
            "now_millis" => Some(Self::now_millis()),
            "id" => Some(Self::id(Arc::clone(ids))),
            _ => None,
        }
    }

    /// Computes the default for `record`
    pub fn provide(&self, record: &Record) -> Value {
        (self.provider)(record)
    }

    /// Provider name (`custom` for closures)
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultValue").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialGenerator;

    #[test]
    fn test_named_lookup() {
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialGenerator::new("x"));
        assert_eq!(DefaultValue::named("now", &ids).unwrap().name(), "now");
        assert_eq!(DefaultValue::named("id", &ids).unwrap().name(), "id");
        assert!(DefaultValue::named("tomorrow", &ids).is_none());
    }

    #[test]
    fn test_debug_shows_name_only() {
        let d = DefaultValue::from_fn(|_| Value::Null);
        assert_eq!(format!("{:?}", d), "DefaultValue { name: \"custom\" }");
    }
}
