//! Uniqueness Race Tests
//!
//! The uniqueness check is check-then-write. Two saves of new records with
//! the same unique value can both pass the check when their lookups complete
//! before either batch commits. Store latency makes that interleaving
//! deterministic here.
//!
//! - `check_then_write`: both saves succeed
//! - `serialized`: the second save waits for the first and fails

use std::sync::Arc;
use std::time::Duration;

use kvmodel::config::ModelConfig;
use kvmodel::model::{Model, ModelError};
use kvmodel::schema::{FieldOptions, Schema};
use kvmodel::store::MemoryStore;
use serde_json::json;

// =============================================================================
// Test Utilities
// =============================================================================

fn slow_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_latency(Duration::from_millis(10)))
}

fn user_model(store: &Arc<MemoryStore>, config: ModelConfig) -> Model {
    let schema = Schema::builder("user")
        .field("name", FieldOptions::new().required().unique().index())
        .build()
        .unwrap();
    Model::with_config(schema, store.clone(), config)
}

// =============================================================================
// Check-then-write
// =============================================================================

/// Both concurrent saves pass the check and commit.
#[tokio::test]
async fn test_check_then_write_admits_duplicates() {
    let store = slow_store();
    let users = user_model(&store, ModelConfig::default());

    let mut first = users.try_create(json!({"name": "dup"})).unwrap();
    let mut second = users.try_create(json!({"name": "dup"})).unwrap();

    let (a, b) = tokio::join!(users.save(&mut first), users.save(&mut second));
    assert!(a.is_ok());
    assert!(b.is_ok());

    // Two primary entries exist; the unique entry names only one of them.
    assert_ne!(first.id(), second.id());
    assert!(users.by_id(first.id().unwrap()).await.unwrap().is_some());
    assert!(users.by_id(second.id().unwrap()).await.unwrap().is_some());
    assert_eq!(store.keys_with_prefix("user!name!dup").unwrap().len(), 1);
}

// =============================================================================
// Serialized
// =============================================================================

/// The per-model lock spans check and commit, so the loser sees the winner.
#[tokio::test]
async fn test_serialized_rejects_concurrent_duplicate() {
    let store = slow_store();
    let users = user_model(&store, ModelConfig::serialized());

    let mut first = users.try_create(json!({"name": "dup"})).unwrap();
    let mut second = users.try_create(json!({"name": "dup"})).unwrap();

    let (a, b) = tokio::join!(users.save(&mut first), users.save(&mut second));
    let results = [a, b];

    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(failures.len(), 1, "exactly one save must lose");
    assert!(matches!(failures[0], ModelError::NotUnique(f) if f == "name"));

    assert_eq!(users.metrics().snapshot().saves, 1);
    assert_eq!(users.metrics().snapshot().saves_rejected, 1);
}

/// Serialized mode does not block saves of persisted records.
#[tokio::test]
async fn test_serialized_resave_is_not_checked() {
    let store = slow_store();
    let users = user_model(&store, ModelConfig::serialized());

    let mut record = users.try_create(json!({"name": "solo"})).unwrap();
    users.save(&mut record).await.unwrap();

    let gets = store.stats().gets;
    users.save(&mut record).await.unwrap();
    assert_eq!(store.stats().gets, gets);
}

/// Distinct values never conflict in either mode.
#[tokio::test]
async fn test_distinct_values_both_commit() {
    for config in [ModelConfig::default(), ModelConfig::serialized()] {
        let store = slow_store();
        let users = user_model(&store, config);

        let mut a = users.try_create(json!({"name": "a"})).unwrap();
        let mut b = users.try_create(json!({"name": "b"})).unwrap();
        let (ra, rb) = tokio::join!(users.save(&mut a), users.save(&mut b));
        ra.unwrap();
        rb.unwrap();
        assert_eq!(users.metrics().snapshot().saves, 2);
    }
}
