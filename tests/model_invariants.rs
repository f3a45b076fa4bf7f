//! Model Invariant Tests
//!
//! Tests for the save/lookup/delete protocol:
//! - Round-trip: save then byId returns the canonical record
//! - Uniqueness failures write nothing
//! - Required checks run before any store access
//! - Persisted records are never re-checked for uniqueness
//! - Non-unique accessors return every holder of a value
//! - Defaults are computed at save time, once
//! - Delete removes unique secondary entries only

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kvmodel::ids::{IdGenerator, SequentialGenerator};
use kvmodel::model::{Lookup, Model, ModelError};
use kvmodel::schema::{DefaultValue, FieldOptions, Schema};
use kvmodel::store::{KvStore, MemoryStore, WriteBatch};
use serde_json::json;

// =============================================================================
// Test Utilities
// =============================================================================

fn user_model(store: &Arc<MemoryStore>) -> Model {
    let ids: Arc<dyn IdGenerator> = Arc::new(SequentialGenerator::new("u"));
    let schema = Schema::builder("user")
        .field("name", FieldOptions::new().required().unique().index())
        .field("email", FieldOptions::new().unique())
        .field("team", FieldOptions::new().index())
        .id_generator(ids)
        .build()
        .unwrap();
    Model::new(schema, store.clone())
}

// =============================================================================
// Round-trip
// =============================================================================

#[tokio::test]
async fn test_save_then_by_id_round_trips() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users
        .try_create(json!({"name": "ann", "email": "ann@x", "team": "red"}))
        .unwrap();
    users.save(&mut record).await.unwrap();

    let id = record.id().unwrap().to_string();
    let found = users.by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.to_canonical(), record.to_canonical());
    assert_eq!(
        serde_json::to_value(&found).unwrap(),
        json!({"name": "ann", "email": "ann@x", "team": "red", "id": id})
    );
}

#[tokio::test]
async fn test_generated_accessor_call() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users.try_create(json!({"name": "ann", "team": "red"})).unwrap();
    users.save(&mut record).await.unwrap();

    let by_name = users.accessor("byName").unwrap();
    match by_name.call(&json!("ann")).await.unwrap() {
        Lookup::One(Some(found)) => assert_eq!(found.id(), record.id()),
        other => panic!("unexpected lookup result: {:?}", other),
    }

    let by_team = users.accessor("byTeam").unwrap();
    assert_eq!(by_team.call(&json!("red")).await.unwrap().len(), 1);
    assert!(users.accessor("byEmail").is_none(), "email is not indexed");
}

// =============================================================================
// Uniqueness
// =============================================================================

/// A uniqueness failure leaves the store untouched.
#[tokio::test]
async fn test_not_unique_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut first = users.try_create(json!({"name": "ann"})).unwrap();
    users.save(&mut first).await.unwrap();
    let before = store.dump().unwrap();
    let commits = store.stats().commits;

    let mut second = users.try_create(json!({"name": "ann"})).unwrap();
    let err = users.save(&mut second).await.unwrap_err();

    assert!(matches!(err, ModelError::NotUnique(ref f) if f == "name"));
    assert_eq!(err.to_string(), ".name not unique");
    assert_eq!(store.stats().commits, commits);
    assert_eq!(store.dump().unwrap(), before);
    assert!(second.is_new());
    assert_eq!(second.id(), None);
}

/// Unique fields are checked even when they are not indexed.
#[tokio::test]
async fn test_unindexed_unique_field_is_checked() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    // Nothing is written for an unindexed field, so seed its entry by hand.
    let mut batch = WriteBatch::new();
    batch.put("user!email!taken@x", json!("u99"));
    store.commit(batch).await.unwrap();

    let mut record = users.try_create(json!({"name": "bob", "email": "taken@x"})).unwrap();
    let err = users.save(&mut record).await.unwrap_err();
    assert!(matches!(err, ModelError::NotUnique(f) if f == "email"));
}

/// Required fields fail before any store access.
#[tokio::test]
async fn test_missing_required_field_touches_no_store() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    for data in [json!({}), json!({"name": ""}), json!({"name": null}), json!({"name": false})] {
        let mut record = users.try_create(data).unwrap();
        let err = users.save(&mut record).await.unwrap_err();
        assert!(matches!(err, ModelError::MissingField(ref f) if f == "name"));
        assert_eq!(err.to_string(), ".name required");
    }
    assert_eq!(store.stats().calls(), 0);
}

/// Persisted records skip the uniqueness phase, even on a collision.
#[tokio::test]
async fn test_resave_skips_uniqueness_check() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut ann = users.try_create(json!({"name": "ann"})).unwrap();
    users.save(&mut ann).await.unwrap();
    let mut bob = users.try_create(json!({"name": "bob"})).unwrap();
    users.save(&mut bob).await.unwrap();

    let gets = store.stats().gets;
    bob.set("name", "ann").unwrap();
    users.save(&mut bob).await.unwrap();
    assert_eq!(store.stats().gets, gets, "re-save must not look anything up");

    // The unique entry now points at the last writer.
    let owner = users.find_one("name", &json!("ann")).await.unwrap().unwrap();
    assert_eq!(owner.id(), bob.id());
}

/// A record constructed with an id is treated as persisted.
#[tokio::test]
async fn test_record_with_id_is_not_new() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users.try_create(json!({"name": "ann", "id": "fixed"})).unwrap();
    assert!(!record.is_new());
    users.save(&mut record).await.unwrap();
    assert_eq!(store.stats().gets, 0);
    assert!(users.by_id("fixed").await.unwrap().is_some());
}

// =============================================================================
// Non-unique indexes
// =============================================================================

#[tokio::test]
async fn test_three_records_share_non_unique_value() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut expected = HashSet::new();
    for name in ["ann", "bob", "cid"] {
        let mut record = users.try_create(json!({"name": name, "team": "red"})).unwrap();
        users.save(&mut record).await.unwrap();
        expected.insert(record.id().unwrap().to_string());
    }
    let mut other = users.try_create(json!({"name": "dan", "team": "redder"})).unwrap();
    users.save(&mut other).await.unwrap();

    let found = users.find_many("team", &json!("red")).await.unwrap();
    assert_eq!(found.len(), 3);
    for record in &found {
        assert_eq!(record.get("team"), Some(&json!("red")));
        let primary = users.by_id(record.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(primary.to_canonical(), record.to_canonical());
    }
    let ids: HashSet<_> = found.iter().map(|r| r.id().unwrap().to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_resave_does_not_duplicate_lookup_results() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users.try_create(json!({"name": "ann", "team": "red"})).unwrap();
    users.save(&mut record).await.unwrap();
    users.save(&mut record).await.unwrap();

    assert_eq!(store.keys_with_prefix("user!team!red!").unwrap().len(), 2);
    assert_eq!(users.find_many("team", &json!("red")).await.unwrap().len(), 1);
}

// =============================================================================
// Defaults
// =============================================================================

#[tokio::test]
async fn test_defaults_applied_once_at_save_time() {
    let store = Arc::new(MemoryStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let schema = Schema::builder("post")
        .field("title", FieldOptions::new().required())
        .field(
            "slug",
            FieldOptions::new().default_with(move |record| {
                counter.fetch_add(1, Ordering::SeqCst);
                let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("");
                json!(title.to_lowercase())
            }),
        )
        .build()
        .unwrap();
    let posts = Model::new(schema, store.clone());

    let mut post = posts.try_create(json!({"title": "Hello"})).unwrap();
    assert_eq!(post.get("slug"), None);
    assert_eq!(post.id(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    posts.save(&mut post).await.unwrap();
    assert_eq!(post.get("slug"), Some(&json!("hello")));
    assert!(!post.id().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    posts.save(&mut post).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// The `user`/`julian` walkthrough.
#[tokio::test]
async fn test_julian_scenario() {
    let store = Arc::new(MemoryStore::new());
    let schema = Schema::builder("user")
        .field("name", FieldOptions::new().unique().index().required())
        .field("createdAt", FieldOptions::new().default_value(DefaultValue::now()))
        .build()
        .unwrap();
    let users = Model::new(schema, store.clone());

    let mut julian = users.try_create(json!({"name": "julian"})).unwrap();
    users.save(&mut julian).await.unwrap();

    let id = julian.id().unwrap();
    assert_eq!(id.len(), 32);
    assert!(!julian.is_new());
    assert!(julian.get("createdAt").and_then(|v| v.as_str()).is_some());

    let found = users.find_one("name", &json!("julian")).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&json!("julian")));

    let mut again = users.try_create(json!({"name": "julian"})).unwrap();
    let err = users.save(&mut again).await.unwrap_err();
    assert!(matches!(err, ModelError::NotUnique(f) if f == "name"));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failed_commit_keeps_record_retryable() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users.try_create(json!({"name": "ann"})).unwrap();
    store.fail_next_commit();
    let err = users.save(&mut record).await.unwrap_err();
    assert!(!err.is_validation());
    assert!(record.is_new());
    assert!(store.is_empty().unwrap());

    users.save(&mut record).await.unwrap();
    assert!(users.find_one("name", &json!("ann")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_separator_in_value_rejected_before_write() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut record = users.try_create(json!({"name": "a!b"})).unwrap();
    let err = users.save(&mut record).await.unwrap_err();
    assert!(matches!(err, ModelError::InvalidKeyToken { field } if field == "name"));
    assert_eq!(store.stats().commits, 0);

    let mut record = users.try_create(json!({"name": "ok", "team": "x!y"})).unwrap();
    assert!(users.save(&mut record).await.is_err());
    assert_eq!(store.stats().commits, 0);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_removes_unique_entries_only() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let mut ann = users.try_create(json!({"name": "ann", "team": "red"})).unwrap();
    users.save(&mut ann).await.unwrap();
    let id = ann.id().unwrap().to_string();

    users.delete(&ann).await.unwrap();

    assert!(users.find_one("name", &json!("ann")).await.unwrap().is_none());
    // Primary and non-unique entries are left behind.
    assert!(users.by_id(&id).await.unwrap().is_some());
    assert_eq!(users.find_many("team", &json!("red")).await.unwrap().len(), 1);
    assert_eq!(users.metrics().snapshot().deletes, 1);

    // The unique value is free again.
    let mut again = users.try_create(json!({"name": "ann"})).unwrap();
    users.save(&mut again).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_new_record_refused() {
    let store = Arc::new(MemoryStore::new());
    let users = user_model(&store);

    let record = users.try_create(json!({"name": "ann"})).unwrap();
    let err = users.delete(&record).await.unwrap_err();
    assert!(matches!(err, ModelError::NotPersisted { .. }));
    assert_eq!(store.stats().calls(), 0);
}
