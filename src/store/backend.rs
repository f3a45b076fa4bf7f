//! Key-value store boundary
//!
//! The indexing layer needs only three capabilities from the ordered store
//! beneath it: point reads, prefix scans, and atomic batch commits. Every
//! call suspends until the store responds.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::batch::WriteBatch;
use super::errors::StoreResult;

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Ordered key-value store
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Point lookup
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;

    /// Values of every key starting with `prefix`, in key order
    fn scan<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<Value>>;

    /// Apply every operation of `batch` atomically
    fn commit(&self, batch: WriteBatch) -> StoreFuture<'_, ()>;

    /// Start an empty batch
    fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }
}
