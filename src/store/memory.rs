//! In-memory ordered store
//!
//! Backed by a `BTreeMap`, so scans return values in key order. Exposes
//! operation counters, one-shot commit failure injection and optional
//! per-operation latency, which makes interleavings of concurrent saves
//! reproducible in tests.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use serde_json::Value;

use super::backend::{KvStore, StoreFuture};
use super::batch::{BatchOp, WriteBatch};
use super::errors::{StoreError, StoreResult};

/// Applies staged operations in order.
pub(crate) fn apply_ops(entries: &mut BTreeMap<String, Value>, ops: Vec<BatchOp>) {
    for op in ops {
        match op {
            BatchOp::Put { key, value } => {
                entries.insert(key, value);
            }
            BatchOp::Delete { key } => {
                entries.remove(&key);
            }
        }
    }
}

/// Values under `prefix`, in key order.
pub(crate) fn scan_prefix(entries: &BTreeMap<String, Value>, prefix: &str) -> Vec<Value> {
    entries
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(_, value)| value.clone())
        .collect()
}

/// Counters of operations served by a [`MemoryStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub gets: u64,
    pub scans: u64,
    pub commits: u64,
    pub puts: u64,
    pub deletes: u64,
}

impl StoreStats {
    /// Total number of store calls of any kind
    pub fn calls(&self) -> u64 {
        self.gets + self.scans + self.commits
    }
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    scans: AtomicU64,
    commits: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
}

/// In-memory [`KvStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
    counters: Counters,
    fail_next_commit: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` before serving every operation.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make the next commit fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Operation counters so far
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            gets: self.counters.gets.load(Ordering::Relaxed),
            scans: self.counters.scans.load(Ordering::Relaxed),
            commits: self.counters.commits.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
        }
    }

    /// Copy of every entry, in key order
    pub fn dump(&self) -> StoreResult<BTreeMap<String, Value>> {
        Ok(self.read()?.clone())
    }

    /// Keys under `prefix`, in key order
    pub fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let entries = self.read()?;
        Ok(entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.entries
            .read()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl KvStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            self.pause().await;
            self.counters.gets.fetch_add(1, Ordering::Relaxed);
            let entries = self.read()?;
            Ok(entries.get(key).cloned())
        })
    }

    fn scan<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move {
            self.pause().await;
            self.counters.scans.fetch_add(1, Ordering::Relaxed);
            let entries = self.read()?;
            Ok(scan_prefix(&entries, prefix))
        })
    }

    fn commit(&self, batch: WriteBatch) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.pause().await;
            self.counters.commits.fetch_add(1, Ordering::Relaxed);

            if self.fail_next_commit.swap(false, Ordering::SeqCst) {
                return Err(StoreError::write_failed_no_source("injected commit failure"));
            }

            let ops = batch.into_ops();
            let puts = ops.iter().filter(|op| matches!(op, BatchOp::Put { .. })).count() as u64;
            let deletes = ops.len() as u64 - puts;

            let mut entries = self
                .entries
                .write()
                .map_err(|_| StoreError::unavailable("memory store lock poisoned"))?;
            apply_ops(&mut entries, ops);

            self.counters.puts.fetch_add(puts, Ordering::Relaxed);
            self.counters.deletes.fetch_add(deletes, Ordering::Relaxed);
            Ok(())
        })
    }
}
