//! File-backed ordered store
//!
//! An append-only log of framed batches, replayed into an ordered map on
//! open. A commit appends one frame and fsyncs it before the batch becomes
//! visible in memory, so readers see a batch entirely or not at all. File
//! I/O for a commit runs on tokio's blocking pool.
//!
//! Replay policy:
//! - A torn final frame (crash mid-append) was never acknowledged; it is
//!   cut off and the store opens with the batches before it.
//! - A complete frame with a bad checksum is corruption; open fails.
//!
//! A commit whose append or fsync fails cuts the log back to its previous
//! length, so no unacknowledged bytes sit in front of later batches. If that
//! cut fails too, the store refuses further commits.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use super::backend::{KvStore, StoreFuture};
use super::batch::WriteBatch;
use super::errors::{StoreError, StoreResult};
use super::frame::{self, FrameError};
use super::memory::{apply_ops, scan_prefix};
use crate::observability::{log_event_with_fields, Event};

/// File-backed [`KvStore`]
#[derive(Debug)]
pub struct LogStore {
    inner: Arc<LogInner>,
}

#[derive(Debug)]
struct LogInner {
    path: PathBuf,
    /// Append handle; held for the whole commit so log order equals apply order
    file: Mutex<File>,
    entries: RwLock<BTreeMap<String, Value>>,
    /// Set when a failed append could not be cut back
    broken: AtomicBool,
}

impl LogStore {
    /// Opens or creates the log at `path`, replaying existing batches.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::io_error(
                        format!("Failed to create store directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StoreError::io_error(format!("Failed to open store log: {}", path.display()), e)
            })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| StoreError::io_error("Failed to read store log", e))?;

        let (entries, valid_len, batches) = Self::replay(&path, &bytes)?;

        if valid_len < bytes.len() {
            file.set_len(valid_len as u64)
                .map_err(|e| StoreError::io_error("Failed to truncate torn batch", e))?;
            log_event_with_fields(
                Event::StoreTailTruncated,
                &[
                    ("path", &path.display().to_string()),
                    ("discarded_bytes", &(bytes.len() - valid_len).to_string()),
                ],
            );
        }

        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("path", &path.display().to_string()),
                ("batches", &batches.to_string()),
                ("keys", &entries.len().to_string()),
            ],
        );

        Ok(Self {
            inner: Arc::new(LogInner {
                path,
                file: Mutex::new(file),
                entries: RwLock::new(entries),
                broken: AtomicBool::new(false),
            }),
        })
    }

    /// Replays frames; returns the map, the length of the valid prefix and the batch count.
    fn replay(path: &Path, bytes: &[u8]) -> StoreResult<(BTreeMap<String, Value>, usize, usize)> {
        let mut entries = BTreeMap::new();
        let mut offset = 0;
        let mut batches = 0;

        while offset < bytes.len() {
            match frame::decode(&bytes[offset..]) {
                Ok((ops, consumed)) => {
                    apply_ops(&mut entries, ops);
                    offset += consumed;
                    batches += 1;
                }
                Err(FrameError::Truncated) => break,
                Err(FrameError::Corrupt(reason)) => {
                    log_event_with_fields(
                        Event::StoreCorruption,
                        &[
                            ("path", &path.display().to_string()),
                            ("offset", &offset.to_string()),
                        ],
                    );
                    return Err(StoreError::corruption_at_offset(offset as u64, reason));
                }
            }
        }

        Ok((entries, offset, batches))
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Number of live keys
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.inner.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.inner.read()?.is_empty())
    }
}

impl LogInner {
    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.entries
            .read()
            .map_err(|_| StoreError::unavailable("log store lock poisoned"))
    }

    fn commit_sync(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let encoded = frame::encode(batch.ops())?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| StoreError::unavailable("log store file lock poisoned"))?;
        self.append(&mut file, |f| {
            f.write_all(&encoded)?;
            f.sync_data()
        })?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::unavailable("log store lock poisoned"))?;
        let ops = batch.len();
        apply_ops(&mut entries, batch.into_ops());
        drop(entries);

        log_event_with_fields(
            Event::BatchCommitted,
            &[
                ("path", &self.path.display().to_string()),
                ("ops", &ops.to_string()),
            ],
        );
        Ok(())
    }

    /// Runs `write` against the log; on failure cuts the file back to its
    /// length before the call.
    fn append<F>(&self, file: &mut File, write: F) -> StoreResult<()>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        if self.broken.load(Ordering::Acquire) {
            return Err(StoreError::unavailable(
                "log store holds an append that could not be rolled back",
            ));
        }

        let prev_len = file
            .metadata()
            .map_err(|e| StoreError::io_error("Failed to stat store log", e))?
            .len();

        let err = match write(file) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match file.set_len(prev_len).and_then(|()| file.sync_data()) {
            Ok(()) => Err(StoreError::write_failed("Failed to append batch", err)),
            Err(rollback) => {
                self.broken.store(true, Ordering::Release);
                Err(StoreError::unavailable(format!(
                    "Failed to append batch ({}); rollback failed: {}",
                    err, rollback
                )))
            }
        }
    }
}

impl KvStore for LogStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            let entries = self.inner.read()?;
            Ok(entries.get(key).cloned())
        })
    }

    fn scan<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let entries = self.inner.read()?;
            Ok(scan_prefix(&entries, prefix))
        })
    }

    fn commit(&self, batch: WriteBatch) -> StoreFuture<'_, ()> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || inner.commit_sync(batch))
                .await
                .map_err(|e| StoreError::unavailable(format!("commit task failed: {}", e)))?
        })
    }
}
