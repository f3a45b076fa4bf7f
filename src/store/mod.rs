//! Ordered key-value store boundary
//!
//! The indexing layer treats the store as an external collaborator exposing
//! point reads, prefix scans and atomic batch commits ([`KvStore`]). Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`]: ordered map, with counters and fault injection for tests
//! - [`LogStore`]: append-only, checksummed batch log replayed on open

mod backend;
mod batch;
mod errors;
mod frame;
mod log;
mod memory;

pub use backend::{KvStore, StoreFuture};
pub use batch::{BatchOp, WriteBatch};
pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use frame::{compute_checksum, FrameError};
pub use log::LogStore;
pub use memory::{MemoryStore, StoreStats};
