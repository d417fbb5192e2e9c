//! Ordered key-value stores underneath the graph.
//!
//! Everything the graph persists (element rows, metadata entries, streamed
//! payloads) ends up as byte keys in a [`StorageBackend`]:
//! - [`RocksDBBackend`]: durable store on disk (feature `rocksdb-backend`)
//! - [`MemoryBackend`]: a shared `BTreeMap`, used by tests and `Graph::in_memory`
//!
//! The crate-internal `rows` layer maps an element row onto these keys as
//! (row key, column family, qualifier) → visibility-labelled, timestamped cells.
//! [`StreamingValueSink`] holds property payloads too large to inline.
//!
//! Backends are shared by reference. A graph, its metadata store and any peer
//! graph over the same data all hold the same `Arc<dyn StorageBackend>`, so every
//! method takes `&self` and the implementation does its own locking.

mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;
pub(crate) mod rows;
mod streaming;

pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDBBackend;
pub use streaming::{BackendStreamingSink, StreamingRef, StreamingValueSink};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A stored `(key, value)` pair.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// An ordered byte store.
///
/// Scans return pairs in ascending key order, and [`StorageBackend::write_batch`]
/// applies all of its operations or none of them. Row mutations depend on both.
pub trait StorageBackend: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the store rejects the write.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Value stored under `key`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the read fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the store rejects the delete.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Whether a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the read fails.
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Pairs whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if iteration fails.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>>;

    /// Pairs with `start <= key < end`. An inverted range is empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if iteration fails.
    fn scan_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<KeyValue>>;

    /// Apply `operations` in order as one atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the batch is rejected, in which
    /// case none of it is visible.
    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<()>;

    /// Make completed writes durable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::Storage`] if the store cannot flush.
    fn flush(&self) -> Result<()>;
}

/// One write inside an atomic [`StorageBackend::write_batch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Store a value
    Put {
        /// Target key
        key: Vec<u8>,
        /// Bytes to store
        value: Vec<u8>,
    },
    /// Remove a key
    Delete {
        /// Target key
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Key the operation writes.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Smallest key greater than every key starting with `prefix`.
///
/// `None` when no such key exists (an empty prefix or one made only of `0xFF`),
/// meaning the scan runs to the end of the keyspace.
pub(crate) fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
