//! Process-local store backing `Graph::in_memory` and the test suites.
//!
//! Nothing is written to disk. The data lives until the last handle is dropped.

use super::{prefix_end, BatchOperation, KeyValue, StorageBackend};
use crate::error::Result;
use log::trace;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered in-memory store.
///
/// Cloning yields another handle onto the same table, so several graphs opened
/// over clones behave like separate processes sharing one database.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    table: Arc<RwLock<Table>>,
}

impl MemoryBackend {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all handles.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Drop every key. Other handles see the empty store too.
    pub fn clear(&self) {
        self.table.write().clear();
    }

    fn collect(&self, lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> Vec<KeyValue> {
        self.table
            .read()
            .range::<[u8], _>((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl StorageBackend for MemoryBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.table.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.table.read().get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.table.write().remove(key);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.table.read().contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let end = prefix_end(prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };
        Ok(self.collect(Bound::Included(prefix), upper))
    }

    fn scan_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<KeyValue>> {
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self.collect(Bound::Included(start), Bound::Excluded(end)))
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<()> {
        trace!("Applying {} operations to memory store", operations.len());
        // One write guard for the whole batch keeps readers from seeing half of it.
        let mut table = self.table.write();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    table.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    table.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
