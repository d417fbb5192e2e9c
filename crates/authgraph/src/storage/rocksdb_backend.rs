//! Durable store on a RocksDB database directory.
//!
//! Writes go through RocksDB's write-ahead log, so a committed row mutation
//! survives a crash. Scans are bounded on the RocksDB side with an iterate upper
//! bound rather than filtered after the fact.

use super::{prefix_end, BatchOperation, KeyValue, StorageBackend};
use crate::error::{GraphError, Result};
use log::{debug, info, trace};
use rocksdb::{Direction, IteratorMode, Options, ReadOptions, WriteBatch, DB};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Graph store kept in a RocksDB directory.
///
/// Cloning shares the open database, which RocksDB allows only once per process.
#[derive(Clone)]
pub struct RocksDBBackend {
    db: Arc<DB>,
    path: PathBuf,
}

impl RocksDBBackend {
    /// Open the store at `path`, creating the directory on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if RocksDB refuses to open the directory,
    /// for example because another process holds its lock.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        // Row keys share long prefixes (element id plus family), so blocks compress well.
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        Self::open_with_options(path, opts)
    }

    /// Open the store at `path` with caller-tuned RocksDB options.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if RocksDB refuses to open the directory.
    pub fn open_with_options<P: AsRef<Path>>(path: P, opts: Options) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = DB::open(&opts, &path).map_err(|e| {
            GraphError::storage(format!("Cannot open graph store at {}", path.display()), Some(e))
        })?;
        info!("Opened RocksDB graph store at {}", path.display());
        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Raw database handle, for maintenance such as compaction or backups.
    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    /// Directory the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scan_bounded(&self, start: &[u8], end: Option<Vec<u8>>) -> Result<Vec<KeyValue>> {
        let mut read_opts = ReadOptions::default();
        if let Some(end) = end {
            read_opts.set_iterate_upper_bound(end);
        }
        let iter = self
            .db
            .iterator_opt(IteratorMode::From(start, Direction::Forward), read_opts);

        let mut rows = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                GraphError::storage("Graph store iteration failed", Some(e))
            })?;
            rows.push((key.into_vec(), value.into_vec()));
        }
        trace!("Scanned {} keys from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

impl std::fmt::Debug for RocksDBBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDBBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl StorageBackend for RocksDBBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| GraphError::storage("Graph store write failed", Some(e)))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| GraphError::storage("Graph store read failed", Some(e)))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.db
            .delete(key)
            .map_err(|e| GraphError::storage("Graph store delete failed", Some(e)))
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        // Pinned reads avoid copying the value just to test for it.
        self.db
            .get_pinned(key)
            .map(|value| value.is_some())
            .map_err(|e| GraphError::storage("Graph store read failed", Some(e)))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.scan_bounded(prefix, prefix_end(prefix))
    }

    fn scan_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<KeyValue>> {
        if start >= end {
            return Ok(Vec::new());
        }
        self.scan_bounded(start, Some(end.to_vec()))
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<()> {
        if operations.is_empty() {
            return Ok(());
        }
        let count = operations.len();
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(key, value),
                BatchOperation::Delete { key } => batch.delete(key),
            }
        }
        self.db.write(batch).map_err(|e| {
            GraphError::storage(format!("Graph store rejected batch of {count} operations"), Some(e))
        })?;
        trace!("Committed batch of {count} operations");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        debug!("Flushing graph store at {}", self.path.display());
        self.db
            .flush()
            .map_err(|e| GraphError::storage("Graph store flush failed", Some(e)))
    }
}
