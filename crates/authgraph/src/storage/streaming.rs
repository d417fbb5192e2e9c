//! Externalized payload storage for streaming property values.

use super::StorageBackend;
use crate::error::{GraphError, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;
use uuid::Uuid;

const STREAMING_PREFIX: &[u8] = b"s\x1f";

/// Opaque handle to a payload held by a [`StreamingValueSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamingRef(String);

impl StreamingRef {
    /// Wrap a sink-specific reference string.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for property payloads too large to embed in an element row.
pub trait StreamingValueSink: Send + Sync {
    /// Store `bytes` for property (`key`, `name`) of the element at `row_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the payload cannot be written.
    fn save(&self, row_key: &str, key: &str, name: &str, bytes: &[u8]) -> Result<StreamingRef>;

    /// Open several payloads in one call, in the order of `references`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if any payload is missing or unreadable.
    fn open_input_streams(&self, references: &[StreamingRef])
        -> Result<Vec<Box<dyn Read + Send>>>;

    /// Drop a payload whose owning property was permanently deleted.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the payload cannot be removed.
    fn delete(&self, reference: &StreamingRef) -> Result<()>;
}

/// Sink that keeps payloads in the graph's own storage backend under a separate
/// key range.
pub struct BackendStreamingSink {
    backend: Arc<dyn StorageBackend>,
}

impl BackendStreamingSink {
    /// Create a sink writing to `backend`.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn key(reference: &StreamingRef) -> Vec<u8> {
        let mut key = STREAMING_PREFIX.to_vec();
        key.extend_from_slice(reference.as_str().as_bytes());
        key
    }
}

impl StreamingValueSink for BackendStreamingSink {
    fn save(&self, row_key: &str, key: &str, name: &str, bytes: &[u8]) -> Result<StreamingRef> {
        let reference = StreamingRef::new(Uuid::new_v4().simple().to_string());
        self.backend.put(&Self::key(&reference), bytes)?;
        debug!(
            "Externalized {} bytes of {}:{} on {} as {}",
            bytes.len(),
            name,
            key,
            row_key,
            reference
        );
        Ok(reference)
    }

    fn open_input_streams(
        &self,
        references: &[StreamingRef],
    ) -> Result<Vec<Box<dyn Read + Send>>> {
        trace!("Opening {} streaming values", references.len());
        references
            .iter()
            .map(|reference| {
                let bytes = self.backend.get(&Self::key(reference))?.ok_or_else(|| {
                    GraphError::storage(
                        format!("Missing streaming payload {reference}"),
                        None::<std::io::Error>,
                    )
                })?;
                Ok(Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
            })
            .collect()
    }

    fn delete(&self, reference: &StreamingRef) -> Result<()> {
        self.backend.delete(&Self::key(reference))
    }
}
