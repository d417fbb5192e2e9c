//! Externalized (streaming) property values.
//!
//! Large payloads are not embedded in element rows. Before a save the payload is
//! held in memory; after the save it is replaced by a reference into a
//! [`StreamingValueSink`] and reopened lazily on read.

use crate::error::{GraphError, Result};
use crate::storage::{StreamingRef, StreamingValueSink};
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// A property value whose payload lives outside the element row.
#[derive(Clone)]
pub struct StreamingPropertyValue {
    length: u64,
    searchable: bool,
    state: StreamingState,
}

#[derive(Clone)]
enum StreamingState {
    Pending(Arc<Vec<u8>>),
    Stored {
        reference: StreamingRef,
        sink: Arc<dyn StreamingValueSink>,
    },
}

impl StreamingPropertyValue {
    /// Wrap an in-memory payload that will be externalized on save.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            length: bytes.len() as u64,
            searchable: false,
            state: StreamingState::Pending(Arc::new(bytes)),
        }
    }

    /// Wrap a text payload; text payloads are searchable by default.
    pub fn from_string(text: impl Into<String>) -> Self {
        let mut value = Self::from_bytes(text.into().into_bytes());
        value.searchable = true;
        value
    }

    /// Mark whether the search index should see this payload.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Lazy reference to a payload already stored in `sink`.
    pub fn stored(
        reference: StreamingRef,
        length: u64,
        searchable: bool,
        sink: Arc<dyn StreamingValueSink>,
    ) -> Self {
        Self {
            length,
            searchable,
            state: StreamingState::Stored { reference, sink },
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns true for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the payload should be indexed.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Sink reference, once the value has been saved.
    pub fn reference(&self) -> Option<&StreamingRef> {
        match &self.state {
            StreamingState::Pending(_) => None,
            StreamingState::Stored { reference, .. } => Some(reference),
        }
    }

    /// Payload still held in memory, before the value has been saved.
    pub(crate) fn pending_bytes(&self) -> Option<&[u8]> {
        match &self.state {
            StreamingState::Pending(bytes) => Some(bytes.as_slice()),
            StreamingState::Stored { .. } => None,
        }
    }

    /// Open the payload for reading, contacting the sink if it was stored.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the sink cannot produce the stream.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.state {
            StreamingState::Pending(bytes) => Ok(Box::new(Cursor::new(bytes.as_ref().clone()))),
            StreamingState::Stored { reference, sink } => sink
                .open_input_streams(std::slice::from_ref(reference))?
                .pop()
                .ok_or_else(|| {
                    GraphError::storage(
                        format!("Streaming sink returned no stream for {reference}"),
                        None::<std::io::Error>,
                    )
                }),
        }
    }

    /// Read the whole payload into memory.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the payload cannot be read.
    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.length as usize);
        self.open()?
            .read_to_end(&mut buf)
            .map_err(|e| GraphError::storage("Failed to read streaming value", Some(e)))?;
        Ok(buf)
    }

    /// Read the whole payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if the payload is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        String::from_utf8(self.read_to_vec()?)
            .map_err(|e| GraphError::serialization("Streaming value is not UTF-8", Some(e)))
    }
}

impl PartialEq for StreamingPropertyValue {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        match (&self.state, &other.state) {
            (StreamingState::Pending(a), StreamingState::Pending(b)) => a == b,
            (StreamingState::Stored { reference: a, .. }, StreamingState::Stored { reference: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Debug for StreamingPropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StreamingPropertyValue");
        s.field("length", &self.length);
        match &self.state {
            StreamingState::Pending(_) => s.field("state", &"pending"),
            StreamingState::Stored { reference, .. } => s.field("reference", reference),
        };
        s.finish()
    }
}
