//! # authgraph
//!
//! Storage core for a property graph whose every value carries a visibility
//! expression. Reads only ever return what the caller's authorizations permit.
//!
//! ## Core Principles
//!
//! - **Visibility Everywhere**: elements, properties, metadata, edge references and
//!   extended data cells are each labelled and filtered on read
//! - **Versioned Properties**: a property is identified by (key, name, visibility)
//!   and keeps its history
//! - **Explicit Fetches**: data not requested through [`FetchHints`] is an error to
//!   access, never silently empty
//! - **Reversible Hiding**: hide/visible and soft delete leave data in place;
//!   hard delete removes it
//! - **Persistence Primary**: durable storage with RocksDB, in-memory for tests
//!
//! ## Architecture
//!
//! ```text
//! Mutation builders / path finder
//!     ↓
//! Graph (create, update, read, delete, cache, events, search index)
//!     ↓
//! Metadata store (schema, coordination between processes)
//!     ↓
//! Row/cell encoding (visibility + timestamp per cell)
//!     ↓
//! Storage Backend (RocksDB, memory)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use authgraph::{Authorizations, FetchHints, Graph, GraphElement, MutationBuilder, Visibility};
//!
//! let graph = Graph::in_memory().unwrap();
//! let auths = Authorizations::new(["a"]);
//!
//! graph
//!     .prepare_vertex_with_id("v1", Visibility::empty())
//!     .set_property("name", "secret", Visibility::new("a"))
//!     .unwrap()
//!     .save(&auths)
//!     .unwrap();
//!
//! let vertex = graph.vertex("v1", FetchHints::all(), &auths).unwrap().unwrap();
//! assert_eq!(vertex.property_value("name").unwrap(), Some("secret".into()));
//!
//! // Without the "a" token the property is filtered out.
//! let vertex = graph
//!     .vertex("v1", FetchHints::all(), &Authorizations::empty())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(vertex.property_value("name").unwrap(), None);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod algorithms;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod model;
pub mod mutation;
pub mod security;
pub mod storage;

// Re-export main types
pub use algorithms::{FindPathOptions, Path};
pub use config::{GraphConfig, ProviderRegistry};
pub use engine::{
    ElementRef, Graph, GraphBuilder, GraphEvent, GraphEventListener, IdGenerator,
    NopSearchIndex, SearchIndex, SequentialIdGenerator, UuidIdGenerator,
};
pub use error::{GraphError, Result};
pub use metadata::{CoordinationService, InProcessCoordinator, MetadataStore};
pub use model::{
    Direction, Edge, EdgeInfo, EdgesSummary, Element, ElementType, ExtendedDataRow,
    ExtendedDataRowId, FetchHints, FetchHintsBuilder, GraphElement, HistoricalPropertyValue,
    Metadata, MetadataEntry, Property, PropertyDataType, PropertyDefinition, PropertyValue,
    StreamingPropertyValue, TimeRange, Vertex,
};
pub use mutation::{ElementMutation, IndexHint, MutationBuilder};
pub use security::{Authorizations, Visibility};
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
pub use storage::{MemoryBackend, StorageBackend, StreamingValueSink};
