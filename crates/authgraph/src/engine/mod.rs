//! The `Graph`: storage engine orchestration over a [`StorageBackend`].
//!
//! Reads decode element rows under the caller's authorizations and fetch hints.
//! Writes go through the mutation builders in [`crate::mutation`]; deletes, hides
//! and soft deletes are methods on [`Graph`] itself.

mod cache;
mod clock;
mod delete;
mod events;
mod ids;
mod read;
mod schema;
mod search;
mod write;

pub use clock::IncreasingTime;
pub use delete::ElementRef;
pub use events::{GraphEvent, GraphEventListener};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use search::{NopSearchIndex, SearchIndex};

use crate::config::{GraphConfig, ProviderRegistry};
use crate::error::{GraphError, Result};
use crate::metadata::{CoordinationService, InProcessCoordinator, MetadataStore};
use crate::model::{Edge, Element, GraphElement, Vertex};
use crate::mutation::{
    order_vertices_first, EdgeBuilder, ElementMutation, ExistingElementMutation, VertexBuilder,
};
use crate::security::{Authorizations, Visibility};
use crate::storage::{BackendStreamingSink, MemoryBackend, StorageBackend, StreamingValueSink};
use cache::ElementCache;
use log::{debug, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Metadata key recording the id generator a graph was created with.
pub const ID_GENERATOR_METADATA_KEY: &str = "authgraph.idGenerator";
/// Metadata key recording the cell encoding version.
pub const FORMAT_VERSION_METADATA_KEY: &str = "authgraph.formatVersion";
const FORMAT_VERSION: u64 = 1;

/// A property graph with visibility-scoped, versioned properties.
///
/// Every operation takes `&self`; the graph is `Send + Sync` and may be shared
/// across threads behind an [`Arc`].
pub struct Graph {
    config: GraphConfig,
    backend: Arc<dyn StorageBackend>,
    streaming: Arc<dyn StreamingValueSink>,
    search_index: Arc<dyn SearchIndex>,
    id_generator: Arc<dyn IdGenerator>,
    metadata: MetadataStore,
    clock: IncreasingTime,
    vertex_cache: ElementCache<Vertex>,
    edge_cache: ElementCache<Edge>,
    listeners: RwLock<Vec<Arc<dyn GraphEventListener>>>,
}

impl Graph {
    /// Open a graph over `backend` with default configuration and an in-process
    /// coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the metadata table cannot be read.
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Result<Self> {
        GraphBuilder::new(backend).build()
    }

    /// Start configuring a graph over `backend`.
    pub fn builder(backend: Arc<dyn StorageBackend>) -> GraphBuilder {
        GraphBuilder::new(backend)
    }

    /// Open a persistent graph at the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use authgraph::Graph;
    ///
    /// let graph = Graph::open("./my_graph.db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, GraphConfig::default())
    }

    /// Open a persistent graph with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened, or
    /// [`GraphError::InvalidOperation`] if the configuration names an unknown
    /// provider.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open_with_config<P: AsRef<std::path::Path>>(path: P, config: GraphConfig) -> Result<Self> {
        use crate::storage::RocksDBBackend;
        log::info!("Opening graph at path: {:?}", path.as_ref());
        let backend = RocksDBBackend::open(path)?;
        GraphBuilder::new(Arc::new(backend)).config(config).build()
    }

    /// Create an in-memory graph.
    ///
    /// **Warning**: All data is lost when the graph is dropped.
    ///
    /// # Errors
    ///
    /// Infallible in practice; the signature matches the persistent constructors.
    pub fn in_memory() -> Result<Self> {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Configuration the graph was opened with.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The graph-wide metadata store.
    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Next timestamp of the graph clock.
    pub fn current_time(&self) -> i64 {
        self.clock.next()
    }

    /// Register a listener for every subsequent [`GraphEvent`].
    pub fn add_listener(&self, listener: Arc<dyn GraphEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Flush the backend and the search index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if either flush fails.
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()?;
        self.search_index.flush()
    }

    /// Metadata value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the metadata table cannot be loaded.
    pub fn get_metadata(&self, key: &str) -> Result<Option<Value>> {
        self.metadata.get_metadata(key)
    }

    /// Set a metadata value and notify peers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if persisting fails.
    pub fn set_metadata(&self, key: &str, value: Value) -> Result<()> {
        self.metadata.set_metadata(key, value)
    }

    /// Remove a metadata value and notify peers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if persisting fails.
    pub fn remove_metadata(&self, key: &str) -> Result<()> {
        self.metadata.remove_metadata(key)
    }

    /// Drop cached metadata and reload it on next use.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if reloading fails.
    pub fn reload_metadata(&self) -> Result<()> {
        self.metadata.reload_metadata()
    }

    /// Builder for a vertex with a generated id.
    pub fn prepare_vertex(&self, visibility: Visibility) -> VertexBuilder<'_> {
        VertexBuilder::new(self, None, visibility)
    }

    /// Builder for a vertex with an explicit id.
    pub fn prepare_vertex_with_id(
        &self,
        vertex_id: impl Into<String>,
        visibility: Visibility,
    ) -> VertexBuilder<'_> {
        VertexBuilder::new(self, Some(vertex_id.into()), visibility)
    }

    /// Builder for an edge with a generated id.
    pub fn prepare_edge(
        &self,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
        label: impl Into<String>,
        visibility: Visibility,
    ) -> EdgeBuilder<'_> {
        EdgeBuilder::new(
            self,
            None,
            out_vertex_id.into(),
            in_vertex_id.into(),
            label.into(),
            visibility,
        )
    }

    /// Builder for an edge with an explicit id.
    pub fn prepare_edge_with_id(
        &self,
        edge_id: impl Into<String>,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
        label: impl Into<String>,
        visibility: Visibility,
    ) -> EdgeBuilder<'_> {
        EdgeBuilder::new(
            self,
            Some(edge_id.into()),
            out_vertex_id.into(),
            in_vertex_id.into(),
            label.into(),
            visibility,
        )
    }

    /// Mutation of an existing vertex.
    pub fn prepare_vertex_mutation(&self, vertex: &Vertex) -> ExistingElementMutation<'_> {
        ExistingElementMutation::new(self, Element::Vertex(vertex.clone()))
    }

    /// Mutation of an existing edge.
    pub fn prepare_edge_mutation(&self, edge: &Edge) -> ExistingElementMutation<'_> {
        ExistingElementMutation::new(self, Element::Edge(edge.clone()))
    }

    /// Mutation of an existing vertex or edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for extended data rows, which are
    /// changed through their owning element.
    pub fn prepare_mutation(&self, element: &Element) -> Result<ExistingElementMutation<'_>> {
        match element {
            Element::Vertex(v) => Ok(self.prepare_vertex_mutation(v)),
            Element::Edge(e) => Ok(self.prepare_edge_mutation(e)),
            Element::ExtendedDataRow(row) => Err(GraphError::invalid(format!(
                "Extended data row {} is mutated through its owning element",
                row.row_id()
            ))),
        }
    }

    /// Save a batch of mutations, vertices first, in one call.
    ///
    /// Returns the saved elements in the reordered sequence.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first failing save; earlier saves stay applied.
    pub fn save_element_mutations(
        &self,
        mut mutations: Vec<ElementMutation<'_>>,
        authorizations: &Authorizations,
    ) -> Result<Vec<Element>> {
        order_vertices_first(&mut mutations);
        debug!("Saving {} element mutations", mutations.len());
        mutations
            .into_iter()
            .map(|m| m.save(authorizations))
            .collect()
    }

    pub(crate) fn fire(&self, events: Vec<GraphEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.read().clone();
        for event in &events {
            for listener in &listeners {
                listener.on_graph_event(event);
            }
        }
    }

    pub(crate) fn invalidate_vertex(&self, vertex_id: &str) {
        self.vertex_cache.invalidate(vertex_id);
    }

    pub(crate) fn invalidate_edge(&self, edge: &EdgeEndpoints) {
        self.edge_cache.invalidate(&edge.edge_id);
        self.vertex_cache.invalidate(&edge.out_vertex_id);
        self.vertex_cache.invalidate(&edge.in_vertex_id);
    }

    /// Record the id generator and encoding version on first open; warn when an
    /// existing graph was created with a different generator.
    fn check_graph_identity(&self) -> Result<()> {
        let generator = Value::String(self.config.id_generator.clone());
        match self.metadata.get_metadata(ID_GENERATOR_METADATA_KEY)? {
            None => self.metadata.set_metadata(ID_GENERATOR_METADATA_KEY, generator)?,
            Some(existing) if existing != generator => warn!(
                "Graph was created with id generator {existing}, opened with {generator}"
            ),
            Some(_) => {}
        }
        match self.metadata.get_metadata(FORMAT_VERSION_METADATA_KEY)? {
            None => self
                .metadata
                .set_metadata(FORMAT_VERSION_METADATA_KEY, Value::from(FORMAT_VERSION))?,
            Some(Value::Number(v)) if v.as_u64() == Some(FORMAT_VERSION) => {}
            Some(other) => {
                return Err(GraphError::storage(
                    format!("Unsupported graph format version {other}"),
                    None::<std::io::Error>,
                ))
            }
        }
        Ok(())
    }
}

/// Identity and endpoints of an edge; enough to touch every row the edge lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EdgeEndpoints {
    pub edge_id: String,
    pub out_vertex_id: String,
    pub in_vertex_id: String,
}

impl EdgeEndpoints {
    pub fn of(edge: &Edge) -> Self {
        Self {
            edge_id: edge.id().to_string(),
            out_vertex_id: edge.out_vertex_id().to_string(),
            in_vertex_id: edge.in_vertex_id().to_string(),
        }
    }
}

/// Configures and opens a [`Graph`].
///
/// ```
/// use authgraph::{Graph, GraphConfig, MemoryBackend};
/// use std::sync::Arc;
///
/// let graph = Graph::builder(Arc::new(MemoryBackend::new()))
///     .config(GraphConfig::default().with_strict_typing(true))
///     .build()
///     .unwrap();
/// assert!(graph.config().strict_typing);
/// ```
pub struct GraphBuilder {
    backend: Arc<dyn StorageBackend>,
    config: GraphConfig,
    registry: ProviderRegistry,
    coordinator: Option<Arc<dyn CoordinationService>>,
    streaming: Option<Arc<dyn StreamingValueSink>>,
}

impl GraphBuilder {
    /// Builder over `backend` with default configuration.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            config: GraphConfig::default(),
            registry: ProviderRegistry::new(),
            coordinator: None,
            streaming: None,
        }
    }

    /// Use this configuration.
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve providers through this registry instead of the built-in one.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Share metadata change notifications through `coordinator`.
    ///
    /// Graphs opened over the same backend with the same coordinator behave as peer
    /// processes.
    pub fn coordinator(mut self, coordinator: Arc<dyn CoordinationService>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Store streaming payloads in `sink` instead of the backing store.
    pub fn streaming_sink(mut self, sink: Arc<dyn StreamingValueSink>) -> Self {
        self.streaming = Some(sink);
        self
    }

    /// Resolve providers and open the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for unknown provider names and
    /// [`GraphError::Storage`] if the metadata table cannot be read.
    pub fn build(self) -> Result<Graph> {
        let id_generator = self.registry.id_generator(&self.config)?;
        let search_index = self.registry.search_index(&self.config)?;
        let coordinator = self
            .coordinator
            .unwrap_or_else(|| Arc::new(InProcessCoordinator::new()));
        let streaming = self
            .streaming
            .unwrap_or_else(|| Arc::new(BackendStreamingSink::new(self.backend.clone())));
        let metadata = MetadataStore::new(
            self.backend.clone(),
            coordinator,
            self.config.metadata_coordination_path.clone(),
        );
        debug!(
            "Opening graph: id_generator={}, search_index={}, strict_typing={}",
            self.config.id_generator, self.config.search_index, self.config.strict_typing
        );
        let graph = Graph {
            vertex_cache: ElementCache::new(self.config.vertex_cache_capacity),
            edge_cache: ElementCache::new(self.config.edge_cache_capacity),
            config: self.config,
            backend: self.backend,
            streaming,
            search_index,
            id_generator,
            metadata,
            clock: IncreasingTime::new(),
            listeners: RwLock::new(Vec::new()),
        };
        graph.check_graph_identity()?;
        Ok(graph)
    }
}
