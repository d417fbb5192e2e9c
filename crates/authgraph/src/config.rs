//! Graph configuration and the provider registry.
//!
//! [`GraphConfig`] is plain data: build it in code or deserialize it from JSON.
//! Pluggable components (id generator, search index) are named in the config and
//! resolved once, at graph construction, through a [`ProviderRegistry`].

use crate::engine::{IdGenerator, NopSearchIndex, SearchIndex, SequentialIdGenerator, UuidIdGenerator};
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the default id generator.
pub const UUID_ID_GENERATOR: &str = "uuid";
/// Name of the deterministic id generator.
pub const SEQUENTIAL_ID_GENERATOR: &str = "sequential";
/// Name of the no-op search index.
pub const NOP_SEARCH_INDEX: &str = "nop";

/// Runtime configuration of a [`crate::Graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Reject properties whose name has no registered definition.
    pub strict_typing: bool,
    /// Maximum cached vertices (0 disables the vertex cache).
    pub vertex_cache_capacity: usize,
    /// Maximum cached edges (0 disables the edge cache).
    pub edge_cache_capacity: usize,
    /// Byte values longer than this are externalized to the streaming sink.
    pub max_inline_value_size: usize,
    /// Coordination path under which metadata change notifications are published.
    pub metadata_coordination_path: String,
    /// Registered name of the id generator.
    pub id_generator: String,
    /// Registered name of the search index.
    pub search_index: String,
    /// Hard deletes flush once more than this many items are pending.
    pub delete_batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            strict_typing: false,
            vertex_cache_capacity: 10_000,
            edge_cache_capacity: 10_000,
            max_inline_value_size: 10 * 1024,
            metadata_coordination_path: "/authgraph/metadata".to_string(),
            id_generator: UUID_ID_GENERATOR.to_string(),
            search_index: NOP_SEARCH_INDEX.to_string(),
            delete_batch_size: 100,
        }
    }
}

impl GraphConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GraphError::serialization("Failed to parse graph config", Some(e)))
    }

    /// Enable or disable strict typing.
    pub fn with_strict_typing(mut self, strict: bool) -> Self {
        self.strict_typing = strict;
        self
    }

    /// Set the id generator name.
    pub fn with_id_generator(mut self, name: impl Into<String>) -> Self {
        self.id_generator = name.into();
        self
    }

    /// Set the search index name.
    pub fn with_search_index(mut self, name: impl Into<String>) -> Self {
        self.search_index = name.into();
        self
    }

    /// Set the inline size limit for byte values.
    pub fn with_max_inline_value_size(mut self, size: usize) -> Self {
        self.max_inline_value_size = size;
        self
    }

    /// Set both element cache capacities.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.vertex_cache_capacity = capacity;
        self.edge_cache_capacity = capacity;
        self
    }

    /// Set the hard-delete batch threshold.
    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size;
        self
    }
}

/// Factory for an id generator.
pub type IdGeneratorFactory = Arc<dyn Fn(&GraphConfig) -> Result<Arc<dyn IdGenerator>> + Send + Sync>;
/// Factory for a search index.
pub type SearchIndexFactory = Arc<dyn Fn(&GraphConfig) -> Result<Arc<dyn SearchIndex>> + Send + Sync>;

/// Maps configuration names to component factories.
///
/// [`ProviderRegistry::new`] registers the built-in providers; applications add
/// their own before opening the graph.
#[derive(Clone)]
pub struct ProviderRegistry {
    id_generators: HashMap<String, IdGeneratorFactory>,
    search_indexes: HashMap<String, SearchIndexFactory>,
}

impl ProviderRegistry {
    /// Registry with the built-in providers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register_id_generator(UUID_ID_GENERATOR, |_| Ok(Arc::new(UuidIdGenerator)))
            .register_id_generator(SEQUENTIAL_ID_GENERATOR, |_| {
                Ok(Arc::new(SequentialIdGenerator::new("")))
            })
            .register_search_index(NOP_SEARCH_INDEX, |_| Ok(Arc::new(NopSearchIndex)));
        registry
    }

    /// Registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            id_generators: HashMap::new(),
            search_indexes: HashMap::new(),
        }
    }

    /// Register (or replace) an id generator factory.
    pub fn register_id_generator<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&GraphConfig) -> Result<Arc<dyn IdGenerator>> + Send + Sync + 'static,
    {
        self.id_generators.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register (or replace) a search index factory.
    pub fn register_search_index<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&GraphConfig) -> Result<Arc<dyn SearchIndex>> + Send + Sync + 'static,
    {
        self.search_indexes.insert(name.into(), Arc::new(factory));
        self
    }

    /// Build the id generator named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for an unregistered name, or the
    /// factory's own error.
    pub fn id_generator(&self, config: &GraphConfig) -> Result<Arc<dyn IdGenerator>> {
        let factory = self.id_generators.get(&config.id_generator).ok_or_else(|| {
            GraphError::invalid(format!("Unknown id generator '{}'", config.id_generator))
        })?;
        factory(config)
    }

    /// Build the search index named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for an unregistered name, or the
    /// factory's own error.
    pub fn search_index(&self, config: &GraphConfig) -> Result<Arc<dyn SearchIndex>> {
        let factory = self.search_indexes.get(&config.search_index).ok_or_else(|| {
            GraphError::invalid(format!("Unknown search index '{}'", config.search_index))
        })?;
        factory(config)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
