//! Graph-wide metadata table with an optimistic-read cache.

use super::coordination::{CoordinationService, CoordinationWatcher};
use crate::engine::IncreasingTime;
use crate::error::{GraphError, Result};
use crate::model::PropertyDefinition;
use crate::security::Visibility;
use crate::storage::rows::{self, family, check_segment, Cell, CellValue, RowKey, RowMutation};
use crate::storage::StorageBackend;
use log::{debug, trace, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Key prefix of persisted property definitions.
pub const PROPERTY_DEFINITION_PREFIX: &str = "propertyDefinition.";

#[derive(Debug, Serialize, Deserialize)]
struct ChangeNotice {
    source: String,
    key: String,
}

struct MetadataState {
    /// Bumped on every invalidation; readers compare it before and after.
    stamp: AtomicU64,
    /// `None` means stale: reload on next touch.
    entries: RwLock<Option<BTreeMap<String, Value>>>,
    definitions: RwLock<HashMap<String, PropertyDefinition>>,
}

impl MetadataState {
    fn invalidate(&self) {
        let mut entries = self.entries.write();
        *entries = None;
        self.stamp.fetch_add(1, Ordering::AcqRel);
    }

    /// Cache `def` unless an invalidation landed after `stamp` was read.
    fn cache_definition(&self, name: &str, def: &PropertyDefinition, stamp: u64) -> bool {
        let mut definitions = self.definitions.write();
        if self.stamp.load(Ordering::Acquire) != stamp {
            trace!("Metadata changed while loading definition {name}, not caching");
            return false;
        }
        definitions.insert(name.to_string(), def.clone());
        true
    }

    fn evict_definition(&self, key: &str) {
        if let Some(name) = key.strip_prefix(PROPERTY_DEFINITION_PREFIX) {
            self.definitions.write().remove(name);
        }
    }
}

struct MetadataWatcher {
    state: Weak<MetadataState>,
    instance_id: String,
}

impl CoordinationWatcher for MetadataWatcher {
    fn on_change(&self, node_path: &str, data: &[u8]) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        match serde_json::from_slice::<ChangeNotice>(data) {
            Ok(notice) if notice.source == self.instance_id => {}
            Ok(notice) => {
                debug!("Metadata key {} changed by peer {}", notice.key, notice.source);
                state.invalidate();
                state.evict_definition(&notice.key);
            }
            Err(e) => {
                warn!("Unreadable metadata notice at {node_path}: {e}");
                state.invalidate();
                state.definitions.write().clear();
            }
        }
    }
}

/// Shared key→value table (schema, generator identity, ...) kept coherent across
/// processes through a [`CoordinationService`].
///
/// Entries are loaded lazily and cached. Writes persist, clear the whole local
/// cache and broadcast the changed key; peers clear theirs on receipt. Broadcast
/// failures are logged and swallowed: the write stands and peers catch up on the
/// next notification or [`MetadataStore::reload_metadata`].
pub struct MetadataStore {
    backend: Arc<dyn StorageBackend>,
    coordinator: Arc<dyn CoordinationService>,
    path: String,
    instance_id: String,
    clock: IncreasingTime,
    state: Arc<MetadataState>,
    _watcher: Arc<MetadataWatcher>,
}

impl MetadataStore {
    /// Create a store over `backend`, publishing and listening under `path`.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        coordinator: Arc<dyn CoordinationService>,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let instance_id = Uuid::new_v4().to_string();
        let state = Arc::new(MetadataState {
            stamp: AtomicU64::new(0),
            entries: RwLock::new(None),
            definitions: RwLock::new(HashMap::new()),
        });
        let watcher = Arc::new(MetadataWatcher {
            state: Arc::downgrade(&state),
            instance_id: instance_id.clone(),
        });
        if let Err(e) = coordinator.subscribe(&path, watcher.clone()) {
            warn!("Could not subscribe to metadata changes at {path}: {e}");
        }
        Self {
            backend,
            coordinator,
            path,
            instance_id,
            clock: IncreasingTime::new(),
            state,
            _watcher: watcher,
        }
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the table must be loaded and loading fails.
    pub fn get_metadata(&self, key: &str) -> Result<Option<Value>> {
        self.read(|entries| entries.get(key).cloned())
    }

    /// Every entry, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if loading fails.
    pub fn metadata(&self) -> Result<Vec<(String, Value)>> {
        self.read(|entries| {
            entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// Keys starting with `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if loading fails.
    pub fn metadata_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.read(|entries| {
            entries
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect()
        })
    }

    /// Persist `value` under `key` and notify peers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for an unusable key, or
    /// [`GraphError::Storage`] if persisting fails. Notification failures are not
    /// errors.
    pub fn set_metadata(&self, key: &str, value: Value) -> Result<()> {
        debug!("Setting metadata {key}");
        self.persist(key, CellValue::Json(value))
    }

    /// Persist a tombstone for `key` and notify peers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if persisting fails.
    pub fn remove_metadata(&self, key: &str) -> Result<()> {
        debug!("Removing metadata {key}");
        self.persist(key, CellValue::Marker)
    }

    /// Eagerly reload every entry from storage.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if loading fails.
    pub fn reload_metadata(&self) -> Result<()> {
        let loaded = self.load()?;
        {
            let mut entries = self.state.entries.write();
            *entries = Some(loaded);
            self.state.stamp.fetch_add(1, Ordering::AcqRel);
        }
        self.state.definitions.write().clear();
        Ok(())
    }

    /// Registered definition for property `name`, cached after first use.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if the stored definition is malformed.
    pub fn property_definition(&self, name: &str) -> Result<Option<PropertyDefinition>> {
        if let Some(def) = self.state.definitions.read().get(name) {
            return Ok(Some(def.clone()));
        }
        let stamp = self.state.stamp.load(Ordering::Acquire);
        let Some(value) = self.get_metadata(&definition_key(name))? else {
            return Ok(None);
        };
        let def: PropertyDefinition = serde_json::from_value(value).map_err(|e| {
            GraphError::serialization(format!("Malformed property definition '{name}'"), Some(e))
        })?;
        self.state.cache_definition(name, &def, stamp);
        Ok(Some(def))
    }

    /// Persist a property definition.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if persisting fails.
    pub fn save_property_definition(&self, definition: &PropertyDefinition) -> Result<()> {
        let value = serde_json::to_value(definition).map_err(|e| {
            GraphError::serialization("Failed to encode property definition", Some(e))
        })?;
        self.set_metadata(&definition_key(&definition.name), value)
    }

    /// Every persisted property definition.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if a stored definition is malformed.
    pub fn property_definitions(&self) -> Result<Vec<PropertyDefinition>> {
        self.metadata_keys_with_prefix(PROPERTY_DEFINITION_PREFIX)?
            .iter()
            .filter_map(|key| key.strip_prefix(PROPERTY_DEFINITION_PREFIX))
            .filter_map(|name| self.property_definition(name).transpose())
            .collect()
    }

    /// Optimistic read with exclusive-lock fallback.
    fn read<R>(&self, f: impl Fn(&BTreeMap<String, Value>) -> R) -> Result<R> {
        let stamp = self.state.stamp.load(Ordering::Acquire);
        if let Some(guard) = self.state.entries.try_read() {
            if let Some(entries) = guard.as_ref() {
                let result = f(entries);
                drop(guard);
                if self.state.stamp.load(Ordering::Acquire) == stamp {
                    return Ok(result);
                }
                trace!("Metadata invalidated during read, retrying under lock");
            }
        }

        let mut guard = self.state.entries.write();
        if guard.is_none() {
            debug!("Loading metadata table");
            *guard = Some(self.load()?);
        }
        Ok(f(guard.get_or_insert_with(BTreeMap::new)))
    }

    fn load(&self) -> Result<BTreeMap<String, Value>> {
        let cells = rows::read_columns(
            self.backend.as_ref(),
            &RowKey::metadata(),
            family::METADATA_ENTRY,
            &[],
        )?;
        let mut entries = BTreeMap::new();
        for cell in cells {
            let key = cell.qualifier_part(0).to_string();
            if let CellValue::Json(value) = cell.cell.value {
                entries.insert(key, value);
            }
        }
        trace!("Loaded {} metadata entries", entries.len());
        Ok(entries)
    }

    fn persist(&self, key: &str, value: CellValue) -> Result<()> {
        if key.is_empty() {
            return Err(GraphError::invalid("Metadata key cannot be empty"));
        }
        check_segment("metadata key", key)?;

        let mut mutation = RowMutation::new(RowKey::metadata());
        mutation.put(
            family::METADATA_ENTRY,
            &[key],
            &Cell::new(Visibility::empty(), self.clock.next(), value),
        )?;
        mutation.apply(self.backend.as_ref())?;

        self.state.invalidate();
        self.state.evict_definition(key);
        self.broadcast(key);
        Ok(())
    }

    fn broadcast(&self, key: &str) {
        let notice = ChangeNotice {
            source: self.instance_id.clone(),
            key: key.to_string(),
        };
        let data = match serde_json::to_vec(&notice) {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not encode metadata notice for {key}: {e}");
                return;
            }
        };
        if let Err(e) = self.coordinator.create_ephemeral_sequential(&self.path, &data) {
            warn!("Could not broadcast metadata change for {key}: {e}");
        }
    }
}

fn definition_key(name: &str) -> String {
    format!("{PROPERTY_DEFINITION_PREFIX}{name}")
}
