//! Property metadata: visibility-scoped key/value side annotations.

use super::fetch_hints::FetchHints;
use super::property::PropertyValue;
use crate::error::{GraphError, Result};
use crate::security::Visibility;
use std::sync::Arc;

/// One metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    key: String,
    value: PropertyValue,
    visibility: Visibility,
}

impl MetadataEntry {
    /// Create an entry.
    pub fn new(key: impl Into<String>, value: PropertyValue, visibility: Visibility) -> Self {
        Self {
            key: key.into(),
            value,
            visibility,
        }
    }

    /// Entry key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Entry value.
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Entry visibility.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

/// Metadata attached to a property.
///
/// Entries are identified by (key, visibility). When loaded from storage the
/// metadata remembers the fetch hints used, and lookups of keys outside those
/// hints fail.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
    fetch_hints: Option<Arc<FetchHints>>,
}

impl Metadata {
    /// Empty, unrestricted metadata (used when building mutations).
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn loaded(entries: Vec<MetadataEntry>, fetch_hints: Arc<FetchHints>) -> Self {
        Self {
            entries,
            fetch_hints: Some(fetch_hints),
        }
    }

    /// Builder pattern: add an entry and return self.
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
        visibility: Visibility,
    ) -> Self {
        self.add(key, value, visibility);
        self
    }

    /// Add or replace the entry (key, visibility).
    pub fn add(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
        visibility: Visibility,
    ) {
        let key = key.into();
        self.entries
            .retain(|e| !(e.key == key && e.visibility == visibility));
        self.entries
            .push(MetadataEntry::new(key, value.into(), visibility));
    }

    /// Remove the entry (key, visibility), returning it if present.
    pub fn remove(&mut self, key: &str, visibility: &Visibility) -> Option<MetadataEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.key == key && e.visibility == *visibility)?;
        Some(self.entries.remove(pos))
    }

    /// Remove every entry with this key regardless of visibility.
    pub fn remove_all(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }

    /// All entries.
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Exact lookup by key and visibility.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::FetchHintsViolation`] if the key was not fetched.
    pub fn entry(&self, key: &str, visibility: &Visibility) -> Result<Option<&MetadataEntry>> {
        self.check_key(key)?;
        Ok(self
            .entries
            .iter()
            .find(|e| e.key == key && e.visibility == *visibility))
    }

    /// Lookup by key alone.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AmbiguousMetadata`] if several visibilities carry the key
    /// and [`GraphError::FetchHintsViolation`] if the key was not fetched.
    pub fn entry_by_key(&self, key: &str) -> Result<Option<&MetadataEntry>> {
        self.check_key(key)?;
        let mut matching = self.entries.iter().filter(|e| e.key == key);
        let first = matching.next();
        let rest = matching.count();
        if rest > 0 {
            return Err(GraphError::AmbiguousMetadata {
                key: key.to_string(),
                count: rest + 1,
            });
        }
        Ok(first)
    }

    /// Value of the single entry with this key.
    ///
    /// # Errors
    ///
    /// Same as [`Metadata::entry_by_key`].
    pub fn value(&self, key: &str) -> Result<Option<&PropertyValue>> {
        Ok(self.entry_by_key(key)?.map(MetadataEntry::value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_key(&self, key: &str) -> Result<()> {
        match &self.fetch_hints {
            Some(hints) if !hints.is_include_metadata_key(key) => Err(GraphError::fetch_hints(
                format!("metadata {key}"),
                format!("metadata key '{key}' was not included in the fetch hints"),
            )),
            _ => Ok(()),
        }
    }
}
