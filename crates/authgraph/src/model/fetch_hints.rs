//! Fetch hints: which parts of an element are loaded, and the gate every accessor
//! checks before returning data.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Immutable descriptor of what was (or may be) loaded for an element.
///
/// Build with [`FetchHintsBuilder`] or use one of the presets such as
/// [`FetchHints::all`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchHints {
    include_all_properties: bool,
    property_names_to_include: BTreeSet<String>,
    include_all_property_metadata: bool,
    metadata_keys_to_include: BTreeSet<String>,
    include_hidden: bool,
    include_all_edge_refs: bool,
    include_out_edge_refs: bool,
    include_in_edge_refs: bool,
    edge_labels_of_edge_refs_to_include: BTreeSet<String>,
    include_edge_label_counts: bool,
    include_edge_ids: bool,
    include_edge_vertex_ids: bool,
    include_extended_data_table_names: bool,
}

static ALL: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::new()
        .include_all_properties(true)
        .include_all_property_metadata(true)
        .include_all_edge_refs(true)
        .include_edge_label_counts(true)
        .include_extended_data_table_names(true)
        .build_unchecked()
});

static ALL_INCLUDING_HIDDEN: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::from(FetchHints::all().clone())
        .include_hidden(true)
        .build_unchecked()
});

static NONE: LazyLock<FetchHints> = LazyLock::new(|| FetchHintsBuilder::empty().build_unchecked());

static PROPERTIES: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::empty()
        .include_all_properties(true)
        .build_unchecked()
});

static PROPERTIES_AND_METADATA: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::empty()
        .include_all_properties(true)
        .include_all_property_metadata(true)
        .build_unchecked()
});

static EDGE_REFS: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::empty()
        .include_all_edge_refs(true)
        .include_edge_ids(true)
        .include_edge_vertex_ids(true)
        .build_unchecked()
});

static EDGE_LABELS: LazyLock<FetchHints> = LazyLock::new(|| {
    FetchHintsBuilder::empty()
        .include_edge_label_counts(true)
        .build_unchecked()
});

impl FetchHints {
    /// Everything except hidden data.
    pub fn all() -> &'static FetchHints {
        &ALL
    }

    /// Everything, including hidden elements and properties.
    pub fn all_including_hidden() -> &'static FetchHints {
        &ALL_INCLUDING_HIDDEN
    }

    /// Only element identity (id, visibility, timestamp, reserved properties).
    pub fn none() -> &'static FetchHints {
        &NONE
    }

    /// All properties without metadata.
    pub fn properties() -> &'static FetchHints {
        &PROPERTIES
    }

    /// All properties with all metadata.
    pub fn properties_and_metadata() -> &'static FetchHints {
        &PROPERTIES_AND_METADATA
    }

    /// All edge references (ids and other-vertex ids), no properties.
    pub fn edge_refs() -> &'static FetchHints {
        &EDGE_REFS
    }

    /// Per-label edge counts only.
    pub fn edge_labels() -> &'static FetchHints {
        &EDGE_LABELS
    }

    /// Builder starting from nothing.
    pub fn builder() -> FetchHintsBuilder {
        FetchHintsBuilder::empty()
    }

    /// Union of several hints.
    ///
    /// Named subsets widen to "all" when any input includes all; label filters are
    /// dropped if any input fetches edge refs unfiltered.
    pub fn union(hints: &[&FetchHints]) -> FetchHints {
        let mut result = FetchHintsBuilder::empty().build_unchecked();
        let mut any_unfiltered_edge_refs = false;
        for h in hints {
            result.include_all_properties |= h.include_all_properties;
            result
                .property_names_to_include
                .extend(h.property_names_to_include.iter().cloned());
            result.include_all_property_metadata |= h.include_all_property_metadata;
            result
                .metadata_keys_to_include
                .extend(h.metadata_keys_to_include.iter().cloned());
            result.include_hidden |= h.include_hidden;
            result.include_all_edge_refs |= h.include_all_edge_refs;
            result.include_out_edge_refs |= h.include_out_edge_refs;
            result.include_in_edge_refs |= h.include_in_edge_refs;
            result.include_edge_label_counts |= h.include_edge_label_counts;
            result.include_edge_ids |= h.include_edge_ids;
            result.include_edge_vertex_ids |= h.include_edge_vertex_ids;
            result.include_extended_data_table_names |= h.include_extended_data_table_names;
            if h.has_edge_refs() && h.edge_labels_of_edge_refs_to_include.is_empty() {
                any_unfiltered_edge_refs = true;
            }
            result
                .edge_labels_of_edge_refs_to_include
                .extend(h.edge_labels_of_edge_refs_to_include.iter().cloned());
        }
        if result.include_all_properties {
            result.property_names_to_include.clear();
        }
        if result.include_all_property_metadata {
            result.metadata_keys_to_include.clear();
        }
        if any_unfiltered_edge_refs {
            result.edge_labels_of_edge_refs_to_include.clear();
        }
        result
    }

    /// Superset test: true when data loaded under `self` satisfies a request for
    /// `other`.
    pub fn has_fetch_hints(&self, other: &FetchHints) -> bool {
        if other.include_all_properties && !self.include_all_properties {
            return false;
        }
        if !self.include_all_properties
            && !other
                .property_names_to_include
                .is_subset(&self.property_names_to_include)
        {
            return false;
        }
        if other.include_all_property_metadata && !self.include_all_property_metadata {
            return false;
        }
        if !self.include_all_property_metadata
            && !other
                .metadata_keys_to_include
                .is_subset(&self.metadata_keys_to_include)
        {
            return false;
        }
        if other.include_hidden && !self.include_hidden {
            return false;
        }
        if other.include_all_edge_refs && !self.include_all_edge_refs {
            return false;
        }
        if other.include_out_edge_refs && !self.includes_out_edge_refs() {
            return false;
        }
        if other.include_in_edge_refs && !self.includes_in_edge_refs() {
            return false;
        }
        if !self.edge_labels_of_edge_refs_to_include.is_empty() {
            if other.has_edge_refs() && other.edge_labels_of_edge_refs_to_include.is_empty() {
                return false;
            }
            if !other
                .edge_labels_of_edge_refs_to_include
                .is_subset(&self.edge_labels_of_edge_refs_to_include)
            {
                return false;
            }
        }
        (!other.include_edge_label_counts || self.include_edge_label_counts)
            && (!other.include_edge_ids || self.include_edge_ids)
            && (!other.include_edge_vertex_ids || self.include_edge_vertex_ids)
            && (!other.include_extended_data_table_names || self.include_extended_data_table_names)
    }

    /// Whether a property with this name was loaded.
    pub fn is_include_property(&self, name: &str) -> bool {
        self.include_all_properties || self.property_names_to_include.contains(name)
    }

    /// Whether any property was loaded.
    pub fn is_include_properties(&self) -> bool {
        self.include_all_properties || !self.property_names_to_include.is_empty()
    }

    /// Whether any metadata was loaded.
    pub fn is_include_metadata(&self) -> bool {
        self.include_all_property_metadata || !self.metadata_keys_to_include.is_empty()
    }

    /// Whether metadata entries with this key were loaded.
    pub fn is_include_metadata_key(&self, key: &str) -> bool {
        self.include_all_property_metadata || self.metadata_keys_to_include.contains(key)
    }

    /// Whether hidden elements and properties are returned.
    pub fn is_include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Whether any edge references were requested.
    pub fn has_edge_refs(&self) -> bool {
        self.include_all_edge_refs
            || self.include_out_edge_refs
            || self.include_in_edge_refs
            || !self.edge_labels_of_edge_refs_to_include.is_empty()
    }

    /// Whether outgoing edge references are loaded.
    pub fn includes_out_edge_refs(&self) -> bool {
        self.include_all_edge_refs
            || self.include_out_edge_refs
            || (!self.edge_labels_of_edge_refs_to_include.is_empty()
                && !self.include_in_edge_refs)
    }

    /// Whether incoming edge references are loaded.
    pub fn includes_in_edge_refs(&self) -> bool {
        self.include_all_edge_refs
            || self.include_in_edge_refs
            || (!self.edge_labels_of_edge_refs_to_include.is_empty()
                && !self.include_out_edge_refs)
    }

    /// Whether an edge reference with this label is loaded.
    pub fn is_include_edge_ref_label(&self, label: &str) -> bool {
        self.edge_labels_of_edge_refs_to_include.is_empty()
            || self.edge_labels_of_edge_refs_to_include.contains(label)
    }

    /// Label filter for edge references (empty means all labels).
    pub fn edge_labels_of_edge_refs_to_include(&self) -> &BTreeSet<String> {
        &self.edge_labels_of_edge_refs_to_include
    }

    /// Whether per-label edge counts are loaded.
    pub fn is_include_edge_label_counts(&self) -> bool {
        self.include_edge_label_counts
    }

    /// Whether edge ids of edge references are loaded.
    pub fn is_include_edge_ids(&self) -> bool {
        self.include_edge_ids
    }

    /// Whether the other-vertex ids of edge references are loaded.
    pub fn is_include_edge_vertex_ids(&self) -> bool {
        self.include_edge_vertex_ids
    }

    /// Whether the element's extended data table names are loaded.
    pub fn is_include_extended_data_table_names(&self) -> bool {
        self.include_extended_data_table_names
    }

    /// Names of the individually requested properties.
    pub fn property_names_to_include(&self) -> &BTreeSet<String> {
        &self.property_names_to_include
    }

    /// Keys of the individually requested metadata.
    pub fn metadata_keys_to_include(&self) -> &BTreeSet<String> {
        &self.metadata_keys_to_include
    }
}

impl Default for FetchHints {
    fn default() -> Self {
        FetchHints::all().clone()
    }
}

/// Builder for [`FetchHints`].
#[derive(Debug, Clone)]
pub struct FetchHintsBuilder {
    hints: FetchHints,
}

impl FetchHintsBuilder {
    /// Builder with every flag off.
    pub fn empty() -> Self {
        Self {
            hints: FetchHints {
                include_all_properties: false,
                property_names_to_include: BTreeSet::new(),
                include_all_property_metadata: false,
                metadata_keys_to_include: BTreeSet::new(),
                include_hidden: false,
                include_all_edge_refs: false,
                include_out_edge_refs: false,
                include_in_edge_refs: false,
                edge_labels_of_edge_refs_to_include: BTreeSet::new(),
                include_edge_label_counts: false,
                include_edge_ids: true,
                include_edge_vertex_ids: true,
                include_extended_data_table_names: false,
            },
        }
    }

    /// Same as [`FetchHintsBuilder::empty`]; edge ids and edge vertex ids default on.
    pub fn new() -> Self {
        Self::empty()
    }

    /// Load every property.
    pub fn include_all_properties(mut self, value: bool) -> Self {
        self.hints.include_all_properties = value;
        self
    }

    /// Load only the named properties.
    pub fn property_names_to_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints
            .property_names_to_include
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Load every metadata entry.
    pub fn include_all_property_metadata(mut self, value: bool) -> Self {
        self.hints.include_all_property_metadata = value;
        self
    }

    /// Load only metadata entries with these keys.
    pub fn metadata_keys_to_include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints
            .metadata_keys_to_include
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Return hidden data.
    pub fn include_hidden(mut self, value: bool) -> Self {
        self.hints.include_hidden = value;
        self
    }

    /// Load references for edges in both directions.
    pub fn include_all_edge_refs(mut self, value: bool) -> Self {
        self.hints.include_all_edge_refs = value;
        self
    }

    /// Load references for outgoing edges.
    pub fn include_out_edge_refs(mut self, value: bool) -> Self {
        self.hints.include_out_edge_refs = value;
        self
    }

    /// Load references for incoming edges.
    pub fn include_in_edge_refs(mut self, value: bool) -> Self {
        self.hints.include_in_edge_refs = value;
        self
    }

    /// Restrict edge references to these labels.
    pub fn edge_labels_of_edge_refs_to_include<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints
            .edge_labels_of_edge_refs_to_include
            .extend(labels.into_iter().map(Into::into));
        self
    }

    /// Load per-label edge counts.
    pub fn include_edge_label_counts(mut self, value: bool) -> Self {
        self.hints.include_edge_label_counts = value;
        self
    }

    /// Load edge ids of edge references.
    pub fn include_edge_ids(mut self, value: bool) -> Self {
        self.hints.include_edge_ids = value;
        self
    }

    /// Load the other-vertex ids of edge references.
    pub fn include_edge_vertex_ids(mut self, value: bool) -> Self {
        self.hints.include_edge_vertex_ids = value;
        self
    }

    /// Load the element's extended data table names.
    pub fn include_extended_data_table_names(mut self, value: bool) -> Self {
        self.hints.include_extended_data_table_names = value;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidFetchHints`] when edge references are requested
    /// but neither edge ids nor edge vertex ids are, because such references could
    /// never be resolved.
    pub fn build(self) -> Result<FetchHints> {
        let hints = self.hints;
        if hints.has_edge_refs() && !hints.include_edge_ids && !hints.include_edge_vertex_ids {
            return Err(GraphError::InvalidFetchHints {
                message: "edge refs were requested without edge ids or edge vertex ids"
                    .to_string(),
            });
        }
        Ok(hints)
    }

    fn build_unchecked(self) -> FetchHints {
        self.hints
    }
}

impl Default for FetchHintsBuilder {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<FetchHints> for FetchHintsBuilder {
    fn from(hints: FetchHints) -> Self {
        Self { hints }
    }
}
