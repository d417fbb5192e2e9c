//! Property definitions (schema entries).

use super::element::{
    CONCEPT_TYPE_PROPERTY_NAME, EDGE_LABEL_PROPERTY_NAME, EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME,
    EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME, EXTENDED_DATA_ROW_ID_PROPERTY_NAME,
    EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME, ID_PROPERTY_NAME, IN_OR_OUT_VERTEX_ID_PROPERTY_NAME,
    IN_VERTEX_ID_PROPERTY_NAME, OUT_VERTEX_ID_PROPERTY_NAME, RESERVED_PROPERTY_NAMES,
};
use super::property::PropertyDataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the search index should treat text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextIndexHint {
    /// Tokenized full-text search
    FullText,
    /// Exact-match (keyword) search
    ExactMatch,
}

/// Schema entry for a property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Value type
    pub data_type: PropertyDataType,
    /// Text indexing hints; empty means not text-indexed
    pub text_index_hints: BTreeSet<TextIndexHint>,
    /// Search boost
    pub boost: Option<f64>,
    /// Whether results may be sorted by this property
    pub sortable: bool,
}

impl PropertyDefinition {
    /// Definition with default indexing for the type.
    ///
    /// Strings default to both full-text and exact-match indexing.
    pub fn new(name: impl Into<String>, data_type: PropertyDataType) -> Self {
        let text_index_hints = if data_type == PropertyDataType::String {
            [TextIndexHint::FullText, TextIndexHint::ExactMatch]
                .into_iter()
                .collect()
        } else {
            BTreeSet::new()
        };
        Self {
            name: name.into(),
            data_type,
            text_index_hints,
            boost: None,
            sortable: true,
        }
    }

    /// Replace the text index hints.
    pub fn with_text_index_hints(mut self, hints: impl IntoIterator<Item = TextIndexHint>) -> Self {
        self.text_index_hints = hints.into_iter().collect();
        self
    }

    /// Set the search boost.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Set sortability.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Built-in definition for a reserved name.
    pub fn built_in(name: &str) -> Option<PropertyDefinition> {
        if !RESERVED_PROPERTY_NAMES.contains(&name) {
            return None;
        }
        let data_type = match name {
            IN_OR_OUT_VERTEX_ID_PROPERTY_NAME => PropertyDataType::StringList,
            ID_PROPERTY_NAME
            | EDGE_LABEL_PROPERTY_NAME
            | OUT_VERTEX_ID_PROPERTY_NAME
            | IN_VERTEX_ID_PROPERTY_NAME
            | CONCEPT_TYPE_PROPERTY_NAME
            | EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME
            | EXTENDED_DATA_ROW_ID_PROPERTY_NAME
            | EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME
            | EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME => PropertyDataType::String,
            _ => return None,
        };
        Some(
            PropertyDefinition::new(name, data_type)
                .with_text_index_hints([TextIndexHint::ExactMatch]),
        )
    }
}
