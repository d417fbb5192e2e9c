//! Core data model types.
//!
//! This module defines the fundamental building blocks:
//! - [`Vertex`], [`Edge`], [`ExtendedDataRow`] and the [`Element`] sum type
//! - [`Property`] and [`Metadata`]: versioned, visibility-scoped values
//! - [`FetchHints`]: what was loaded, enforced by every accessor
//! - [`PropertyDefinition`]: schema entries
//! - [`HistoricalPropertyValue`]: stored versions of a property

mod definition;
mod edge;
mod element;
mod extended_data;
mod fetch_hints;
mod history;
mod metadata;
mod property;
mod streaming;
mod vertex;

pub use definition::{PropertyDefinition, TextIndexHint};
pub use edge::Edge;
pub use element::{
    is_reserved_property_name, Direction, Element, ElementCore, ElementType, GraphElement,
    CONCEPT_TYPE_PROPERTY_NAME, EDGE_LABEL_PROPERTY_NAME, EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME,
    EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME, EXTENDED_DATA_ROW_ID_PROPERTY_NAME,
    EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME, ID_PROPERTY_NAME, IN_OR_OUT_VERTEX_ID_PROPERTY_NAME,
    IN_VERTEX_ID_PROPERTY_NAME, OUT_VERTEX_ID_PROPERTY_NAME, RESERVED_PROPERTY_NAMES,
};
pub use extended_data::{ExtendedDataRow, ExtendedDataRowId};
pub use fetch_hints::{FetchHints, FetchHintsBuilder};
pub use history::{HistoricalPropertyValue, TimeRange};
pub use metadata::{Metadata, MetadataEntry};
pub use property::{Property, PropertyDataType, PropertyValue};
pub use streaming::StreamingPropertyValue;
pub use vertex::{EdgeInfo, EdgesSummary, Vertex};
