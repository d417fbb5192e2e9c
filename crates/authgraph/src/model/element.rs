//! Element core state, reserved property names and the [`GraphElement`] trait.

use super::edge::Edge;
use super::extended_data::ExtendedDataRow;
use super::fetch_hints::FetchHints;
use super::property::{Property, PropertyValue};
use super::vertex::Vertex;
use crate::error::{GraphError, Result};
use crate::security::{Authorizations, Visibility};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Reserved property: the element id.
pub const ID_PROPERTY_NAME: &str = "__id";
/// Reserved property: the edge label.
pub const EDGE_LABEL_PROPERTY_NAME: &str = "__edgeLabel";
/// Reserved property: the edge's out-vertex id.
pub const OUT_VERTEX_ID_PROPERTY_NAME: &str = "__outVertexId";
/// Reserved property: the edge's in-vertex id.
pub const IN_VERTEX_ID_PROPERTY_NAME: &str = "__inVertexId";
/// Reserved property: both endpoint ids of an edge.
pub const IN_OR_OUT_VERTEX_ID_PROPERTY_NAME: &str = "__inOrOutVertexId";
/// Reserved property: the vertex concept type.
pub const CONCEPT_TYPE_PROPERTY_NAME: &str = "__conceptType";
/// Reserved property: extended data table name.
pub const EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME: &str = "__extendedDataTableName";
/// Reserved property: extended data row id.
pub const EXTENDED_DATA_ROW_ID_PROPERTY_NAME: &str = "__extendedDataRowId";
/// Reserved property: id of the element owning an extended data row.
pub const EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME: &str = "__extendedDataElementId";
/// Reserved property: type of the element owning an extended data row.
pub const EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME: &str = "__extendedDataElementType";

/// Every reserved property name.
pub const RESERVED_PROPERTY_NAMES: &[&str] = &[
    ID_PROPERTY_NAME,
    EDGE_LABEL_PROPERTY_NAME,
    OUT_VERTEX_ID_PROPERTY_NAME,
    IN_VERTEX_ID_PROPERTY_NAME,
    IN_OR_OUT_VERTEX_ID_PROPERTY_NAME,
    CONCEPT_TYPE_PROPERTY_NAME,
    EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME,
    EXTENDED_DATA_ROW_ID_PROPERTY_NAME,
    EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME,
    EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME,
];

/// Returns true for names that are computed from element identity.
pub fn is_reserved_property_name(name: &str) -> bool {
    RESERVED_PROPERTY_NAMES.contains(&name)
}

/// Kind of a top-level element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    /// A vertex
    Vertex,
    /// An edge
    Edge,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Vertex => write!(f, "vertex"),
            ElementType::Edge => write!(f, "edge"),
        }
    }
}

/// Direction for edge and neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow outgoing edges (from this vertex)
    Outgoing,
    /// Follow incoming edges (to this vertex)
    Incoming,
    /// Follow edges in both directions
    Both,
}

/// State shared by vertices, edges and extended data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementCore {
    pub(crate) id: String,
    pub(crate) visibility: Visibility,
    pub(crate) timestamp: i64,
    pub(crate) fetch_hints: Arc<FetchHints>,
    pub(crate) properties: Vec<Property>,
    pub(crate) hidden_visibilities: BTreeSet<Visibility>,
    pub(crate) extended_data_table_names: BTreeSet<String>,
    pub(crate) authorizations: Authorizations,
}

impl ElementCore {
    pub(crate) fn new(
        id: impl Into<String>,
        visibility: Visibility,
        timestamp: i64,
        fetch_hints: Arc<FetchHints>,
        authorizations: Authorizations,
    ) -> Self {
        Self {
            id: id.into(),
            visibility,
            timestamp,
            fetch_hints,
            properties: Vec::new(),
            hidden_visibilities: BTreeSet::new(),
            extended_data_table_names: BTreeSet::new(),
            authorizations,
        }
    }
}

/// Minimal element interface plus property accessors built on it.
///
/// Implementors provide [`GraphElement::core`] and
/// [`GraphElement::reserved_property`]; every other method is derived. Accessors
/// for data the fetch hints did not load fail with
/// [`GraphError::FetchHintsViolation`]. Reserved names bypass the check.
pub trait GraphElement {
    /// Shared element state.
    fn core(&self) -> &ElementCore;

    /// Synthetic property computed from identity, if `name` is reserved for this
    /// kind of element.
    fn reserved_property(&self, name: &str) -> Option<Property>;

    /// Element id.
    fn id(&self) -> &str {
        &self.core().id
    }

    /// Element visibility.
    fn visibility(&self) -> &Visibility {
        &self.core().visibility
    }

    /// Element timestamp.
    fn timestamp(&self) -> i64 {
        self.core().timestamp
    }

    /// Hints this element was loaded with.
    fn fetch_hints(&self) -> &FetchHints {
        &self.core().fetch_hints
    }

    /// Authorizations this element was loaded with.
    fn authorizations(&self) -> &Authorizations {
        &self.core().authorizations
    }

    /// Visibilities under which the element is hidden (only populated when hidden
    /// data was fetched).
    fn hidden_visibilities(&self) -> &BTreeSet<Visibility> {
        &self.core().hidden_visibilities
    }

    /// Whether the element is hidden from a caller with `authorizations`.
    fn is_hidden(&self, authorizations: &Authorizations) -> bool {
        self.core()
            .hidden_visibilities
            .iter()
            .any(|v| authorizations.can_read(v))
    }

    /// All loaded properties.
    ///
    /// # Errors
    ///
    /// Fails if no properties were fetched.
    fn properties(&self) -> Result<&[Property]> {
        if !self.fetch_hints().is_include_properties() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "properties were not included in the fetch hints",
            ));
        }
        Ok(&self.core().properties)
    }

    /// First property with this name.
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn property(&self, name: &str) -> Result<Option<Cow<'_, Property>>> {
        if let Some(reserved) = self.reserved_property(name) {
            return Ok(Some(Cow::Owned(reserved)));
        }
        check_property_fetched(self, name)?;
        Ok(self
            .core()
            .properties
            .iter()
            .find(|p| p.name() == name)
            .map(Cow::Borrowed))
    }

    /// Property with this key and name (any visibility).
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn property_by_key(&self, key: &str, name: &str) -> Result<Option<Cow<'_, Property>>> {
        if let Some(reserved) = self.reserved_property(name) {
            return Ok(Some(Cow::Owned(reserved)));
        }
        check_property_fetched(self, name)?;
        Ok(self
            .core()
            .properties
            .iter()
            .find(|p| p.key() == key && p.name() == name)
            .map(Cow::Borrowed))
    }

    /// Property with the exact identity (key, name, visibility).
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn property_exact(
        &self,
        key: &str,
        name: &str,
        visibility: &Visibility,
    ) -> Result<Option<&Property>> {
        check_property_fetched(self, name)?;
        Ok(self
            .core()
            .properties
            .iter()
            .find(|p| p.matches(key, name, Some(visibility))))
    }

    /// Every property with this name.
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn properties_named(&self, name: &str) -> Result<Vec<Cow<'_, Property>>> {
        if let Some(reserved) = self.reserved_property(name) {
            return Ok(vec![Cow::Owned(reserved)]);
        }
        check_property_fetched(self, name)?;
        Ok(self
            .core()
            .properties
            .iter()
            .filter(|p| p.name() == name)
            .map(Cow::Borrowed)
            .collect())
    }

    /// Value of the first property with this name.
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn property_value(&self, name: &str) -> Result<Option<PropertyValue>> {
        Ok(self.property(name)?.map(|p| p.value().clone()))
    }

    /// Values of every property with this name.
    ///
    /// # Errors
    ///
    /// Fails if the name was not fetched.
    fn property_values(&self, name: &str) -> Result<Vec<PropertyValue>> {
        Ok(self
            .properties_named(name)?
            .into_iter()
            .map(|p| p.value().clone())
            .collect())
    }

    /// Names of the extended data tables attached to this element.
    ///
    /// # Errors
    ///
    /// Fails if table names were not fetched.
    fn extended_data_table_names(&self) -> Result<&BTreeSet<String>> {
        if !self.fetch_hints().is_include_extended_data_table_names() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "extended data table names were not included in the fetch hints",
            ));
        }
        Ok(&self.core().extended_data_table_names)
    }
}

fn check_property_fetched<E: GraphElement + ?Sized>(element: &E, name: &str) -> Result<()> {
    if element.fetch_hints().is_include_property(name) {
        Ok(())
    } else {
        Err(GraphError::fetch_hints(
            element.id(),
            format!("property '{name}' was not included in the fetch hints"),
        ))
    }
}

/// Any element returned by the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A vertex
    Vertex(Vertex),
    /// An edge
    Edge(Edge),
    /// A row of an element's extended data table
    ExtendedDataRow(ExtendedDataRow),
}

impl Element {
    /// Top-level element type; `None` for extended data rows.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Element::Vertex(_) => Some(ElementType::Vertex),
            Element::Edge(_) => Some(ElementType::Edge),
            Element::ExtendedDataRow(_) => None,
        }
    }

    /// The vertex, if this is one.
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Element::Vertex(v) => Some(v),
            _ => None,
        }
    }

    /// The edge, if this is one.
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Edge(e) => Some(e),
            _ => None,
        }
    }
}

impl GraphElement for Element {
    fn core(&self) -> &ElementCore {
        match self {
            Element::Vertex(v) => v.core(),
            Element::Edge(e) => e.core(),
            Element::ExtendedDataRow(r) => r.core(),
        }
    }

    fn reserved_property(&self, name: &str) -> Option<Property> {
        match self {
            Element::Vertex(v) => v.reserved_property(name),
            Element::Edge(e) => e.reserved_property(name),
            Element::ExtendedDataRow(r) => r.reserved_property(name),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Vertex(v) => write!(f, "{v}"),
            Element::Edge(e) => write!(f, "{e}"),
            Element::ExtendedDataRow(r) => write!(f, "{r}"),
        }
    }
}

impl From<Vertex> for Element {
    fn from(value: Vertex) -> Self {
        Element::Vertex(value)
    }
}

impl From<Edge> for Element {
    fn from(value: Edge) -> Self {
        Element::Edge(value)
    }
}

impl From<ExtendedDataRow> for Element {
    fn from(value: ExtendedDataRow) -> Self {
        Element::ExtendedDataRow(value)
    }
}

/// Id property shared by every element kind.
pub(crate) fn id_property(core: &ElementCore) -> Property {
    Property::reserved(
        ID_PROPERTY_NAME,
        PropertyValue::String(core.id.clone()),
        core.timestamp,
    )
}
