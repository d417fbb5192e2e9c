//! Mutation builders for new and existing elements.

use super::changes::{
    AlterPropertyVisibility, ExtendedDataAdd, ExtendedDataDelete, IndexHint, PropertyChanges,
    SetPropertyMetadata,
};
use crate::engine::Graph;
use crate::error::{GraphError, Result};
use crate::model::{Edge, Element, ElementType, GraphElement, Metadata, PropertyValue, Vertex};
use crate::security::{Authorizations, Visibility};

/// Chainable change-accumulation methods shared by every builder.
///
/// Implementors expose their [`PropertyChanges`]; everything else is provided.
pub trait MutationBuilder: Sized {
    /// Accumulated changes.
    fn changes(&self) -> &PropertyChanges;

    /// Mutable access to the accumulated changes.
    fn changes_mut(&mut self) -> &mut PropertyChanges;

    /// Add or overwrite the property (key, name, visibility).
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or the value is null.
    fn add_property_value(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut().add_property_value(
            key,
            name,
            value.into(),
            Metadata::new(),
            None,
            visibility,
        )?;
        Ok(self)
    }

    /// Add or overwrite a property with metadata and an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or the value is null.
    fn add_property_value_full(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        metadata: Metadata,
        timestamp: Option<i64>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut()
            .add_property_value(key, name, value.into(), metadata, timestamp, visibility)?;
        Ok(self)
    }

    /// Single-valued shorthand: property with the empty key.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or the value is null.
    fn set_property(
        self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.add_property_value("", name, value, visibility)
    }

    /// Permanently delete a property; every visibility when `visibility` is `None`.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty.
    fn delete_property(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Option<Visibility>,
    ) -> Result<Self> {
        self.changes_mut().delete_property(key, name, visibility)?;
        Ok(self)
    }

    /// Soft-delete a property; every visibility when `visibility` is `None`.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty.
    fn soft_delete_property(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Option<Visibility>,
        timestamp: Option<i64>,
    ) -> Result<Self> {
        self.changes_mut()
            .soft_delete_property(key, name, visibility, timestamp)?;
        Ok(self)
    }

    /// Set a metadata entry on the property (key, name, property_visibility).
    ///
    /// # Errors
    ///
    /// Fails when a name or key is empty or the value is null.
    fn set_property_metadata(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        property_visibility: Visibility,
        metadata_key: impl Into<String>,
        value: impl Into<PropertyValue>,
        metadata_visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut().set_property_metadata(SetPropertyMetadata {
            property_key: key.into(),
            property_name: name.into(),
            property_visibility,
            metadata_key: metadata_key.into(),
            value: value.into(),
            metadata_visibility,
        })?;
        Ok(self)
    }

    /// Move the property (key, name) to a new visibility.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty.
    fn alter_property_visibility(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        existing_visibility: Option<Visibility>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut()
            .alter_property_visibility(AlterPropertyVisibility {
                key: key.into(),
                name: name.into(),
                existing_visibility,
                visibility,
            })?;
        Ok(self)
    }

    /// Write an extended data cell with the empty key.
    ///
    /// # Errors
    ///
    /// Fails when an identifier is empty or the value is null.
    fn add_extended_data(
        mut self,
        table_name: impl Into<String>,
        row_id: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<PropertyValue>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut().add_extended_data(ExtendedDataAdd {
            table_name: table_name.into(),
            row_id: row_id.into(),
            column: column.into(),
            key: String::new(),
            value: value.into(),
            visibility,
            timestamp: None,
        })?;
        Ok(self)
    }

    /// Write a fully specified extended data cell.
    ///
    /// # Errors
    ///
    /// Fails when an identifier is empty or the value is null.
    fn add_extended_data_full(mut self, change: ExtendedDataAdd) -> Result<Self> {
        self.changes_mut().add_extended_data(change)?;
        Ok(self)
    }

    /// Delete an extended data cell with the empty key.
    ///
    /// # Errors
    ///
    /// Fails when an identifier is empty.
    fn delete_extended_data(
        mut self,
        table_name: impl Into<String>,
        row_id: impl Into<String>,
        column: impl Into<String>,
        visibility: Visibility,
    ) -> Result<Self> {
        self.changes_mut().delete_extended_data(ExtendedDataDelete {
            table_name: table_name.into(),
            row_id: row_id.into(),
            column: column.into(),
            key: String::new(),
            visibility,
        })?;
        Ok(self)
    }

    /// Choose whether the save is sent to the search index.
    fn index_hint(mut self, hint: IndexHint) -> Self {
        self.changes_mut().index_hint = hint;
        self
    }
}

/// Builder for a new vertex. Created by [`Graph::prepare_vertex`].
pub struct VertexBuilder<'g> {
    graph: &'g Graph,
    pub(crate) id: Option<String>,
    pub(crate) visibility: Visibility,
    pub(crate) concept_type: Option<String>,
    pub(crate) timestamp: Option<i64>,
    pub(crate) changes: PropertyChanges,
}

impl std::fmt::Debug for VertexBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuilder")
            .field("id", &self.id)
            .field("visibility", &self.visibility)
            .field("concept_type", &self.concept_type)
            .field("timestamp", &self.timestamp)
            .field("changes", &self.changes)
            .finish_non_exhaustive()
    }
}

impl<'g> VertexBuilder<'g> {
    pub(crate) fn new(graph: &'g Graph, id: Option<String>, visibility: Visibility) -> Self {
        Self {
            graph,
            id,
            visibility,
            concept_type: None,
            timestamp: None,
            changes: PropertyChanges::default(),
        }
    }

    /// Explicit id, if one was given.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Visibility of the new vertex.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Set the concept type.
    pub fn with_concept_type(mut self, concept_type: impl Into<String>) -> Self {
        self.concept_type = Some(concept_type.into());
        self
    }

    /// Use an explicit creation timestamp instead of the graph clock.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether anything beyond the bare vertex would be written.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || self.concept_type.is_some()
    }

    /// Persist the vertex.
    ///
    /// # Errors
    ///
    /// Fails on schema violations or storage errors.
    pub fn save(self, authorizations: &Authorizations) -> Result<Vertex> {
        let graph = self.graph;
        graph.save_new_vertex(self, authorizations)
    }
}

impl MutationBuilder for VertexBuilder<'_> {
    fn changes(&self) -> &PropertyChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut PropertyChanges {
        &mut self.changes
    }
}

/// Builder for a new edge. Created by [`Graph::prepare_edge`].
pub struct EdgeBuilder<'g> {
    graph: &'g Graph,
    pub(crate) id: Option<String>,
    pub(crate) out_vertex_id: String,
    pub(crate) in_vertex_id: String,
    pub(crate) label: String,
    pub(crate) visibility: Visibility,
    pub(crate) timestamp: Option<i64>,
    pub(crate) changes: PropertyChanges,
}

impl<'g> EdgeBuilder<'g> {
    pub(crate) fn new(
        graph: &'g Graph,
        id: Option<String>,
        out_vertex_id: String,
        in_vertex_id: String,
        label: String,
        visibility: Visibility,
    ) -> Self {
        Self {
            graph,
            id,
            out_vertex_id,
            in_vertex_id,
            label,
            visibility,
            timestamp: None,
            changes: PropertyChanges::default(),
        }
    }

    /// Explicit id, if one was given.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Out-vertex id.
    pub fn out_vertex_id(&self) -> &str {
        &self.out_vertex_id
    }

    /// In-vertex id.
    pub fn in_vertex_id(&self) -> &str {
        &self.in_vertex_id
    }

    /// Edge label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Use an explicit creation timestamp instead of the graph clock.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether anything beyond the bare edge would be written.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Persist the edge and its references on both endpoints.
    ///
    /// # Errors
    ///
    /// Fails on invalid ids or labels, schema violations or storage errors.
    pub fn save(self, authorizations: &Authorizations) -> Result<Edge> {
        let graph = self.graph;
        graph.save_new_edge(self, authorizations)
    }
}

impl MutationBuilder for EdgeBuilder<'_> {
    fn changes(&self) -> &PropertyChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut PropertyChanges {
        &mut self.changes
    }
}

/// Changes to an element that already exists. Created by
/// [`Graph::prepare_vertex_mutation`] and [`Graph::prepare_edge_mutation`].
pub struct ExistingElementMutation<'g> {
    graph: &'g Graph,
    pub(crate) element: Element,
    pub(crate) changes: PropertyChanges,
    pub(crate) new_visibility: Option<Visibility>,
    pub(crate) new_edge_label: Option<String>,
    pub(crate) new_concept_type: Option<String>,
    pub(crate) alter_timestamp: Option<i64>,
}

impl<'g> ExistingElementMutation<'g> {
    pub(crate) fn new(graph: &'g Graph, element: Element) -> Self {
        Self {
            graph,
            element,
            changes: PropertyChanges::default(),
            new_visibility: None,
            new_edge_label: None,
            new_concept_type: None,
            alter_timestamp: None,
        }
    }

    /// The element as it was when the mutation was prepared.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Type of the mutated element.
    pub fn element_type(&self) -> ElementType {
        self.element
            .element_type()
            .unwrap_or(ElementType::Vertex)
    }

    /// Move the element itself to a new visibility.
    pub fn alter_element_visibility(mut self, visibility: Visibility) -> Self {
        if visibility != *self.element.visibility() {
            self.new_visibility = Some(visibility);
        }
        self
    }

    /// Rename the edge label.
    ///
    /// # Errors
    ///
    /// Fails when the element is not an edge or the label is empty.
    pub fn alter_edge_label(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let Some(edge) = self.element.as_edge() else {
            return Err(GraphError::invalid(format!(
                "Cannot alter the label of non-edge {}",
                self.element.id()
            )));
        };
        if label.is_empty() {
            return Err(GraphError::invalid("Edge label cannot be empty"));
        }
        if label != edge.label() {
            self.new_edge_label = Some(label);
        }
        Ok(self)
    }

    /// Change the vertex concept type.
    ///
    /// # Errors
    ///
    /// Fails when the element is not a vertex.
    pub fn alter_concept_type(mut self, concept_type: impl Into<String>) -> Result<Self> {
        let concept_type = concept_type.into();
        let Some(vertex) = self.element.as_vertex() else {
            return Err(GraphError::invalid(format!(
                "Cannot alter the concept type of non-vertex {}",
                self.element.id()
            )));
        };
        if vertex.concept_type() != Some(concept_type.as_str()) {
            self.new_concept_type = Some(concept_type);
        }
        Ok(self)
    }

    /// Timestamp used for label, concept type and visibility changes.
    pub fn with_alter_timestamp(mut self, timestamp: i64) -> Self {
        self.alter_timestamp = Some(timestamp);
        self
    }

    /// Whether saving would write anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
            || self.new_visibility.is_some()
            || self.new_edge_label.is_some()
            || self.new_concept_type.is_some()
    }

    /// Apply the changes and return the element re-read from storage.
    ///
    /// A mutation without changes writes nothing, emits no event and returns the
    /// current element.
    ///
    /// # Errors
    ///
    /// Fails on schema violations, missing properties or storage errors.
    pub fn save(self, authorizations: &Authorizations) -> Result<Element> {
        let graph = self.graph;
        graph.save_existing_element(self, authorizations)
    }
}

impl MutationBuilder for ExistingElementMutation<'_> {
    fn changes(&self) -> &PropertyChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut PropertyChanges {
        &mut self.changes
    }
}
