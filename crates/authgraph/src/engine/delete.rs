//! Soft delete, hide/visible and hard delete.

use super::{EdgeEndpoints, Graph, GraphEvent};
use crate::error::{GraphError, Result};
use crate::model::{Direction, Element, ElementType, GraphElement, Property};
use crate::security::{Authorizations, Visibility};
use crate::storage::rows::{
    self, family, Cell, CellValue, RowCell, RowKey, RowMutation, StoredValue,
};
use log::{debug, info, trace};
use std::collections::BTreeMap;

const EDGE_REF_FAMILIES: [&str; 4] = [
    family::OUT_EDGE,
    family::IN_EDGE,
    family::EDGE_REF_DELETED,
    family::EDGE_REF_HIDDEN,
];

/// An element to hard-delete, by id or as a loaded element.
#[derive(Debug, Clone)]
pub enum ElementRef {
    /// A vertex id
    VertexId(String),
    /// An edge id
    EdgeId(String),
    /// A loaded vertex or edge
    Element(Element),
}

impl From<Element> for ElementRef {
    fn from(value: Element) -> Self {
        ElementRef::Element(value)
    }
}

/// Resolved hard-delete work, applied in one flush.
#[derive(Default)]
struct PendingDeletes {
    vertices: Vec<String>,
    edges: BTreeMap<String, EdgeEndpoints>,
}

impl PendingDeletes {
    fn len(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Graph {
    /// Tombstone a vertex and every edge touching it with one shared timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the vertex does not exist or is not
    /// readable with `authorizations`.
    pub fn soft_delete_vertex(
        &self,
        vertex_id: &str,
        timestamp: Option<i64>,
        authorizations: &Authorizations,
    ) -> Result<()> {
        let vertex = self
            .current_state(ElementType::Vertex, vertex_id, authorizations)?
            .ok_or_else(|| GraphError::not_found("vertex", vertex_id, "soft delete"))?;
        let timestamp = self.timestamp(timestamp);
        debug!("Soft deleting vertex {vertex_id} at {timestamp}");

        let mut events = Vec::new();
        for endpoints in incident_edges(&vertex).into_values() {
            self.write_edge_tombstone(&endpoints, timestamp)?;
            self.search_index
                .delete_element(ElementType::Edge, &endpoints.edge_id)?;
            events.push(GraphEvent::SoftDeleteEdge {
                edge_id: endpoints.edge_id.clone(),
                timestamp,
            });
        }
        let mut mutation = RowMutation::new(RowKey::vertex(vertex_id));
        mutation.put(
            family::ELEMENT_DELETED,
            &[],
            &Cell::marker(Visibility::empty(), timestamp),
        )?;
        mutation.apply(self.backend.as_ref())?;
        self.invalidate_vertex(vertex_id);
        self.search_index.delete_element(ElementType::Vertex, vertex_id)?;
        events.push(GraphEvent::SoftDeleteVertex {
            vertex_id: vertex_id.to_string(),
            timestamp,
        });
        self.fire(events);
        Ok(())
    }

    /// Tombstone an edge and drop it from both endpoints' edge references.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the edge does not exist or is not
    /// readable with `authorizations`.
    pub fn soft_delete_edge(
        &self,
        edge_id: &str,
        timestamp: Option<i64>,
        authorizations: &Authorizations,
    ) -> Result<()> {
        let endpoints = self.resolve_edge(edge_id, authorizations, "soft delete")?;
        let timestamp = self.timestamp(timestamp);
        debug!("Soft deleting edge {edge_id} at {timestamp}");
        self.write_edge_tombstone(&endpoints, timestamp)?;
        self.search_index.delete_element(ElementType::Edge, edge_id)?;
        self.fire(vec![GraphEvent::SoftDeleteEdge {
            edge_id: edge_id.to_string(),
            timestamp,
        }]);
        Ok(())
    }

    /// Hide a vertex and its edges from readers of `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the vertex does not exist or is not
    /// readable with `authorizations`.
    pub fn mark_vertex_hidden(
        &self,
        vertex_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_vertex_hidden(vertex_id, visibility, authorizations, true)
    }

    /// Remove the hidden markers [`Graph::mark_vertex_hidden`] wrote for
    /// `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the vertex does not exist or is not
    /// readable with `authorizations`.
    pub fn mark_vertex_visible(
        &self,
        vertex_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_vertex_hidden(vertex_id, visibility, authorizations, false)
    }

    /// Hide an edge from readers of `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the edge does not exist or is not
    /// readable with `authorizations`.
    pub fn mark_edge_hidden(
        &self,
        edge_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_edge_hidden(edge_id, visibility, authorizations, true)
    }

    /// Remove the hidden marker [`Graph::mark_edge_hidden`] wrote for `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the edge does not exist or is not
    /// readable with `authorizations`.
    pub fn mark_edge_visible(
        &self,
        edge_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_edge_hidden(edge_id, visibility, authorizations, false)
    }

    /// Hide one property of a vertex or edge from readers of `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for extended data rows and
    /// [`GraphError::NotFound`] if the element no longer exists.
    pub fn mark_property_hidden(
        &self,
        element: &Element,
        property: &Property,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_property_hidden(element, property, visibility, authorizations, true)
    }

    /// Remove the hidden marker [`Graph::mark_property_hidden`] wrote for
    /// `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for extended data rows and
    /// [`GraphError::NotFound`] if the element no longer exists.
    pub fn mark_property_visible(
        &self,
        element: &Element,
        property: &Property,
        visibility: &Visibility,
        authorizations: &Authorizations,
    ) -> Result<()> {
        self.set_property_hidden(element, property, visibility, authorizations, false)
    }

    /// Permanently delete a vertex, its edges and all extended data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the vertex does not exist or is not
    /// readable with `authorizations`.
    pub fn delete_vertex(&self, vertex_id: &str, authorizations: &Authorizations) -> Result<()> {
        self.delete_elements([ElementRef::VertexId(vertex_id.to_string())], authorizations)
    }

    /// Permanently delete an edge and its extended data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the edge does not exist or is not
    /// readable with `authorizations`.
    pub fn delete_edge(&self, edge_id: &str, authorizations: &Authorizations) -> Result<()> {
        self.delete_elements([ElementRef::EdgeId(edge_id.to_string())], authorizations)
    }

    /// Permanently delete many elements.
    ///
    /// Work is flushed whenever more than `delete_batch_size` elements are pending,
    /// and once at the end. Each flush removes extended data first, then every
    /// edge (including edges incident to deleted vertices), then the vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] for the first id that cannot be resolved;
    /// batches flushed before it stay deleted.
    pub fn delete_elements<I>(&self, elements: I, authorizations: &Authorizations) -> Result<()>
    where
        I: IntoIterator<Item = ElementRef>,
    {
        let mut pending = PendingDeletes::default();
        for element in elements {
            match element {
                ElementRef::VertexId(id) => {
                    if self
                        .current_state(ElementType::Vertex, &id, authorizations)?
                        .is_none()
                    {
                        return Err(GraphError::not_found("vertex", id, "delete"));
                    }
                    pending.vertices.push(id);
                }
                ElementRef::EdgeId(id) => {
                    let endpoints = self.resolve_edge(&id, authorizations, "delete")?;
                    pending.edges.insert(id, endpoints);
                }
                ElementRef::Element(Element::Vertex(vertex)) => {
                    pending.vertices.push(vertex.id().to_string());
                }
                ElementRef::Element(Element::Edge(edge)) => {
                    pending
                        .edges
                        .insert(edge.id().to_string(), EdgeEndpoints::of(&edge));
                }
                ElementRef::Element(Element::ExtendedDataRow(row)) => {
                    return Err(GraphError::invalid(format!(
                        "Extended data row {} is deleted through its owning element",
                        row.id()
                    )));
                }
            }
            if pending.len() > self.config.delete_batch_size {
                self.flush_deletes(std::mem::take(&mut pending))?;
            }
        }
        if !pending.is_empty() {
            self.flush_deletes(pending)?;
        }
        Ok(())
    }

    /// Delete cells of one row, removing streaming payloads they reference.
    pub(crate) fn delete_cells(&self, row: &RowKey, cells: Vec<RowCell>) -> Result<()> {
        let mut mutation = RowMutation::new(row.clone());
        for cell in cells {
            if let CellValue::Value(StoredValue::Streaming { reference, .. }) = &cell.cell.value {
                self.streaming.delete(reference)?;
            }
            mutation.delete_key(cell.key);
        }
        mutation.apply(self.backend.as_ref())
    }

    fn flush_deletes(&self, mut pending: PendingDeletes) -> Result<()> {
        info!(
            "Deleting {} vertices and {} edges",
            pending.vertices.len(),
            pending.edges.len()
        );
        for vertex_id in &pending.vertices {
            self.delete_extended_data_rows(ElementType::Vertex, vertex_id)?;
            for endpoints in self.raw_incident_edges(vertex_id)? {
                pending
                    .edges
                    .entry(endpoints.edge_id.clone())
                    .or_insert(endpoints);
            }
        }

        let mut events = Vec::new();
        for endpoints in pending.edges.values() {
            trace!("Deleting edge {}", endpoints.edge_id);
            self.delete_extended_data_rows(ElementType::Edge, &endpoints.edge_id)?;
            let row = RowKey::edge(&endpoints.edge_id);
            self.delete_cells(&row, rows::read_row(self.backend.as_ref(), &row)?)?;
            for vertex_id in [&endpoints.out_vertex_id, &endpoints.in_vertex_id] {
                let vertex_row = RowKey::vertex(vertex_id);
                let mut refs = Vec::new();
                for column_family in EDGE_REF_FAMILIES {
                    refs.extend(rows::read_columns(
                        self.backend.as_ref(),
                        &vertex_row,
                        column_family,
                        &[&endpoints.edge_id],
                    )?);
                }
                self.delete_cells(&vertex_row, refs)?;
            }
            self.invalidate_edge(endpoints);
            self.search_index
                .delete_element(ElementType::Edge, &endpoints.edge_id)?;
            events.push(GraphEvent::DeleteEdge {
                edge_id: endpoints.edge_id.clone(),
            });
        }

        for vertex_id in &pending.vertices {
            trace!("Deleting vertex {vertex_id}");
            let row = RowKey::vertex(vertex_id);
            self.delete_cells(&row, rows::read_row(self.backend.as_ref(), &row)?)?;
            self.invalidate_vertex(vertex_id);
            self.search_index.delete_element(ElementType::Vertex, vertex_id)?;
            events.push(GraphEvent::DeleteVertex {
                vertex_id: vertex_id.clone(),
            });
        }
        self.fire(events);
        Ok(())
    }

    fn delete_extended_data_rows(&self, element_type: ElementType, element_id: &str) -> Result<()> {
        let prefix = RowKey::extended_data_prefix(element_type, element_id, None);
        for (row, cells) in rows::scan_rows(self.backend.as_ref(), &prefix)? {
            self.delete_cells(&row, cells)?;
            if let Some(row_id) = row.extended_data_row_id() {
                self.search_index.delete_extended_data(&row_id)?;
            }
        }
        Ok(())
    }

    /// Every edge referenced from a vertex row, regardless of authorizations.
    fn raw_incident_edges(&self, vertex_id: &str) -> Result<Vec<EdgeEndpoints>> {
        let row = RowKey::vertex(vertex_id);
        let mut edges = Vec::new();
        for column_family in [family::OUT_EDGE, family::IN_EDGE] {
            for cell in rows::read_columns(self.backend.as_ref(), &row, column_family, &[])? {
                let edge_id = cell.qualifier_part(0).to_string();
                let CellValue::EdgeRef {
                    other_vertex_id, ..
                } = cell.cell.value
                else {
                    continue;
                };
                edges.push(if column_family == family::OUT_EDGE {
                    EdgeEndpoints {
                        edge_id,
                        out_vertex_id: vertex_id.to_string(),
                        in_vertex_id: other_vertex_id,
                    }
                } else {
                    EdgeEndpoints {
                        edge_id,
                        out_vertex_id: other_vertex_id,
                        in_vertex_id: vertex_id.to_string(),
                    }
                });
            }
        }
        Ok(edges)
    }

    fn resolve_edge(
        &self,
        edge_id: &str,
        authorizations: &Authorizations,
        operation: &str,
    ) -> Result<EdgeEndpoints> {
        self.current_state(ElementType::Edge, edge_id, authorizations)?
            .as_ref()
            .and_then(Element::as_edge)
            .map(EdgeEndpoints::of)
            .ok_or_else(|| GraphError::not_found("edge", edge_id, operation))
    }

    fn write_edge_tombstone(&self, endpoints: &EdgeEndpoints, timestamp: i64) -> Result<()> {
        let mut edge = RowMutation::new(RowKey::edge(&endpoints.edge_id));
        edge.put(
            family::ELEMENT_DELETED,
            &[],
            &Cell::marker(Visibility::empty(), timestamp),
        )?;
        edge.apply(self.backend.as_ref())?;
        for vertex_id in [&endpoints.out_vertex_id, &endpoints.in_vertex_id] {
            let mut vertex = RowMutation::new(RowKey::vertex(vertex_id));
            vertex.put(
                family::EDGE_REF_DELETED,
                &[&endpoints.edge_id],
                &Cell::marker(Visibility::empty(), timestamp),
            )?;
            vertex.apply(self.backend.as_ref())?;
        }
        self.invalidate_edge(endpoints);
        Ok(())
    }

    fn set_vertex_hidden(
        &self,
        vertex_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
        hidden: bool,
    ) -> Result<()> {
        let operation = if hidden { "mark hidden" } else { "mark visible" };
        super::write::check_visibility(visibility)?;
        let vertex = self
            .current_state(ElementType::Vertex, vertex_id, authorizations)?
            .ok_or_else(|| GraphError::not_found("vertex", vertex_id, operation))?;
        let timestamp = self.clock.next();
        debug!("Vertex {vertex_id}: {operation} for {visibility}");

        let mut events = Vec::new();
        for endpoints in incident_edges(&vertex).into_values() {
            self.write_edge_hidden(&endpoints, visibility, timestamp, hidden)?;
            events.push(hidden_event(ElementType::Edge, &endpoints.edge_id, visibility, hidden));
        }
        let mut mutation = RowMutation::new(RowKey::vertex(vertex_id));
        if hidden {
            mutation.put(
                family::ELEMENT_HIDDEN,
                &[visibility.as_str()],
                &Cell::marker(visibility.clone(), timestamp),
            )?;
        } else {
            mutation.delete(family::ELEMENT_HIDDEN, &[visibility.as_str()]);
        }
        mutation.apply(self.backend.as_ref())?;
        self.invalidate_vertex(vertex_id);
        if hidden {
            self.search_index.mark_element_hidden(&vertex, visibility)?;
        } else {
            self.search_index.mark_element_visible(&vertex, visibility)?;
        }
        events.push(hidden_event(ElementType::Vertex, vertex_id, visibility, hidden));
        self.fire(events);
        Ok(())
    }

    fn set_edge_hidden(
        &self,
        edge_id: &str,
        visibility: &Visibility,
        authorizations: &Authorizations,
        hidden: bool,
    ) -> Result<()> {
        let operation = if hidden { "mark hidden" } else { "mark visible" };
        super::write::check_visibility(visibility)?;
        let edge = self
            .current_state(ElementType::Edge, edge_id, authorizations)?
            .ok_or_else(|| GraphError::not_found("edge", edge_id, operation))?;
        let Some(endpoints) = edge.as_edge().map(EdgeEndpoints::of) else {
            return Err(GraphError::not_found("edge", edge_id, operation));
        };
        debug!("Edge {edge_id}: {operation} for {visibility}");
        self.write_edge_hidden(&endpoints, visibility, self.clock.next(), hidden)?;
        if hidden {
            self.search_index.mark_element_hidden(&edge, visibility)?;
        } else {
            self.search_index.mark_element_visible(&edge, visibility)?;
        }
        self.fire(vec![hidden_event(ElementType::Edge, edge_id, visibility, hidden)]);
        Ok(())
    }

    /// Write or remove the hidden marker of an edge row and its two references.
    fn write_edge_hidden(
        &self,
        endpoints: &EdgeEndpoints,
        visibility: &Visibility,
        timestamp: i64,
        hidden: bool,
    ) -> Result<()> {
        let marker = Cell::marker(visibility.clone(), timestamp);
        let mut edge = RowMutation::new(RowKey::edge(&endpoints.edge_id));
        if hidden {
            edge.put(family::ELEMENT_HIDDEN, &[visibility.as_str()], &marker)?;
        } else {
            edge.delete(family::ELEMENT_HIDDEN, &[visibility.as_str()]);
        }
        edge.apply(self.backend.as_ref())?;
        for vertex_id in [&endpoints.out_vertex_id, &endpoints.in_vertex_id] {
            let mut vertex = RowMutation::new(RowKey::vertex(vertex_id));
            let qualifier = [endpoints.edge_id.as_str(), visibility.as_str()];
            if hidden {
                vertex.put(family::EDGE_REF_HIDDEN, &qualifier, &marker)?;
            } else {
                vertex.delete(family::EDGE_REF_HIDDEN, &qualifier);
            }
            vertex.apply(self.backend.as_ref())?;
        }
        self.invalidate_edge(endpoints);
        Ok(())
    }

    fn set_property_hidden(
        &self,
        element: &Element,
        property: &Property,
        visibility: &Visibility,
        authorizations: &Authorizations,
        hidden: bool,
    ) -> Result<()> {
        let operation = if hidden {
            "mark property hidden"
        } else {
            "mark property visible"
        };
        let Some(element_type) = element.element_type() else {
            return Err(GraphError::invalid(format!(
                "Cannot {operation} on extended data row {}",
                element.id()
            )));
        };
        super::write::check_visibility(visibility)?;
        let element_id = element.id();
        if self
            .current_state(element_type, element_id, authorizations)?
            .is_none()
        {
            return Err(GraphError::not_found(element_type.to_string(), element_id, operation));
        }
        debug!(
            "{element_type} {element_id}: {operation} {}:{} for {visibility}",
            property.key(),
            property.name()
        );

        let qualifier = [
            property.name(),
            property.key(),
            property.visibility().as_str(),
            visibility.as_str(),
        ];
        let mut mutation = RowMutation::new(RowKey::element(element_type, element_id));
        if hidden {
            mutation.put(
                family::PROPERTY_HIDDEN,
                &qualifier,
                &Cell::marker(visibility.clone(), self.clock.next()),
            )?;
        } else {
            mutation.delete(family::PROPERTY_HIDDEN, &qualifier);
        }
        mutation.apply(self.backend.as_ref())?;
        match element_type {
            ElementType::Vertex => self.invalidate_vertex(element_id),
            ElementType::Edge => self.edge_cache.invalidate(element_id),
        }

        let (key, name) = (property.key().to_string(), property.name().to_string());
        let element_id = element_id.to_string();
        let visibility = visibility.clone();
        let event = if hidden {
            self.search_index
                .mark_property_hidden(element, property, &visibility)?;
            GraphEvent::MarkPropertyHidden {
                element_type,
                element_id,
                key,
                name,
                visibility,
            }
        } else {
            self.search_index
                .mark_property_visible(element, property, &visibility)?;
            GraphEvent::MarkPropertyVisible {
                element_type,
                element_id,
                key,
                name,
                visibility,
            }
        };
        self.fire(vec![event]);
        Ok(())
    }
}

/// Edges of a loaded vertex keyed by id; self-loops appear once.
fn incident_edges(vertex: &Element) -> BTreeMap<String, EdgeEndpoints> {
    let mut edges = BTreeMap::new();
    let Some(vertex) = vertex.as_vertex() else {
        return edges;
    };
    for info in vertex.all_edge_infos() {
        let (out_vertex_id, in_vertex_id) = match info.direction() {
            Direction::Incoming => (info.other_vertex_id(), vertex.id()),
            _ => (vertex.id(), info.other_vertex_id()),
        };
        edges
            .entry(info.edge_id().to_string())
            .or_insert_with(|| EdgeEndpoints {
                edge_id: info.edge_id().to_string(),
                out_vertex_id: out_vertex_id.to_string(),
                in_vertex_id: in_vertex_id.to_string(),
            });
    }
    edges
}

fn hidden_event(
    element_type: ElementType,
    element_id: &str,
    visibility: &Visibility,
    hidden: bool,
) -> GraphEvent {
    let element_id = element_id.to_string();
    let visibility = visibility.clone();
    if hidden {
        GraphEvent::MarkHidden {
            element_type,
            element_id,
            visibility,
        }
    } else {
        GraphEvent::MarkVisible {
            element_type,
            element_id,
            visibility,
        }
    }
}
