//! Create and update paths of [`Graph`].
//!
//! Updates apply in a fixed order: property metadata, property visibility, property
//! values and deletes, element visibility, label or concept type, extended data.
//! Each step is persisted before the next starts.

use super::{EdgeEndpoints, Graph, GraphEvent};
use crate::error::{GraphError, Result};
use crate::model::{
    Edge, Element, ElementCore, ElementType, ExtendedDataRowId, FetchHints, GraphElement, Property,
    PropertyValue, Vertex,
};
use crate::mutation::{
    AlterPropertyVisibility, EdgeBuilder, ExistingElementMutation, IndexHint, PropertyAdd,
    PropertyChanges, VertexBuilder,
};
use crate::security::{Authorizations, Visibility};
use crate::storage::rows::{
    self, check_segment, family, inverted_timestamp, Cell, CellValue, RowKey, RowMutation,
    StoredValue,
};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Families whose qualifiers start with a property's (name, key, visibility).
pub(crate) const PROPERTY_FAMILIES: [&str; 4] = [
    family::PROPERTY,
    family::PROPERTY_METADATA,
    family::PROPERTY_DELETED,
    family::PROPERTY_HIDDEN,
];

pub(crate) fn check_visibility(visibility: &Visibility) -> Result<()> {
    check_segment("visibility", visibility.as_str())?;
    visibility.expression().map(|_| ())
}

fn check_identifier(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(GraphError::invalid(format!("{what} cannot be empty")));
    }
    check_segment(what, value)
}

impl Graph {
    pub(crate) fn save_new_vertex(
        &self,
        builder: VertexBuilder<'_>,
        authorizations: &Authorizations,
    ) -> Result<Vertex> {
        let vertex_id = builder.id.unwrap_or_else(|| self.id_generator.next_id());
        check_identifier("Vertex id", &vertex_id)?;
        check_visibility(&builder.visibility)?;
        let changes = builder.changes;
        self.check_property_types(&changes)?;
        let timestamp = self.timestamp(builder.timestamp);
        debug!(
            "Adding vertex: id={vertex_id}, properties={}",
            changes.properties().len()
        );

        let mut events = vec![GraphEvent::AddVertex {
            vertex_id: vertex_id.clone(),
        }];
        let mut mutation = RowMutation::new(RowKey::vertex(&vertex_id));
        mutation.put(
            family::ELEMENT,
            &[],
            &Cell::new(
                builder.visibility.clone(),
                timestamp,
                CellValue::Vertex {
                    concept_type: builder.concept_type.clone(),
                },
            ),
        )?;
        self.put_properties(
            &mut mutation,
            ElementType::Vertex,
            &vertex_id,
            changes.properties(),
            timestamp,
            &mut events,
        )?;
        put_table_names(&mut mutation, &changes, timestamp)?;
        mutation.apply(self.backend.as_ref())?;
        self.invalidate_vertex(&vertex_id);
        let extended_rows = self.write_extended_data(
            ElementType::Vertex,
            &vertex_id,
            &changes,
            timestamp,
            &mut events,
        )?;

        let vertex = match self.vertex(&vertex_id, FetchHints::all(), authorizations)? {
            Some(vertex) => vertex,
            None => {
                trace!("Vertex {vertex_id} is not readable by its creator; returning the written state");
                let core = written_core(
                    &vertex_id,
                    &builder.visibility,
                    timestamp,
                    &changes,
                    authorizations,
                );
                Vertex::new(core, builder.concept_type)
            }
        };
        if changes.index_hint() == IndexHint::Index {
            self.search_index
                .add_element(&Element::Vertex(vertex.clone()), authorizations)?;
            self.index_extended_data(&extended_rows, authorizations)?;
        }
        self.fire(events);
        trace!("Vertex {vertex_id} added successfully");
        Ok(vertex)
    }

    pub(crate) fn save_new_edge(
        &self,
        builder: EdgeBuilder<'_>,
        authorizations: &Authorizations,
    ) -> Result<Edge> {
        let edge_id = builder.id.unwrap_or_else(|| self.id_generator.next_id());
        check_identifier("Edge id", &edge_id)?;
        check_identifier("Out vertex id", &builder.out_vertex_id)?;
        check_identifier("In vertex id", &builder.in_vertex_id)?;
        check_identifier("Edge label", &builder.label)?;
        check_visibility(&builder.visibility)?;
        for vertex_id in [&builder.out_vertex_id, &builder.in_vertex_id] {
            if !self.vertex_row_exists(vertex_id)? {
                return Err(GraphError::not_found("vertex", vertex_id.as_str(), "add edge"));
            }
        }
        let changes = builder.changes;
        self.check_property_types(&changes)?;
        let timestamp = self.timestamp(builder.timestamp);
        let endpoints = EdgeEndpoints {
            edge_id: edge_id.clone(),
            out_vertex_id: builder.out_vertex_id.clone(),
            in_vertex_id: builder.in_vertex_id.clone(),
        };
        debug!(
            "Adding edge: id={edge_id}, {} -[{}]-> {}",
            endpoints.out_vertex_id, builder.label, endpoints.in_vertex_id
        );

        let mut events = vec![GraphEvent::AddEdge {
            edge_id: edge_id.clone(),
            out_vertex_id: endpoints.out_vertex_id.clone(),
            in_vertex_id: endpoints.in_vertex_id.clone(),
            label: builder.label.clone(),
        }];
        let mut mutation = RowMutation::new(RowKey::edge(&edge_id));
        mutation.put(
            family::ELEMENT,
            &[],
            &Cell::new(
                builder.visibility.clone(),
                timestamp,
                CellValue::Edge {
                    out_vertex_id: endpoints.out_vertex_id.clone(),
                    in_vertex_id: endpoints.in_vertex_id.clone(),
                    label: builder.label.clone(),
                },
            ),
        )?;
        self.put_properties(
            &mut mutation,
            ElementType::Edge,
            &edge_id,
            changes.properties(),
            timestamp,
            &mut events,
        )?;
        put_table_names(&mut mutation, &changes, timestamp)?;
        mutation.apply(self.backend.as_ref())?;
        self.put_edge_refs(&endpoints, &builder.label, &builder.visibility, timestamp)?;
        self.invalidate_edge(&endpoints);
        let extended_rows =
            self.write_extended_data(ElementType::Edge, &edge_id, &changes, timestamp, &mut events)?;

        let edge = match self.edge(&edge_id, FetchHints::all(), authorizations)? {
            Some(edge) => edge,
            None => {
                trace!("Edge {edge_id} is not readable by its creator; returning the written state");
                let core =
                    written_core(&edge_id, &builder.visibility, timestamp, &changes, authorizations);
                Edge::new(
                    core,
                    endpoints.out_vertex_id.clone(),
                    endpoints.in_vertex_id.clone(),
                    builder.label,
                )
            }
        };
        if changes.index_hint() == IndexHint::Index {
            self.search_index
                .add_element(&Element::Edge(edge.clone()), authorizations)?;
            self.index_extended_data(&extended_rows, authorizations)?;
        }
        self.fire(events);
        trace!("Edge {edge_id} added successfully");
        Ok(edge)
    }

    pub(crate) fn save_existing_element(
        &self,
        mutation: ExistingElementMutation<'_>,
        authorizations: &Authorizations,
    ) -> Result<Element> {
        if !mutation.has_changes() {
            trace!("No changes to save for {}", mutation.element.id());
            return Ok(mutation.element);
        }
        let Some(element_type) = mutation.element.element_type() else {
            return Err(GraphError::invalid(format!(
                "Extended data row {} is mutated through its owning element",
                mutation.element.id()
            )));
        };
        let element_id = mutation.element.id().to_string();
        let changes = &mutation.changes;
        self.check_property_types(changes)?;
        let mut current = self
            .current_state(element_type, &element_id, authorizations)?
            .ok_or_else(|| GraphError::not_found(element_type.to_string(), &element_id, "update"))?;
        // Tombstones predate the values written by the same mutation, so a
        // delete followed by a set keeps the new value.
        let deleted_at = self.clock.next();
        let timestamp = self.clock.next();
        let alter_timestamp = self.timestamp(mutation.alter_timestamp);
        let row = RowKey::element(element_type, &element_id);
        let mut events = Vec::new();
        debug!("Updating {element_type} {element_id}");

        if !changes.set_property_metadata.is_empty() {
            let mut metadata = RowMutation::new(row.clone());
            for change in &changes.set_property_metadata {
                check_visibility(&change.property_visibility)?;
                check_visibility(&change.metadata_visibility)?;
                metadata.put(
                    family::PROPERTY_METADATA,
                    &[
                        &change.property_name,
                        &change.property_key,
                        change.property_visibility.as_str(),
                        &change.metadata_key,
                        change.metadata_visibility.as_str(),
                    ],
                    &Cell::new(
                        change.metadata_visibility.clone(),
                        timestamp,
                        CellValue::Value(StoredValue::Inline(change.value.clone())),
                    ),
                )?;
                events.push(GraphEvent::SetPropertyMetadata {
                    element_type,
                    element_id: element_id.clone(),
                    key: change.property_key.clone(),
                    name: change.property_name.clone(),
                    metadata_key: change.metadata_key.clone(),
                });
            }
            metadata.apply(self.backend.as_ref())?;
        }

        if !changes.alter_property_visibilities.is_empty() {
            for change in &changes.alter_property_visibilities {
                self.alter_property_visibility(&row, &current, element_type, change, &mut events)?;
            }
            current = self
                .current_state(element_type, &element_id, authorizations)?
                .ok_or_else(|| {
                    GraphError::not_found(element_type.to_string(), &element_id, "update")
                })?;
        }

        let mut removed_properties = Vec::new();
        for delete in changes.property_deletes() {
            let targets =
                matching_properties(&current, &delete.key, &delete.name, delete.visibility.as_ref());
            if targets.is_empty() {
                debug!("No property {}:{} to delete on {element_id}", delete.key, delete.name);
            }
            for property in targets {
                self.delete_property_cells(&row, property)?;
                events.push(GraphEvent::DeleteProperty {
                    element_type,
                    element_id: element_id.clone(),
                    key: property.key().to_string(),
                    name: property.name().to_string(),
                    visibility: property.visibility().clone(),
                });
                removed_properties.push(property.clone());
            }
        }

        let mut values = RowMutation::new(row.clone());
        for soft_delete in changes.property_soft_deletes() {
            let deleted_at = soft_delete
                .timestamp
                .map_or(deleted_at, |ts| self.timestamp(Some(ts)));
            for property in matching_properties(
                &current,
                &soft_delete.key,
                &soft_delete.name,
                soft_delete.visibility.as_ref(),
            ) {
                values.put(
                    family::PROPERTY_DELETED,
                    &[
                        property.name(),
                        property.key(),
                        property.visibility().as_str(),
                        &inverted_timestamp(deleted_at),
                    ],
                    &Cell::marker(property.visibility().clone(), deleted_at),
                )?;
                events.push(GraphEvent::SoftDeleteProperty {
                    element_type,
                    element_id: element_id.clone(),
                    key: property.key().to_string(),
                    name: property.name().to_string(),
                    visibility: property.visibility().clone(),
                });
                removed_properties.push(property.clone());
            }
        }
        self.put_properties(
            &mut values,
            element_type,
            &element_id,
            changes.properties(),
            timestamp,
            &mut events,
        )?;
        put_table_names(&mut values, changes, timestamp)?;
        values.apply(self.backend.as_ref())?;

        if mutation.new_visibility.is_some()
            || mutation.new_edge_label.is_some()
            || mutation.new_concept_type.is_some()
        {
            let visibility = mutation
                .new_visibility
                .clone()
                .unwrap_or_else(|| current.visibility().clone());
            check_visibility(&visibility)?;
            if let Some(label) = &mutation.new_edge_label {
                check_identifier("Edge label", label)?;
            }
            self.put_element_cell(
                &row,
                &current,
                &visibility,
                mutation.new_edge_label.as_deref(),
                mutation.new_concept_type.as_deref(),
                alter_timestamp,
            )?;
            if let Some(edge) = current.as_edge() {
                let label = mutation.new_edge_label.as_deref().unwrap_or(edge.label());
                self.put_edge_refs(&EdgeEndpoints::of(edge), label, &visibility, alter_timestamp)?;
            }
            if mutation.new_visibility.is_some() {
                events.push(GraphEvent::AlterElementVisibility {
                    element_type,
                    element_id: element_id.clone(),
                    visibility,
                });
            }
            if let Some(label) = &mutation.new_edge_label {
                events.push(GraphEvent::AlterEdgeLabel {
                    edge_id: element_id.clone(),
                    label: label.clone(),
                });
            }
            if let Some(concept_type) = &mutation.new_concept_type {
                events.push(GraphEvent::AlterConceptType {
                    vertex_id: element_id.clone(),
                    concept_type: concept_type.clone(),
                });
            }
        }

        let extended_rows =
            self.write_extended_data(element_type, &element_id, changes, timestamp, &mut events)?;

        match current.as_edge() {
            Some(edge) => self.invalidate_edge(&EdgeEndpoints::of(edge)),
            None => self.invalidate_vertex(&element_id),
        }

        let updated = match self.element(element_type, &element_id, FetchHints::all(), authorizations)? {
            Some(element) => element,
            None => {
                debug!("{element_type} {element_id} is no longer readable after update");
                mutation.element.clone()
            }
        };
        if changes.index_hint() == IndexHint::Index {
            for property in &removed_properties {
                self.search_index.delete_property(
                    element_type,
                    &element_id,
                    property.key(),
                    property.name(),
                    property.visibility(),
                )?;
            }
            self.search_index.update_element(&updated, authorizations)?;
            self.index_extended_data(&extended_rows, authorizations)?;
        }
        self.fire(events);
        Ok(updated)
    }

    /// Full stored state of an element including hidden data, bypassing the cache.
    pub(crate) fn current_state(
        &self,
        element_type: ElementType,
        element_id: &str,
        authorizations: &Authorizations,
    ) -> Result<Option<Element>> {
        let row = RowKey::element(element_type, element_id);
        let cells = rows::read_row(self.backend.as_ref(), &row)?;
        let hints = Arc::new(FetchHints::all_including_hidden().clone());
        Ok(match element_type {
            ElementType::Vertex => self
                .decode_vertex(element_id, &cells, &hints, authorizations)?
                .map(Element::Vertex),
            ElementType::Edge => self
                .decode_edge(element_id, &cells, &hints, authorizations)?
                .map(Element::Edge),
        })
    }

    /// Convert a value into its stored form, moving streaming values and large
    /// byte values into the streaming sink.
    ///
    /// Large `Bytes` read back as [`PropertyValue::Streaming`].
    pub(crate) fn store_value(
        &self,
        row: &RowKey,
        key: &str,
        name: &str,
        value: &PropertyValue,
    ) -> Result<StoredValue> {
        match value {
            PropertyValue::Streaming(streaming) => {
                let reference = match streaming.pending_bytes() {
                    Some(bytes) => self.streaming.save(&row.to_string(), key, name, bytes)?,
                    None => {
                        let bytes = streaming.read_to_vec()?;
                        self.streaming.save(&row.to_string(), key, name, &bytes)?
                    }
                };
                Ok(StoredValue::Streaming {
                    reference,
                    length: streaming.len(),
                    searchable: streaming.is_searchable(),
                })
            }
            PropertyValue::Bytes(bytes) if bytes.len() > self.config.max_inline_value_size => {
                trace!(
                    "Externalizing {} byte value of {name} on {row}",
                    bytes.len()
                );
                let reference = self.streaming.save(&row.to_string(), key, name, bytes)?;
                Ok(StoredValue::Streaming {
                    reference,
                    length: bytes.len() as u64,
                    searchable: false,
                })
            }
            other => Ok(StoredValue::Inline(other.clone())),
        }
    }

    /// Explicit timestamps move the clock forward; absent ones take the next tick.
    pub(crate) fn timestamp(&self, explicit: Option<i64>) -> i64 {
        match explicit {
            Some(timestamp) => {
                self.clock.observe(timestamp);
                timestamp
            }
            None => self.clock.next(),
        }
    }

    pub(crate) fn put_edge_refs(
        &self,
        endpoints: &EdgeEndpoints,
        label: &str,
        visibility: &Visibility,
        timestamp: i64,
    ) -> Result<()> {
        let mut out = RowMutation::new(RowKey::vertex(&endpoints.out_vertex_id));
        out.put(
            family::OUT_EDGE,
            &[&endpoints.edge_id],
            &Cell::new(
                visibility.clone(),
                timestamp,
                CellValue::EdgeRef {
                    label: label.to_string(),
                    other_vertex_id: endpoints.in_vertex_id.clone(),
                },
            ),
        )?;
        out.apply(self.backend.as_ref())?;
        let mut incoming = RowMutation::new(RowKey::vertex(&endpoints.in_vertex_id));
        incoming.put(
            family::IN_EDGE,
            &[&endpoints.edge_id],
            &Cell::new(
                visibility.clone(),
                timestamp,
                CellValue::EdgeRef {
                    label: label.to_string(),
                    other_vertex_id: endpoints.out_vertex_id.clone(),
                },
            ),
        )?;
        incoming.apply(self.backend.as_ref())
    }

    fn vertex_row_exists(&self, vertex_id: &str) -> Result<bool> {
        let cells = rows::read_columns(
            self.backend.as_ref(),
            &RowKey::vertex(vertex_id),
            family::ELEMENT,
            &[],
        )?;
        Ok(!cells.is_empty())
    }

    fn put_properties(
        &self,
        mutation: &mut RowMutation,
        element_type: ElementType,
        element_id: &str,
        adds: &[PropertyAdd],
        timestamp: i64,
        events: &mut Vec<GraphEvent>,
    ) -> Result<()> {
        for add in adds {
            check_visibility(&add.visibility)?;
            let written_at = add.timestamp.map_or(timestamp, |ts| self.timestamp(Some(ts)));
            let stored = self.store_value(mutation.row(), &add.key, &add.name, &add.value)?;
            mutation.put(
                family::PROPERTY,
                &[
                    &add.name,
                    &add.key,
                    add.visibility.as_str(),
                    &inverted_timestamp(written_at),
                ],
                &Cell::new(add.visibility.clone(), written_at, CellValue::Value(stored)),
            )?;
            for entry in add.metadata.entries() {
                check_visibility(entry.visibility())?;
                check_segment("metadata key", entry.key())?;
                mutation.put(
                    family::PROPERTY_METADATA,
                    &[
                        &add.name,
                        &add.key,
                        add.visibility.as_str(),
                        entry.key(),
                        entry.visibility().as_str(),
                    ],
                    &Cell::new(
                        entry.visibility().clone(),
                        written_at,
                        CellValue::Value(StoredValue::Inline(entry.value().clone())),
                    ),
                )?;
            }
            events.push(GraphEvent::AddProperty {
                element_type,
                element_id: element_id.to_string(),
                key: add.key.clone(),
                name: add.name.clone(),
                visibility: add.visibility.clone(),
            });
        }
        Ok(())
    }

    /// Move every cell of one property to a new visibility.
    fn alter_property_visibility(
        &self,
        row: &RowKey,
        current: &Element,
        element_type: ElementType,
        change: &AlterPropertyVisibility,
        events: &mut Vec<GraphEvent>,
    ) -> Result<()> {
        check_visibility(&change.visibility)?;
        let property = current
            .core()
            .properties
            .iter()
            .find(|p| p.matches(&change.key, &change.name, change.existing_visibility.as_ref()))
            .ok_or_else(|| {
                GraphError::not_found(
                    "property",
                    format!("{}:{} on {}", change.key, change.name, current.id()),
                    "alter visibility",
                )
            })?;
        let old = property.visibility();
        if *old == change.visibility {
            return Ok(());
        }
        let mut mutation = RowMutation::new(row.clone());
        for column_family in PROPERTY_FAMILIES {
            let cells = rows::read_columns(
                self.backend.as_ref(),
                row,
                column_family,
                &[&change.name, &change.key, old.as_str()],
            )?;
            for cell in cells {
                let mut qualifier: Vec<&str> = cell.qualifier.iter().map(String::as_str).collect();
                if let Some(slot) = qualifier.get_mut(2) {
                    *slot = change.visibility.as_str();
                }
                let mut moved = cell.cell.clone();
                if column_family == family::PROPERTY || column_family == family::PROPERTY_DELETED {
                    moved.visibility = change.visibility.clone();
                }
                mutation.put(column_family, &qualifier, &moved)?;
                mutation.delete_key(cell.key.clone());
            }
        }
        mutation.apply(self.backend.as_ref())?;
        events.push(GraphEvent::DeleteProperty {
            element_type,
            element_id: current.id().to_string(),
            key: change.key.clone(),
            name: change.name.clone(),
            visibility: old.clone(),
        });
        events.push(GraphEvent::AddProperty {
            element_type,
            element_id: current.id().to_string(),
            key: change.key.clone(),
            name: change.name.clone(),
            visibility: change.visibility.clone(),
        });
        Ok(())
    }

    /// Rewrite the element cell with a new visibility, edge label or concept type.
    fn put_element_cell(
        &self,
        row: &RowKey,
        current: &Element,
        visibility: &Visibility,
        label: Option<&str>,
        concept_type: Option<&str>,
        timestamp: i64,
    ) -> Result<()> {
        let info = match current {
            Element::Vertex(vertex) => CellValue::Vertex {
                concept_type: concept_type.or(vertex.concept_type()).map(str::to_string),
            },
            Element::Edge(edge) => CellValue::Edge {
                out_vertex_id: edge.out_vertex_id().to_string(),
                in_vertex_id: edge.in_vertex_id().to_string(),
                label: label.unwrap_or(edge.label()).to_string(),
            },
            Element::ExtendedDataRow(_) => {
                return Err(GraphError::invalid("Extended data rows have no element cell"))
            }
        };
        let mut mutation = RowMutation::new(row.clone());
        mutation.put(
            family::ELEMENT,
            &[],
            &Cell::new(visibility.clone(), timestamp, info),
        )?;
        mutation.apply(self.backend.as_ref())
    }

    fn delete_property_cells(&self, row: &RowKey, property: &Property) -> Result<()> {
        let mut cells = Vec::new();
        for column_family in PROPERTY_FAMILIES {
            cells.extend(rows::read_columns(
                self.backend.as_ref(),
                row,
                column_family,
                &[property.name(), property.key(), property.visibility().as_str()],
            )?);
        }
        self.delete_cells(row, cells)
    }

    /// Write extended data upserts and deletes; returns the rows that received
    /// values, with the columns written.
    fn write_extended_data(
        &self,
        element_type: ElementType,
        element_id: &str,
        changes: &PropertyChanges,
        timestamp: i64,
        events: &mut Vec<GraphEvent>,
    ) -> Result<BTreeMap<ExtendedDataRowId, Vec<(String, Visibility)>>> {
        let mut mutations: BTreeMap<ExtendedDataRowId, RowMutation> = BTreeMap::new();
        let mut written: BTreeMap<ExtendedDataRowId, Vec<(String, Visibility)>> = BTreeMap::new();
        for add in changes.extended_data() {
            check_visibility(&add.visibility)?;
            let row_id =
                ExtendedDataRowId::new(element_type, element_id, &add.table_name, &add.row_id);
            let mutation = mutations
                .entry(row_id.clone())
                .or_insert_with(|| RowMutation::new(RowKey::extended_data(&row_id)));
            let stored = self.store_value(mutation.row(), &add.key, &add.column, &add.value)?;
            let written_at = add.timestamp.map_or(timestamp, |ts| self.timestamp(Some(ts)));
            mutation.put(
                family::EXTENDED_COLUMN,
                &[&add.column, &add.key, add.visibility.as_str()],
                &Cell::new(add.visibility.clone(), written_at, CellValue::Value(stored)),
            )?;
            written
                .entry(row_id.clone())
                .or_default()
                .push((add.column.clone(), add.visibility.clone()));
            events.push(GraphEvent::AddExtendedData {
                row_id,
                column: add.column.clone(),
            });
        }
        for delete in &changes.extended_data_deletes {
            let row_id =
                ExtendedDataRowId::new(element_type, element_id, &delete.table_name, &delete.row_id);
            let row = RowKey::extended_data(&row_id);
            let cells = rows::read_columns(
                self.backend.as_ref(),
                &row,
                family::EXTENDED_COLUMN,
                &[&delete.column, &delete.key, delete.visibility.as_str()],
            )?;
            self.delete_cells(&row, cells)?;
            events.push(GraphEvent::DeleteExtendedData {
                row_id,
                column: delete.column.clone(),
            });
        }
        for mutation in mutations.into_values() {
            mutation.apply(self.backend.as_ref())?;
        }
        Ok(written)
    }

    fn index_extended_data(
        &self,
        rows: &BTreeMap<ExtendedDataRowId, Vec<(String, Visibility)>>,
        authorizations: &Authorizations,
    ) -> Result<()> {
        for (row_id, columns) in rows {
            self.search_index
                .add_element_extended_data(row_id, columns, authorizations)?;
        }
        Ok(())
    }
}

fn put_table_names(mutation: &mut RowMutation, changes: &PropertyChanges, timestamp: i64) -> Result<()> {
    let tables: BTreeSet<&str> = changes
        .extended_data()
        .iter()
        .map(|add| add.table_name.as_str())
        .collect();
    for table in tables {
        mutation.put(family::TABLE, &[table], &Cell::marker(Visibility::empty(), timestamp))?;
    }
    Ok(())
}

fn matching_properties<'a>(
    element: &'a Element,
    key: &str,
    name: &str,
    visibility: Option<&Visibility>,
) -> Vec<&'a Property> {
    element
        .core()
        .properties
        .iter()
        .filter(|p| p.matches(key, name, visibility))
        .collect()
}

/// Element state as written, for creators who cannot read back what they wrote.
fn written_core(
    element_id: &str,
    visibility: &Visibility,
    timestamp: i64,
    changes: &PropertyChanges,
    authorizations: &Authorizations,
) -> ElementCore {
    let hints = Arc::new(FetchHints::all().clone());
    let mut core = ElementCore::new(
        element_id,
        visibility.clone(),
        timestamp,
        hints.clone(),
        authorizations.clone(),
    );
    for add in changes.properties() {
        core.properties
            .retain(|p| !p.matches(&add.key, &add.name, Some(&add.visibility)));
        core.properties.push(Property::new(
            add.key.clone(),
            add.name.clone(),
            add.visibility.clone(),
            add.value.clone(),
            add.timestamp.unwrap_or(timestamp),
            add.metadata.clone(),
            BTreeSet::new(),
            hints.clone(),
        ));
    }
    core.extended_data_table_names = changes
        .extended_data()
        .iter()
        .map(|add| add.table_name.clone())
        .collect();
    core
}
