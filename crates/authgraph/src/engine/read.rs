//! Authorization-aware reads: row decoding and the read API of [`Graph`].

use super::Graph;
use crate::error::{GraphError, Result};
use crate::model::{
    Direction, Edge, EdgeInfo, EdgesSummary, Element, ElementCore, ElementType, ExtendedDataRow,
    ExtendedDataRowId, FetchHints, GraphElement, HistoricalPropertyValue,
    Metadata, MetadataEntry, Property, PropertyValue, StreamingPropertyValue, TimeRange, Vertex,
};
use crate::security::{Authorizations, Visibility};
use crate::storage::rows::{self, family, CellValue, RowCell, RowKey, StoredValue, SEP};
use crate::storage::StreamingRef;
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::sync::Arc;

/// (name, key, visibility) of a property cell.
type PropertyIdentity = (String, String, String);

fn property_identity(cell: &RowCell) -> PropertyIdentity {
    (
        cell.qualifier_part(0).to_string(),
        cell.qualifier_part(1).to_string(),
        cell.qualifier_part(2).to_string(),
    )
}

/// Element-level state of a decoded vertex or edge row.
struct DecodedRow<'a> {
    core: ElementCore,
    info: &'a CellValue,
    edge_infos: Vec<EdgeInfo>,
    summary: EdgesSummary,
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.as_bytes().contains(&SEP)
}

impl Graph {
    /// A vertex by id, or `None` when it does not exist, is soft-deleted, is hidden
    /// (unless the hints include hidden data) or is not readable by
    /// `authorizations`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] or [`GraphError::Serialization`] when the row
    /// cannot be read.
    pub fn vertex(
        &self,
        vertex_id: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Option<Vertex>> {
        if !is_valid_id(vertex_id) {
            return Ok(None);
        }
        if let Some(vertex) = self.vertex_cache.get(vertex_id, fetch_hints, authorizations) {
            trace!("Vertex {vertex_id} served from cache");
            return Ok(Some(vertex));
        }
        let cells = rows::read_row(self.backend.as_ref(), &RowKey::vertex(vertex_id))?;
        let vertex =
            self.decode_vertex(vertex_id, &cells, &Arc::new(fetch_hints.clone()), authorizations)?;
        if let Some(vertex) = &vertex {
            self.vertex_cache.put(vertex, authorizations);
        }
        Ok(vertex)
    }

    /// An edge by id; see [`Graph::vertex`] for the visibility rules.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] or [`GraphError::Serialization`] when the row
    /// cannot be read.
    pub fn edge(
        &self,
        edge_id: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Option<Edge>> {
        if !is_valid_id(edge_id) {
            return Ok(None);
        }
        if let Some(edge) = self.edge_cache.get(edge_id, fetch_hints, authorizations) {
            trace!("Edge {edge_id} served from cache");
            return Ok(Some(edge));
        }
        let cells = rows::read_row(self.backend.as_ref(), &RowKey::edge(edge_id))?;
        let edge = self.decode_edge(edge_id, &cells, &Arc::new(fetch_hints.clone()), authorizations)?;
        if let Some(edge) = &edge {
            self.edge_cache.put(edge, authorizations);
        }
        Ok(edge)
    }

    /// Vertex or edge by type and id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn element(
        &self,
        element_type: ElementType,
        element_id: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Option<Element>> {
        Ok(match element_type {
            ElementType::Vertex => self
                .vertex(element_id, fetch_hints, authorizations)?
                .map(Element::Vertex),
            ElementType::Edge => self
                .edge(element_id, fetch_hints, authorizations)?
                .map(Element::Edge),
        })
    }

    /// Readable vertices among `vertex_ids`, in input order; missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn vertices_by_ids<I, S>(
        &self,
        vertex_ids: I,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Vertex>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vertices = Vec::new();
        for id in vertex_ids {
            if let Some(v) = self.vertex(id.as_ref(), fetch_hints, authorizations)? {
                vertices.push(v);
            }
        }
        Ok(vertices)
    }

    /// Readable edges among `edge_ids`, in input order; missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn edges_by_ids<I, S>(
        &self,
        edge_ids: I,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Edge>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut edges = Vec::new();
        for id in edge_ids {
            if let Some(e) = self.edge(id.as_ref(), fetch_hints, authorizations)? {
                edges.push(e);
            }
        }
        Ok(edges)
    }

    /// Every readable vertex, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn vertices(
        &self,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Vertex>> {
        let prefix = RowKey::type_prefix(ElementType::Vertex);
        let rows = rows::scan_rows(self.backend.as_ref(), &prefix)?;
        self.decode_vertex_rows(rows, fetch_hints, authorizations)
    }

    /// Every readable edge, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn edges(&self, fetch_hints: &FetchHints, authorizations: &Authorizations) -> Result<Vec<Edge>> {
        let prefix = RowKey::type_prefix(ElementType::Edge);
        let rows = rows::scan_rows(self.backend.as_ref(), &prefix)?;
        self.decode_edge_rows(rows, fetch_hints, authorizations)
    }

    /// Readable vertices with `start <= id < end`, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn vertices_in_range(
        &self,
        start: &str,
        end: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Vertex>> {
        let (start, end) = id_range(ElementType::Vertex, start, end);
        let rows = rows::scan_row_range(self.backend.as_ref(), &start, &end)?;
        self.decode_vertex_rows(rows, fetch_hints, authorizations)
    }

    /// Readable edges with `start <= id < end`, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn edges_in_range(
        &self,
        start: &str,
        end: &str,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Edge>> {
        let (start, end) = id_range(ElementType::Edge, start, end);
        let rows = rows::scan_row_range(self.backend.as_ref(), &start, &end)?;
        self.decode_edge_rows(rows, fetch_hints, authorizations)
    }

    /// Whether a readable, non-deleted, non-hidden vertex has this id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn does_vertex_exist(&self, vertex_id: &str, authorizations: &Authorizations) -> Result<bool> {
        Ok(self.vertex(vertex_id, FetchHints::none(), authorizations)?.is_some())
    }

    /// Whether a readable, non-deleted, non-hidden edge has this id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn does_edge_exist(&self, edge_id: &str, authorizations: &Authorizations) -> Result<bool> {
        Ok(self.edge(edge_id, FetchHints::none(), authorizations)?.is_some())
    }

    /// Existence of each id, as [`Graph::does_vertex_exist`] would report it.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn do_vertices_exist<I, S>(
        &self,
        vertex_ids: I,
        authorizations: &Authorizations,
    ) -> Result<HashMap<String, bool>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = HashMap::new();
        for id in vertex_ids {
            let id = id.as_ref();
            if !result.contains_key(id) {
                result.insert(id.to_string(), self.does_vertex_exist(id, authorizations)?);
            }
        }
        Ok(result)
    }

    /// Vertices at the other end of `vertex`'s edges in `direction`, optionally
    /// restricted to labels.
    ///
    /// Edge references on `vertex` are resolved here, one read per neighbor.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::FetchHintsViolation`] if `vertex` was loaded without the
    /// needed edge references.
    pub fn vertex_neighbors(
        &self,
        vertex: &Vertex,
        direction: Direction,
        labels: &[&str],
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Vertex>> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = vertex
            .vertex_ids(direction, labels)?
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        self.vertices_by_ids(ids, fetch_hints, authorizations)
    }

    /// Edges of `vertex` in `direction`, optionally restricted to labels.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::FetchHintsViolation`] if `vertex` was loaded without the
    /// needed edge references.
    pub fn vertex_edges(
        &self,
        vertex: &Vertex,
        direction: Direction,
        labels: &[&str],
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Edge>> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = vertex
            .edge_ids(direction, labels)?
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        self.edges_by_ids(ids, fetch_hints, authorizations)
    }

    /// Readable extended data rows of an element, optionally narrowed to one table,
    /// ordered by table then row id.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn extended_data(
        &self,
        element_type: ElementType,
        element_id: &str,
        table_name: Option<&str>,
        authorizations: &Authorizations,
    ) -> Result<Vec<ExtendedDataRow>> {
        if !is_valid_id(element_id) || table_name.is_some_and(|t| !is_valid_id(t)) {
            return Ok(Vec::new());
        }
        let prefix = RowKey::extended_data_prefix(element_type, element_id, table_name);
        let hints = Arc::new(FetchHints::all().clone());
        let mut result = Vec::new();
        for (row, cells) in rows::scan_rows(self.backend.as_ref(), &prefix)? {
            let Some(row_id) = row.extended_data_row_id() else {
                continue;
            };
            if let Some(decoded) = self.decode_extended_row(row_id, &cells, &hints, authorizations)? {
                result.push(decoded);
            }
        }
        Ok(result)
    }

    /// One extended data row, or `None` when no cell of it is readable.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn extended_data_row(
        &self,
        row_id: &ExtendedDataRowId,
        authorizations: &Authorizations,
    ) -> Result<Option<ExtendedDataRow>> {
        let segments = [&row_id.element_id, &row_id.table_name, &row_id.row_id];
        if segments.iter().any(|s| !is_valid_id(s)) {
            return Ok(None);
        }
        let cells = rows::read_row(self.backend.as_ref(), &RowKey::extended_data(row_id))?;
        let hints = Arc::new(FetchHints::all().clone());
        self.decode_extended_row(row_id.clone(), &cells, &hints, authorizations)
    }

    /// Every stored version and soft delete of the element's properties, newest
    /// first, optionally filtered by key, name, visibility and time range.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    #[allow(clippy::too_many_arguments)]
    pub fn historical_property_values(
        &self,
        element: &Element,
        key: Option<&str>,
        name: Option<&str>,
        visibility: Option<&Visibility>,
        time_range: Option<TimeRange>,
        authorizations: &Authorizations,
    ) -> Result<Vec<HistoricalPropertyValue>> {
        let Some(element_type) = element.element_type() else {
            return Ok(Vec::new());
        };
        let range = time_range.unwrap_or_else(TimeRange::all);
        let row = RowKey::element(element_type, element.id());
        let cells = rows::read_row(self.backend.as_ref(), &row)?;
        let hints = Arc::new(FetchHints::all().clone());

        let matches = |id: &PropertyIdentity| {
            name.is_none_or(|n| n == id.0)
                && key.is_none_or(|k| k == id.1)
                && visibility.is_none_or(|v| v.as_str() == id.2)
        };

        let mut versions: BTreeMap<PropertyIdentity, Vec<(i64, PropertyValue)>> = BTreeMap::new();
        let mut deletes: Vec<(PropertyIdentity, i64, Visibility)> = Vec::new();
        let mut metadata: HashMap<PropertyIdentity, Vec<MetadataEntry>> = HashMap::new();
        for cell in &cells {
            if !authorizations.can_read(&cell.cell.visibility) {
                continue;
            }
            let id = property_identity(cell);
            if !matches(&id) {
                continue;
            }
            match cell.family.as_str() {
                family::PROPERTY => {
                    let value = self.decode_value(&cell.cell.value)?;
                    versions.entry(id).or_default().push((cell.cell.timestamp, value));
                }
                family::PROPERTY_DELETED => {
                    deletes.push((id, cell.cell.timestamp, cell.cell.visibility.clone()));
                }
                family::PROPERTY_METADATA => {
                    let value = self.decode_value(&cell.cell.value)?;
                    metadata.entry(id).or_default().push(MetadataEntry::new(
                        cell.qualifier_part(3),
                        value,
                        cell.cell.visibility.clone(),
                    ));
                }
                _ => {}
            }
        }

        let mut history = Vec::new();
        for (id, values) in &versions {
            let entries = metadata.get(id).cloned().unwrap_or_default();
            for (timestamp, value) in values {
                if range.contains(*timestamp) {
                    history.push(HistoricalPropertyValue {
                        key: id.1.clone(),
                        name: id.0.clone(),
                        visibility: Visibility::new(id.2.clone()),
                        timestamp: *timestamp,
                        value: value.clone(),
                        metadata: Metadata::loaded(entries.clone(), hints.clone()),
                        is_deleted: false,
                    });
                }
            }
        }
        for (id, timestamp, visibility) in deletes {
            if !range.contains(timestamp) {
                continue;
            }
            let value = versions
                .get(&id)
                .and_then(|values| {
                    values
                        .iter()
                        .filter(|(ts, _)| *ts <= timestamp)
                        .max_by_key(|(ts, _)| *ts)
                })
                .map(|(_, value)| value.clone())
                .unwrap_or(PropertyValue::Null);
            history.push(HistoricalPropertyValue {
                key: id.1.clone(),
                name: id.0.clone(),
                visibility,
                timestamp,
                value,
                metadata: Metadata::loaded(Vec::new(), hints.clone()),
                is_deleted: true,
            });
        }
        history.sort();
        Ok(history)
    }

    /// Open several streaming values at once.
    ///
    /// Values still holding in-memory bytes are served from memory; stored values
    /// are fetched from their sink in one call per sink.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if a payload is missing.
    pub fn open_streaming_values(
        &self,
        values: &[&StreamingPropertyValue],
    ) -> Result<Vec<Box<dyn Read + Send>>> {
        let refs: Vec<StreamingRef> = values
            .iter()
            .filter(|v| v.pending_bytes().is_none())
            .filter_map(|v| v.reference().cloned())
            .collect();
        let mut stored = self.streaming.open_input_streams(&refs)?.into_iter();
        let mut streams = Vec::with_capacity(values.len());
        for value in values {
            if value.pending_bytes().is_some() {
                streams.push(value.open()?);
            } else {
                let stream = stored.next().ok_or_else(|| {
                    GraphError::storage("Streaming sink returned too few streams", None::<std::io::Error>)
                })?;
                streams.push(stream);
            }
        }
        Ok(streams)
    }

    fn decode_vertex_rows(
        &self,
        rows: Vec<(RowKey, Vec<RowCell>)>,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Vertex>> {
        let hints = Arc::new(fetch_hints.clone());
        let mut vertices = Vec::new();
        for (row, cells) in rows {
            let Some(id) = row.element_id() else {
                continue;
            };
            if let Some(vertex) = self.decode_vertex(id, &cells, &hints, authorizations)? {
                vertices.push(vertex);
            }
        }
        Ok(vertices)
    }

    fn decode_edge_rows(
        &self,
        rows: Vec<(RowKey, Vec<RowCell>)>,
        fetch_hints: &FetchHints,
        authorizations: &Authorizations,
    ) -> Result<Vec<Edge>> {
        let hints = Arc::new(fetch_hints.clone());
        let mut edges = Vec::new();
        for (row, cells) in rows {
            let Some(id) = row.element_id() else {
                continue;
            };
            if let Some(edge) = self.decode_edge(id, &cells, &hints, authorizations)? {
                edges.push(edge);
            }
        }
        Ok(edges)
    }

    pub(crate) fn decode_vertex(
        &self,
        vertex_id: &str,
        cells: &[RowCell],
        fetch_hints: &Arc<FetchHints>,
        authorizations: &Authorizations,
    ) -> Result<Option<Vertex>> {
        let Some(decoded) = self.decode_row(vertex_id, cells, fetch_hints, authorizations)? else {
            return Ok(None);
        };
        let CellValue::Vertex { concept_type } = decoded.info else {
            return Err(corrupt_row("vertex", vertex_id));
        };
        Ok(Some(
            Vertex::new(decoded.core, concept_type.clone()).with_edges(decoded.edge_infos, decoded.summary),
        ))
    }

    pub(crate) fn decode_edge(
        &self,
        edge_id: &str,
        cells: &[RowCell],
        fetch_hints: &Arc<FetchHints>,
        authorizations: &Authorizations,
    ) -> Result<Option<Edge>> {
        let Some(decoded) = self.decode_row(edge_id, cells, fetch_hints, authorizations)? else {
            return Ok(None);
        };
        let CellValue::Edge {
            out_vertex_id,
            in_vertex_id,
            label,
        } = decoded.info
        else {
            return Err(corrupt_row("edge", edge_id));
        };
        Ok(Some(Edge::new(
            decoded.core,
            out_vertex_id.clone(),
            in_vertex_id.clone(),
            label.clone(),
        )))
    }

    fn decode_row<'a>(
        &self,
        element_id: &str,
        cells: &'a [RowCell],
        fetch_hints: &Arc<FetchHints>,
        authorizations: &Authorizations,
    ) -> Result<Option<DecodedRow<'a>>> {
        let mut info = None;
        let mut deleted_at: Option<i64> = None;
        let mut hidden = BTreeSet::new();
        let mut table_names = BTreeSet::new();
        for cell in cells {
            match cell.family.as_str() {
                family::ELEMENT => info = Some(&cell.cell),
                family::ELEMENT_DELETED => {
                    deleted_at = deleted_at.max(Some(cell.cell.timestamp));
                }
                family::ELEMENT_HIDDEN if authorizations.can_read(&cell.cell.visibility) => {
                    hidden.insert(cell.cell.visibility.clone());
                }
                family::TABLE => {
                    table_names.insert(cell.qualifier_part(0).to_string());
                }
                _ => {}
            }
        }
        let Some(info) = info else {
            return Ok(None);
        };
        if !authorizations.can_read(&info.visibility) {
            return Ok(None);
        }
        if deleted_at.is_some_and(|deleted| deleted >= info.timestamp) {
            trace!("Element {element_id} is soft-deleted");
            return Ok(None);
        }
        if !hidden.is_empty() && !fetch_hints.is_include_hidden() {
            trace!("Element {element_id} is hidden");
            return Ok(None);
        }

        let mut core = ElementCore::new(
            element_id,
            info.visibility.clone(),
            info.timestamp,
            fetch_hints.clone(),
            authorizations.clone(),
        );
        core.hidden_visibilities = hidden;
        if fetch_hints.is_include_extended_data_table_names() {
            core.extended_data_table_names = table_names;
        }
        if fetch_hints.is_include_properties() {
            core.properties = self.decode_properties(cells, fetch_hints, authorizations, deleted_at)?;
        }
        let (edge_infos, summary) = decode_edge_refs(cells, fetch_hints, authorizations);
        Ok(Some(DecodedRow {
            core,
            info: &info.value,
            edge_infos,
            summary,
        }))
    }

    fn decode_properties(
        &self,
        cells: &[RowCell],
        fetch_hints: &Arc<FetchHints>,
        authorizations: &Authorizations,
        element_deleted_at: Option<i64>,
    ) -> Result<Vec<Property>> {
        let mut latest: BTreeMap<PropertyIdentity, &RowCell> = BTreeMap::new();
        let mut deleted: HashMap<PropertyIdentity, i64> = HashMap::new();
        let mut hidden: HashMap<PropertyIdentity, BTreeSet<Visibility>> = HashMap::new();
        let mut metadata: HashMap<PropertyIdentity, Vec<MetadataEntry>> = HashMap::new();

        for cell in cells {
            let readable = authorizations.can_read(&cell.cell.visibility);
            match cell.family.as_str() {
                family::PROPERTY if readable => {
                    let id = property_identity(cell);
                    if !fetch_hints.is_include_property(&id.0) {
                        continue;
                    }
                    let newer = latest
                        .get(&id)
                        .is_none_or(|current| current.cell.timestamp < cell.cell.timestamp);
                    if newer {
                        latest.insert(id, cell);
                    }
                }
                family::PROPERTY_DELETED => {
                    let ts = deleted.entry(property_identity(cell)).or_insert(i64::MIN);
                    *ts = (*ts).max(cell.cell.timestamp);
                }
                family::PROPERTY_HIDDEN if readable => {
                    hidden
                        .entry(property_identity(cell))
                        .or_default()
                        .insert(cell.cell.visibility.clone());
                }
                family::PROPERTY_METADATA if readable => {
                    let meta_key = cell.qualifier_part(3);
                    if fetch_hints.is_include_metadata_key(meta_key) {
                        metadata.entry(property_identity(cell)).or_default().push(
                            MetadataEntry::new(
                                meta_key,
                                self.decode_value(&cell.cell.value)?,
                                cell.cell.visibility.clone(),
                            ),
                        );
                    }
                }
                _ => {}
            }
        }

        let mut properties = Vec::with_capacity(latest.len());
        for (id, cell) in latest {
            let timestamp = cell.cell.timestamp;
            if element_deleted_at.is_some_and(|deleted| deleted >= timestamp) {
                continue;
            }
            if deleted.get(&id).is_some_and(|deleted| *deleted >= timestamp) {
                continue;
            }
            let hidden_visibilities = hidden.remove(&id).unwrap_or_default();
            if !hidden_visibilities.is_empty() && !fetch_hints.is_include_hidden() {
                continue;
            }
            let entries = metadata.remove(&id).unwrap_or_default();
            let (name, key, _) = id;
            properties.push(Property::new(
                key,
                name,
                cell.cell.visibility.clone(),
                self.decode_value(&cell.cell.value)?,
                timestamp,
                Metadata::loaded(entries, fetch_hints.clone()),
                hidden_visibilities,
                fetch_hints.clone(),
            ));
        }
        Ok(properties)
    }

    fn decode_extended_row(
        &self,
        row_id: ExtendedDataRowId,
        cells: &[RowCell],
        fetch_hints: &Arc<FetchHints>,
        authorizations: &Authorizations,
    ) -> Result<Option<ExtendedDataRow>> {
        let mut properties = Vec::new();
        let mut timestamp = None;
        for cell in cells {
            if cell.family != family::EXTENDED_COLUMN
                || !authorizations.can_read(&cell.cell.visibility)
            {
                continue;
            }
            timestamp = timestamp.max(Some(cell.cell.timestamp));
            properties.push(Property::new(
                cell.qualifier_part(1),
                cell.qualifier_part(0),
                cell.cell.visibility.clone(),
                self.decode_value(&cell.cell.value)?,
                cell.cell.timestamp,
                Metadata::loaded(Vec::new(), fetch_hints.clone()),
                BTreeSet::new(),
                fetch_hints.clone(),
            ));
        }
        let Some(timestamp) = timestamp else {
            return Ok(None);
        };
        let mut core = ElementCore::new(
            row_id.row_id.clone(),
            Visibility::empty(),
            timestamp,
            fetch_hints.clone(),
            authorizations.clone(),
        );
        core.properties = properties;
        Ok(Some(ExtendedDataRow::new(core, row_id)))
    }

    pub(crate) fn decode_value(&self, value: &CellValue) -> Result<PropertyValue> {
        match value {
            CellValue::Value(StoredValue::Inline(v)) => Ok(v.clone()),
            CellValue::Value(StoredValue::Streaming {
                reference,
                length,
                searchable,
            }) => Ok(PropertyValue::Streaming(StreamingPropertyValue::stored(
                reference.clone(),
                *length,
                *searchable,
                self.streaming.clone(),
            ))),
            other => Err(GraphError::serialization(
                format!("Expected a property value cell, found {other:?}"),
                None::<std::io::Error>,
            )),
        }
    }
}

fn decode_edge_refs(
    cells: &[RowCell],
    fetch_hints: &FetchHints,
    authorizations: &Authorizations,
) -> (Vec<EdgeInfo>, EdgesSummary) {
    let mut infos = Vec::new();
    let mut summary = EdgesSummary::default();
    let want_counts = fetch_hints.is_include_edge_label_counts();
    if !fetch_hints.has_edge_refs() && !want_counts {
        return (infos, summary);
    }

    let mut deleted: HashMap<&str, i64> = HashMap::new();
    let mut hidden: HashSet<&str> = HashSet::new();
    for cell in cells {
        match cell.family.as_str() {
            family::EDGE_REF_DELETED => {
                let ts = deleted.entry(cell.qualifier_part(0)).or_insert(i64::MIN);
                *ts = (*ts).max(cell.cell.timestamp);
            }
            family::EDGE_REF_HIDDEN if authorizations.can_read(&cell.cell.visibility) => {
                hidden.insert(cell.qualifier_part(0));
            }
            _ => {}
        }
    }

    for cell in cells {
        let direction = match cell.family.as_str() {
            family::OUT_EDGE => Direction::Outgoing,
            family::IN_EDGE => Direction::Incoming,
            _ => continue,
        };
        let edge_id = cell.qualifier_part(0);
        if !authorizations.can_read(&cell.cell.visibility)
            || deleted.get(edge_id).is_some_and(|ts| *ts >= cell.cell.timestamp)
            || (hidden.contains(edge_id) && !fetch_hints.is_include_hidden())
        {
            continue;
        }
        let CellValue::EdgeRef {
            label,
            other_vertex_id,
        } = &cell.cell.value
        else {
            continue;
        };
        if want_counts {
            let counts = match direction {
                Direction::Outgoing => &mut summary.out_edge_counts,
                _ => &mut summary.in_edge_counts,
            };
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        let wanted = match direction {
            Direction::Outgoing => fetch_hints.includes_out_edge_refs(),
            _ => fetch_hints.includes_in_edge_refs(),
        };
        if wanted && fetch_hints.is_include_edge_ref_label(label) {
            infos.push(EdgeInfo::new(edge_id, label.clone(), other_vertex_id.clone(), direction));
        }
    }
    (infos, summary)
}

fn id_range(element_type: ElementType, start: &str, end: &str) -> (Vec<u8>, Vec<u8>) {
    let prefix = RowKey::type_prefix(element_type);
    let mut start_key = prefix.clone();
    start_key.extend_from_slice(start.as_bytes());
    let mut end_key = prefix;
    end_key.extend_from_slice(end.as_bytes());
    (start_key, end_key)
}

fn corrupt_row(kind: &str, id: &str) -> GraphError {
    GraphError::serialization(
        format!("Row of {kind} {id} has a mismatched element cell"),
        None::<std::io::Error>,
    )
}
