//! Cell/row layer over the byte-level [`StorageBackend`].
//!
//! Every element is a row of cells. A cell key is
//! `row key ␟ column family ␟ qualifier part ␟ ...`, with `␟` the 0x1F unit
//! separator, and a cell value is a serialized [`Cell`] carrying the visibility and
//! timestamp of the write. Row keys encode the element type and id (plus table and
//! row id for extended data), so one prefix scan loads one row.

use super::{BatchOperation, StorageBackend, StreamingRef};
use crate::error::{GraphError, Result};
use crate::model::{ElementType, ExtendedDataRowId, PropertyValue};
use crate::security::Visibility;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between key segments.
pub(crate) const SEP: u8 = 0x1f;

/// Column families.
pub(crate) mod family {
    /// Element info (vertex concept type / edge endpoints and label)
    pub const ELEMENT: &str = "a";
    /// Element soft-delete tombstone
    pub const ELEMENT_DELETED: &str = "d";
    /// Element hidden marker, qualified by the hiding visibility
    pub const ELEMENT_HIDDEN: &str = "h";
    /// Property value versions: name, key, visibility, inverted timestamp
    pub const PROPERTY: &str = "p";
    /// Property metadata: name, key, visibility, metadata key, metadata visibility
    pub const PROPERTY_METADATA: &str = "pm";
    /// Property soft-delete marker: name, key, visibility, inverted timestamp
    pub const PROPERTY_DELETED: &str = "pd";
    /// Property hidden marker: name, key, visibility, hiding visibility
    pub const PROPERTY_HIDDEN: &str = "ph";
    /// Outgoing edge reference, qualified by edge id
    pub const OUT_EDGE: &str = "eo";
    /// Incoming edge reference, qualified by edge id
    pub const IN_EDGE: &str = "ei";
    /// Edge reference soft-delete marker, qualified by edge id
    pub const EDGE_REF_DELETED: &str = "ed";
    /// Edge reference hidden marker: edge id, hiding visibility
    pub const EDGE_REF_HIDDEN: &str = "eh";
    /// Extended data table name
    pub const TABLE: &str = "t";
    /// Extended data column value: column, key, visibility
    pub const EXTENDED_COLUMN: &str = "c";
    /// Metadata store entry, qualified by metadata key
    pub const METADATA_ENTRY: &str = "k";
}

/// A property value as persisted: inline, or a reference into the streaming sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum StoredValue {
    Inline(PropertyValue),
    Streaming {
        reference: StreamingRef,
        length: u64,
        searchable: bool,
    },
}

/// Typed payload of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum CellValue {
    /// Presence-only cell (tombstones, hidden markers, table names)
    Marker,
    Vertex {
        concept_type: Option<String>,
    },
    Edge {
        out_vertex_id: String,
        in_vertex_id: String,
        label: String,
    },
    Value(StoredValue),
    EdgeRef {
        label: String,
        other_vertex_id: String,
    },
    Json(serde_json::Value),
}

/// One visibility-labelled, timestamped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Cell {
    pub visibility: Visibility,
    pub timestamp: i64,
    pub value: CellValue,
}

impl Cell {
    pub fn new(visibility: Visibility, timestamp: i64, value: CellValue) -> Self {
        Self {
            visibility,
            timestamp,
            value,
        }
    }

    pub fn marker(visibility: Visibility, timestamp: i64) -> Self {
        Self::new(visibility, timestamp, CellValue::Marker)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| GraphError::serialization("Failed to encode cell", Some(e)))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| GraphError::serialization("Failed to decode cell", Some(e)))
    }
}

/// Row key of an element, an extended data row or the metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RowKey(Vec<u8>);

impl RowKey {
    pub fn vertex(id: &str) -> Self {
        Self::from_segments(&["v", id])
    }

    pub fn edge(id: &str) -> Self {
        Self::from_segments(&["e", id])
    }

    pub fn element(element_type: ElementType, id: &str) -> Self {
        match element_type {
            ElementType::Vertex => Self::vertex(id),
            ElementType::Edge => Self::edge(id),
        }
    }

    pub fn extended_data(row_id: &ExtendedDataRowId) -> Self {
        Self::from_segments(&[
            "x",
            type_segment(row_id.element_type),
            &row_id.element_id,
            &row_id.table_name,
            &row_id.row_id,
        ])
    }

    pub fn metadata() -> Self {
        Self::from_segments(&["m"])
    }

    /// Prefix shared by every row of one element kind.
    pub fn type_prefix(element_type: ElementType) -> Vec<u8> {
        let mut key = match element_type {
            ElementType::Vertex => b"v".to_vec(),
            ElementType::Edge => b"e".to_vec(),
        };
        key.push(SEP);
        key
    }

    /// Prefix shared by the extended data rows of one element, optionally narrowed
    /// to one table.
    pub fn extended_data_prefix(
        element_type: ElementType,
        element_id: &str,
        table_name: Option<&str>,
    ) -> Vec<u8> {
        let mut segments = vec!["x", type_segment(element_type), element_id];
        if let Some(table) = table_name {
            segments.push(table);
        }
        Self::from_segments(&segments).0
    }

    fn from_segments(segments: &[&str]) -> Self {
        let mut key = Vec::new();
        for segment in segments {
            key.extend_from_slice(segment.as_bytes());
            key.push(SEP);
        }
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The id segment of a vertex or edge row.
    pub fn element_id(&self) -> Option<&str> {
        let text = std::str::from_utf8(&self.0).ok()?;
        let mut parts = text.split(SEP as char);
        match parts.next()? {
            "v" | "e" => parts.next(),
            _ => None,
        }
    }

    /// Identity of an extended data row key.
    pub fn extended_data_row_id(&self) -> Option<ExtendedDataRowId> {
        let text = std::str::from_utf8(&self.0).ok()?;
        let parts: Vec<&str> = text.split(SEP as char).collect();
        if parts.len() != 6 || parts[0] != "x" {
            return None;
        }
        let element_type = match parts[1] {
            "v" => ElementType::Vertex,
            "e" => ElementType::Edge,
            _ => return None,
        };
        Some(ExtendedDataRowId::new(
            element_type,
            parts[2],
            parts[3],
            parts[4],
        ))
    }

    /// Full key of one cell.
    pub fn column(&self, family: &str, qualifier: &[&str]) -> Vec<u8> {
        let mut key = self.0.clone();
        key.extend_from_slice(family.as_bytes());
        key.push(SEP);
        for part in qualifier {
            key.extend_from_slice(part.as_bytes());
            key.push(SEP);
        }
        key
    }

    /// Row key of the row a cell key belongs to.
    pub fn of_cell_key(key: &[u8]) -> Option<RowKey> {
        let segments = match key.first()? {
            b'v' | b'e' => 2,
            b'x' => 5,
            b'm' => 1,
            _ => return None,
        };
        let mut seen = 0;
        for (i, b) in key.iter().enumerate() {
            if *b == SEP {
                seen += 1;
                if seen == segments {
                    return Some(RowKey(key[..=i].to_vec()));
                }
            }
        }
        None
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.0);
        write!(f, "{}", text.trim_end_matches(SEP as char).replace(SEP as char, ":"))
    }
}

fn type_segment(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Vertex => "v",
        ElementType::Edge => "e",
    }
}

/// Order-preserving, newest-first encoding of a timestamp for qualifiers.
pub(crate) fn inverted_timestamp(timestamp: i64) -> String {
    let biased = (timestamp as u64) ^ (1 << 63);
    format!("{:016x}", u64::MAX - biased)
}

/// Rejects values that would corrupt key segmentation.
pub(crate) fn check_segment(what: &str, value: &str) -> Result<()> {
    if value.as_bytes().contains(&SEP) {
        return Err(GraphError::invalid(format!(
            "{what} '{}' contains the reserved 0x1F separator",
            value.escape_debug()
        )));
    }
    Ok(())
}

/// A decoded cell of a row.
#[derive(Debug, Clone)]
pub(crate) struct RowCell {
    pub key: Vec<u8>,
    pub family: String,
    pub qualifier: Vec<String>,
    pub cell: Cell,
}

impl RowCell {
    pub fn qualifier_part(&self, index: usize) -> &str {
        self.qualifier.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Pending writes for one row, applied atomically.
#[derive(Debug)]
pub(crate) struct RowMutation {
    row: RowKey,
    operations: Vec<BatchOperation>,
}

impl RowMutation {
    pub fn new(row: RowKey) -> Self {
        Self {
            row,
            operations: Vec::new(),
        }
    }

    pub fn row(&self) -> &RowKey {
        &self.row
    }

    pub fn put(&mut self, family: &str, qualifier: &[&str], cell: &Cell) -> Result<&mut Self> {
        let key = self.row.column(family, qualifier);
        self.operations.push(BatchOperation::Put {
            key,
            value: cell.encode()?,
        });
        Ok(self)
    }

    pub fn delete(&mut self, family: &str, qualifier: &[&str]) -> &mut Self {
        let key = self.row.column(family, qualifier);
        self.operations.push(BatchOperation::Delete { key });
        self
    }

    pub fn delete_key(&mut self, key: Vec<u8>) -> &mut Self {
        self.operations.push(BatchOperation::Delete { key });
        self
    }

    pub fn apply(self, backend: &dyn StorageBackend) -> Result<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        backend.write_batch(self.operations)
    }
}

fn decode_cell(row: &RowKey, key: Vec<u8>, value: &[u8]) -> Result<RowCell> {
    let rest = key.get(row.as_bytes().len()..).unwrap_or_default();
    let text = std::str::from_utf8(rest)
        .map_err(|e| GraphError::serialization("Cell key is not UTF-8", Some(e)))?;
    let mut parts: Vec<String> = text.split(SEP as char).map(str::to_string).collect();
    // Every segment is SEP-terminated, so the split ends with an empty string.
    parts.pop();
    if parts.is_empty() {
        return Err(GraphError::serialization(
            "Cell key has no column family",
            None::<std::io::Error>,
        ));
    }
    let family = parts.remove(0);
    Ok(RowCell {
        cell: Cell::decode(value)?,
        key,
        family,
        qualifier: parts,
    })
}

/// Every cell of one row, in key order.
pub(crate) fn read_row(backend: &dyn StorageBackend, row: &RowKey) -> Result<Vec<RowCell>> {
    backend
        .scan_prefix(row.as_bytes())?
        .into_iter()
        .map(|(key, value)| decode_cell(row, key, &value))
        .collect()
}

/// Cells of one row restricted to a column family and qualifier prefix.
pub(crate) fn read_columns(
    backend: &dyn StorageBackend,
    row: &RowKey,
    family: &str,
    qualifier: &[&str],
) -> Result<Vec<RowCell>> {
    backend
        .scan_prefix(&row.column(family, qualifier))?
        .into_iter()
        .map(|(key, value)| decode_cell(row, key, &value))
        .collect()
}

fn group_rows(pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Vec<(RowKey, Vec<RowCell>)>> {
    let mut rows: Vec<(RowKey, Vec<RowCell>)> = Vec::new();
    for (key, value) in pairs {
        let Some(row) = RowKey::of_cell_key(&key) else {
            continue;
        };
        let cell = decode_cell(&row, key, &value)?;
        match rows.last_mut() {
            Some((last, cells)) if *last == row => cells.push(cell),
            _ => rows.push((row, vec![cell])),
        }
    }
    Ok(rows)
}

/// Rows whose keys start with `prefix`, grouped and in key order.
pub(crate) fn scan_rows(
    backend: &dyn StorageBackend,
    prefix: &[u8],
) -> Result<Vec<(RowKey, Vec<RowCell>)>> {
    group_rows(backend.scan_prefix(prefix)?)
}

/// Rows with `start <= key < end`, grouped and in key order.
pub(crate) fn scan_row_range(
    backend: &dyn StorageBackend,
    start: &[u8],
    end: &[u8],
) -> Result<Vec<(RowKey, Vec<RowCell>)>> {
    group_rows(backend.scan_range(start, end)?)
}
