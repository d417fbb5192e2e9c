//! Vertices and their edge references.

use super::element::{
    id_property, Direction, ElementCore, GraphElement, CONCEPT_TYPE_PROPERTY_NAME,
    ID_PROPERTY_NAME,
};
use super::property::{Property, PropertyValue};
use crate::error::{GraphError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Lightweight reference to an edge stored on one of its endpoint vertices.
///
/// Holds ids and the label only, never the live edge or the other vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeInfo {
    edge_id: String,
    label: String,
    other_vertex_id: String,
    direction: Direction,
}

impl EdgeInfo {
    /// Create an edge reference; `direction` is relative to the owning vertex.
    pub fn new(
        edge_id: impl Into<String>,
        label: impl Into<String>,
        other_vertex_id: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            edge_id: edge_id.into(),
            label: label.into(),
            other_vertex_id: other_vertex_id.into(),
            direction,
        }
    }

    /// Edge id.
    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    /// Edge label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Id of the vertex at the other end.
    pub fn other_vertex_id(&self) -> &str {
        &self.other_vertex_id
    }

    /// [`Direction::Outgoing`] or [`Direction::Incoming`] relative to the owner.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Per-direction edge counts keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgesSummary {
    /// Outgoing edge counts per label
    pub out_edge_counts: BTreeMap<String, usize>,
    /// Incoming edge counts per label
    pub in_edge_counts: BTreeMap<String, usize>,
}

impl EdgesSummary {
    /// Total edges in both directions.
    pub fn total(&self) -> usize {
        self.out_edge_counts.values().sum::<usize>() + self.in_edge_counts.values().sum::<usize>()
    }
}

/// A vertex in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    core: ElementCore,
    concept_type: Option<String>,
    edge_infos: Vec<EdgeInfo>,
    summary: EdgesSummary,
}

impl Vertex {
    pub(crate) fn new(core: ElementCore, concept_type: Option<String>) -> Self {
        Self {
            core,
            concept_type,
            edge_infos: Vec::new(),
            summary: EdgesSummary::default(),
        }
    }

    pub(crate) fn with_edges(mut self, edge_infos: Vec<EdgeInfo>, summary: EdgesSummary) -> Self {
        self.edge_infos = edge_infos;
        self.summary = summary;
        self
    }

    /// Concept type, if one was assigned.
    pub fn concept_type(&self) -> Option<&str> {
        self.concept_type.as_deref()
    }

    /// Edge references in a direction, optionally restricted to labels.
    ///
    /// # Errors
    ///
    /// Fails if the fetch hints did not load the requested direction or labels, or
    /// did not load both edge ids and edge vertex ids.
    pub fn edge_infos(&self, direction: Direction, labels: &[&str]) -> Result<Vec<&EdgeInfo>> {
        self.check_edge_refs(direction, labels)?;
        let hints = self.fetch_hints();
        if !hints.is_include_edge_ids() || !hints.is_include_edge_vertex_ids() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "edge infos need both edge ids and edge vertex ids in the fetch hints",
            ));
        }
        Ok(self.matching_edge_infos(direction, labels))
    }

    /// Ids of edges in a direction, optionally restricted to labels.
    ///
    /// # Errors
    ///
    /// Fails if edge ids or the requested direction/labels were not fetched.
    pub fn edge_ids(&self, direction: Direction, labels: &[&str]) -> Result<Vec<String>> {
        self.check_edge_refs(direction, labels)?;
        if !self.fetch_hints().is_include_edge_ids() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "edge ids were not included in the fetch hints",
            ));
        }
        let ids: BTreeSet<&str> = self
            .matching_edge_infos(direction, labels)
            .into_iter()
            .map(EdgeInfo::edge_id)
            .collect();
        Ok(ids.into_iter().map(str::to_string).collect())
    }

    /// Ids of vertices at the other end of edges in a direction.
    ///
    /// # Errors
    ///
    /// Fails if edge vertex ids or the requested direction/labels were not fetched.
    pub fn vertex_ids(&self, direction: Direction, labels: &[&str]) -> Result<Vec<String>> {
        self.check_edge_refs(direction, labels)?;
        if !self.fetch_hints().is_include_edge_vertex_ids() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "edge vertex ids were not included in the fetch hints",
            ));
        }
        let ids: BTreeSet<&str> = self
            .matching_edge_infos(direction, labels)
            .into_iter()
            .map(EdgeInfo::other_vertex_id)
            .collect();
        Ok(ids.into_iter().map(str::to_string).collect())
    }

    /// Number of edges in a direction.
    ///
    /// Uses label counts when fetched, edge references otherwise.
    ///
    /// # Errors
    ///
    /// Fails if neither label counts nor the direction's edge refs were fetched.
    pub fn edge_count(&self, direction: Direction) -> Result<usize> {
        if self.fetch_hints().is_include_edge_label_counts() {
            let summary = &self.summary;
            return Ok(match direction {
                Direction::Outgoing => summary.out_edge_counts.values().sum(),
                Direction::Incoming => summary.in_edge_counts.values().sum(),
                Direction::Both => summary.total(),
            });
        }
        self.check_edge_refs(direction, &[])?;
        Ok(self.matching_edge_infos(direction, &[]).len())
    }

    /// Distinct labels of edges in a direction.
    ///
    /// # Errors
    ///
    /// Fails if neither label counts nor the direction's edge refs were fetched.
    pub fn edge_labels(&self, direction: Direction) -> Result<BTreeSet<String>> {
        if self.fetch_hints().is_include_edge_label_counts() {
            let summary = &self.summary;
            let mut labels = BTreeSet::new();
            if direction != Direction::Incoming {
                labels.extend(summary.out_edge_counts.keys().cloned());
            }
            if direction != Direction::Outgoing {
                labels.extend(summary.in_edge_counts.keys().cloned());
            }
            return Ok(labels);
        }
        self.check_edge_refs(direction, &[])?;
        Ok(self
            .matching_edge_infos(direction, &[])
            .into_iter()
            .map(|e| e.label().to_string())
            .collect())
    }

    /// Per-label edge counts in both directions.
    ///
    /// # Errors
    ///
    /// Fails if label counts were not fetched.
    pub fn edges_summary(&self) -> Result<&EdgesSummary> {
        if !self.fetch_hints().is_include_edge_label_counts() {
            return Err(GraphError::fetch_hints(
                self.id(),
                "edge label counts were not included in the fetch hints",
            ));
        }
        Ok(&self.summary)
    }

    pub(crate) fn all_edge_infos(&self) -> &[EdgeInfo] {
        &self.edge_infos
    }

    fn matching_edge_infos(&self, direction: Direction, labels: &[&str]) -> Vec<&EdgeInfo> {
        self.edge_infos
            .iter()
            .filter(|info| {
                (direction == Direction::Both || info.direction == direction)
                    && (labels.is_empty() || labels.contains(&info.label.as_str()))
            })
            .collect()
    }

    fn check_edge_refs(&self, direction: Direction, labels: &[&str]) -> Result<()> {
        let hints = self.fetch_hints();
        let covered = match direction {
            Direction::Outgoing => hints.includes_out_edge_refs(),
            Direction::Incoming => hints.includes_in_edge_refs(),
            Direction::Both => hints.includes_out_edge_refs() && hints.includes_in_edge_refs(),
        };
        if !covered {
            return Err(GraphError::fetch_hints(
                self.id(),
                format!("{direction:?} edge refs were not included in the fetch hints"),
            ));
        }
        let filter = hints.edge_labels_of_edge_refs_to_include();
        if !filter.is_empty() {
            if labels.is_empty() {
                return Err(GraphError::fetch_hints(
                    self.id(),
                    "edge refs were fetched for a subset of labels; specify labels",
                ));
            }
            if let Some(missing) = labels.iter().find(|l| !filter.contains(**l)) {
                return Err(GraphError::fetch_hints(
                    self.id(),
                    format!("edge refs with label '{missing}' were not included in the fetch hints"),
                ));
            }
        }
        Ok(())
    }
}

impl GraphElement for Vertex {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn reserved_property(&self, name: &str) -> Option<Property> {
        match name {
            ID_PROPERTY_NAME => Some(id_property(&self.core)),
            CONCEPT_TYPE_PROPERTY_NAME => Some(Property::reserved(
                CONCEPT_TYPE_PROPERTY_NAME,
                self.concept_type
                    .clone()
                    .map_or(PropertyValue::Null, PropertyValue::String),
                self.core.timestamp,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v[{}]", self.core.id)
    }
}
