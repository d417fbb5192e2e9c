//! Directed, labelled edges.

use super::element::{
    id_property, Direction, ElementCore, GraphElement, EDGE_LABEL_PROPERTY_NAME,
    ID_PROPERTY_NAME, IN_OR_OUT_VERTEX_ID_PROPERTY_NAME, IN_VERTEX_ID_PROPERTY_NAME,
    OUT_VERTEX_ID_PROPERTY_NAME,
};
use super::property::{Property, PropertyValue};
use crate::error::{GraphError, Result};
use std::fmt;

/// A directed edge between two vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    core: ElementCore,
    out_vertex_id: String,
    in_vertex_id: String,
    label: String,
}

impl Edge {
    pub(crate) fn new(
        core: ElementCore,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            core,
            out_vertex_id: out_vertex_id.into(),
            in_vertex_id: in_vertex_id.into(),
            label: label.into(),
        }
    }

    /// Edge label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Id of the vertex this edge leaves.
    pub fn out_vertex_id(&self) -> &str {
        &self.out_vertex_id
    }

    /// Id of the vertex this edge enters.
    pub fn in_vertex_id(&self) -> &str {
        &self.in_vertex_id
    }

    /// Endpoint id for a single direction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for [`Direction::Both`].
    pub fn vertex_id(&self, direction: Direction) -> Result<&str> {
        match direction {
            Direction::Outgoing => Ok(&self.out_vertex_id),
            Direction::Incoming => Ok(&self.in_vertex_id),
            Direction::Both => Err(GraphError::invalid(
                "an edge has one vertex per direction; Both is ambiguous",
            )),
        }
    }

    /// The endpoint that is not `vertex_id`, or `None` if `vertex_id` is not an
    /// endpoint. Self-loops return the same id.
    pub fn other_vertex_id(&self, vertex_id: &str) -> Option<&str> {
        if self.out_vertex_id == vertex_id {
            Some(&self.in_vertex_id)
        } else if self.in_vertex_id == vertex_id {
            Some(&self.out_vertex_id)
        } else {
            None
        }
    }
}

impl GraphElement for Edge {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn reserved_property(&self, name: &str) -> Option<Property> {
        let ts = self.core.timestamp;
        match name {
            ID_PROPERTY_NAME => Some(id_property(&self.core)),
            EDGE_LABEL_PROPERTY_NAME => Some(Property::reserved(
                name,
                PropertyValue::String(self.label.clone()),
                ts,
            )),
            OUT_VERTEX_ID_PROPERTY_NAME => Some(Property::reserved(
                name,
                PropertyValue::String(self.out_vertex_id.clone()),
                ts,
            )),
            IN_VERTEX_ID_PROPERTY_NAME => Some(Property::reserved(
                name,
                PropertyValue::String(self.in_vertex_id.clone()),
                ts,
            )),
            IN_OR_OUT_VERTEX_ID_PROPERTY_NAME => Some(Property::reserved(
                name,
                PropertyValue::StringList(vec![
                    self.out_vertex_id.clone(),
                    self.in_vertex_id.clone(),
                ]),
                ts,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "e[{}]{{{}->{}:{}}}",
            self.core.id, self.out_vertex_id, self.in_vertex_id, self.label
        )
    }
}
