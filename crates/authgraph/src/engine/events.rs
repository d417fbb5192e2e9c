//! Change events delivered to registered listeners.

use crate::model::{ElementType, ExtendedDataRowId};
use crate::security::Visibility;

/// A change applied by the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A vertex was created
    AddVertex {
        /// Vertex id
        vertex_id: String,
    },
    /// An edge was created
    AddEdge {
        /// Edge id
        edge_id: String,
        /// Out-vertex id
        out_vertex_id: String,
        /// In-vertex id
        in_vertex_id: String,
        /// Edge label
        label: String,
    },
    /// A property value was written
    AddProperty {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Property visibility
        visibility: Visibility,
    },
    /// A property was permanently deleted
    DeleteProperty {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Property visibility
        visibility: Visibility,
    },
    /// A property was soft-deleted
    SoftDeleteProperty {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Property visibility
        visibility: Visibility,
    },
    /// A metadata entry of a property was set
    SetPropertyMetadata {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Metadata key
        metadata_key: String,
    },
    /// A vertex was permanently deleted
    DeleteVertex {
        /// Vertex id
        vertex_id: String,
    },
    /// An edge was permanently deleted
    DeleteEdge {
        /// Edge id
        edge_id: String,
    },
    /// A vertex was soft-deleted
    SoftDeleteVertex {
        /// Vertex id
        vertex_id: String,
        /// Tombstone timestamp
        timestamp: i64,
    },
    /// An edge was soft-deleted
    SoftDeleteEdge {
        /// Edge id
        edge_id: String,
        /// Tombstone timestamp
        timestamp: i64,
    },
    /// An element was hidden under a visibility
    MarkHidden {
        /// Element type
        element_type: ElementType,
        /// Element id
        element_id: String,
        /// Hiding visibility
        visibility: Visibility,
    },
    /// A hidden marker was removed from an element
    MarkVisible {
        /// Element type
        element_type: ElementType,
        /// Element id
        element_id: String,
        /// Visibility of the removed marker
        visibility: Visibility,
    },
    /// A property was hidden under a visibility
    MarkPropertyHidden {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Hiding visibility
        visibility: Visibility,
    },
    /// A hidden marker was removed from a property
    MarkPropertyVisible {
        /// Owning element type
        element_type: ElementType,
        /// Owning element id
        element_id: String,
        /// Property key
        key: String,
        /// Property name
        name: String,
        /// Visibility of the removed marker
        visibility: Visibility,
    },
    /// An element's own visibility changed
    AlterElementVisibility {
        /// Element type
        element_type: ElementType,
        /// Element id
        element_id: String,
        /// New visibility
        visibility: Visibility,
    },
    /// An edge label changed
    AlterEdgeLabel {
        /// Edge id
        edge_id: String,
        /// New label
        label: String,
    },
    /// A vertex concept type changed
    AlterConceptType {
        /// Vertex id
        vertex_id: String,
        /// New concept type
        concept_type: String,
    },
    /// An extended data cell was written
    AddExtendedData {
        /// Row identity
        row_id: ExtendedDataRowId,
        /// Column name
        column: String,
    },
    /// An extended data cell was deleted
    DeleteExtendedData {
        /// Row identity
        row_id: ExtendedDataRowId,
        /// Column name
        column: String,
    },
}

/// Receives every [`GraphEvent`] after the change is persisted.
pub trait GraphEventListener: Send + Sync {
    /// Called synchronously on the thread that applied the change.
    fn on_graph_event(&self, event: &GraphEvent);
}

impl<F> GraphEventListener for F
where
    F: Fn(&GraphEvent) + Send + Sync,
{
    fn on_graph_event(&self, event: &GraphEvent) {
        self(event)
    }
}
