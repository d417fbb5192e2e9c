//! Mutation builders and batch ordering.
//!
//! Builders accumulate property and extended-data changes in memory; nothing is
//! written until `save`. Batches are applied vertices first so that every edge's
//! endpoints exist before the edge becomes resolvable.

mod builder;
mod changes;

pub use builder::{EdgeBuilder, ExistingElementMutation, MutationBuilder, VertexBuilder};
pub use changes::{
    AlterPropertyVisibility, ExtendedDataAdd, ExtendedDataDelete, IndexHint, PropertyAdd,
    PropertyChanges, PropertyDelete, PropertySoftDelete, SetPropertyMetadata,
};

use crate::error::Result;
use crate::model::{Element, ElementType};
use crate::security::Authorizations;

/// One entry of a batch save.
pub enum ElementMutation<'g> {
    /// Create a vertex
    NewVertex(VertexBuilder<'g>),
    /// Create an edge
    NewEdge(EdgeBuilder<'g>),
    /// Update a vertex or edge
    Existing(ExistingElementMutation<'g>),
}

impl ElementMutation<'_> {
    /// Type of the element this mutation writes.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementMutation::NewVertex(_) => ElementType::Vertex,
            ElementMutation::NewEdge(_) => ElementType::Edge,
            ElementMutation::Existing(m) => m.element_type(),
        }
    }

    /// Whether saving would write anything beyond a bare element.
    pub fn has_changes(&self) -> bool {
        match self {
            ElementMutation::NewVertex(b) => b.has_changes(),
            ElementMutation::NewEdge(b) => b.has_changes(),
            ElementMutation::Existing(m) => m.has_changes(),
        }
    }

    /// Save this mutation.
    ///
    /// # Errors
    ///
    /// Propagates the builder's save error.
    pub fn save(self, authorizations: &Authorizations) -> Result<Element> {
        match self {
            ElementMutation::NewVertex(b) => b.save(authorizations).map(Element::from),
            ElementMutation::NewEdge(b) => b.save(authorizations).map(Element::from),
            ElementMutation::Existing(m) => m.save(authorizations),
        }
    }
}

impl<'g> From<VertexBuilder<'g>> for ElementMutation<'g> {
    fn from(value: VertexBuilder<'g>) -> Self {
        ElementMutation::NewVertex(value)
    }
}

impl<'g> From<EdgeBuilder<'g>> for ElementMutation<'g> {
    fn from(value: EdgeBuilder<'g>) -> Self {
        ElementMutation::NewEdge(value)
    }
}

impl<'g> From<ExistingElementMutation<'g>> for ElementMutation<'g> {
    fn from(value: ExistingElementMutation<'g>) -> Self {
        ElementMutation::Existing(value)
    }
}

/// Stable reorder putting every vertex mutation before every edge mutation.
pub fn order_vertices_first(mutations: &mut [ElementMutation<'_>]) {
    mutations.sort_by_key(|m| m.element_type() == ElementType::Edge);
}
