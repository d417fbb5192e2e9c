//! Search index seam.
//!
//! The graph keeps the index informed of every change unless a mutation carries
//! [`crate::IndexHint::DoNotIndex`]. Querying the index is out of this crate's scope.

use crate::error::Result;
use crate::model::{Element, ElementType, ExtendedDataRowId, Property};
use crate::security::{Authorizations, Visibility};

/// Receiver of element changes for attribute and full-text search.
pub trait SearchIndex: Send + Sync {
    /// Index a new or fully rewritten element.
    fn add_element(&self, element: &Element, authorizations: &Authorizations) -> Result<()>;

    /// Index one extended data row.
    fn add_element_extended_data(
        &self,
        row_id: &ExtendedDataRowId,
        columns: &[(String, Visibility)],
        authorizations: &Authorizations,
    ) -> Result<()>;

    /// Remove an element.
    fn delete_element(&self, element_type: ElementType, element_id: &str) -> Result<()>;

    /// Remove a single property of an element.
    fn delete_property(
        &self,
        element_type: ElementType,
        element_id: &str,
        key: &str,
        name: &str,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Remove an extended data row.
    fn delete_extended_data(&self, row_id: &ExtendedDataRowId) -> Result<()>;

    /// Record that an element is hidden under `visibility`.
    fn mark_element_hidden(&self, element: &Element, visibility: &Visibility) -> Result<()>;

    /// Record that an element is no longer hidden under `visibility`.
    fn mark_element_visible(&self, element: &Element, visibility: &Visibility) -> Result<()>;

    /// Record that a property is hidden under `visibility`.
    fn mark_property_hidden(
        &self,
        element: &Element,
        property: &Property,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Record that a property is no longer hidden under `visibility`.
    fn mark_property_visible(
        &self,
        element: &Element,
        property: &Property,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Reindex an element after an update.
    fn update_element(&self, element: &Element, authorizations: &Authorizations) -> Result<()>;

    /// Make pending index writes visible.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Index that accepts and discards every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSearchIndex;

impl SearchIndex for NopSearchIndex {
    fn add_element(&self, _element: &Element, _authorizations: &Authorizations) -> Result<()> {
        Ok(())
    }

    fn add_element_extended_data(
        &self,
        _row_id: &ExtendedDataRowId,
        _columns: &[(String, Visibility)],
        _authorizations: &Authorizations,
    ) -> Result<()> {
        Ok(())
    }

    fn delete_element(&self, _element_type: ElementType, _element_id: &str) -> Result<()> {
        Ok(())
    }

    fn delete_property(
        &self,
        _element_type: ElementType,
        _element_id: &str,
        _key: &str,
        _name: &str,
        _visibility: &Visibility,
    ) -> Result<()> {
        Ok(())
    }

    fn delete_extended_data(&self, _row_id: &ExtendedDataRowId) -> Result<()> {
        Ok(())
    }

    fn mark_element_hidden(&self, _element: &Element, _visibility: &Visibility) -> Result<()> {
        Ok(())
    }

    fn mark_element_visible(&self, _element: &Element, _visibility: &Visibility) -> Result<()> {
        Ok(())
    }

    fn mark_property_hidden(
        &self,
        _element: &Element,
        _property: &Property,
        _visibility: &Visibility,
    ) -> Result<()> {
        Ok(())
    }

    fn mark_property_visible(
        &self,
        _element: &Element,
        _property: &Property,
        _visibility: &Visibility,
    ) -> Result<()> {
        Ok(())
    }

    fn update_element(&self, _element: &Element, _authorizations: &Authorizations) -> Result<()> {
        Ok(())
    }
}
