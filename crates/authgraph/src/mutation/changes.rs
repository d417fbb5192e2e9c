//! Accumulated change lists shared by every mutation builder.

use crate::error::{GraphError, Result};
use crate::model::{Metadata, PropertyValue};
use crate::security::Visibility;
use crate::storage::rows::check_segment;

/// Whether a saved mutation is sent to the search index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexHint {
    /// Index the change (default)
    #[default]
    Index,
    /// Skip the search index
    DoNotIndex,
}

/// A property value to add or overwrite.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAdd {
    /// Property key
    pub key: String,
    /// Property name
    pub name: String,
    /// New value
    pub value: PropertyValue,
    /// Property visibility
    pub visibility: Visibility,
    /// Explicit write time; the graph clock is used when absent
    pub timestamp: Option<i64>,
    /// Metadata written with the value
    pub metadata: Metadata,
}

/// A property to remove permanently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDelete {
    /// Property key
    pub key: String,
    /// Property name
    pub name: String,
    /// Visibility; every visibility when absent
    pub visibility: Option<Visibility>,
}

/// A property to tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySoftDelete {
    /// Property key
    pub key: String,
    /// Property name
    pub name: String,
    /// Visibility; every visibility when absent
    pub visibility: Option<Visibility>,
    /// Tombstone time; the graph clock is used when absent
    pub timestamp: Option<i64>,
}

/// A metadata entry to set on an existing property.
#[derive(Debug, Clone, PartialEq)]
pub struct SetPropertyMetadata {
    /// Property key
    pub property_key: String,
    /// Property name
    pub property_name: String,
    /// Property visibility
    pub property_visibility: Visibility,
    /// Metadata key
    pub metadata_key: String,
    /// Metadata value
    pub value: PropertyValue,
    /// Metadata visibility
    pub metadata_visibility: Visibility,
}

/// A property whose visibility changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterPropertyVisibility {
    /// Property key
    pub key: String,
    /// Property name
    pub name: String,
    /// Current visibility; the first matching property when absent
    pub existing_visibility: Option<Visibility>,
    /// New visibility
    pub visibility: Visibility,
}

/// An extended data cell to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedDataAdd {
    /// Table name
    pub table_name: String,
    /// Row id
    pub row_id: String,
    /// Column name
    pub column: String,
    /// Cell key (distinguishes several values of one column)
    pub key: String,
    /// Cell value
    pub value: PropertyValue,
    /// Cell visibility
    pub visibility: Visibility,
    /// Explicit write time; the graph clock is used when absent
    pub timestamp: Option<i64>,
}

/// An extended data cell to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedDataDelete {
    /// Table name
    pub table_name: String,
    /// Row id
    pub row_id: String,
    /// Column name
    pub column: String,
    /// Cell key
    pub key: String,
    /// Cell visibility
    pub visibility: Visibility,
}

/// Change lists accumulated by a builder before one save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyChanges {
    pub(crate) properties: Vec<PropertyAdd>,
    pub(crate) property_deletes: Vec<PropertyDelete>,
    pub(crate) property_soft_deletes: Vec<PropertySoftDelete>,
    pub(crate) set_property_metadata: Vec<SetPropertyMetadata>,
    pub(crate) alter_property_visibilities: Vec<AlterPropertyVisibility>,
    pub(crate) extended_data: Vec<ExtendedDataAdd>,
    pub(crate) extended_data_deletes: Vec<ExtendedDataDelete>,
    pub(crate) index_hint: IndexHint,
}

impl PropertyChanges {
    /// Whether any list is non-empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.property_deletes.is_empty()
            && self.property_soft_deletes.is_empty()
            && self.set_property_metadata.is_empty()
            && self.alter_property_visibilities.is_empty()
            && self.extended_data.is_empty()
            && self.extended_data_deletes.is_empty()
    }

    /// Queue a property value with metadata and an optional explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when the name is empty or the value
    /// is [`PropertyValue::Null`].
    pub fn add_property_value(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        value: PropertyValue,
        metadata: Metadata,
        timestamp: Option<i64>,
        visibility: Visibility,
    ) -> Result<()> {
        let key = key.into();
        let name = name.into();
        validate_property(&key, &name)?;
        if value.is_null() {
            return Err(GraphError::invalid(format!(
                "Property '{name}' cannot be set to null; delete it instead"
            )));
        }
        self.properties.push(PropertyAdd {
            key,
            name,
            value,
            visibility,
            timestamp,
            metadata,
        });
        Ok(())
    }

    /// Queue a permanent property delete.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when the name is empty.
    pub fn delete_property(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Option<Visibility>,
    ) -> Result<()> {
        let key = key.into();
        let name = name.into();
        validate_property(&key, &name)?;
        self.property_deletes.push(PropertyDelete {
            key,
            name,
            visibility,
        });
        Ok(())
    }

    /// Queue a property soft delete.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when the name is empty.
    pub fn soft_delete_property(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Option<Visibility>,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let key = key.into();
        let name = name.into();
        validate_property(&key, &name)?;
        self.property_soft_deletes.push(PropertySoftDelete {
            key,
            name,
            visibility,
            timestamp,
        });
        Ok(())
    }

    /// Queue a metadata entry for an existing property.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when a name or key is empty or the
    /// value is null.
    pub fn set_property_metadata(&mut self, change: SetPropertyMetadata) -> Result<()> {
        validate_property(&change.property_key, &change.property_name)?;
        if change.metadata_key.is_empty() {
            return Err(GraphError::invalid("Metadata key cannot be empty"));
        }
        check_segment("metadata key", &change.metadata_key)?;
        if change.value.is_null() {
            return Err(GraphError::invalid(format!(
                "Metadata '{}' cannot be set to null",
                change.metadata_key
            )));
        }
        self.set_property_metadata.push(change);
        Ok(())
    }

    /// Queue a property visibility change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when the name is empty.
    pub fn alter_property_visibility(&mut self, change: AlterPropertyVisibility) -> Result<()> {
        validate_property(&change.key, &change.name)?;
        self.alter_property_visibilities.push(change);
        Ok(())
    }

    /// Queue an extended data cell.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when an identifier is empty or
    /// malformed, or the value is null.
    pub fn add_extended_data(&mut self, change: ExtendedDataAdd) -> Result<()> {
        validate_extended(&change.table_name, &change.row_id, &change.column, &change.key)?;
        if change.value.is_null() {
            return Err(GraphError::invalid(format!(
                "Extended data column '{}' cannot be set to null",
                change.column
            )));
        }
        self.extended_data.push(change);
        Ok(())
    }

    /// Queue an extended data delete.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when an identifier is empty or
    /// malformed.
    pub fn delete_extended_data(&mut self, change: ExtendedDataDelete) -> Result<()> {
        validate_extended(&change.table_name, &change.row_id, &change.column, &change.key)?;
        self.extended_data_deletes.push(change);
        Ok(())
    }

    /// Current index hint.
    pub fn index_hint(&self) -> IndexHint {
        self.index_hint
    }

    /// Queued property values.
    pub fn properties(&self) -> &[PropertyAdd] {
        &self.properties
    }

    /// Queued permanent deletes.
    pub fn property_deletes(&self) -> &[PropertyDelete] {
        &self.property_deletes
    }

    /// Queued soft deletes.
    pub fn property_soft_deletes(&self) -> &[PropertySoftDelete] {
        &self.property_soft_deletes
    }

    /// Queued extended data cells.
    pub fn extended_data(&self) -> &[ExtendedDataAdd] {
        &self.extended_data
    }
}

fn validate_property(key: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GraphError::invalid("Property name cannot be empty"));
    }
    check_segment("property name", name)?;
    check_segment("property key", key)
}

fn validate_extended(table: &str, row: &str, column: &str, key: &str) -> Result<()> {
    for (what, value) in [("table name", table), ("row id", row), ("column", column)] {
        if value.is_empty() {
            return Err(GraphError::invalid(format!("Extended data {what} cannot be empty")));
        }
        check_segment(what, value)?;
    }
    check_segment("extended data key", key)
}
