//! Extended data: side tables of rows attached to an element.

use super::element::{
    id_property, ElementCore, ElementType, GraphElement,
    EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME, EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME,
    EXTENDED_DATA_ROW_ID_PROPERTY_NAME, EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME,
    ID_PROPERTY_NAME,
};
use super::property::{Property, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an extended data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtendedDataRowId {
    /// Type of the owning element
    pub element_type: ElementType,
    /// Id of the owning element
    pub element_id: String,
    /// Table name
    pub table_name: String,
    /// Row id within the table
    pub row_id: String,
}

impl ExtendedDataRowId {
    /// Create a row id.
    pub fn new(
        element_type: ElementType,
        element_id: impl Into<String>,
        table_name: impl Into<String>,
        row_id: impl Into<String>,
    ) -> Self {
        Self {
            element_type,
            element_id: element_id.into(),
            table_name: table_name.into(),
            row_id: row_id.into(),
        }
    }
}

impl fmt::Display for ExtendedDataRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.element_type, self.element_id, self.table_name, self.row_id
        )
    }
}

/// A row of properties logically attached to an element but stored and fetched
/// independently of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedDataRow {
    core: ElementCore,
    row_id: ExtendedDataRowId,
}

impl ExtendedDataRow {
    pub(crate) fn new(core: ElementCore, row_id: ExtendedDataRowId) -> Self {
        Self { core, row_id }
    }

    /// Row identity.
    pub fn row_id(&self) -> &ExtendedDataRowId {
        &self.row_id
    }

    /// Table this row belongs to.
    pub fn table_name(&self) -> &str {
        &self.row_id.table_name
    }
}

impl GraphElement for ExtendedDataRow {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn reserved_property(&self, name: &str) -> Option<Property> {
        let ts = self.core.timestamp;
        let value = match name {
            ID_PROPERTY_NAME => return Some(id_property(&self.core)),
            EXTENDED_DATA_TABLE_NAME_PROPERTY_NAME => self.row_id.table_name.clone(),
            EXTENDED_DATA_ROW_ID_PROPERTY_NAME => self.row_id.row_id.clone(),
            EXTENDED_DATA_ELEMENT_ID_PROPERTY_NAME => self.row_id.element_id.clone(),
            EXTENDED_DATA_ELEMENT_TYPE_PROPERTY_NAME => self.row_id.element_type.to_string(),
            _ => return None,
        };
        Some(Property::reserved(name, PropertyValue::String(value), ts))
    }
}

impl fmt::Display for ExtendedDataRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row[{}]", self.row_id)
    }
}
