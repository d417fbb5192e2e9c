//! Property definitions and the typing checks applied on every property write.

use super::Graph;
use crate::error::{GraphError, Result};
use crate::model::{is_reserved_property_name, PropertyDefinition, PropertyValue};
use crate::mutation::PropertyChanges;
use log::warn;

impl Graph {
    /// Register or replace a property definition.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for reserved names and
    /// [`GraphError::Storage`] if persisting fails.
    pub fn define_property(&self, definition: PropertyDefinition) -> Result<()> {
        if is_reserved_property_name(&definition.name) {
            return Err(GraphError::invalid(format!(
                "Property '{}' is reserved and has a built-in definition",
                definition.name
            )));
        }
        self.metadata.save_property_definition(&definition)
    }

    /// Definition for `name`: built-in for reserved names, otherwise registered.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if the stored definition is malformed.
    pub fn property_definition(&self, name: &str) -> Result<Option<PropertyDefinition>> {
        if let Some(built_in) = PropertyDefinition::built_in(name) {
            return Ok(Some(built_in));
        }
        self.metadata.property_definition(name)
    }

    /// Every registered definition.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if a stored definition is malformed.
    pub fn property_definitions(&self) -> Result<Vec<PropertyDefinition>> {
        self.metadata.property_definitions()
    }

    /// Check every property value of `changes` against the schema.
    pub(crate) fn check_property_types(&self, changes: &PropertyChanges) -> Result<()> {
        for add in changes.properties() {
            self.check_property_type(&add.name, &add.value)?;
        }
        Ok(())
    }

    fn check_property_type(&self, name: &str, value: &PropertyValue) -> Result<()> {
        if is_reserved_property_name(name) {
            return Err(GraphError::invalid(format!(
                "Property '{name}' is reserved and computed from the element"
            )));
        }
        let Some(actual) = value.data_type() else {
            return Ok(());
        };
        match self.metadata.property_definition(name)? {
            Some(definition) => {
                if self.config.strict_typing && !definition.data_type.accepts(actual) {
                    return Err(GraphError::SchemaViolation {
                        property_name: name.to_string(),
                        message: format!(
                            "expected a {} value, found {actual}",
                            definition.data_type
                        ),
                    });
                }
                Ok(())
            }
            None if self.config.strict_typing => Err(GraphError::SchemaViolation {
                property_name: name.to_string(),
                message: "no property definition is registered".to_string(),
            }),
            None => {
                warn!("Creating default property definition for '{name}' as {actual}");
                self.metadata
                    .save_property_definition(&PropertyDefinition::new(name, actual))
            }
        }
    }
}
