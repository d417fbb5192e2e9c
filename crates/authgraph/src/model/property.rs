//! Property values and versioned, visibility-scoped properties.

use super::fetch_hints::FetchHints;
use super::metadata::Metadata;
use super::streaming::StreamingPropertyValue;
use crate::security::{Authorizations, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Strongly-typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// List of strings
    StringList(Vec<String>),
    /// List of integers
    IntList(Vec<i64>),
    /// Raw bytes, externalized automatically when large
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch
    DateTime(i64),
    /// Explicit null/absence of value; rejected by mutations
    Null,
    /// Payload stored outside the element row
    #[serde(skip)]
    Streaming(StreamingPropertyValue),
}

impl PropertyValue {
    /// Data type tag of this value, `None` for [`PropertyValue::Null`].
    pub fn data_type(&self) -> Option<PropertyDataType> {
        Some(match self {
            PropertyValue::String(_) => PropertyDataType::String,
            PropertyValue::Int(_) => PropertyDataType::Int,
            PropertyValue::Float(_) => PropertyDataType::Float,
            PropertyValue::Bool(_) => PropertyDataType::Bool,
            PropertyValue::StringList(_) => PropertyDataType::StringList,
            PropertyValue::IntList(_) => PropertyDataType::IntList,
            PropertyValue::Bytes(_) => PropertyDataType::Bytes,
            PropertyValue::DateTime(_) => PropertyDataType::DateTime,
            PropertyValue::Streaming(_) => PropertyDataType::Streaming,
            PropertyValue::Null => return None,
        })
    }

    /// Returns true for [`PropertyValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// String payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean payload, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Streaming payload, if this value is externalized.
    pub fn as_streaming(&self) -> Option<&StreamingPropertyValue> {
        match self {
            PropertyValue::Streaming(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::StringList(list) => write!(f, "{}", list.join(",")),
            PropertyValue::IntList(list) => {
                let parts: Vec<String> = list.iter().map(i64::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
            PropertyValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            PropertyValue::DateTime(millis) => write!(f, "@{millis}"),
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Streaming(s) => write!(f, "<stream {} bytes>", s.len()),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::StringList(value)
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(value: Vec<i64>) -> Self {
        PropertyValue::IntList(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Bytes(value)
    }
}

impl From<StreamingPropertyValue> for PropertyValue {
    fn from(value: StreamingPropertyValue) -> Self {
        PropertyValue::Streaming(value)
    }
}

/// Type tag used by property definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyDataType {
    /// [`PropertyValue::String`]
    String,
    /// [`PropertyValue::Int`]
    Int,
    /// [`PropertyValue::Float`]
    Float,
    /// [`PropertyValue::Bool`]
    Bool,
    /// [`PropertyValue::StringList`]
    StringList,
    /// [`PropertyValue::IntList`]
    IntList,
    /// [`PropertyValue::Bytes`]
    Bytes,
    /// [`PropertyValue::DateTime`]
    DateTime,
    /// [`PropertyValue::Streaming`]
    Streaming,
}

impl PropertyDataType {
    /// Whether a value of type `actual` may be stored under this type.
    ///
    /// Large byte values are externalized on save, so `Bytes` and `Streaming` are
    /// interchangeable.
    pub fn accepts(self, actual: PropertyDataType) -> bool {
        self == actual
            || matches!(
                (self, actual),
                (PropertyDataType::Bytes, PropertyDataType::Streaming)
                    | (PropertyDataType::Streaming, PropertyDataType::Bytes)
                    | (PropertyDataType::String, PropertyDataType::Streaming)
            )
    }
}

impl fmt::Display for PropertyDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single property value on an element.
///
/// Identity is the triple (key, name, visibility): one name may carry several values
/// distinguished by key and/or visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    key: String,
    name: String,
    visibility: Visibility,
    value: PropertyValue,
    timestamp: i64,
    metadata: Metadata,
    hidden_visibilities: BTreeSet<Visibility>,
    fetch_hints: Arc<FetchHints>,
}

impl Property {
    /// Create a property loaded under `fetch_hints`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        value: PropertyValue,
        timestamp: i64,
        metadata: Metadata,
        hidden_visibilities: BTreeSet<Visibility>,
        fetch_hints: Arc<FetchHints>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            visibility,
            value,
            timestamp,
            metadata,
            hidden_visibilities,
            fetch_hints,
        }
    }

    /// Reserved (synthetic) property computed from element identity.
    pub(crate) fn reserved(name: &str, value: PropertyValue, timestamp: i64) -> Self {
        Self::new(
            "",
            name,
            Visibility::empty(),
            value,
            timestamp,
            Metadata::new(),
            BTreeSet::new(),
            Arc::new(FetchHints::all().clone()),
        )
    }

    /// Property key (distinguishes multiple values of one name).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property visibility.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Property value.
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Write timestamp of this value.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Metadata of this property.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::FetchHintsViolation`] if metadata was not fetched.
    pub fn metadata(&self) -> crate::Result<&Metadata> {
        if !self.fetch_hints.is_include_metadata() {
            return Err(crate::GraphError::fetch_hints(
                format!("property {}:{}", self.name, self.key),
                "metadata was not included in the fetch hints",
            ));
        }
        Ok(&self.metadata)
    }

    /// Visibilities under which this property is hidden.
    pub fn hidden_visibilities(&self) -> &BTreeSet<Visibility> {
        &self.hidden_visibilities
    }

    /// Whether this property is hidden from a caller holding `authorizations`.
    pub fn is_hidden(&self, authorizations: &Authorizations) -> bool {
        self.hidden_visibilities
            .iter()
            .any(|v| authorizations.can_read(v))
    }

    /// Whether this property has the identity (key, name, visibility).
    pub fn matches(&self, key: &str, name: &str, visibility: Option<&Visibility>) -> bool {
        self.key == key
            && self.name == name
            && visibility.map_or(true, |v| *v == self.visibility)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}[{}]={}",
            self.name, self.key, self.visibility, self.value
        )
    }
}
