//! Historical property values.

use super::metadata::Metadata;
use super::property::PropertyValue;
use crate::security::Visibility;
use std::cmp::Ordering;

/// Immutable snapshot of one stored version of a property.
///
/// Snapshots sort by descending timestamp; callers diff consecutive snapshots of the
/// same (key, name, visibility) to infer changes.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalPropertyValue {
    /// Property key
    pub key: String,
    /// Property name
    pub name: String,
    /// Property visibility
    pub visibility: Visibility,
    /// Time of this version
    pub timestamp: i64,
    /// Value at this version; `Null` for deletion markers
    pub value: PropertyValue,
    /// Metadata at this version
    pub metadata: Metadata,
    /// True when this snapshot records a soft delete
    pub is_deleted: bool,
}

impl HistoricalPropertyValue {
    /// Whether this snapshot belongs to the property (key, name, visibility).
    pub fn is_same_property(&self, other: &HistoricalPropertyValue) -> bool {
        self.key == other.key && self.name == other.name && self.visibility == other.visibility
    }
}

impl Eq for HistoricalPropertyValue {}

impl PartialOrd for HistoricalPropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HistoricalPropertyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.visibility.cmp(&other.visibility))
            .then_with(|| self.is_deleted.cmp(&other.is_deleted))
    }
}

/// Inclusive timestamp window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Earliest timestamp included
    pub start: i64,
    /// Latest timestamp included
    pub end: i64,
}

impl TimeRange {
    /// Every timestamp.
    pub fn all() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }

    /// Whether `timestamp` falls in the window.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
