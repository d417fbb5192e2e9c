//! The single error type returned by every graph, metadata and storage call.
//!
//! Validation failures (fetch hints, schema, not-found) are programming or caller
//! errors and are never retried internally.

use thiserror::Error;

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Everything that can go wrong reading or writing the graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The backing store failed or refused an operation.
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored cell or metadata value could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An element targeted by an operation does not exist (or is not visible).
    #[error("Could not find {kind} {id} to {operation}")]
    NotFound {
        /// Element kind ("vertex", "edge", "extended data row", ...)
        kind: String,
        /// Identifier that was looked up
        id: String,
        /// Operation that needed the element
        operation: String,
    },

    /// Data was accessed that the element's fetch hints did not load.
    #[error("Fetch hints violation on {element_id}: {message}")]
    FetchHintsViolation {
        /// Element whose hints were violated
        element_id: String,
        /// What was requested and which hint is missing
        message: String,
    },

    /// A fetch hints combination that can never be satisfied.
    #[error("Invalid fetch hints: {message}")]
    InvalidFetchHints {
        /// Why the combination was rejected
        message: String,
    },

    /// A property was written without a matching definition under strict typing,
    /// or with a value of the wrong type.
    #[error("Schema violation for property '{property_name}': {message}")]
    SchemaViolation {
        /// Offending property name
        property_name: String,
        /// Details
        message: String,
    },

    /// A metadata lookup by key alone matched entries under several visibilities.
    #[error("Ambiguous metadata key '{key}': found {count} entries with different visibilities")]
    AmbiguousMetadata {
        /// Metadata key
        key: String,
        /// Number of matching entries
        count: usize,
    },

    /// A visibility expression failed to parse.
    #[error("Invalid visibility '{expression}': {message}")]
    InvalidVisibility {
        /// Raw expression
        expression: String,
        /// Parser message
        message: String,
    },

    /// A caller request that can never succeed, such as an id containing the row separator.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Failure talking to the coordination service.
    #[error("Coordination error: {message}")]
    Coordination {
        /// Error details
        message: String,
    },
}

impl GraphError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a not-found error for `operation` on the element `id`.
    pub fn not_found(
        kind: impl Into<String>,
        id: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
            operation: operation.into(),
        }
    }

    /// Create a fetch hints violation error.
    pub fn fetch_hints(element_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchHintsViolation {
            element_id: element_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid operation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for the not-found variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for the fetch hints violation variant.
    pub fn is_fetch_hints_violation(&self) -> bool {
        matches!(self, Self::FetchHintsViolation { .. })
    }
}
