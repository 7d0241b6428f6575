//! Error types for the graph generator

use std::fmt;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug)]
pub enum GraphError {
    /// IO operation failed
    Io(std::io::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Snapshot is not an array of service records
    MalformedSnapshot(String),

    /// A single service record could not be decoded
    InvalidRecord(String),

    /// Slug is not safe to use in a file name
    InvalidSlug(String),

    /// Another service in the same snapshot already uses this slug
    DuplicateSlug(String),

    /// Chart requested for a series with no points
    EmptySeries,

    /// Writing a rendered artifact failed
    Storage(String),

    /// Incident report is missing a required field
    InvalidIncident(String),
}

impl GraphError {
    /// Errors confined to a single service; the batch can skip it and move on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GraphError::InvalidRecord(_)
                | GraphError::InvalidSlug(_)
                | GraphError::DuplicateSlug(_)
                | GraphError::EmptySeries
        )
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Io(err) => write!(f, "IO error: {}", err),
            GraphError::Json(err) => write!(f, "JSON error: {}", err),
            GraphError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GraphError::MalformedSnapshot(msg) => write!(f, "Malformed snapshot: {}", msg),
            GraphError::InvalidRecord(msg) => write!(f, "Invalid service record: {}", msg),
            GraphError::InvalidSlug(slug) => write!(f, "Invalid slug: {:?}", slug),
            GraphError::DuplicateSlug(slug) => write!(f, "Duplicate slug: {}", slug),
            GraphError::EmptySeries => write!(f, "Cannot render an empty series"),
            GraphError::Storage(msg) => write!(f, "Storage error: {}", msg),
            GraphError::InvalidIncident(msg) => write!(f, "Invalid incident report: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Io(err) => Some(err),
            GraphError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::Io(err)
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Json(err)
    }
}
