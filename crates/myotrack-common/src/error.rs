//! Error types for Myotrack

use thiserror::Error;

/// Result type alias for Myotrack operations
pub type Result<T> = std::result::Result<T, MyotrackError>;

/// Main error type for the shared domain layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MyotrackError {
    #[error("Cannot summarize an empty series")]
    EmptySeries,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}
