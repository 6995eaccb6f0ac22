//! Error types for the somkit network and training toolkit.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for somkit operations.
#[derive(Error, Debug)]
pub enum SomkitError {
    /// A required argument was absent or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A position or parameter index outside its declared range.
    #[error("Index {index} out of range [{min}, {max}]")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Smallest accepted index.
        min: usize,
        /// Largest accepted index.
        max: usize,
    },

    /// A vector does not fit the slot it is assigned to.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The dimension the target declares.
        expected: usize,
        /// The dimension that was supplied.
        found: usize,
    },

    /// A handle that does not resolve to a live node.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A structural contract was violated (non-empty container, cascade refused, ...).
    #[error("Structure error: {0}")]
    Structure(String),

    /// No function class matches the requested name.
    #[error("Unknown function class: {0}")]
    UnknownFunction(String),

    /// Malformed configuration or data file.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the offending file.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Training error.
    #[error("Training error: {0}")]
    Training(String),

    /// Statistics are missing or out of date.
    #[error("Statistics error: {0}")]
    Stats(String),

    /// Requested behaviour exists only as a stub.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SomkitError {
    /// Builds a parse error for the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        SomkitError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for somkit operations.
pub type Result<T> = std::result::Result<T, SomkitError>;

impl From<serde_json::Error> for SomkitError {
    fn from(err: serde_json::Error) -> Self {
        SomkitError::Serialization(err.to_string())
    }
}

/// Checks that `position` lies in `1..=max`, the valid range for an insertion
/// or lookup in a 1-indexed list.
pub(crate) fn check_position(position: usize, max: usize) -> Result<()> {
    if position == 0 || position > max {
        return Err(SomkitError::IndexOutOfRange {
            index: position,
            min: 1,
            max,
        });
    }
    Ok(())
}
