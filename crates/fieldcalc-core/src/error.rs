//! Error types for fieldcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldcalc-core
#[derive(Debug, Error)]
pub enum Error {
    /// Two fields share the same display name
    #[error("Duplicate display name: {0}")]
    DuplicateDisplayName(String),

    /// Two fields share the same source name
    #[error("Duplicate source name: {0}")]
    DuplicateSourceName(String),

    /// A field name is empty or contains characters that cannot form an identifier
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Unknown field type label
    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
}
