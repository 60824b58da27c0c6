//! Error types for the bulk transfer engine.
//!
//! Row-level validation problems are never errors: they are reported as data
//! inside a [`crate::models::BatchResult`]. The types below cover the cases
//! where an import or export cannot even be attempted.
//!
//! - [`BulkError`] - Structural engine failures (unknown entity, undecodable input)
//! - [`StoreError`] - Storage collaborator errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`ServerError`] - Top-level HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Engine Errors
// =============================================================================

/// Structural failures of the bulk transfer engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BulkError {
    /// Entity kind not recognized.
    #[error("Unsupported entity: {0}")]
    UnsupportedEntity(String),

    /// Input could not be read as text.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Delimited text could not be written.
    #[error("Failed to write CSV: {0}")]
    Write(String),
}

impl From<csv::Error> for BulkError {
    fn from(err: csv::Error) -> Self {
        BulkError::Write(err.to_string())
    }
}

impl From<std::io::Error> for BulkError {
    fn from(err: std::io::Error) -> Self {
        BulkError::MalformedInput(err.to_string())
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,

    /// Backend-specific failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading settings from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Engine error.
    #[error("Bulk error: {0}")]
    Bulk(#[from] BulkError),

    /// Storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Socket or IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for engine operations.
pub type BulkResult<T> = Result<T, BulkError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // BulkError -> ServerError
        let bulk_err = BulkError::UnsupportedEntity("patients".into());
        let server_err: ServerError = bulk_err.into();
        assert!(server_err.to_string().contains("patients"));

        // StoreError -> ServerError
        let server_err: ServerError = StoreError::Poisoned.into();
        assert!(server_err.to_string().contains("poisoned"));
    }

    #[test]
    fn test_config_error_format() {
        let err = ConfigError::InvalidValue {
            key: "PHARMPLUS_PORT".into(),
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PHARMPLUS_PORT"));
        assert!(msg.contains("abc"));
    }
}
