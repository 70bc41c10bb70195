//! Error types for the survey result engine.
//!
//! This module defines one error enum per concern:
//!
//! - [`TimeError`] - local-to-UTC timestamp conversion
//! - [`ColumnError`] - column catalog and column-list resolution
//! - [`LoadError`] - reading response rows from JSON or CSV input
//! - [`RenderError`] - serializing an output document
//! - [`EngineError`] - top-level errors returned by the composer
//!
//! Conversion into [`EngineError`] is automatic via `From` implementations,
//! so `?` works across the boundaries.

use thiserror::Error;

// =============================================================================
// Time Errors
// =============================================================================

/// Errors raised while normalizing timestamps to UTC.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The zone id is not a recognized IANA identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// The local timestamp does not match `YYYY-MM-DD HH:MM:SS`.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

// =============================================================================
// Column Errors
// =============================================================================

/// Errors raised while building the catalog or resolving requested columns.
///
/// These are caller contract violations: user-facing validation of column
/// lists happens before the engine runs.
#[derive(Debug, Error)]
pub enum ColumnError {
    /// Token is neither a catalog URN, a prompt id nor a wildcard.
    #[error("Unknown output column: {0}")]
    UnknownToken(String),

    /// Token is a valid URN that the configured catalog does not allow.
    #[error("Output column not allowed: {0}")]
    NotAllowed(String),

    /// The allowed-column catalog is empty.
    #[error("Allowed-column catalog is empty")]
    EmptyCatalog,

    /// Nothing left to pivot after wildcard expansion.
    #[error("Resolved column list is empty")]
    EmptyColumnList,
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading response rows from a file or byte buffer.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON input.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Input bytes could not be decoded.
    #[error("Failed to decode input: {0}")]
    Encoding(String),

    /// A single row could not be converted.
    #[error("Row {line}: {message}")]
    Row { line: usize, message: String },
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors while serializing an output document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Engine Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transform::pipeline::ResultComposer`].
///
/// The engine never emits a partial document: any of these means no body was
/// produced.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Timestamp normalization error.
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// Column resolution error.
    #[error("Column error: {0}")]
    Column(#[from] ColumnError),

    /// Serialization error.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Input loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Strict mode found a group key that reappears after its group closed.
    #[error("Input rows are not grouped contiguously (row {index})")]
    UnsortedInput { index: usize },
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Render(RenderError::Json(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for time operations.
pub type TimeResult<T> = Result<T, TimeError>;

/// Result type for column operations.
pub type ColumnResult<T> = Result<T, ColumnError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // TimeError -> EngineError
        let time_err = TimeError::UnknownTimezone("Mars/Olympus".into());
        let engine_err: EngineError = time_err.into();
        assert!(engine_err.to_string().contains("Mars/Olympus"));

        // ColumnError -> EngineError
        let column_err = ColumnError::UnknownToken("urn:bogus".into());
        let engine_err: EngineError = column_err.into();
        assert!(engine_err.to_string().contains("urn:bogus"));
    }

    #[test]
    fn test_invalid_timestamp_format() {
        let err = TimeError::InvalidTimestamp {
            value: "yesterday".into(),
            reason: "input contains invalid characters".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("yesterday"));
        assert!(msg.contains("invalid characters"));
    }

    #[test]
    fn test_unsorted_input_mentions_row() {
        let err = EngineError::UnsortedInput { index: 7 };
        assert!(err.to_string().contains("row 7"));
    }
}
