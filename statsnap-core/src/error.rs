/*!
Error types for the statsnap core engine.
*/

use thiserror::Error;

/// Result type used throughout the statsnap core.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while reading, writing or persisting statistics.
///
/// Only [`StatsError::TruncatedArchive`] and [`StatsError::OversizedField`] ever
/// escape an archive decode. Unknown identifiers and unknown chunk kinds are
/// recovered inside the codec and never surface here.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A declared length runs past the end of the available bytes
    #[error("Truncated archive: expected {expected} bytes, {actual} remaining")]
    TruncatedArchive { expected: usize, actual: usize },

    /// A bounded field declares a size above its safety ceiling
    #[error("Oversized field '{field}': {size} exceeds limit of {limit}")]
    OversizedField {
        field: &'static str,
        size: usize,
        limit: usize,
    },

    /// An identifier argument was missing or blank
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Integrity check failures
    #[error("Integrity check failed: expected hash {expected}, got {actual}")]
    IntegrityCheckFailed { expected: String, actual: String },

    /// Invalid snapshot envelope
    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    /// Snapshot written by an unsupported format generation
    #[error("Unsupported snapshot format version: {found} (supported: {min}..={max})")]
    UnsupportedVersion { found: u16, min: u16, max: u16 },

    /// Storage adapter errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StatsError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Whether this error aborts an archive decode
    pub fn is_fatal_decode_error(&self) -> bool {
        matches!(
            self,
            Self::TruncatedArchive { .. } | Self::OversizedField { .. }
        )
    }
}
