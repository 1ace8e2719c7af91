// ── Core error types ──
//
// Structural errors only. User-data validity is never an error: it is
// reported through `should_disable_save` and `invalid_fields`, and
// reference decay is repaired silently by the reconciler.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Addressing errors ────────────────────────────────────────────
    #[error("Unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("Path {path} does not resolve: no '{segment}'")]
    PathNotFound { path: String, segment: String },

    #[error("Path {path} does not point at a list of records")]
    NotAList { path: String },

    #[error("Record '{key}' not found in {path}")]
    RecordNotFound { path: String, key: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{entity} has no field '{field}'")]
    UnknownField { entity: String, field: String },

    // ── Mutation guards ──────────────────────────────────────────────
    #[error("A record named '{name}' already exists in {path}")]
    NameConflict { path: String, name: String },

    #[error("Records in {path} need a non-blank '{field}'")]
    MissingKey { path: String, field: String },

    #[error("Operation not supported: {operation} on {collection}")]
    Unsupported {
        operation: String,
        collection: String,
    },

    #[error("Record index {index} out of range for {path} (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    // ── Document errors ──────────────────────────────────────────────
    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn path_not_found(path: impl ToString, segment: impl Into<String>) -> Self {
        Self::PathNotFound {
            path: path.to_string(),
            segment: segment.into(),
        }
    }

    pub(crate) fn record_not_found(path: impl ToString, key: impl Into<String>) -> Self {
        Self::RecordNotFound {
            path: path.to_string(),
            key: key.into(),
        }
    }

    /// `true` for errors that indicate the caller addressed something that
    /// does not exist, as opposed to a refused mutation.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnknownCollection { .. }
                | Self::PathNotFound { .. }
                | Self::NotAList { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidPath { .. }
                | Self::UnknownField { .. }
                | Self::IndexOutOfRange { .. }
        )
    }
}
