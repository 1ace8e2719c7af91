//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use graphform_config::ConfigError;
use graphform_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const INVALID: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Document ─────────────────────────────────────────────────────
    #[error("No document at {path}")]
    #[diagnostic(
        code(graphform::no_document),
        help(
            "Create one with: graphform init\n\
             Or point at an existing file with --file (-f)."
        )
    )]
    NoDocument { path: String },

    #[error("A document already exists at {path}")]
    #[diagnostic(
        code(graphform::document_exists),
        help("Use --force to overwrite it.")
    )]
    DocumentExists { path: String },

    #[error("Could not read document: {message}")]
    #[diagnostic(
        code(graphform::invalid_document),
        help("The document must be a JSON object keyed by collection name.")
    )]
    InvalidDocument { message: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(graphform::not_found),
        help("Run: graphform {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{identifier}' already exists in {resource_type}")]
    #[diagnostic(
        code(graphform::conflict),
        help("Names are unique within their scope; pick another name.")
    )]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Operation '{operation}' is not supported on {collection}")]
    #[diagnostic(code(graphform::unsupported))]
    Unsupported {
        operation: String,
        collection: String,
    },

    #[error("{path}/{name} cannot be saved: {reasons}")]
    #[diagnostic(
        code(graphform::rejected),
        help("Fix the listed fields; nothing was written.")
    )]
    Rejected {
        path: String,
        name: String,
        reasons: String,
    },

    #[error("{count} record(s) cannot be saved")]
    #[diagnostic(
        code(graphform::invalid_records),
        help("Run: graphform check -o json for the full report")
    )]
    InvalidRecords { count: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(graphform::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(graphform::config),
        help("Inspect the resolved configuration with: graphform config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(graphform::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(graphform::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::NoDocument { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::Rejected { .. } | Self::InvalidRecords { .. } => {
                exit_code::INVALID
            }
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::DocumentExists { .. } => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownCollection { collection } => CliError::NotFound {
                resource_type: "collection".into(),
                identifier: collection,
                list_command: "collections".into(),
            },

            CoreError::RecordNotFound { path, key } => CliError::NotFound {
                list_command: format!("list {path}"),
                resource_type: path,
                identifier: key,
            },

            CoreError::PathNotFound { path, segment } => CliError::NotFound {
                list_command: format!("list {}", path.split('/').next().unwrap_or_default()),
                resource_type: path,
                identifier: segment,
            },

            CoreError::NotAList { path } => CliError::Validation {
                field: "path".into(),
                reason: format!("{path} does not hold a list of records"),
            },

            CoreError::InvalidPath { path, reason } => CliError::Validation {
                field: "path".into(),
                reason: format!("'{path}': {reason}"),
            },

            CoreError::UnknownField { entity, field } => CliError::Validation {
                reason: format!("{entity} has no such field"),
                field,
            },

            CoreError::NameConflict { path, name } => CliError::Conflict {
                resource_type: path,
                identifier: name,
            },

            CoreError::MissingKey { path, field } => CliError::Rejected {
                path,
                name: "-".into(),
                reasons: format!("{field}: a non-blank value is required"),
            },

            CoreError::Unsupported {
                operation,
                collection,
            } => CliError::Unsupported {
                operation,
                collection,
            },

            CoreError::IndexOutOfRange { path, index, len } => CliError::Validation {
                field: "index".into(),
                reason: format!("{index} is out of range for {path} ({len} records)"),
            },

            CoreError::InvalidDocument { message } => CliError::InvalidDocument { message },

            CoreError::Json(err) => CliError::InvalidDocument {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let missing: CliError = CoreError::UnknownCollection {
            collection: "routers".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let conflict: CliError = CoreError::NameConflict {
            path: "vpcs".into(),
            name: "edge".into(),
        }
        .into();
        assert_eq!(conflict.exit_code(), exit_code::INVALID);
        assert_eq!(conflict.to_string(), "'edge' already exists in vpcs");

        let singleton: CliError = CoreError::Unsupported {
            operation: "move".into(),
            collection: "_options".into(),
        }
        .into();
        assert_eq!(singleton.exit_code(), exit_code::UNSUPPORTED);

        let unnamed: CliError = CoreError::MissingKey {
            path: "vpcs".into(),
            field: "name".into(),
        }
        .into();
        assert_eq!(unnamed.exit_code(), exit_code::INVALID);
    }
}
