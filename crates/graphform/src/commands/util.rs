//! Shared helpers for command handlers.

use std::path::{Path, PathBuf};

use serde_json::Value;

use graphform_core::{ConfigStore, Document, Record, StorePath};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// An opened document: the settled store, where it came from, and the
/// bytes as read (before reconciliation).
pub struct Opened {
    pub store: ConfigStore,
    pub path: PathBuf,
    pub original: Document,
}

/// Load the document named by flags/config and open a store over it.
pub fn open(global: &GlobalOpts) -> Result<Opened, CliError> {
    let resolved = config::resolve(global)?;
    let path = resolved.document;
    if !path.exists() {
        return Err(CliError::NoDocument {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(&path)?;
    let original = Document::from_json_str(&text)?;
    let store = ConfigStore::from_document(resolved.store, original.clone());
    tracing::info!(path = %path.display(), "document opened");
    Ok(Opened {
        store,
        path,
        original,
    })
}

/// Write the store's document back as pretty JSON.
pub fn write(path: &Path, store: &ConfigStore) -> Result<(), CliError> {
    let mut text = store.document().to_json_pretty()?;
    text.push('\n');
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), revision = store.revision(), "document written");
    Ok(())
}

pub fn parse_path(text: &str) -> Result<StorePath, CliError> {
    Ok(text.parse()?)
}

/// A JSON value from the command line. Text that is not valid JSON is
/// taken as a string so `set vpcs edge region eu-de` needs no quoting.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

/// A JSON object from the command line.
pub fn parse_record(text: &str) -> Result<Record, CliError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(record) => Ok(record),
        other => Err(CliError::Validation {
            field: "json".into(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_words_become_strings() {
        assert_eq!(parse_value("eu-de"), json!("eu-de"));
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value("[\"a\"]"), json!(["a"]));
        assert_eq!(parse_value("true"), json!(true));
    }

    #[test]
    fn records_must_be_objects() {
        assert!(parse_record("{\"name\":\"edge\"}").is_ok());
        let err = parse_record("[1]").unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
