// ── Entity definition contract ──
//
// One definition per top-level collection. The default methods are driven
// entirely by the definition's `EntitySpec`; definitions override only
// where their collection needs something the spec cannot express (seeded
// `init` data, for instance).

use serde_json::Value;
use tracing::debug;

use super::spec::{EntitySpec, Shape, Uniqueness};
use crate::error::CoreError;
use crate::model::record::key_of;
use crate::model::{
    CreateContext, DeleteContext, Document, FormContext, Record, RecordExt, SaveContext,
    StorePath, ValidationContext,
};
use crate::reconcile;
use crate::schema::{self, FieldIssue};
use crate::store::StoreConfig;

/// Lifecycle contract for one top-level collection.
pub trait EntityDefinition: Send + Sync {
    /// Static description driving every default method.
    fn spec(&self) -> &'static EntitySpec;

    fn collection(&self) -> &'static str {
        self.spec().name
    }

    /// Reset the collection to its documented default: `[]` for lists, a
    /// record of field defaults for singletons.
    fn init(&self, doc: &mut Document, _config: &StoreConfig) {
        seed_default(doc, self.spec());
    }

    /// Repair this collection in place. Returns the number of records changed.
    fn on_store_update(&self, doc: &mut Document) -> usize {
        reconcile::reconcile_collection(doc, self.spec())
    }

    fn create(
        &self,
        doc: &mut Document,
        path: &StorePath,
        data: Record,
        ctx: &CreateContext,
    ) -> Result<(), CoreError> {
        create_record(doc, self.spec(), path, data, ctx)
    }

    fn save(
        &self,
        doc: &mut Document,
        path: &StorePath,
        data: Record,
        ctx: &SaveContext,
    ) -> Result<(), CoreError> {
        save_record(doc, self.spec(), path, data, ctx)
    }

    fn delete(
        &self,
        doc: &mut Document,
        path: &StorePath,
        ctx: &DeleteContext,
    ) -> Result<Record, CoreError> {
        delete_record(doc, self.spec(), path, ctx)
    }

    /// Every failing field of `data`, plus a duplicate-name issue.
    fn invalid_fields(
        &self,
        doc: &Document,
        path: &StorePath,
        data: &Record,
        ctx: &ValidationContext,
    ) -> Result<Vec<FieldIssue>, CoreError> {
        record_issues(doc, self.spec(), path, data, ctx)
    }

    fn should_disable_save(
        &self,
        doc: &Document,
        path: &StorePath,
        data: &Record,
        ctx: &ValidationContext,
    ) -> Result<bool, CoreError> {
        Ok(!self.invalid_fields(doc, path, data, ctx)?.is_empty())
    }
}

// ── Spec-driven operations ───────────────────────────────────────────

pub fn seed_default(doc: &mut Document, spec: &EntitySpec) {
    let value = match spec.shape {
        Shape::List => Value::Array(Vec::new()),
        Shape::Singleton => Value::Object(schema::defaults(spec.fields)),
    };
    doc.set(spec.name, value);
}

pub fn create_record(
    doc: &mut Document,
    root: &'static EntitySpec,
    path: &StorePath,
    data: Record,
    ctx: &CreateContext,
) -> Result<(), CoreError> {
    if root.shape == Shape::Singleton {
        return Err(unsupported("create", path));
    }
    let spec = root.resolve(path)?;
    let record = schema::overlay(spec.fields, data);
    let key = usable_key(&record, spec, path)?;
    if name_taken(doc, spec, path, key, None)? {
        return Err(conflict(path, key));
    }
    debug!(%path, key, "create");
    doc.insert_keyed(path, spec.key, record, ctx.position)
}

pub fn save_record(
    doc: &mut Document,
    root: &'static EntitySpec,
    path: &StorePath,
    data: Record,
    ctx: &SaveContext,
) -> Result<(), CoreError> {
    if root.shape == Shape::Singleton {
        if !path.is_top_level() {
            return Err(CoreError::InvalidPath {
                path: path.to_string(),
                reason: format!("{} is a singleton", root.name),
            });
        }
        let record = doc
            .singleton_mut(root.name)
            .ok_or_else(|| CoreError::path_not_found(path, root.name))?;
        debug!(%path, fields = data.len(), "save singleton");
        for (field, value) in data {
            record.insert(field, value);
        }
        return Ok(());
    }

    let spec = root.resolve(path)?;
    if data.contains_key(spec.key) {
        let key = usable_key(&data, spec, path)?;
        if name_taken(doc, spec, path, key, Some(&ctx.original_name))? {
            return Err(conflict(path, key));
        }
    }
    debug!(%path, original = %ctx.original_name, "save");
    doc.update_keyed(path, spec.key, &ctx.original_name, data)
}

pub fn delete_record(
    doc: &mut Document,
    root: &'static EntitySpec,
    path: &StorePath,
    ctx: &DeleteContext,
) -> Result<Record, CoreError> {
    if root.shape == Shape::Singleton {
        return Err(unsupported("delete", path));
    }
    let spec = root.resolve(path)?;
    debug!(%path, key = %ctx.name, "delete");
    doc.carve_keyed(path, spec.key, &ctx.name)
}

pub fn record_issues(
    doc: &Document,
    root: &'static EntitySpec,
    path: &StorePath,
    data: &Record,
    ctx: &ValidationContext,
) -> Result<Vec<FieldIssue>, CoreError> {
    let spec = root.resolve(path)?;
    let record = schema::overlay(spec.fields, data.clone());
    let parent = doc.parent_of(path)?;
    let form = FormContext::new(doc, path)
        .editing(ctx.original_name.as_deref())
        .with_parent(parent);

    let mut issues = schema::invalid_fields(spec.fields, &record, &form);
    if spec.shape == Shape::List {
        match record.str_field(spec.key).filter(|key| !key.trim().is_empty()) {
            Some(key) => {
                if name_taken(doc, spec, path, key, ctx.original_name.as_deref())? {
                    issues.push(FieldIssue {
                        field: spec.key.to_owned(),
                        text: format!("Name \"{key}\" already in use"),
                    });
                }
            }
            None if !issues.iter().any(|issue| issue.field == spec.key) => {
                issues.push(FieldIssue {
                    field: spec.key.to_owned(),
                    text: format!("{} is required", schema::label(spec.key)),
                });
            }
            None => {}
        }
    }
    Ok(issues)
}

/// `true` when another record in scope already uses `key`.
///
/// `original` is the key the record had when its edit session opened; a
/// record never collides with itself.
pub fn name_taken(
    doc: &Document,
    spec: &EntitySpec,
    path: &StorePath,
    key: &str,
    original: Option<&str>,
) -> Result<bool, CoreError> {
    if original == Some(key) {
        return Ok(false);
    }
    let lists = match spec.unique {
        Uniqueness::Global => doc.lists_like(path),
        Uniqueness::WithinParent => vec![doc.list(path)?],
    };
    Ok(lists
        .into_iter()
        .flatten()
        .any(|item| key_of(item, spec.key) == Some(key)))
}

/// The record's key when it is a non-blank string.
fn usable_key<'r>(
    record: &'r Record,
    spec: &EntitySpec,
    path: &StorePath,
) -> Result<&'r str, CoreError> {
    record
        .str_field(spec.key)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| CoreError::MissingKey {
            path: path.to_string(),
            field: spec.key.to_owned(),
        })
}

fn unsupported(operation: &str, path: &StorePath) -> CoreError {
    CoreError::Unsupported {
        operation: operation.to_owned(),
        collection: path.root().to_owned(),
    }
}

fn conflict(path: &StorePath, key: &str) -> CoreError {
    CoreError::NameConflict {
        path: path.to_string(),
        name: key.to_owned(),
    }
}
