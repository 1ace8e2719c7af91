//! Record commands: read views and single-record mutations.
//!
//! Every mutation goes through the store, so the written document is
//! always reconciled.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use graphform_core::{
    CreateContext, DeleteContext, EntitySpec, FieldIssue, FieldKind, FormSession, Record,
    RecordExt, SaveContext, Shape, StorePath, ValidationContext, schema,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CollectionInfo {
    order: usize,
    collection: &'static str,
    shape: String,
    rename: String,
    records: Option<usize>,
}

#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Collection")]
    collection: &'static str,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "On rename")]
    rename: String,
    #[tabled(rename = "Records")]
    records: String,
}

impl From<&CollectionInfo> for CollectionRow {
    fn from(c: &CollectionInfo) -> Self {
        Self {
            order: c.order,
            collection: c.collection,
            shape: c.shape.clone(),
            rename: c.rename.clone(),
            records: c.records.map_or_else(|| "-".into(), |n| n.to_string()),
        }
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

// ── Read handlers ───────────────────────────────────────────────────

pub fn collections(global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let store = &opened.store;
    let infos: Vec<CollectionInfo> = store
        .registry()
        .iter()
        .enumerate()
        .map(|(order, definition)| {
            let spec = definition.spec();
            CollectionInfo {
                order,
                collection: spec.name,
                shape: spec.shape.to_string(),
                rename: spec.rename.to_string(),
                records: (spec.shape == Shape::List).then(|| store.records(spec.name).len()),
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &infos,
        |c| CollectionRow::from(c),
        |c| c.collection.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn list(path: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let store = &opened.store;
    let path = util::parse_path(path)?;
    let spec = store.spec_for(&path)?;
    if spec.shape == Shape::Singleton {
        return show_record(store.record(&path, spec.name)?, spec, global);
    }

    let records: Vec<&Record> = store
        .document()
        .list(&path)?
        .iter()
        .filter_map(Value::as_object)
        .collect();
    let out = output::render_list(
        &global.output,
        &records,
        |r| RecordRow {
            name: r.str_field(spec.key).unwrap_or("-").to_owned(),
            fields: summary(r, spec),
        },
        |r| r.str_field(spec.key).unwrap_or_default().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn show(path: &str, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let store = &opened.store;
    let path = util::parse_path(path)?;
    let spec = store.spec_for(&path)?;
    show_record(store.record(&path, name)?, spec, global)
}

fn show_record(record: &Record, spec: &EntitySpec, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        record,
        |r| detail(r, spec),
        |r| r.str_field(spec.key).unwrap_or(spec.name).to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Mutation handlers ───────────────────────────────────────────────

pub fn create(
    path: &str,
    json: &str,
    at: Option<usize>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut opened = util::open(global)?;
    let path = util::parse_path(path)?;
    let spec = refuse_singleton(opened.store.spec_for(&path)?, "create", &path)?;
    let record = util::parse_record(json)?;

    let ctx = ValidationContext::creating();
    if opened.store.should_disable_save(&path, &record, &ctx)? {
        let issues = opened.store.invalid_fields(&path, &record, &ctx)?;
        return Err(rejected(&path, record.str_field(spec.key).unwrap_or("-"), &issues));
    }
    let name = record.str_field(spec.key).unwrap_or_default().to_owned();
    opened
        .store
        .create(&path, record, &CreateContext { position: at })?;

    util::write(&opened.path, &opened.store)?;
    output::status(&format!("Created {path}/{name}"), global.quiet);
    Ok(())
}

pub fn delete(path: &str, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let mut opened = util::open(global)?;
    let path = util::parse_path(path)?;
    opened.store.delete(&path, &DeleteContext::new(name))?;

    util::write(&opened.path, &opened.store)?;
    output::status(&format!("Deleted {path}/{name}"), global.quiet);
    Ok(())
}

pub fn rename(path: &str, old: &str, new: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let mut opened = util::open(global)?;
    let path = util::parse_path(path)?;
    let spec = refuse_singleton(opened.store.spec_for(&path)?, "rename", &path)?;

    let mut renamed = opened.store.record(&path, old)?.clone();
    renamed.insert(spec.key.to_owned(), Value::String(new.to_owned()));
    let issues: Vec<FieldIssue> = opened
        .store
        .invalid_fields(&path, &renamed, &ValidationContext::editing(old))?
        .into_iter()
        .filter(|issue| issue.field == spec.key)
        .collect();
    if !issues.is_empty() {
        return Err(rejected(&path, old, &issues));
    }

    let mut data = Record::new();
    data.insert(spec.key.to_owned(), Value::String(new.to_owned()));
    opened.store.save(&path, data, &SaveContext::new(old))?;

    util::write(&opened.path, &opened.store)?;
    output::status(
        &format!("Renamed {path}/{old} to {new} (references: {})", spec.rename),
        global.quiet,
    );
    Ok(())
}

pub fn move_record(path: &str, from: usize, to: usize, global: &GlobalOpts) -> Result<(), CliError> {
    let mut opened = util::open(global)?;
    let path = util::parse_path(path)?;
    opened.store.move_record(&path, from, to)?;

    util::write(&opened.path, &opened.store)?;
    output::status(&format!("Moved {path}[{from}] to {to}"), global.quiet);
    Ok(())
}

pub fn set(
    path: &str,
    name: &str,
    field: &str,
    value: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut opened = util::open(global)?;
    let path = util::parse_path(path)?;

    let mut form = FormSession::edit(&opened.store, path.clone(), name)?;
    form.set(&opened.store, field, util::parse_value(value))?;
    if form.should_disable_save(&opened.store)? {
        let issues = form.invalid_fields(&opened.store)?;
        return Err(rejected(&path, name, &issues));
    }
    form.commit(&mut opened.store)?;

    util::write(&opened.path, &opened.store)?;
    output::status(&format!("Updated {path}/{name}: {field}"), global.quiet);
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn refuse_singleton(
    spec: &'static EntitySpec,
    operation: &str,
    path: &StorePath,
) -> Result<&'static EntitySpec, CliError> {
    if spec.shape == Shape::Singleton {
        return Err(CliError::Unsupported {
            operation: operation.to_owned(),
            collection: path.root().to_owned(),
        });
    }
    Ok(spec)
}

fn rejected(path: &StorePath, name: &str, issues: &[FieldIssue]) -> CliError {
    CliError::Rejected {
        path: path.to_string(),
        name: name.to_owned(),
        reasons: issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.text))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Non-blank scalar fields as `field=value`, child lists as counts.
fn summary(record: &Record, spec: &EntitySpec) -> String {
    spec.fields
        .iter()
        .filter(|field| field.name != spec.key && !record.is_blank(field.name))
        .map(|field| match field.kind {
            FieldKind::Records => format!("{}: {}", field.name, record.records(field.name).len()),
            _ => format!("{}={}", field.name, output::cell(record.get(field.name))),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Aligned `Label: value` lines in schema order, then any extra fields.
fn detail(record: &Record, spec: &EntitySpec) -> String {
    let labels: Vec<(String, &str)> = spec
        .fields
        .iter()
        .map(|field| (schema::label(field.name), field.name))
        .chain(
            record
                .keys()
                .filter(|key| spec.field(key).is_none())
                .map(|key| (schema::label(key), key.as_str())),
        )
        .collect();
    let width = labels.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;

    labels
        .iter()
        .map(|(label, field)| {
            let value = match spec.field(field) {
                Some(f) if f.kind == FieldKind::Records => {
                    let names: Vec<&str> = record
                        .records(field)
                        .iter()
                        .filter_map(|child| child.get("name").and_then(Value::as_str))
                        .collect();
                    if names.is_empty() {
                        format!("{} record(s)", record.records(field).len())
                    } else {
                        names.join(", ")
                    }
                }
                _ => output::cell(record.get(*field)),
            };
            format!("{:<width$} {value}", format!("{label}:"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
