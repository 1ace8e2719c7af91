//! Whole-document commands: init, check, reconcile, export.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use graphform_core::{CollectionRepair, ConfigStore, Document, Finding, RecordIssues, audit};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RepairRow {
    #[tabled(rename = "Collection")]
    collection: &'static str,
    #[tabled(rename = "Records changed")]
    changed: usize,
}

impl From<&CollectionRepair> for RepairRow {
    fn from(r: &CollectionRepair) -> Self {
        Self {
            collection: r.collection,
            changed: r.changed,
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    document: String,
    /// Integrity problems in the file as stored, before repair.
    findings: Vec<Finding>,
    /// Records whose save would be disabled after repair.
    invalid: Vec<RecordIssues>,
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn init(force: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    if resolved.document.exists() && !force {
        return Err(CliError::DocumentExists {
            path: resolved.document.display().to_string(),
        });
    }
    let store = ConfigStore::new(resolved.store);
    util::write(&resolved.document, &store)?;
    output::status(
        &format!("Wrote {}", resolved.document.display()),
        global.quiet,
    );
    Ok(())
}

pub fn check(global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let store = &opened.store;
    let report = CheckReport {
        document: opened.path.display().to_string(),
        findings: audit(&opened.original, &store.registry().specs()),
        invalid: store.invalid_records()?,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| check_detail(r, color),
        |r| {
            r.findings
                .iter()
                .map(ToString::to_string)
                .chain(r.invalid.iter().map(|i| format!("{}/{}", i.path, i.name)))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);

    if report.invalid.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidRecords {
            count: report.invalid.len(),
        })
    }
}

pub fn reconcile(dry_run: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let store = &opened.store;
    let repairs = diff(&opened.original, store);

    if !dry_run && !repairs.is_empty() {
        util::write(&opened.path, store)?;
    }

    let out = output::render_list(
        &global.output,
        &repairs,
        |r| RepairRow::from(r),
        |r| format!("{}\t{}", r.collection, r.changed),
    )?;
    let empty_table = repairs.is_empty()
        && matches!(global.output, OutputFormat::Table | OutputFormat::Plain);
    output::print_output(&out, global.quiet || empty_table);

    let message = match (repairs.is_empty(), dry_run) {
        (true, _) => "Document already consistent".to_owned(),
        (false, true) => format!("{} collection(s) would be repaired", repairs.len()),
        (false, false) => format!("{} collection(s) repaired", repairs.len()),
    };
    output::status(&message, global.quiet);
    Ok(())
}

pub fn export(global: &GlobalOpts) -> Result<(), CliError> {
    let opened = util::open(global)?;
    let snapshot = opened.store.snapshot();
    let pretty = snapshot.to_json_pretty()?;
    let out = output::render_single(
        &global.output,
        snapshot.as_map(),
        |_| pretty.clone(),
        |_| pretty.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Per-collection count of records the open-time reconciliation changed.
fn diff(original: &Document, store: &ConfigStore) -> Vec<CollectionRepair> {
    let settled = store.document();
    store
        .registry()
        .collections()
        .map(|collection| CollectionRepair {
            collection,
            changed: changed_records(original.get(collection), settled.get(collection)),
        })
        .filter(|repair| repair.changed > 0)
        .collect()
}

fn changed_records(before: Option<&Value>, after: Option<&Value>) -> usize {
    match (before, after) {
        (Some(Value::Array(before)), Some(Value::Array(after))) => {
            let len = before.len().max(after.len());
            (0..len).filter(|&i| before.get(i) != after.get(i)).count()
        }
        (before, after) => usize::from(before != after),
    }
}

fn check_detail(report: &CheckReport, color: bool) -> String {
    let mut lines = vec![format!("Document:   {}", report.document)];

    if report.findings.is_empty() {
        lines.push(format!("References: {}", output::paint("ok", Tone::Ok, color)));
    } else {
        lines.push(format!(
            "References: {}",
            output::paint(
                &format!("{} finding(s), repaired on next write", report.findings.len()),
                Tone::Warn,
                color
            )
        ));
        lines.extend(report.findings.iter().map(|f| format!("  - {f}")));
    }

    if report.invalid.is_empty() {
        lines.push(format!("Records:    {}", output::paint("ok", Tone::Ok, color)));
    } else {
        lines.push(format!(
            "Records:    {}",
            output::paint(
                &format!("{} cannot be saved", report.invalid.len()),
                Tone::Error,
                color
            )
        ));
        for record in &report.invalid {
            lines.push(format!("  {}/{}", record.path, record.name));
            lines.extend(
                record
                    .issues
                    .iter()
                    .map(|issue| format!("    {}: {}", issue.field, issue.text)),
            );
        }
    }
    lines.join("\n")
}
