// ── Event streams ──
//
// Enterprise-plan settings are hidden, and unvalidated, on every other plan.

use serde_json::Value;

use super::EVENT_STREAMS;
use super::definition::EntityDefinition;
use super::options::ENDPOINTS;
use super::spec::{EntitySpec, ReferenceSpec};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns};

pub const ENTERPRISE: &str = "enterprise";

/// Fields that only exist on the enterprise plan.
const ENTERPRISE_FIELDS: &[&str] = &["private_ip_allowlist", "throughput", "storage_size"];

fn not_enterprise(record: &Record, _: &FormContext<'_>) -> bool {
    record.str_field("plan") != Some(ENTERPRISE)
}

fn invalid_allowlist(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("private_ip_allowlist")
        .is_some_and(|list| !patterns::is_ip_list(list))
}

/// Leaving the enterprise plan drops its settings.
fn clear_enterprise(record: &mut Record, _: &FormContext<'_>, plan: &Value) {
    if plan.as_str() == Some(ENTERPRISE) {
        return;
    }
    for field in ENTERPRISE_FIELDS {
        record.insert((*field).to_owned(), Value::Null);
    }
}

pub static EVENT_STREAM: EntitySpec = EntitySpec::list(
    EVENT_STREAMS,
    &[
        FieldSpec::name(),
        FieldSpec::select("plan")
            .default_text("standard")
            .options(&["lite", "standard", ENTERPRISE])
            .on_state_change(clear_enterprise),
        FieldSpec::resource_group(),
        FieldSpec::select("endpoints")
            .default_text("private")
            .options(ENDPOINTS)
            .hide_when(not_enterprise),
        FieldSpec::text("private_ip_allowlist")
            .required()
            .invalid(
                invalid_allowlist,
                "Allowlist must be a comma separated list of addresses or CIDR blocks",
            )
            .hide_when(not_enterprise),
        FieldSpec::select("throughput")
            .required()
            .options(&["150MB/s", "300MB/s", "450MB/s"])
            .hide_when(not_enterprise),
        FieldSpec::select("storage_size")
            .required()
            .options(&["2TB", "4TB", "6TB", "8TB", "10TB", "12TB"])
            .hide_when(not_enterprise),
    ],
)
.references(&[ReferenceSpec::resource_group()]);

pub struct EventStreams;

impl EntityDefinition for EventStreams {
    fn spec(&self) -> &'static EntitySpec {
        &EVENT_STREAM
    }
}
