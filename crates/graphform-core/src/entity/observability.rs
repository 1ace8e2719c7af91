// ── Logging and monitoring ──
//
// `logdna` and `sysdig` singletons. Both are inert until enabled.

use super::definition::EntityDefinition;
use super::options::ENDPOINTS;
use super::spec::{EntitySpec, ReferenceSpec, Target};
use super::{LOGDNA, OBJECT_STORAGE, SYSDIG};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

fn disabled(record: &Record, _: &FormContext<'_>) -> bool {
    !record.bool_field("enabled")
}

pub static LOGDNA_SPEC: EntitySpec = EntitySpec::singleton(
    LOGDNA,
    &[
        FieldSpec::toggle("enabled", false),
        FieldSpec::text("name")
            .default_text("logdna")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
            .hide_when(disabled),
        FieldSpec::select("plan")
            .default_text("lite")
            .options(&["lite", "7-day", "14-day", "30-day"])
            .hide_when(disabled),
        FieldSpec::select("endpoints")
            .default_text("private")
            .options(ENDPOINTS)
            .hide_when(disabled),
        FieldSpec::toggle("platform_logs", false),
        FieldSpec::select("resource_group")
            .required()
            .groups(validators::resource_group_groups)
            .hide_when(disabled),
        FieldSpec::select("cos")
            .required()
            .groups(validators::cos_groups)
            .on_state_change(validators::clear_bucket)
            .hide_when(disabled),
        FieldSpec::select("bucket")
            .required()
            .groups(validators::bucket_groups)
            .hide_when(disabled),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("cos", Target::Collection(OBJECT_STORAGE)).clears(&["bucket"]),
    ReferenceSpec::one(
        "bucket",
        Target::ChildrenOf {
            collection: OBJECT_STORAGE,
            child: "buckets",
            via: "cos",
        },
    ),
]);

pub struct LogDna;

impl EntityDefinition for LogDna {
    fn spec(&self) -> &'static EntitySpec {
        &LOGDNA_SPEC
    }
}

pub static SYSDIG_SPEC: EntitySpec = EntitySpec::singleton(
    SYSDIG,
    &[
        FieldSpec::toggle("enabled", false),
        FieldSpec::text("name")
            .default_text("sysdig")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
            .hide_when(disabled),
        FieldSpec::select("plan")
            .default_text("tier1")
            .options(&["tier1", "graduated-tier"])
            .hide_when(disabled),
        FieldSpec::toggle("platform_logs", false),
        FieldSpec::select("resource_group")
            .required()
            .groups(validators::resource_group_groups)
            .hide_when(disabled),
    ],
)
.references(&[ReferenceSpec::resource_group()]);

pub struct Sysdig;

impl EntityDefinition for Sysdig {
    fn spec(&self) -> &'static EntitySpec {
        &SYSDIG_SPEC
    }
}
