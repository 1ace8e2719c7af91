// ── Activity tracker ──
//
// Singleton route for account activity events. Every target field is
// hidden, and so never invalid, until the tracker is enabled.

use super::definition::EntityDefinition;
use super::options::REGIONS;
use super::spec::{EntitySpec, ReferenceSpec, Target};
use super::{ATRACKER, OBJECT_STORAGE};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldDefault, FieldSpec, validators};

fn disabled(record: &Record, _: &FormContext<'_>) -> bool {
    !record.bool_field("enabled")
}

/// The tracker instance only needs a resource group when it is provisioned.
fn no_instance(record: &Record, ctx: &FormContext<'_>) -> bool {
    disabled(record, ctx) || !record.bool_field("instance")
}

fn location_groups(_: &Record, _: &FormContext<'_>) -> Vec<String> {
    std::iter::once("global")
        .chain(REGIONS.iter().copied())
        .map(str::to_owned)
        .collect()
}

pub static ATRACKER_SPEC: EntitySpec = EntitySpec::singleton(
    ATRACKER,
    &[
        FieldSpec::toggle("enabled", false),
        FieldSpec::select("type")
            .default_text("cos")
            .options(&["cos", "logdna"])
            .hide_when(disabled),
        FieldSpec::text("name")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
            .hide_when(disabled),
        FieldSpec::text("target_name")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
            .hide_when(disabled),
        FieldSpec::select("bucket")
            .required()
            .groups(validators::all_bucket_groups)
            .hide_when(disabled),
        FieldSpec::select("cos_key")
            .required()
            .groups(validators::cos_key_groups)
            .hide_when(disabled),
        FieldSpec::multiselect("locations")
            .default(FieldDefault::List(&["global"]))
            .required()
            .groups(location_groups)
            .hide_when(disabled),
        FieldSpec::toggle("add_route", true),
        FieldSpec::select("plan")
            .default_text("lite")
            .options(&["lite", "standard"])
            .hide_when(no_instance),
        FieldSpec::toggle("instance", false),
        FieldSpec::select("resource_group")
            .required()
            .groups(validators::resource_group_groups)
            .hide_when(no_instance),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one(
        "bucket",
        Target::AllChildren {
            collection: OBJECT_STORAGE,
            child: "buckets",
        },
    ),
    ReferenceSpec::one(
        "cos_key",
        Target::AllChildren {
            collection: OBJECT_STORAGE,
            child: "keys",
        },
    ),
]);

pub struct Atracker;

impl EntityDefinition for Atracker {
    fn spec(&self) -> &'static EntitySpec {
        &ATRACKER_SPEC
    }
}
