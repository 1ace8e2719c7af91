// ── Security and compliance center ──

use super::SCC;
use super::definition::EntityDefinition;
use super::options::REGIONS;
use super::spec::{EntitySpec, ReferenceSpec};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

fn disabled(record: &Record, _: &FormContext<'_>) -> bool {
    !record.bool_field("enable")
}

pub static SCC_SPEC: EntitySpec = EntitySpec::singleton(
    SCC,
    &[
        FieldSpec::toggle("enable", false),
        FieldSpec::text("name")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
            .hide_when(disabled),
        FieldSpec::select("region")
            .required()
            .options(REGIONS)
            .hide_when(disabled),
        FieldSpec::select("resource_group")
            .required()
            .groups(validators::resource_group_groups)
            .hide_when(disabled),
        FieldSpec::textarea("collector_description").hide_when(disabled),
    ],
)
.references(&[ReferenceSpec::resource_group()]);

pub struct Scc;

impl EntityDefinition for Scc {
    fn spec(&self) -> &'static EntitySpec {
        &SCC_SPEC
    }
}
