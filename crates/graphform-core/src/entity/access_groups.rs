// ── IAM access groups ──

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec};
use super::ACCESS_GROUPS;
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

fn invalid_expiration(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .int_field("expiration")
        .is_none_or(|hours| !(1..=24).contains(&hours))
}

pub static POLICY: EntitySpec = EntitySpec::list(
    "policies",
    &[
        FieldSpec::name(),
        FieldSpec::select("resource_group").groups(validators::resource_group_groups),
        FieldSpec::text("resource_type"),
        FieldSpec::text("service"),
    ],
)
.references(&[ReferenceSpec::resource_group()]);

pub static DYNAMIC_POLICY: EntitySpec = EntitySpec::list(
    "dynamic_policies",
    &[
        FieldSpec::name(),
        FieldSpec::text("identity_provider").required(),
        FieldSpec::number("expiration")
            .default_int(24)
            .invalid(invalid_expiration, "Expiration must be between 1 and 24 hours"),
        FieldSpec::text("claim").required(),
        FieldSpec::select("operator").default_text("EQUALS").options(&[
            "EQUALS",
            "EQUALS_IGNORE_CASE",
            "IN",
            "NOT_EQUALS",
            "NOT_EQUALS_IGNORE_CASE",
            "CONTAINS",
        ]),
        FieldSpec::text("value").required(),
    ],
);

pub static ACCESS_GROUP: EntitySpec = EntitySpec::list(
    ACCESS_GROUPS,
    &[
        FieldSpec::name(),
        FieldSpec::textarea("description"),
        FieldSpec::records("policies"),
        FieldSpec::records("dynamic_policies"),
    ],
)
.children(&[
    ChildSpec::new(&POLICY).back_ref("group"),
    ChildSpec::new(&DYNAMIC_POLICY).back_ref("group"),
]);

pub struct AccessGroups;

impl EntityDefinition for AccessGroups {
    fn spec(&self) -> &'static EntitySpec {
        &ACCESS_GROUP
    }
}
