// ── Virtual server deployments ──
//
// A deployment places `vsi_per_subnet` servers in each selected subnet,
// all sharing the same image, profile and boot volume key.

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::vpe::{VPC_SECURITY_GROUPS, VPC_SUBNETS};
use super::{KEY_MANAGEMENT, SSH_KEYS, VPCS, VSI};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

pub(crate) const ANY_KEY: Target = Target::AllChildren {
    collection: KEY_MANAGEMENT,
    child: "keys",
};

fn invalid_capacity(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("capacity")
        && record
            .int_field("capacity")
            .is_none_or(|gb| !(10..=16_000).contains(&gb))
}

fn invalid_vsi_per_subnet(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .int_field("vsi_per_subnet")
        .is_none_or(|n| !(1..=10).contains(&n))
}

pub static VOLUME: EntitySpec = EntitySpec::list(
    "volumes",
    &[
        FieldSpec::name(),
        FieldSpec::select("profile")
            .default_text("general-purpose")
            .options(&["general-purpose", "5iops-tier", "10iops-tier", "custom"]),
        FieldSpec::number("capacity")
            .invalid(invalid_capacity, "Capacity must be between 10 and 16000 GB"),
        FieldSpec::select("encryption_key").groups(validators::encryption_key_groups),
    ],
)
.references(&[ReferenceSpec::one("encryption_key", ANY_KEY)]);

pub static VSI_SPEC: EntitySpec = EntitySpec::list(
    VSI,
    &[
        FieldSpec::name(),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::subnet_groups),
        FieldSpec::multiselect("security_groups").groups(validators::security_group_groups),
        FieldSpec::multiselect("ssh_keys")
            .required()
            .groups(validators::ssh_key_groups),
        FieldSpec::text("image").required(),
        FieldSpec::text("profile").required(),
        FieldSpec::number("vsi_per_subnet").default_int(1).invalid(
            invalid_vsi_per_subnet,
            "Servers per subnet must be between 1 and 10",
        ),
        FieldSpec::select("encryption_key")
            .required()
            .groups(validators::encryption_key_groups),
        FieldSpec::resource_group(),
        FieldSpec::textarea("user_data"),
        FieldSpec::toggle("enable_floating_ip", false),
        FieldSpec::records("volumes"),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnets", "security_groups"]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
    ReferenceSpec::many("security_groups", VPC_SECURITY_GROUPS),
    ReferenceSpec::many("ssh_keys", Target::Collection(SSH_KEYS)),
    ReferenceSpec::one("encryption_key", ANY_KEY),
])
.children(&[ChildSpec::new(&VOLUME).back_ref("vsi")]);

pub struct Vsi;

impl EntityDefinition for Vsi {
    fn spec(&self) -> &'static EntitySpec {
        &VSI_SPEC
    }
}
