// ── Load balancers ──

use super::definition::EntityDefinition;
use super::spec::{EntitySpec, ReferenceSpec, Target};
use super::vpe::{VPC_SECURITY_GROUPS, VPC_SUBNETS};
use super::{LOAD_BALANCERS, VPCS, VSI};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

const LB_PROTOCOLS: &[&str] = &["http", "https", "tcp"];

fn invalid_connection_limit(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("connection_limit")
        && record
            .int_field("connection_limit")
            .is_none_or(|n| !(1..=15_000).contains(&n))
}

pub static LOAD_BALANCER: EntitySpec = EntitySpec::list(
    LOAD_BALANCERS,
    &[
        FieldSpec::name(),
        FieldSpec::select("type")
            .default_text("private")
            .options(&["private", "public"]),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::subnet_groups),
        FieldSpec::multiselect("security_groups").groups(validators::security_group_groups),
        FieldSpec::multiselect("target_vsi")
            .required()
            .groups(validators::vsi_groups),
        FieldSpec::select("algorithm")
            .default_text("round_robin")
            .options(&["round_robin", "weighted_round_robin", "least_connections"]),
        FieldSpec::select("protocol")
            .default_text("http")
            .options(LB_PROTOCOLS),
        FieldSpec::number("port")
            .default_int(80)
            .required()
            .invalid(validators::invalid_port, "Port must be between 1 and 65535"),
        FieldSpec::select("health_type")
            .default_text("http")
            .options(LB_PROTOCOLS),
        FieldSpec::number("listener_port").default_int(80).required().invalid(
            validators::invalid_listener_port,
            "Listener port must be between 1 and 65535",
        ),
        FieldSpec::select("listener_protocol")
            .default_text("http")
            .options(LB_PROTOCOLS),
        FieldSpec::number("connection_limit").invalid(
            invalid_connection_limit,
            "Connection limit must be between 1 and 15000",
        ),
        FieldSpec::resource_group(),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&[
        "subnets",
        "security_groups",
        "target_vsi",
    ]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
    ReferenceSpec::many("security_groups", VPC_SECURITY_GROUPS),
    ReferenceSpec::many(
        "target_vsi",
        Target::Where {
            collection: VSI,
            field: "vpc",
            via: "vpc",
        },
    ),
]);

pub struct LoadBalancers;

impl EntityDefinition for LoadBalancers {
    fn spec(&self) -> &'static EntitySpec {
        &LOAD_BALANCER
    }
}
