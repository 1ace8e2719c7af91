// ── Routing tables ──

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::{ROUTING_TABLES, VPCS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};

/// `next_hop` only applies to delivered traffic.
fn not_delivered(record: &Record, _: &FormContext<'_>) -> bool {
    record.str_field("action") != Some("deliver")
}

fn invalid_next_hop(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("next_hop")
        .is_some_and(|hop| !patterns::is_ipv4_address(hop))
}

pub static ROUTE: EntitySpec = EntitySpec::list(
    "routes",
    &[
        FieldSpec::name(),
        FieldSpec::select("zone")
            .required()
            .groups(validators::zone_groups),
        FieldSpec::text("destination").required().invalid(
            validators::invalid_destination,
            "Destination must be an IP address or CIDR block",
        ),
        FieldSpec::select("action")
            .default_text("deliver")
            .options(&["deliver", "delegate", "delegate_vpc", "drop"]),
        FieldSpec::text("next_hop")
            .required()
            .invalid(invalid_next_hop, "Next hop must be an IPv4 address")
            .hide_when(not_delivered),
    ],
);

pub static ROUTING_TABLE: EntitySpec = EntitySpec::list(
    ROUTING_TABLES,
    &[
        FieldSpec::name(),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups),
        FieldSpec::toggle("route_direct_link_ingress", false),
        FieldSpec::toggle("transit_gateway_ingress", false),
        FieldSpec::toggle("route_vpc_zone_ingress", false),
        FieldSpec::records("routes"),
    ],
)
.references(&[ReferenceSpec::one("vpc", Target::Collection(VPCS))])
.children(&[ChildSpec::new(&ROUTE)
    .back_ref("routing_table")
    .inherit(&["vpc"])]);

pub struct RoutingTables;

impl EntityDefinition for RoutingTables {
    fn spec(&self) -> &'static EntitySpec {
        &ROUTING_TABLE
    }
}
