// ── VPCs ──
//
// Virtual private clouds own their address prefixes, subnets and network
// ACLs. Subnet names are unique across every vpc; ACL names only within
// their vpc, which is why a subnet's `network_acl` resolves against its
// sibling ACLs.

use serde_json::Value;

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::{OBJECT_STORAGE, VPCS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};
use crate::views;

pub const PROTOCOLS: &[&str] = &["all", "tcp", "udp", "icmp"];
pub const DIRECTIONS: &[&str] = &["inbound", "outbound"];

/// Zone number of a field, accepting `1` or `"1"`.
pub fn zone_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ── Address prefixes ─────────────────────────────────────────────────

pub static ADDRESS_PREFIX: EntitySpec = EntitySpec::list(
    "address_prefixes",
    &[
        FieldSpec::name(),
        FieldSpec::text("cidr")
            .required()
            .invalid(validators::invalid_cidr, "Invalid CIDR block"),
        FieldSpec::select("zone")
            .required()
            .groups(validators::zone_groups),
    ],
);

// ── Subnets ──────────────────────────────────────────────────────────

/// Overlaps a sibling subnet's block in the same vpc.
fn overlapping_cidr(record: &Record, ctx: &FormContext<'_>) -> bool {
    let Some(cidr) = record.str_field("cidr") else {
        return false;
    };
    if !patterns::is_ipv4_cidr(cidr) {
        return true;
    }
    let this = record.name().or(ctx.original_name);
    ctx.parent.is_some_and(|vpc| {
        views::child_records(vpc, "subnets")
            .filter(|other| other.name() != this && other.name() != ctx.original_name)
            .filter_map(|other| other.str_field("cidr"))
            .any(|other| patterns::cidrs_overlap(cidr, other))
    })
}

fn subnet_cidr_text(record: &Record, _: &FormContext<'_>) -> String {
    match record.str_field("cidr") {
        Some(cidr) if !patterns::is_ipv4_cidr(cidr) => "Invalid CIDR block".to_owned(),
        Some(cidr) => format!("{cidr} overlaps another subnet in this vpc"),
        None => "Invalid CIDR block".to_owned(),
    }
}

/// A public gateway only exists in zones the vpc enabled one for.
fn normalize_subnet(record: &mut Record, ctx: &FormContext<'_>) {
    if !record.bool_field("public_gateway") {
        return;
    }
    let zone = record.get("zone").and_then(zone_of);
    let available = ctx.parent.is_some_and(|vpc| {
        vpc.get("public_gateways")
            .and_then(Value::as_array)
            .is_some_and(|zones| zones.iter().filter_map(zone_of).any(|z| Some(z) == zone))
    });
    if !available {
        record.insert("public_gateway".to_owned(), Value::Bool(false));
    }
}

pub static SUBNET: EntitySpec = EntitySpec::list(
    "subnets",
    &[
        FieldSpec::name(),
        FieldSpec::text("cidr")
            .required()
            .invalid_with(overlapping_cidr, subnet_cidr_text),
        FieldSpec::select("zone")
            .required()
            .groups(validators::zone_groups),
        FieldSpec::select("network_acl").groups(validators::sibling_acl_groups),
        FieldSpec::toggle("public_gateway", false),
        FieldSpec::text("tier"),
    ],
)
.references(&[ReferenceSpec::one("network_acl", Target::Siblings("acls"))])
.normalize(normalize_subnet)
.global();

// ── Network ACLs ─────────────────────────────────────────────────────

pub static ACL_RULE: EntitySpec = EntitySpec::list(
    "rules",
    &[
        FieldSpec::name(),
        FieldSpec::select("action")
            .default_text("allow")
            .options(&["allow", "deny"]),
        FieldSpec::select("direction")
            .default_text("inbound")
            .options(DIRECTIONS),
        FieldSpec::text("source")
            .required()
            .invalid(validators::invalid_source, "Source must be an IP address or CIDR block"),
        FieldSpec::text("destination").required().invalid(
            validators::invalid_destination,
            "Destination must be an IP address or CIDR block",
        ),
        FieldSpec::select("protocol")
            .default_text("all")
            .options(PROTOCOLS),
        FieldSpec::number("port_min")
            .hide_when(validators::hide_ports)
            .invalid(validators::invalid_port_min, "Port must be between 1 and 65535"),
        FieldSpec::number("port_max").hide_when(validators::hide_ports).invalid(
            validators::invalid_port_max,
            "Port must be between 1 and 65535 and not below the minimum",
        ),
    ],
);

pub static ACL: EntitySpec = EntitySpec::list(
    "acls",
    &[
        FieldSpec::name(),
        FieldSpec::select("resource_group").groups(validators::resource_group_groups),
        FieldSpec::records("rules"),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.children(&[ChildSpec::new(&ACL_RULE).back_ref("acl").inherit(&["vpc"])]);

// ── VPC ──────────────────────────────────────────────────────────────

fn missing_flow_log_bucket(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("cos") && record.is_blank("bucket")
}

fn bucket_choices(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    let mut choices = vec![DISABLED.to_owned()];
    choices.extend(validators::bucket_groups(record, ctx));
    choices
}

fn invalid_acl_name(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("default_network_acl_name")
        .is_some_and(|name| !name.is_empty() && !patterns::is_valid_name(name))
}

/// Literal accepted by a vpc's `bucket` to turn flow logs off.
pub const DISABLED: &str = "$disabled";

pub static VPC: EntitySpec = EntitySpec::list(
    VPCS,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::select("cos")
            .groups(validators::cos_groups)
            .on_state_change(validators::clear_bucket),
        FieldSpec::select("bucket").groups(bucket_choices).invalid(
            missing_flow_log_bucket,
            "Select a flow logs bucket or disable flow logs",
        ),
        FieldSpec::toggle("classic_access", false),
        FieldSpec::toggle("manual_address_prefix_management", false),
        FieldSpec::text("default_network_acl_name")
            .invalid(invalid_acl_name, "Invalid network ACL name"),
        FieldSpec::multiselect("public_gateways").groups(validators::zone_groups),
        FieldSpec::records("address_prefixes"),
        FieldSpec::records("subnets"),
        FieldSpec::records("acls"),
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
    )
    .allow(&[DISABLED]),
])
.children(&[
    ChildSpec::new(&ADDRESS_PREFIX).back_ref("vpc"),
    ChildSpec::new(&SUBNET).back_ref("vpc"),
    ChildSpec::new(&ACL).back_ref("vpc"),
])
.cascade();

pub struct Vpcs;

impl EntityDefinition for Vpcs {
    fn spec(&self) -> &'static EntitySpec {
        &VPC
    }
}
