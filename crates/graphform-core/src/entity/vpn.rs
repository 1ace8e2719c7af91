// ── VPN gateways and client-to-site VPN servers ──

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::vpe::{VPC_SECURITY_GROUPS, VPC_SUBNETS};
use super::{VPCS, VPN_GATEWAYS, VPN_SERVERS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};

// ── Gateways ─────────────────────────────────────────────────────────

fn invalid_peer_address(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("peer_address")
        .is_some_and(|addr| !patterns::is_ipv4_address(addr))
}

fn invalid_cidr_list(record: &Record, field: &str) -> bool {
    !record
        .str_list(field)
        .into_iter()
        .all(patterns::is_ipv4_cidr)
}

fn invalid_local_cidrs(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_cidr_list(record, "local_cidrs")
}

fn invalid_peer_cidrs(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_cidr_list(record, "peer_cidrs")
}

pub static CONNECTION: EntitySpec = EntitySpec::list(
    "connections",
    &[
        FieldSpec::name(),
        FieldSpec::text("peer_address")
            .required()
            .invalid(invalid_peer_address, "Peer address must be an IPv4 address"),
        FieldSpec::multiselect("local_cidrs")
            .invalid(invalid_local_cidrs, "Local CIDRs must be valid CIDR blocks"),
        FieldSpec::multiselect("peer_cidrs")
            .invalid(invalid_peer_cidrs, "Peer CIDRs must be valid CIDR blocks"),
    ],
);

pub static VPN_GATEWAY: EntitySpec = EntitySpec::list(
    VPN_GATEWAYS,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::select("subnet")
            .required()
            .groups(validators::subnet_groups),
        FieldSpec::records("connections"),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnet"]),
    ReferenceSpec::one("subnet", VPC_SUBNETS),
])
.children(&[ChildSpec::new(&CONNECTION).back_ref("vpn")]);

pub struct VpnGateways;

impl EntityDefinition for VpnGateways {
    fn spec(&self) -> &'static EntitySpec {
        &VPN_GATEWAY
    }
}

// ── Servers ──────────────────────────────────────────────────────────

fn uses_username(record: &Record, _: &FormContext<'_>) -> bool {
    record.str_field("method") == Some("username")
}

fn invalid_certificate(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("certificate_crn")
        .is_some_and(|crn| !patterns::is_crn(crn))
}

/// Client pools must be between /9 and /22.
fn invalid_client_pool(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("client_ip_pool")
        .is_some_and(|pool| patterns::parse_cidr(pool).is_none_or(|(_, len)| !(9..=22).contains(&len)))
}

fn invalid_idle_timeout(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("client_idle_timeout")
        && record
            .int_field("client_idle_timeout")
            .is_none_or(|secs| !(0..=28_800).contains(&secs))
}

pub static VPN_ROUTE: EntitySpec = EntitySpec::list(
    "routes",
    &[
        FieldSpec::name(),
        FieldSpec::text("destination").required().invalid(
            validators::invalid_destination,
            "Destination must be an IP address or CIDR block",
        ),
        FieldSpec::select("action")
            .default_text("deliver")
            .options(&["deliver", "drop", "translate"]),
    ],
);

pub static VPN_SERVER: EntitySpec = EntitySpec::list(
    VPN_SERVERS,
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
        FieldSpec::resource_group(),
        FieldSpec::text("certificate_crn")
            .required()
            .invalid(invalid_certificate, "Certificate must be a valid CRN")
            .hide_when(uses_username),
        FieldSpec::select("method")
            .default_text("certificate")
            .options(&["certificate", "username"]),
        FieldSpec::text("client_ip_pool")
            .required()
            .invalid(invalid_client_pool, "Client IP pool must be a CIDR block from /9 to /22"),
        FieldSpec::number("port")
            .default_int(443)
            .required()
            .invalid(validators::invalid_port, "Port must be between 1 and 65535"),
        FieldSpec::select("protocol")
            .default_text("udp")
            .options(&["udp", "tcp"]),
        FieldSpec::number("client_idle_timeout").default_int(600).invalid(
            invalid_idle_timeout,
            "Idle timeout must be between 0 and 28800 seconds",
        ),
        FieldSpec::toggle("enable_split_tunneling", false),
        FieldSpec::records("routes"),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnets", "security_groups"]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
    ReferenceSpec::many("security_groups", VPC_SECURITY_GROUPS),
])
.children(&[ChildSpec::new(&VPN_ROUTE).back_ref("vpn")]);

pub struct VpnServers;

impl EntityDefinition for VpnServers {
    fn spec(&self) -> &'static EntitySpec {
        &VPN_SERVER
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath, ValidationContext};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn client_pool_prefix_range() {
        let doc = Document::from_value(json!({ "vpn_servers": [] })).unwrap();
        let path = StorePath::collection(VPN_SERVERS);
        let data = json!({
            "name": "client-vpn", "vpc": "v", "subnets": ["s"], "resource_group": "rg",
            "method": "username", "client_ip_pool": "10.0.0.0/24",
        });
        let issues = VpnServers
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, ["client_ip_pool"]);
    }
}
