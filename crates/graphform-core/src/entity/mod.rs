// ── Entity catalog ──
//
// One module per top-level collection. Each exposes a static
// `EntitySpec` and a unit struct implementing `EntityDefinition`.

pub mod definition;
pub mod spec;

pub mod access_groups;
pub mod appid;
pub mod atracker;
pub mod clusters;
pub mod dns;
pub mod event_streams;
pub mod iam_account_settings;
pub mod key_management;
pub mod load_balancers;
pub mod object_storage;
pub mod observability;
pub mod options;
pub mod resource_groups;
pub mod routing_tables;
pub mod scc;
pub mod secrets_manager;
pub mod security_groups;
pub mod ssh_keys;
pub mod transit_gateways;
pub mod vpcs;
pub mod vpe;
pub mod vpn;
pub mod vsi;

use serde_json::Value;

pub use definition::EntityDefinition;
pub use spec::{
    Cardinality, ChildSpec, EntitySpec, NormalizeFn, ReferenceSpec, RenamePolicy, Shape, Target,
    Uniqueness,
};

use crate::schema;

// ── Collection names ─────────────────────────────────────────────────

pub const OPTIONS: &str = "_options";
pub const RESOURCE_GROUPS: &str = "resource_groups";
pub const KEY_MANAGEMENT: &str = "key_management";
pub const OBJECT_STORAGE: &str = "object_storage";
pub const SECRETS_MANAGER: &str = "secrets_manager";
pub const ATRACKER: &str = "atracker";
pub const VPCS: &str = "vpcs";
pub const SECURITY_GROUPS: &str = "security_groups";
pub const SSH_KEYS: &str = "ssh_keys";
pub const VIRTUAL_PRIVATE_ENDPOINTS: &str = "virtual_private_endpoints";
pub const VSI: &str = "vsi";
pub const CLUSTERS: &str = "clusters";
pub const LOAD_BALANCERS: &str = "load_balancers";
pub const VPN_GATEWAYS: &str = "vpn_gateways";
pub const VPN_SERVERS: &str = "vpn_servers";
pub const ROUTING_TABLES: &str = "routing_tables";
pub const TRANSIT_GATEWAYS: &str = "transit_gateways";
pub const EVENT_STREAMS: &str = "event_streams";
pub const APPID: &str = "appid";
pub const ACCESS_GROUPS: &str = "access_groups";
pub const IAM_ACCOUNT_SETTINGS: &str = "iam_account_settings";
pub const SCC: &str = "scc";
pub const LOGDNA: &str = "logdna";
pub const SYSDIG: &str = "sysdig";
pub const DNS: &str = "dns";

/// Static reconciliation order: reference targets before their dependents.
pub const RECONCILE_ORDER: &[&str] = &[
    OPTIONS,
    RESOURCE_GROUPS,
    KEY_MANAGEMENT,
    OBJECT_STORAGE,
    SECRETS_MANAGER,
    ATRACKER,
    VPCS,
    SECURITY_GROUPS,
    SSH_KEYS,
    VIRTUAL_PRIVATE_ENDPOINTS,
    VSI,
    CLUSTERS,
    LOAD_BALANCERS,
    VPN_GATEWAYS,
    VPN_SERVERS,
    ROUTING_TABLES,
    TRANSIT_GATEWAYS,
    EVENT_STREAMS,
    APPID,
    ACCESS_GROUPS,
    IAM_ACCOUNT_SETTINGS,
    SCC,
    LOGDNA,
    SYSDIG,
    DNS,
];

/// Every built-in definition, in [`RECONCILE_ORDER`].
pub fn standard_definitions() -> Vec<Box<dyn EntityDefinition>> {
    vec![
        Box::new(options::Options),
        Box::new(resource_groups::ResourceGroups),
        Box::new(key_management::KeyManagement),
        Box::new(object_storage::ObjectStorage),
        Box::new(secrets_manager::SecretsManager),
        Box::new(atracker::Atracker),
        Box::new(vpcs::Vpcs),
        Box::new(security_groups::SecurityGroups),
        Box::new(ssh_keys::SshKeys),
        Box::new(vpe::VirtualPrivateEndpoints),
        Box::new(vsi::Vsi),
        Box::new(clusters::Clusters),
        Box::new(load_balancers::LoadBalancers),
        Box::new(vpn::VpnGateways),
        Box::new(vpn::VpnServers),
        Box::new(routing_tables::RoutingTables),
        Box::new(transit_gateways::TransitGateways),
        Box::new(event_streams::EventStreams),
        Box::new(appid::AppId),
        Box::new(access_groups::AccessGroups),
        Box::new(iam_account_settings::IamAccountSettings),
        Box::new(scc::Scc),
        Box::new(observability::LogDna),
        Box::new(observability::Sysdig),
        Box::new(dns::Dns),
    ]
}

/// A seed record overlaid on the spec's defaults. Non-object values pass
/// through unchanged.
pub(crate) fn seeded(spec: &EntitySpec, value: Value) -> Value {
    match value {
        Value::Object(data) => Value::Object(schema::overlay(spec.fields, data)),
        other => other,
    }
}
