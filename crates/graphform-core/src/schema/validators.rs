// ── Shared field behaviour ──
//
// Predicates, option groups and state-change hooks reused across entity
// types. Entity-specific rules live next to the entity that owns them.

use serde_json::Value;

use super::patterns;
use crate::model::{FormContext, Record, RecordExt};
use crate::views;

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_owned).collect()
}

// ── Names ────────────────────────────────────────────────────────────

pub fn invalid_name(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .name()
        .is_some_and(|name| !patterns::is_valid_name(name))
}

pub fn invalid_name_text(record: &Record, _: &FormContext<'_>) -> String {
    match record.name() {
        Some(name) if name.len() > patterns::MAX_NAME_LEN => format!(
            "Name must be at most {} characters",
            patterns::MAX_NAME_LEN
        ),
        _ => "Name must start with a lowercase letter and contain only lowercase letters, \
              numbers and dashes, ending in a letter or number"
            .to_owned(),
    }
}

// ── Option groups ────────────────────────────────────────────────────

pub fn resource_group_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::resource_group_names(ctx.document))
}

pub fn vpc_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::vpc_names(ctx.document))
}

pub fn kms_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(ctx.document.names(crate::entity::KEY_MANAGEMENT))
}

pub fn cos_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(ctx.document.names(crate::entity::OBJECT_STORAGE))
}

pub fn ssh_key_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::ssh_key_names(ctx.document))
}

/// Every encryption key in every key-management instance.
pub fn encryption_key_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::encryption_key_names(ctx.document))
}

/// Keys of the instance named by the record's `kms`.
pub fn kms_key_groups(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    record
        .str_field("kms")
        .map(|kms| owned(views::kms_key_names(ctx.document, kms)))
        .unwrap_or_default()
}

/// Buckets of the instance named by the record's `cos`.
pub fn bucket_groups(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    record
        .str_field("cos")
        .map(|cos| owned(views::bucket_names_in(ctx.document, cos)))
        .unwrap_or_default()
}

pub fn all_bucket_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::bucket_names(ctx.document))
}

pub fn cos_key_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    owned(views::cos_key_names(ctx.document))
}

/// Subnets of the vpc named by the record's `vpc`.
pub fn subnet_groups(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    record
        .str_field("vpc")
        .map(|vpc| owned(views::subnet_names_in(ctx.document, vpc)))
        .unwrap_or_default()
}

/// Security groups attached to the record's `vpc`.
pub fn security_group_groups(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    record
        .str_field("vpc")
        .map(|vpc| owned(views::security_group_names_in(ctx.document, vpc)))
        .unwrap_or_default()
}

/// Virtual server deployments in the record's `vpc`.
pub fn vsi_groups(record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    record
        .str_field("vpc")
        .map(|vpc| owned(views::vsi_names_in(ctx.document, vpc)))
        .unwrap_or_default()
}

pub fn zone_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    views::zone_numbers(ctx.document)
}

/// Subnets selected on the parent record (worker pools pick from their cluster).
pub fn parent_subnet_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    ctx.parent
        .map(|parent| owned(parent.str_list("subnets")))
        .unwrap_or_default()
}

/// Network ACLs of the parent vpc.
pub fn sibling_acl_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    ctx.parent
        .map(|parent| owned(views::names_in(parent.records("acls"))))
        .unwrap_or_default()
}

// ── Network predicates ───────────────────────────────────────────────

pub fn invalid_cidr(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("cidr")
        .is_some_and(|cidr| !patterns::is_ipv4_cidr(cidr))
}

pub fn invalid_source(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("source")
        .is_some_and(|source| !patterns::is_ipv4_cidr_or_address(source))
}

pub fn invalid_destination(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("destination")
        .is_some_and(|dest| !patterns::is_ipv4_cidr_or_address(dest))
}

/// Ports only apply to tcp and udp rules.
pub fn hide_ports(record: &Record, _: &FormContext<'_>) -> bool {
    !matches!(record.str_field("protocol"), Some("tcp" | "udp"))
}

/// Type and code only apply to icmp rules.
pub fn hide_icmp(record: &Record, _: &FormContext<'_>) -> bool {
    record.str_field("protocol") != Some("icmp")
}

pub fn invalid_port_min(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_port_bound(record, "port_min")
}

pub fn invalid_port_max(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_port_bound(record, "port_max")
        || matches!(
            (record.int_field("port_min"), record.int_field("port_max")),
            (Some(min), Some(max)) if min > max
        )
}

fn invalid_port_bound(record: &Record, field: &str) -> bool {
    if record.is_blank(field) {
        return false;
    }
    record.int_field(field).is_none_or(|port| !patterns::is_port(port))
}

/// A required port: a whole number from 1 to 65535.
pub fn invalid_port(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_port_bound(record, "port")
}

pub fn invalid_listener_port(record: &Record, _: &FormContext<'_>) -> bool {
    invalid_port_bound(record, "listener_port")
}

// ── State-change hooks ───────────────────────────────────────────────

/// A new `vpc` invalidates every selection scoped to the old one.
pub fn clear_vpc_scoped(record: &mut Record, _: &FormContext<'_>, _: &Value) {
    for field in ["subnets", "security_groups", "target_vsi"] {
        if record.contains_key(field) {
            record.insert(field.to_owned(), Value::Array(Vec::new()));
        }
    }
    if record.contains_key("subnet") {
        record.insert("subnet".to_owned(), Value::Null);
    }
}

/// A new `kms` invalidates the selected key.
pub fn clear_encryption_key(record: &mut Record, _: &FormContext<'_>, _: &Value) {
    record.insert("encryption_key".to_owned(), Value::Null);
}

/// A new `cos` invalidates the selected bucket.
pub fn clear_bucket(record: &mut Record, _: &FormContext<'_>, _: &Value) {
    record.insert("bucket".to_owned(), Value::Null);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath};
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn name_rule() {
        let doc = Document::new();
        let path = StorePath::collection("vpcs");
        let ctx = FormContext::new(&doc, &path);
        assert!(!invalid_name(&record(json!({ "name": "edge" })), &ctx));
        assert!(invalid_name(&record(json!({ "name": "Edge" })), &ctx));
        assert!(!invalid_name(&record(json!({ "name": null })), &ctx));
        let long = record(json!({ "name": "a".repeat(70) }));
        assert_eq!(invalid_name_text(&long, &ctx), "Name must be at most 63 characters");
    }

    #[test]
    fn port_rules() {
        let doc = Document::new();
        let path = StorePath::collection("security_groups");
        let ctx = FormContext::new(&doc, &path);
        let ok = record(json!({ "protocol": "tcp", "port_min": 80, "port_max": 443 }));
        assert!(!invalid_port_min(&ok, &ctx));
        assert!(!invalid_port_max(&ok, &ctx));
        let inverted = record(json!({ "protocol": "tcp", "port_min": 8080, "port_max": 80 }));
        assert!(invalid_port_max(&inverted, &ctx));
        let zero = record(json!({ "protocol": "tcp", "port_min": 0 }));
        assert!(invalid_port_min(&zero, &ctx));
        assert!(hide_ports(&record(json!({ "protocol": "all" })), &ctx));
        assert!(!hide_icmp(&record(json!({ "protocol": "icmp" })), &ctx));
    }

    #[test]
    fn vpc_change_clears_scoped_selections() {
        let doc = Document::new();
        let path = StorePath::collection("vsi");
        let ctx = FormContext::new(&doc, &path);
        let mut r = record(json!({ "vpc": "b", "subnets": ["x"], "security_groups": ["y"], "image": "i" }));
        clear_vpc_scoped(&mut r, &ctx, &json!("b"));
        assert_eq!(r["subnets"], json!([]));
        assert_eq!(r["security_groups"], json!([]));
        assert!(!r.contains_key("subnet"));
        assert_eq!(r["image"], json!("i"));
    }
}
