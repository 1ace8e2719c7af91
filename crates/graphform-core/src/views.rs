//! Derived read-only views over a [`Document`].
//!
//! Used by field `groups` / `invalid` predicates, by the reconciler when
//! resolving reference targets, and by presentation consumers.

use serde_json::Value;

use crate::entity::{
    KEY_MANAGEMENT, OBJECT_STORAGE, RESOURCE_GROUPS, SECURITY_GROUPS, SSH_KEYS, VPCS, VSI,
};
use crate::model::{Document, Record, RecordExt};

/// Names of the children in list `child` of the record `parent` in `collection`.
pub fn child_names<'a>(doc: &'a Document, collection: &str, parent: &str, child: &str) -> Vec<&'a str> {
    doc.find(collection, parent)
        .map(|record| names_in(record.records(child)))
        .unwrap_or_default()
}

/// Names of every child in list `child` across all records of `collection`.
pub fn all_child_names<'a>(doc: &'a Document, collection: &str, child: &str) -> Vec<&'a str> {
    doc.record_maps(collection)
        .flat_map(|record| names_in(record.records(child)))
        .collect()
}

/// Names of records in `collection` whose `field` equals `value`.
pub fn names_where<'a>(doc: &'a Document, collection: &str, field: &str, value: &str) -> Vec<&'a str> {
    doc.record_maps(collection)
        .filter(|record| record.str_field(field) == Some(value))
        .filter_map(RecordExt::name)
        .collect()
}

/// Names of a list of child record values.
pub fn names_in(records: &[Value]) -> Vec<&str> {
    records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(RecordExt::name)
        .collect()
}

/// Child records of a record, as objects.
pub fn child_records<'a>(record: &'a Record, child: &str) -> impl Iterator<Item = &'a Record> {
    record.records(child).iter().filter_map(Value::as_object)
}

// ── Topology shortcuts ───────────────────────────────────────────────

pub fn resource_group_names(doc: &Document) -> Vec<&str> {
    doc.names(RESOURCE_GROUPS)
}

pub fn vpc_names(doc: &Document) -> Vec<&str> {
    doc.names(VPCS)
}

/// Every subnet name across every vpc.
pub fn subnet_names(doc: &Document) -> Vec<&str> {
    all_child_names(doc, VPCS, "subnets")
}

pub fn subnet_names_in<'a>(doc: &'a Document, vpc: &str) -> Vec<&'a str> {
    child_names(doc, VPCS, vpc, "subnets")
}

/// Every subnet record across every vpc, paired with its vpc name.
pub fn subnets(doc: &Document) -> Vec<(&str, &Record)> {
    doc.record_maps(VPCS)
        .flat_map(|vpc| {
            let vpc_name = vpc.name().unwrap_or_default();
            child_records(vpc, "subnets").map(move |subnet| (vpc_name, subnet))
        })
        .collect()
}

pub fn security_group_names_in<'a>(doc: &'a Document, vpc: &str) -> Vec<&'a str> {
    names_where(doc, SECURITY_GROUPS, "vpc", vpc)
}

pub fn vsi_names_in<'a>(doc: &'a Document, vpc: &str) -> Vec<&'a str> {
    names_where(doc, VSI, "vpc", vpc)
}

/// Every encryption key across every key-management instance.
pub fn encryption_key_names(doc: &Document) -> Vec<&str> {
    all_child_names(doc, KEY_MANAGEMENT, "keys")
}

pub fn kms_key_names<'a>(doc: &'a Document, kms: &str) -> Vec<&'a str> {
    child_names(doc, KEY_MANAGEMENT, kms, "keys")
}

/// Every bucket across every object-storage instance.
pub fn bucket_names(doc: &Document) -> Vec<&str> {
    all_child_names(doc, OBJECT_STORAGE, "buckets")
}

pub fn bucket_names_in<'a>(doc: &'a Document, cos: &str) -> Vec<&'a str> {
    child_names(doc, OBJECT_STORAGE, cos, "buckets")
}

/// Every object-storage service key across every instance.
pub fn cos_key_names(doc: &Document) -> Vec<&str> {
    all_child_names(doc, OBJECT_STORAGE, "keys")
}

pub fn ssh_key_names(doc: &Document) -> Vec<&str> {
    doc.names(SSH_KEYS)
}

/// Zone numbers available in the configured region, as strings (`"1"`..).
pub fn zone_numbers(doc: &Document) -> Vec<String> {
    let zones = doc
        .singleton(crate::entity::OPTIONS)
        .and_then(|options| options.int_field("zones"))
        .unwrap_or(3)
        .clamp(1, 3);
    (1..=zones).map(|z| z.to_string()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "_options": { "zones": 2 },
            "vpcs": [
                { "name": "management", "subnets": [ { "name": "vsi-zone-1" }, { "name": "vpe-zone-1" } ] },
                { "name": "workload", "subnets": [ { "name": "vsi-zone-2" } ] },
            ],
            "security_groups": [
                { "name": "management-vpe", "vpc": "management" },
                { "name": "workload-vpe", "vpc": "workload" },
            ],
            "key_management": [ { "name": "kms", "keys": [ { "name": "slz-key" }, { "name": "atracker-key" } ] } ],
        }))
        .unwrap()
    }

    #[test]
    fn subnet_views() {
        let doc = doc();
        assert_eq!(subnet_names(&doc), ["vsi-zone-1", "vpe-zone-1", "vsi-zone-2"]);
        assert_eq!(subnet_names_in(&doc, "workload"), ["vsi-zone-2"]);
        assert!(subnet_names_in(&doc, "missing").is_empty());
        assert_eq!(subnets(&doc).len(), 3);
    }

    #[test]
    fn names_where_filters_by_field() {
        let doc = doc();
        assert_eq!(security_group_names_in(&doc, "management"), ["management-vpe"]);
    }

    #[test]
    fn keys_and_zones() {
        let doc = doc();
        assert_eq!(encryption_key_names(&doc), ["slz-key", "atracker-key"]);
        assert_eq!(kms_key_names(&doc, "kms").len(), 2);
        assert_eq!(zone_numbers(&doc), ["1", "2"]);
    }
}
