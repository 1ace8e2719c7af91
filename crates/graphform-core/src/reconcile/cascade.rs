// ── Cascade rename ──
//
// When a record whose type cascades renames is saved under a new name,
// every declared reference into its list is rewritten before the
// reconciler runs, so nothing decays to a sentinel.

use serde_json::Value;
use tracing::debug;

use crate::entity::{Cardinality, EntitySpec};
use crate::model::{Document, Record, StorePath};

/// A reference field that can hold names from the renamed list.
struct Referrer {
    shape: String,
    field: &'static str,
    cardinality: Cardinality,
}

/// Rewrite `old` to `new` in every reference targeting the list at
/// `renamed`. `roots` are the top-level specs to search. Returns the
/// number of values rewritten.
pub fn cascade_rename<'s>(
    doc: &mut Document,
    roots: impl IntoIterator<Item = &'s &'static EntitySpec>,
    renamed: &StorePath,
    old: &str,
    new: &str,
) -> usize {
    let target_shape = renamed.shape();
    let mut referrers = Vec::new();
    for root in roots {
        root.walk(root.name, &mut |spec, shape| {
            for reference in spec.references {
                if reference.target.shape(shape).as_deref() == Some(target_shape.as_str()) {
                    referrers.push(Referrer {
                        shape: shape.to_owned(),
                        field: reference.field,
                        cardinality: reference.cardinality,
                    });
                }
            }
        });
    }

    let mut rewritten = 0;
    for referrer in &referrers {
        let mut fields = referrer.shape.split("/*/");
        let Some(collection) = fields.next() else {
            continue;
        };
        let nested: Vec<&str> = fields.collect();
        let Some(mut value) = doc.take(collection) else {
            continue;
        };
        visit_records(&mut value, &nested, &mut |record: &mut Record| {
            rewritten += rewrite(record, referrer, old, new);
        });
        doc.set(collection, value);
    }

    if rewritten > 0 {
        debug!(%renamed, old, new, rewritten, "cascaded rename");
    }
    rewritten
}

fn rewrite(record: &mut Record, referrer: &Referrer, old: &str, new: &str) -> usize {
    let Some(value) = record.get_mut(referrer.field) else {
        return 0;
    };
    match referrer.cardinality {
        Cardinality::One if value.as_str() == Some(old) => {
            *value = Value::String(new.to_owned());
            1
        }
        Cardinality::One => 0,
        Cardinality::Many => {
            let Some(items) = value.as_array_mut() else {
                return 0;
            };
            let mut count = 0;
            for item in items.iter_mut().filter(|item| item.as_str() == Some(old)) {
                *item = Value::String(new.to_owned());
                count += 1;
            }
            count
        }
    }
}

/// Call `visit` on every record reached by descending `nested` list fields.
fn visit_records(
    value: &mut Value,
    nested: &[&str],
    visit: &mut dyn FnMut(&mut Record),
) {
    match value {
        Value::Array(items) => {
            for record in items.iter_mut().filter_map(Value::as_object_mut) {
                descend(record, nested, visit);
            }
        }
        Value::Object(record) => descend(record, nested, visit),
        _ => {}
    }
}

fn descend(
    record: &mut Record,
    nested: &[&str],
    visit: &mut dyn FnMut(&mut Record),
) {
    match nested.split_first() {
        None => visit(record),
        Some((field, rest)) => {
            if let Some(Value::Array(items)) = record.get_mut(*field) {
                for child in items.iter_mut().filter_map(Value::as_object_mut) {
                    descend(child, rest, visit);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{
        ReferenceSpec, Target, key_management, object_storage, resource_groups, vsi,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    static ROOTS: [&EntitySpec; 4] = [
        &resource_groups::RESOURCE_GROUP,
        &key_management::KMS,
        &object_storage::COS,
        &vsi::VSI_SPEC,
    ];

    #[test]
    fn rewrites_scalars_and_list_elements() {
        let mut doc = Document::from_value(json!({
            "resource_groups": [{ "name": "slz-service-rg" }],
            "key_management": [{ "name": "kms", "resource_group": "slz-service-rg", "keys": [] }],
            "object_storage": [{ "name": "cos", "resource_group": "other", "kms": "kms", "buckets": [], "keys": [] }],
            "vsi": [],
        }))
        .unwrap();
        let path = StorePath::collection("resource_groups");
        let n = cascade_rename(&mut doc, &ROOTS, &path, "slz-service-rg", "service-rg");
        assert_eq!(n, 1);
        assert_eq!(doc.records("key_management")[0]["resource_group"], json!("service-rg"));
        assert_eq!(doc.records("object_storage")[0]["resource_group"], json!("other"));
    }

    #[test]
    fn child_shapes_are_matched() {
        let mut doc = Document::from_value(json!({
            "key_management": [{ "name": "kms", "keys": [{ "name": "old-key" }] }],
            "object_storage": [{
                "name": "cos",
                "kms": "kms",
                "buckets": [{ "name": "b", "kms_key": "old-key" }],
                "keys": [],
            }],
            "vsi": [{
                "name": "v",
                "encryption_key": "old-key",
                "volumes": [{ "name": "data", "encryption_key": "old-key" }],
            }],
        }))
        .unwrap();
        let path: StorePath = "key_management/kms/keys".parse().unwrap();
        let n = cascade_rename(&mut doc, &ROOTS, &path, "old-key", "new-key");
        assert_eq!(n, 3);
        assert_eq!(
            doc.records("object_storage")[0]["buckets"][0]["kms_key"],
            json!("new-key")
        );
        assert_eq!(doc.records("vsi")[0]["volumes"][0]["encryption_key"], json!("new-key"));
    }

    #[test]
    fn unrelated_shapes_are_untouched() {
        static SPEC: EntitySpec = EntitySpec::list("things", &[])
            .references(&[ReferenceSpec::many("tags", Target::Collection("labels"))]);
        let mut doc = Document::from_value(json!({ "things": [{ "tags": ["a"] }] })).unwrap();
        let n = cascade_rename(&mut doc, &[&SPEC], &StorePath::collection("vpcs"), "a", "b");
        assert_eq!(n, 0);
        assert_eq!(doc.records("things")[0]["tags"], json!(["a"]));
    }
}
