// ── Object storage ──
//
// Cloud object storage instances with their buckets and service keys.
// A bucket's encryption key must belong to the instance's own `kms`.

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::{KEY_MANAGEMENT, OBJECT_STORAGE};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};
use crate::views;

pub const STORAGE_CLASSES: &[&str] = &["standard", "vault", "cold", "smart"];
pub const KEY_ROLES: &[&str] = &[
    "Writer",
    "Reader",
    "Manager",
    "Content Reader",
    "Object Reader",
    "Object Writer",
];

/// Keys of the key-management instance the parent instance encrypts with.
fn parent_kms_key_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    ctx.parent
        .and_then(|cos| cos.str_field("kms"))
        .map(|kms| {
            views::kms_key_names(ctx.document, kms)
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// A bucket needs a key once its instance is encrypted.
fn missing_kms_key(record: &Record, ctx: &FormContext<'_>) -> bool {
    let encrypted = ctx.parent.is_some_and(|cos| !cos.is_blank("kms"));
    encrypted && record.is_blank("kms_key")
}

pub static BUCKET: EntitySpec = EntitySpec::list(
    "buckets",
    &[
        FieldSpec::name(),
        FieldSpec::select("storage_class")
            .default_text("standard")
            .options(STORAGE_CLASSES),
        FieldSpec::select("kms_key")
            .groups(parent_kms_key_groups)
            .invalid(missing_kms_key, "Select an encryption key"),
        FieldSpec::toggle("force_delete", true),
        FieldSpec::select("endpoint")
            .default_text("public")
            .options(&["public", "private", "direct"]),
    ],
)
.references(&[ReferenceSpec::one(
    "kms_key",
    Target::OfParent {
        collection: KEY_MANAGEMENT,
        child: "keys",
        via: "kms",
    },
)])
.global();

pub static COS_KEY: EntitySpec = EntitySpec::list(
    "keys",
    &[
        FieldSpec::name(),
        FieldSpec::select("role")
            .default_text("Writer")
            .options(KEY_ROLES),
        FieldSpec::toggle("enable_hmac", false),
    ],
)
.global();

pub static COS: EntitySpec = EntitySpec::list(
    OBJECT_STORAGE,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::select("kms").groups(validators::kms_groups),
        FieldSpec::select("plan")
            .default_text("standard")
            .options(&["standard", "lite"]),
        FieldSpec::toggle("use_random_suffix", true),
        FieldSpec::toggle("use_data", false),
        FieldSpec::records("buckets"),
        FieldSpec::records("keys"),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("kms", Target::Collection(KEY_MANAGEMENT)),
])
.children(&[
    ChildSpec::new(&BUCKET).back_ref("cos"),
    ChildSpec::new(&COS_KEY).back_ref("cos"),
])
.cascade();

pub struct ObjectStorage;

impl EntityDefinition for ObjectStorage {
    fn spec(&self) -> &'static EntitySpec {
        &COS
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath, ValidationContext};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "key_management": [ { "name": "kms", "keys": [ { "name": "cos-key" } ] } ],
            "object_storage": [
                { "name": "cos", "kms": "kms", "buckets": [], "keys": [] },
                { "name": "plain", "kms": null, "buckets": [], "keys": [] },
            ],
        }))
        .unwrap()
    }

    #[test]
    fn encrypted_bucket_needs_key_from_instance_kms() {
        let doc = doc();
        let path: StorePath = "object_storage/cos/buckets".parse().unwrap();
        let data = json!({ "name": "flow-logs" });
        let issues = ObjectStorage
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "kms_key");

        let kms_key = BUCKET.field("kms_key").unwrap();
        let parent = doc.find(OBJECT_STORAGE, "cos");
        let ctx = FormContext::new(&doc, &path).with_parent(parent);
        assert_eq!(kms_key.groups_for(&Record::new(), &ctx), ["cos-key"]);
    }

    #[test]
    fn unencrypted_bucket_needs_no_key() {
        let doc = doc();
        let path: StorePath = "object_storage/plain/buckets".parse().unwrap();
        let data = json!({ "name": "logs" });
        let disabled = ObjectStorage
            .should_disable_save(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        assert!(!disabled);
    }
}
