// ── Key management ──
//
// Key-protect style instances and the encryption keys they own. Key
// names are unique across every instance so that a bare key name is a
// usable reference from volumes, clusters and buckets.

use serde_json::{Value, json};

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec};
use super::{KEY_MANAGEMENT, seeded};
use crate::model::{Document, FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns};
use crate::store::StoreConfig;

fn invalid_key_ring(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("key_ring")
        .is_some_and(|ring| !ring.is_empty() && !patterns::is_valid_name(ring))
}

fn invalid_rotation(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .int_field("rotation")
        .is_none_or(|months| !(1..=12).contains(&months))
}

pub static KEY: EntitySpec = EntitySpec::list(
    "keys",
    &[
        FieldSpec::name(),
        FieldSpec::toggle("root_key", true),
        FieldSpec::text("key_ring").invalid(invalid_key_ring, "Invalid key ring name"),
        FieldSpec::toggle("force_delete", true),
        FieldSpec::select("endpoint")
            .default_text("private")
            .options(&["private", "public"]),
        FieldSpec::number("rotation").default_int(1).invalid(
            invalid_rotation,
            "Rotation interval must be between 1 and 12 months",
        ),
        FieldSpec::toggle("dual_auth_delete", false),
    ],
)
.global()
.cascade();

pub static KMS: EntitySpec = EntitySpec::list(
    KEY_MANAGEMENT,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::toggle("use_hs_crypto", false),
        FieldSpec::toggle("use_data", false),
        FieldSpec::toggle("authorize_vpc_reader_role", true),
        FieldSpec::records("keys"),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.children(&[ChildSpec::new(&KEY).back_ref("kms")])
.cascade();

pub struct KeyManagement;

impl EntityDefinition for KeyManagement {
    fn spec(&self) -> &'static EntitySpec {
        &KMS
    }

    fn init(&self, doc: &mut Document, _: &StoreConfig) {
        let key = seeded(&KEY, json!({ "name": "slz-key", "key_ring": "slz-ring" }));
        let kms = seeded(
            &KMS,
            json!({ "name": "slz-kms", "resource_group": "service-rg", "keys": [key] }),
        );
        doc.set(KEY_MANAGEMENT, Value::Array(vec![kms]));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{StorePath, ValidationContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn seeded_instance_owns_a_key() {
        let mut doc = Document::new();
        KeyManagement.init(&mut doc, &StoreConfig::default());
        let kms = doc.find(KEY_MANAGEMENT, "slz-kms").unwrap();
        assert_eq!(kms.records("keys").len(), 1);
        assert!(kms.bool_field("authorize_vpc_reader_role"));
    }

    #[test]
    fn key_names_are_unique_across_instances() {
        let mut doc = Document::new();
        KeyManagement.init(&mut doc, &StoreConfig::default());
        let first = doc.find(KEY_MANAGEMENT, "slz-kms").unwrap().clone();
        let other = seeded(&KMS, json!({ "name": "other-kms", "resource_group": "service-rg" }));
        doc.set(KEY_MANAGEMENT, json!([first, other]));

        let path: StorePath = "key_management/other-kms/keys".parse().unwrap();
        let data = json!({ "name": "slz-key" });
        let disabled = KeyManagement
            .should_disable_save(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        assert!(disabled);
    }

    #[test]
    fn rotation_range() {
        let mut doc = Document::new();
        KeyManagement.init(&mut doc, &StoreConfig::default());
        let path: StorePath = "key_management/slz-kms/keys".parse().unwrap();
        let data = json!({ "name": "new-key", "rotation": 13 });
        let issues = KeyManagement
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "rotation");
    }
}
