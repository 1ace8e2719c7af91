// ── SSH keys ──

use serde_json::Value;

use super::SSH_KEYS;
use super::definition::EntityDefinition;
use super::spec::{EntitySpec, ReferenceSpec};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};

/// Public key value for keys that are looked up rather than created.
pub const FROM_DATA: &str = "NONE";

fn uses_data(record: &Record, _: &FormContext<'_>) -> bool {
    record.bool_field("use_data")
}

/// Another key already carries the same public key material.
fn duplicate_public_key(record: &Record, ctx: &FormContext<'_>) -> bool {
    let Some(key) = record.str_field("public_key").map(str::trim) else {
        return false;
    };
    ctx.document
        .record_maps(SSH_KEYS)
        .filter(|other| other.name() != ctx.original_name && other.name() != record.name())
        .filter_map(|other| other.str_field("public_key"))
        .any(|other| other.trim() == key)
}

fn invalid_public_key(record: &Record, ctx: &FormContext<'_>) -> bool {
    let malformed = record
        .str_field("public_key")
        .is_some_and(|key| !patterns::is_ssh_public_key(key));
    malformed || duplicate_public_key(record, ctx)
}

fn public_key_text(record: &Record, ctx: &FormContext<'_>) -> String {
    if duplicate_public_key(record, ctx) {
        "Public key already in use".to_owned()
    } else {
        "Public key must be a valid ssh-rsa or ssh-ed25519 key".to_owned()
    }
}

/// Keys read from existing data carry no key material.
fn toggle_use_data(record: &mut Record, _: &FormContext<'_>, value: &Value) {
    if value.as_bool() == Some(true) {
        record.insert("public_key".to_owned(), Value::String(FROM_DATA.to_owned()));
    } else if record.str_field("public_key") == Some(FROM_DATA) {
        record.insert("public_key".to_owned(), Value::Null);
    }
}

pub static SSH_KEY: EntitySpec = EntitySpec::list(
    SSH_KEYS,
    &[
        FieldSpec::name(),
        FieldSpec::textarea("public_key")
            .required()
            .invalid_with(invalid_public_key, public_key_text)
            .hide_when(uses_data),
        FieldSpec::select("resource_group").groups(validators::resource_group_groups),
        FieldSpec::toggle("use_data", false).on_state_change(toggle_use_data),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.cascade();

pub struct SshKeys;

impl EntityDefinition for SshKeys {
    fn spec(&self) -> &'static EntitySpec {
        &SSH_KEY
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath, ValidationContext};
    use serde_json::json;

    const KEY: &str = "ssh-rsa AAAAB3NzaC1yc2E= ops@bastion";

    fn doc() -> Document {
        Document::from_value(json!({
            "ssh_keys": [ { "name": "ops", "public_key": KEY, "use_data": false } ],
        }))
        .unwrap()
    }

    #[test]
    fn public_keys_are_unique() {
        let doc = doc();
        let path = StorePath::collection(SSH_KEYS);
        let data = json!({ "name": "other", "public_key": KEY });
        let issues = SshKeys
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        insta::assert_snapshot!(issues[0].text, @"Public key already in use");

        let same = json!({ "name": "ops", "public_key": KEY });
        assert!(!SshKeys
            .should_disable_save(&doc, &path, same.as_object().unwrap(), &ValidationContext::editing("ops"))
            .unwrap());
    }

    #[test]
    fn use_data_replaces_key_material() {
        let doc = doc();
        let path = StorePath::collection(SSH_KEYS);
        let ctx = FormContext::new(&doc, &path);
        let mut record = json!({ "public_key": KEY }).as_object().unwrap().clone();
        toggle_use_data(&mut record, &ctx, &json!(true));
        assert_eq!(record.str_field("public_key"), Some(FROM_DATA));
        toggle_use_data(&mut record, &ctx, &json!(false));
        assert!(record.is_blank("public_key"));
    }
}
