// ── Secrets manager ──

use super::definition::EntityDefinition;
use super::spec::{EntitySpec, ReferenceSpec, Target};
use super::{KEY_MANAGEMENT, SECRETS_MANAGER};
use crate::schema::{FieldSpec, validators};

pub static SECRETS: EntitySpec = EntitySpec::list(
    SECRETS_MANAGER,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::select("kms")
            .required()
            .groups(validators::kms_groups)
            .on_state_change(validators::clear_encryption_key),
        FieldSpec::select("encryption_key")
            .required()
            .groups(validators::kms_key_groups),
        FieldSpec::select("plan")
            .default_text("standard")
            .options(&["standard", "trial"]),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("kms", Target::Collection(KEY_MANAGEMENT)).clears(&["encryption_key"]),
    ReferenceSpec::one(
        "encryption_key",
        Target::ChildrenOf {
            collection: KEY_MANAGEMENT,
            child: "keys",
            via: "kms",
        },
    ),
]);

pub struct SecretsManager;

impl EntityDefinition for SecretsManager {
    fn spec(&self) -> &'static EntitySpec {
        &SECRETS
    }
}
