// ── App ID ──

use super::APPID;
use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec};
use crate::schema::FieldSpec;

pub static APPID_KEY: EntitySpec = EntitySpec::list("keys", &[FieldSpec::name()]);

pub static APPID_SPEC: EntitySpec = EntitySpec::list(
    APPID,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::toggle("use_data", false),
        FieldSpec::records("keys"),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.children(&[ChildSpec::new(&APPID_KEY).back_ref("appid")]);

pub struct AppId;

impl EntityDefinition for AppId {
    fn spec(&self) -> &'static EntitySpec {
        &APPID_SPEC
    }
}
