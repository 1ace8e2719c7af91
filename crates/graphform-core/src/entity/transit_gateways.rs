// ── Transit gateways ──
//
// Connections are keyed by the vpc they attach rather than by a name, so
// a connection disappears with its vpc instead of lingering with a
// cleared key.

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::{TRANSIT_GATEWAYS, VPCS};
use crate::schema::{FieldSpec, validators};

pub static TGW_CONNECTION: EntitySpec = EntitySpec::list(
    "connections",
    &[FieldSpec::select("vpc")
        .required()
        .groups(validators::vpc_groups)],
)
.references(&[ReferenceSpec::one("vpc", Target::Collection(VPCS))])
.keyed_by("vpc");

pub static TRANSIT_GATEWAY: EntitySpec = EntitySpec::list(
    TRANSIT_GATEWAYS,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::toggle("global", false),
        FieldSpec::records("connections"),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.children(&[ChildSpec::new(&TGW_CONNECTION).back_ref("tgw")]);

pub struct TransitGateways;

impl EntityDefinition for TransitGateways {
    fn spec(&self) -> &'static EntitySpec {
        &TRANSIT_GATEWAY
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::model::{CreateContext, Document, StorePath};
    use serde_json::json;

    #[test]
    fn connections_are_unique_per_vpc() {
        let mut doc = Document::from_value(json!({
            "transit_gateways": [ { "name": "tgw", "connections": [ { "vpc": "management" } ] } ],
        }))
        .unwrap();
        let path: StorePath = "transit_gateways/tgw/connections".parse().unwrap();
        let again = json!({ "vpc": "management" }).as_object().unwrap().clone();
        let err = TransitGateways
            .create(&mut doc, &path, again, &CreateContext::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
    }
}
