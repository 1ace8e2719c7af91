// ── Security groups ──

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::vpcs::{DIRECTIONS, PROTOCOLS};
use super::{SECURITY_GROUPS, VPCS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, validators};

fn invalid_icmp_type(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("type") && record.int_field("type").is_none_or(|t| !(0..=254).contains(&t))
}

fn invalid_icmp_code(record: &Record, _: &FormContext<'_>) -> bool {
    !record.is_blank("code") && record.int_field("code").is_none_or(|c| !(0..=255).contains(&c))
}

pub static SG_RULE: EntitySpec = EntitySpec::list(
    "rules",
    &[
        FieldSpec::name(),
        FieldSpec::select("direction")
            .default_text("inbound")
            .options(DIRECTIONS),
        FieldSpec::text("source")
            .required()
            .invalid(validators::invalid_source, "Source must be an IP address or CIDR block"),
        FieldSpec::select("protocol")
            .default_text("all")
            .options(PROTOCOLS),
        FieldSpec::number("port_min")
            .hide_when(validators::hide_ports)
            .invalid(validators::invalid_port_min, "Port must be between 1 and 65535"),
        FieldSpec::number("port_max").hide_when(validators::hide_ports).invalid(
            validators::invalid_port_max,
            "Port must be between 1 and 65535 and not below the minimum",
        ),
        FieldSpec::number("type")
            .hide_when(validators::hide_icmp)
            .invalid(invalid_icmp_type, "ICMP type must be between 0 and 254"),
        FieldSpec::number("code")
            .hide_when(validators::hide_icmp)
            .invalid(invalid_icmp_code, "ICMP code must be between 0 and 255"),
    ],
);

pub static SECURITY_GROUP: EntitySpec = EntitySpec::list(
    SECURITY_GROUPS,
    &[
        FieldSpec::name(),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups),
        FieldSpec::resource_group(),
        FieldSpec::records("rules"),
    ],
)
.references(&[
    ReferenceSpec::one("vpc", Target::Collection(VPCS)),
    ReferenceSpec::resource_group(),
])
.children(&[ChildSpec::new(&SG_RULE).back_ref("sg").inherit(&["vpc"])])
.cascade();

pub struct SecurityGroups;

impl EntityDefinition for SecurityGroups {
    fn spec(&self) -> &'static EntitySpec {
        &SECURITY_GROUP
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath, ValidationContext};
    use serde_json::json;

    #[test]
    fn icmp_fields_only_checked_for_icmp() {
        let doc = Document::from_value(json!({
            "security_groups": [ { "name": "sg", "vpc": "v", "rules": [] } ],
        }))
        .unwrap();
        let path: StorePath = "security_groups/sg/rules".parse().unwrap();
        let tcp = json!({ "name": "r", "source": "10.0.0.0/8", "protocol": "tcp", "type": 999 });
        assert!(!SecurityGroups
            .should_disable_save(&doc, &path, tcp.as_object().unwrap(), &ValidationContext::creating())
            .unwrap());
        let icmp = json!({ "name": "r", "source": "10.0.0.0/8", "protocol": "icmp", "type": 999 });
        assert!(SecurityGroups
            .should_disable_save(&doc, &path, icmp.as_object().unwrap(), &ValidationContext::creating())
            .unwrap());
    }
}
