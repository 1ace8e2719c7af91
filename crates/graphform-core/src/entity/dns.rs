// ── Private DNS ──
//
// A DNS instance owns zones, records and custom resolvers. Zones are
// named by domain rather than resource name, and records point at a
// sibling zone of the same instance.

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::vpe::VPC_SUBNETS;
use super::{DNS, VPCS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};
use crate::views;

pub const RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "PTR", "SRV", "TXT"];

fn invalid_domain(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .name()
        .is_some_and(|name| !patterns::is_domain(name))
}

fn invalid_ttl(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .int_field("ttl")
        .is_none_or(|ttl| !(60..=86_400).contains(&ttl))
}

fn zone_groups(_: &Record, ctx: &FormContext<'_>) -> Vec<String> {
    ctx.parent
        .map(|dns| {
            views::names_in(dns.records("zones"))
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub static ZONE: EntitySpec = EntitySpec::list(
    "zones",
    &[
        FieldSpec::text("name")
            .required()
            .invalid(invalid_domain, "Zone name must be a valid domain, such as example.com"),
        FieldSpec::text("label"),
        FieldSpec::textarea("description"),
        FieldSpec::multiselect("permitted_networks").groups(validators::vpc_groups),
    ],
)
.references(&[ReferenceSpec::many("permitted_networks", Target::Collection(VPCS))]);

pub static RECORD: EntitySpec = EntitySpec::list(
    "records",
    &[
        FieldSpec::name(),
        FieldSpec::select("dns_zone").required().groups(zone_groups),
        FieldSpec::select("type")
            .default_text("A")
            .required()
            .options(RECORD_TYPES),
        FieldSpec::text("rdata").required(),
        FieldSpec::number("ttl")
            .default_int(300)
            .invalid(invalid_ttl, "TTL must be between 60 and 86400 seconds"),
        FieldSpec::select("vpc").groups(validators::vpc_groups),
    ],
)
.references(&[
    ReferenceSpec::one("dns_zone", Target::Siblings("zones")),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)),
]);

pub static RESOLVER: EntitySpec = EntitySpec::list(
    "custom_resolvers",
    &[
        FieldSpec::name(),
        FieldSpec::textarea("description"),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::subnet_groups),
    ],
)
.references(&[
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnets"]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
]);

pub static DNS_SPEC: EntitySpec = EntitySpec::list(
    DNS,
    &[
        FieldSpec::name(),
        FieldSpec::select("plan")
            .default_text("standard")
            .options(&["free", "standard"]),
        FieldSpec::resource_group(),
        FieldSpec::records("zones"),
        FieldSpec::records("records"),
        FieldSpec::records("custom_resolvers"),
    ],
)
.references(&[ReferenceSpec::resource_group()])
.children(&[
    ChildSpec::new(&ZONE).back_ref("dns"),
    ChildSpec::new(&RECORD).back_ref("dns"),
    ChildSpec::new(&RESOLVER).back_ref("dns"),
]);

pub struct Dns;

impl EntityDefinition for Dns {
    fn spec(&self) -> &'static EntitySpec {
        &DNS_SPEC
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath};
    use serde_json::json;

    #[test]
    fn zone_names_are_domains() {
        let doc = Document::new();
        let path: StorePath = "dns/*/zones".parse().unwrap();
        let ctx = FormContext::new(&doc, &path);
        let mut zone = json!({ "name": "slz.example.com" }).as_object().unwrap().clone();
        assert!(crate::schema::invalid_fields(ZONE.fields, &zone, &ctx).is_empty());

        zone.insert("name".into(), json!("not_a_domain"));
        let issues = crate::schema::invalid_fields(ZONE.fields, &zone, &ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "name");
    }
}
