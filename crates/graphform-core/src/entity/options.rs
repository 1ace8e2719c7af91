// ── Global options ──
//
// The `_options` singleton: naming prefix, region and zone count. Seeded
// from `StoreConfig` rather than from field defaults.

use serde_json::json;

use super::definition::EntityDefinition;
use super::spec::EntitySpec;
use super::{OPTIONS, seeded};
use crate::model::{Document, FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns};
use crate::store::StoreConfig;

/// Regions a topology can be deployed to.
pub const REGIONS: &[&str] = &[
    "au-syd", "br-sao", "ca-tor", "eu-de", "eu-es", "eu-gb", "jp-osa", "jp-tok", "us-east",
    "us-south",
];

pub const ENDPOINTS: &[&str] = &["private", "public", "public-and-private"];

const MAX_PREFIX_LEN: usize = 16;

fn invalid_prefix(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("prefix")
        .is_some_and(|p| p.len() > MAX_PREFIX_LEN || !patterns::is_valid_name(p))
}

fn invalid_zones(record: &Record, _: &FormContext<'_>) -> bool {
    record.int_field("zones").is_none_or(|z| !(1..=3).contains(&z))
}

fn invalid_tags(record: &Record, _: &FormContext<'_>) -> bool {
    !record.str_list("tags").into_iter().all(patterns::is_tag)
}

pub static OPTIONS_SPEC: EntitySpec = EntitySpec::singleton(
    OPTIONS,
    &[
        FieldSpec::text("prefix").required().invalid(
            invalid_prefix,
            "Prefix must be a valid name of at most 16 characters",
        ),
        FieldSpec::select("region")
            .default_text("us-south")
            .required()
            .options(REGIONS),
        FieldSpec::number("zones")
            .default_int(3)
            .invalid(invalid_zones, "Zones must be 1, 2 or 3"),
        FieldSpec::multiselect("tags").invalid(
            invalid_tags,
            "Tags may contain letters, numbers, spaces and :_.- only",
        ),
        FieldSpec::select("endpoints")
            .default_text("private")
            .options(ENDPOINTS),
        FieldSpec::toggle("dynamic_subnets", false),
        FieldSpec::text("account_id"),
    ],
);

pub struct Options;

impl EntityDefinition for Options {
    fn spec(&self) -> &'static EntitySpec {
        &OPTIONS_SPEC
    }

    fn init(&self, doc: &mut Document, config: &StoreConfig) {
        let seed = json!({
            "prefix": config.prefix,
            "region": config.region,
            "zones": config.zones,
            "tags": config.tags,
            "endpoints": config.endpoints,
        });
        doc.set(OPTIONS, seeded(&OPTIONS_SPEC, seed));
    }
}

/// Configured zone count, defaulting to three.
pub fn zones(doc: &Document) -> i64 {
    doc.singleton(OPTIONS)
        .and_then(|options| options.int_field("zones"))
        .unwrap_or(3)
}

/// Configured name prefix, if any.
pub fn prefix(doc: &Document) -> Option<&str> {
    doc.singleton(OPTIONS)
        .and_then(|options| options.str_field("prefix"))
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{StorePath, ValidationContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn init_seeds_from_config() {
        let mut doc = Document::new();
        let config = StoreConfig {
            prefix: "slz".into(),
            region: "eu-de".into(),
            zones: 2,
            ..StoreConfig::default()
        };
        Options.init(&mut doc, &config);
        let options = doc.singleton(OPTIONS).unwrap();
        assert_eq!(options.str_field("prefix"), Some("slz"));
        assert_eq!(options.str_field("region"), Some("eu-de"));
        assert_eq!(zones(&doc), 2);
        assert!(!options.bool_field("dynamic_subnets"));
    }

    #[test]
    fn prefix_and_zone_rules() {
        let mut doc = Document::new();
        Options.init(&mut doc, &StoreConfig::default());
        let path = StorePath::collection(OPTIONS);
        let data = json!({ "prefix": "this-prefix-is-far-too-long", "zones": 4 });
        let issues = Options
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, ["prefix", "zones"]);
    }
}
