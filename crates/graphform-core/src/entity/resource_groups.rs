// ── Resource groups ──

use serde_json::{Value, json};

use super::definition::EntityDefinition;
use super::spec::EntitySpec;
use super::{RESOURCE_GROUPS, seeded};
use crate::model::Document;
use crate::schema::FieldSpec;
use crate::store::StoreConfig;

pub static RESOURCE_GROUP: EntitySpec = EntitySpec::list(
    RESOURCE_GROUPS,
    &[
        FieldSpec::name(),
        FieldSpec::toggle("use_prefix", true),
        FieldSpec::toggle("use_data", false),
    ],
)
.cascade();

/// Groups every fresh topology starts with.
pub const DEFAULT_GROUPS: &[&str] = &["service-rg", "management-rg", "workload-rg"];

pub struct ResourceGroups;

impl EntityDefinition for ResourceGroups {
    fn spec(&self) -> &'static EntitySpec {
        &RESOURCE_GROUP
    }

    fn init(&self, doc: &mut Document, _: &StoreConfig) {
        let groups = DEFAULT_GROUPS
            .iter()
            .map(|name| seeded(&RESOURCE_GROUP, json!({ "name": name })))
            .collect();
        doc.set(RESOURCE_GROUPS, Value::Array(groups));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{CreateContext, RecordExt, StorePath};
    use pretty_assertions::assert_eq;

    #[test]
    fn init_resets_to_default_groups() {
        let mut doc = Document::new();
        ResourceGroups.init(&mut doc, &StoreConfig::default());
        let path = StorePath::collection(RESOURCE_GROUPS);
        let extra = json!({ "name": "edge-rg" }).as_object().unwrap().clone();
        ResourceGroups
            .create(&mut doc, &path, extra, &CreateContext::default())
            .unwrap();
        assert_eq!(doc.names(RESOURCE_GROUPS).len(), 4);

        ResourceGroups.init(&mut doc, &StoreConfig::default());
        assert_eq!(doc.names(RESOURCE_GROUPS), DEFAULT_GROUPS);
        let first = doc.find(RESOURCE_GROUPS, "service-rg").unwrap();
        assert!(first.bool_field("use_prefix"));
    }
}
