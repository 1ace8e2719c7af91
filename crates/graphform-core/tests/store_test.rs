// Integration tests for `ConfigStore`: the update cycle, reference repair,
// renames and resets, against small hand-built registries and the built-in
// topology catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use graphform_core::entity::{ReferenceSpec, Target};
use graphform_core::{
    ConfigStore, CoreError, CreateContext, DeleteContext, Document, EntityDefinition,
    EntityRegistry, EntitySpec, FieldSpec, FormSession, Record, RecordExt, SaveContext,
    StoreConfig, StorePath, ValidationContext,
};

// ── Helpers ─────────────────────────────────────────────────────────

static GROUP: EntitySpec = EntitySpec::list("groups", &[FieldSpec::name()]);

static RULE: EntitySpec = EntitySpec::list(
    "rules",
    &[
        FieldSpec::name(),
        FieldSpec::select("group"),
        FieldSpec::multiselect("members"),
    ],
)
.references(&[
    ReferenceSpec::one("group", Target::Collection("groups")),
    ReferenceSpec::many("members", Target::Collection("groups")),
]);

static OWNER: EntitySpec = EntitySpec::list("owners", &[FieldSpec::name()]);

static TEAM: EntitySpec =
    EntitySpec::list("teams", &[FieldSpec::name(), FieldSpec::select("owner")])
        .references(&[ReferenceSpec::one("owner", Target::Collection("owners"))]);

/// Policies pick teams of their own owner.
static POLICY: EntitySpec = EntitySpec::list(
    "policies",
    &[
        FieldSpec::name(),
        FieldSpec::text("owner"),
        FieldSpec::multiselect("teams"),
    ],
)
.references(&[ReferenceSpec::many(
    "teams",
    Target::Where {
        collection: "teams",
        field: "owner",
        via: "owner",
    },
)]);

struct Fixed(&'static EntitySpec);

impl EntityDefinition for Fixed {
    fn spec(&self) -> &'static EntitySpec {
        self.0
    }
}

struct Groups;

impl EntityDefinition for Groups {
    fn spec(&self) -> &'static EntitySpec {
        &GROUP
    }
}

struct Rules;

impl EntityDefinition for Rules {
    fn spec(&self) -> &'static EntitySpec {
        &RULE
    }
}

fn record(value: Value) -> Record {
    value.as_object().unwrap().clone()
}

fn minimal(document: Value) -> ConfigStore {
    let registry = EntityRegistry::new([
        Box::new(Groups) as Box<dyn EntityDefinition>,
        Box::new(Rules),
    ]);
    let document = Document::from_value(document).unwrap();
    ConfigStore::with_registry(StoreConfig::default(), registry, Some(document))
}

fn path(text: &str) -> StorePath {
    text.parse().unwrap()
}

fn create(store: &mut ConfigStore, at: &str, data: Value) {
    store
        .create(&path(at), record(data), &CreateContext::default())
        .unwrap();
}

/// Repairs are complete and a further pass changes nothing.
fn assert_settled(store: &mut ConfigStore) {
    assert_eq!(store.audit(), Vec::new());
    let before = store.document().clone();
    store.update();
    assert_eq!(store.document(), &before);
}

/// Catalog store with one vpc, two subnets, a security group and a server.
fn topology() -> ConfigStore {
    let mut store = ConfigStore::new(StoreConfig {
        prefix: "slz".into(),
        ..StoreConfig::default()
    });
    create(
        &mut store,
        "vpcs",
        json!({ "name": "management", "resource_group": "management-rg" }),
    );
    create(
        &mut store,
        "vpcs/management/subnets",
        json!({ "name": "vsi-zone-1", "cidr": "10.10.10.0/24", "zone": "1" }),
    );
    create(
        &mut store,
        "vpcs/management/subnets",
        json!({ "name": "vsi-zone-2", "cidr": "10.10.20.0/24", "zone": "2" }),
    );
    create(
        &mut store,
        "security_groups",
        json!({ "name": "management-sg", "vpc": "management", "resource_group": "management-rg" }),
    );
    create(
        &mut store,
        "vsi",
        json!({
            "name": "jump-box",
            "vpc": "management",
            "subnets": ["vsi-zone-1", "vsi-zone-2"],
            "security_groups": ["management-sg"],
            "encryption_key": "slz-key",
            "resource_group": "management-rg",
        }),
    );
    store
}

// ── Reference repair ────────────────────────────────────────────────

#[test]
fn deleting_a_target_nulls_scalar_references() {
    let mut store = minimal(json!({
        "groups": [{ "name": "a" }, { "name": "b" }],
        "rules": [{ "name": "r", "group": "a", "members": [] }],
    }));
    store
        .delete(&path("groups"), &DeleteContext::new("a"))
        .unwrap();

    assert_eq!(store.document().names("groups"), ["b"]);
    assert_eq!(store.records("rules").len(), 1);
    assert_eq!(store.records("rules")[0]["group"], Value::Null);
}

#[test]
fn list_references_are_filtered_in_order() {
    let store = minimal(json!({
        "groups": [{ "name": "x" }, { "name": "z" }],
        "rules": [{ "name": "r", "group": null, "members": ["z", "x", "y", "z"] }],
    }));
    assert_eq!(store.records("rules")[0]["members"], json!(["z", "x", "z"]));
}

#[test]
fn saving_under_a_taken_name_is_disabled() {
    let store = minimal(json!({
        "groups": [{ "name": "a" }, { "name": "b" }],
        "rules": [],
    }));
    let disabled = store
        .should_disable_save(
            &path("groups"),
            &record(json!({ "name": "a" })),
            &ValidationContext::editing("b"),
        )
        .unwrap();
    assert!(disabled);

    let unchanged = store
        .should_disable_save(
            &path("groups"),
            &record(json!({ "name": "b" })),
            &ValidationContext::editing("b"),
        )
        .unwrap();
    assert!(!unchanged);
}

#[test]
fn clear_policy_renames_decay_references() {
    let mut store = minimal(json!({
        "groups": [{ "name": "p1" }],
        "rules": [{ "name": "r", "group": "p1", "members": ["p1"] }],
    }));
    store
        .save(&path("groups"), record(json!({ "name": "p2" })), &SaveContext::new("p1"))
        .unwrap();
    assert_eq!(store.records("rules")[0]["group"], Value::Null);
    assert_eq!(store.records("rules")[0]["members"], json!([]));
}

#[test]
fn update_is_idempotent() {
    let mut store = minimal(json!({
        "groups": [{ "name": "x" }],
        "rules": [{ "name": "r", "group": "gone", "members": ["gone", "x"] }],
    }));
    let settled = store.document().clone();
    let repairs = store.update();
    assert!(repairs.iter().all(|r| r.changed == 0));
    assert_eq!(store.document(), &settled);
    assert_eq!(store.revision(), 1);
}

#[test]
fn subscriber_is_notified_once_per_mutation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut store = minimal(json!({ "groups": [], "rules": [] }));
    let counter = Arc::clone(&calls);
    store.set_update_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    create(&mut store, "groups", json!({ "name": "a" }));
    create(&mut store, "rules", json!({ "name": "r", "group": "a" }));
    store
        .delete(&path("groups"), &DeleteContext::new("a"))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.revision(), 3);
}

#[test]
fn registration_order_does_not_affect_settling() {
    let registry = EntityRegistry::new([
        Box::new(Fixed(&POLICY)) as Box<dyn EntityDefinition>,
        Box::new(Fixed(&TEAM)),
        Box::new(Fixed(&OWNER)),
    ]);
    let collections: Vec<&str> = registry.collections().collect();
    assert_eq!(collections, ["owners", "teams", "policies"]);

    let document = Document::from_value(json!({
        "owners": [{ "name": "o1" }, { "name": "o2" }],
        "teams": [{ "name": "g", "owner": "o1" }],
        "policies": [{ "name": "p", "owner": "o1", "teams": ["g"] }],
    }))
    .unwrap();
    let mut store = ConfigStore::with_registry(StoreConfig::default(), registry, Some(document));
    assert_settled(&mut store);

    store
        .delete(&path("owners"), &DeleteContext::new("o1"))
        .unwrap();
    assert_eq!(store.records("teams")[0]["owner"], Value::Null);
    assert_eq!(store.records("policies")[0]["teams"], json!([]));
    assert_settled(&mut store);
}

#[test]
fn records_without_a_key_are_refused() {
    let mut store = minimal(json!({ "groups": [], "rules": [] }));
    for data in [json!({}), json!({ "name": null }), json!({ "name": "  " })] {
        let err = store
            .create(&path("groups"), record(data), &CreateContext::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingKey { .. }), "{err}");
    }
    assert!(store.records("groups").is_empty());

    create(&mut store, "groups", json!({ "name": "a" }));
    let err = store
        .save(&path("groups"), record(json!({ "name": null })), &SaveContext::new("a"))
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingKey { .. }));
    assert_eq!(store.document().names("groups"), ["a"]);
}

// ── Catalog behaviour ───────────────────────────────────────────────

#[test]
fn fresh_catalog_store_has_no_findings() {
    let store = topology();
    assert!(store.audit().is_empty());
    let options = store.document().singleton("_options").unwrap();
    assert_eq!(options.str_field("prefix"), Some("slz"));
}

#[test]
fn cascade_rename_follows_a_vpc() {
    let mut store = topology();
    store
        .save(&path("vpcs"), record(json!({ "name": "edge" })), &SaveContext::new("management"))
        .unwrap();

    let doc = store.document();
    assert_eq!(doc.find("security_groups", "management-sg").unwrap().str_field("vpc"), Some("edge"));
    let server = doc.find("vsi", "jump-box").unwrap();
    assert_eq!(server.str_field("vpc"), Some("edge"));
    assert_eq!(server.str_list("subnets"), ["vsi-zone-1", "vsi-zone-2"]);
    let subnet = doc.find("vpcs", "edge").unwrap().records("subnets")[0].clone();
    assert_eq!(subnet["vpc"], json!("edge"));
    assert!(store.audit().is_empty());
}

#[test]
fn cascade_rename_follows_a_resource_group() {
    let mut store = topology();
    store
        .save(
            &path("resource_groups"),
            record(json!({ "name": "core-rg" })),
            &SaveContext::new("service-rg"),
        )
        .unwrap();
    let kms = store.document().find("key_management", "slz-kms").unwrap();
    assert_eq!(kms.str_field("resource_group"), Some("core-rg"));
}

#[test]
fn renaming_a_subnet_drops_it_from_servers() {
    let mut store = topology();
    store
        .save(
            &path("vpcs/management/subnets"),
            record(json!({ "name": "vsi-zone-9" })),
            &SaveContext::new("vsi-zone-2"),
        )
        .unwrap();
    let server = store.document().find("vsi", "jump-box").unwrap();
    assert_eq!(server.str_list("subnets"), ["vsi-zone-1"]);
}

#[test]
fn deleting_a_vpc_clears_dependents_and_children() {
    let mut store = topology();
    create(&mut store, "transit_gateways", json!({ "name": "tgw", "resource_group": "service-rg" }));
    create(&mut store, "transit_gateways/tgw/connections", json!({ "vpc": "management" }));

    store
        .delete(&path("vpcs"), &DeleteContext::new("management"))
        .unwrap();

    let doc = store.document();
    let server = doc.find("vsi", "jump-box").unwrap();
    assert_eq!(server.get("vpc"), Some(&Value::Null));
    assert_eq!(server.str_list("subnets"), Vec::<&str>::new());
    assert_eq!(server.str_list("security_groups"), Vec::<&str>::new());
    let tgw = doc.find("transit_gateways", "tgw").unwrap();
    assert!(tgw.records("connections").is_empty());
    assert!(store.audit().is_empty());
}

#[test]
fn subnet_names_are_unique_across_vpcs() {
    let mut store = topology();
    create(&mut store, "vpcs", json!({ "name": "workload", "resource_group": "workload-rg" }));
    let err = store
        .create(
            &path("vpcs/workload/subnets"),
            record(json!({ "name": "vsi-zone-1", "cidr": "10.40.10.0/24", "zone": "1" })),
            &CreateContext::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::NameConflict { .. }));
}

#[test]
fn reset_collection_restores_defaults() {
    let mut store = topology();
    create(&mut store, "resource_groups", json!({ "name": "edge-rg" }));
    assert_eq!(store.document().names("resource_groups").len(), 4);

    store.reset_collection("resource_groups").unwrap();
    assert_eq!(
        store.document().names("resource_groups"),
        ["service-rg", "management-rg", "workload-rg"]
    );
    store.reset_collection("vsi").unwrap();
    assert!(store.records("vsi").is_empty());

    let err = store.reset_collection("routers").unwrap_err();
    assert!(matches!(err, CoreError::UnknownCollection { .. }));
}

#[test]
fn moving_records_reorders_without_repair() {
    let mut store = topology();
    store.move_record(&path("resource_groups"), 2, 0).unwrap();
    assert_eq!(
        store.document().names("resource_groups"),
        ["workload-rg", "service-rg", "management-rg"]
    );
}

#[test]
fn form_session_round_trip() {
    let mut store = topology();
    let mut form = FormSession::create(&store, path("security_groups")).unwrap();
    form.set(&store, "name", json!("workload-sg")).unwrap();
    assert!(form.should_disable_save(&store).unwrap());

    form.set(&store, "vpc", json!("management")).unwrap();
    form.set(&store, "resource_group", json!("workload-rg")).unwrap();
    assert!(form.invalid_fields(&store).unwrap().is_empty());
    form.commit(&mut store).unwrap();

    assert_eq!(
        store.document().names("security_groups"),
        ["management-sg", "workload-sg"]
    );
}

#[test]
fn every_mutation_leaves_the_catalog_settled() {
    let mut store = topology();
    assert_settled(&mut store);

    create(
        &mut store,
        "security_groups",
        json!({ "name": "edge-sg", "vpc": "management", "resource_group": "management-rg" }),
    );
    assert_settled(&mut store);

    store
        .save(&path("vpcs"), record(json!({ "name": "edge" })), &SaveContext::new("management"))
        .unwrap();
    assert_settled(&mut store);

    store
        .save(
            &path("vpcs/edge/subnets"),
            record(json!({ "name": "vsi-zone-7" })),
            &SaveContext::new("vsi-zone-1"),
        )
        .unwrap();
    assert_settled(&mut store);

    store.move_record(&path("vpcs/edge/subnets"), 1, 0).unwrap();
    assert_settled(&mut store);

    store
        .delete(&path("security_groups"), &DeleteContext::new("management-sg"))
        .unwrap();
    assert_settled(&mut store);

    store
        .delete(&path("resource_groups"), &DeleteContext::new("management-rg"))
        .unwrap();
    assert_settled(&mut store);

    store.reset_collection("vpcs").unwrap();
    assert_settled(&mut store);
    let server = store.document().find("vsi", "jump-box").unwrap();
    assert_eq!(server.get("vpc"), Some(&Value::Null));
    assert!(store.records("security_groups").iter().all(|sg| sg["vpc"].is_null()));
}

#[test]
fn keyless_children_are_reported_invalid() {
    let mut store = topology();
    create(&mut store, "transit_gateways", json!({ "name": "tgw", "resource_group": "service-rg" }));
    let issues = store
        .invalid_fields(
            &path("transit_gateways/tgw/connections"),
            &record(json!({})),
            &ValidationContext::creating(),
        )
        .unwrap();
    assert!(issues.iter().any(|issue| issue.field == "vpc"), "{issues:?}");
}
