// ── Kubernetes / OpenShift clusters ──
//
// Worker pools inherit the cluster's vpc and resource group and may only
// use subnets the cluster itself spans.

use super::definition::EntityDefinition;
use super::spec::{ChildSpec, EntitySpec, ReferenceSpec, Target};
use super::vpe::VPC_SUBNETS;
use super::{CLUSTERS, KEY_MANAGEMENT, OBJECT_STORAGE, VPCS};
use crate::model::{FormContext, Record, RecordExt};
use crate::schema::{FieldSpec, patterns, validators};

pub const OPENSHIFT: &str = "openshift";

fn not_openshift(record: &Record, _: &FormContext<'_>) -> bool {
    record.str_field("kube_type") != Some(OPENSHIFT)
}

/// OpenShift clusters need object storage for their internal registry.
fn missing_registry_cos(record: &Record, ctx: &FormContext<'_>) -> bool {
    !not_openshift(record, ctx) && record.is_blank("cos")
}

fn invalid_workers(record: &Record, ctx: &FormContext<'_>) -> bool {
    let Some(per_subnet) = record.int_field("workers_per_subnet") else {
        return true;
    };
    if per_subnet < 1 {
        return true;
    }
    let subnets = i64::try_from(record.str_list("subnets").len()).unwrap_or(i64::MAX);
    !not_openshift(record, ctx) && subnets > 0 && per_subnet.saturating_mul(subnets) < 2
}

fn workers_text(record: &Record, _: &FormContext<'_>) -> String {
    match record.int_field("workers_per_subnet") {
        Some(n) if n >= 1 => "OpenShift clusters need at least two workers".to_owned(),
        _ => "Workers per subnet must be at least 1".to_owned(),
    }
}

fn invalid_kube_version(record: &Record, _: &FormContext<'_>) -> bool {
    record
        .str_field("kube_version")
        .is_some_and(|v| !v.is_empty() && !patterns::is_kube_version(v))
}

fn invalid_pool_workers(record: &Record, _: &FormContext<'_>) -> bool {
    record.int_field("workers_per_subnet").is_none_or(|n| n < 1)
}

pub static WORKER_POOL: EntitySpec = EntitySpec::list(
    "worker_pools",
    &[
        FieldSpec::name(),
        FieldSpec::text("flavor").default_text("bx2.16x64").required(),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::parent_subnet_groups),
        FieldSpec::number("workers_per_subnet")
            .default_int(2)
            .invalid(invalid_pool_workers, "Workers per subnet must be at least 1"),
    ],
)
.references(&[ReferenceSpec::many("subnets", Target::ParentList("subnets"))]);

pub static CLUSTER: EntitySpec = EntitySpec::list(
    CLUSTERS,
    &[
        FieldSpec::name(),
        FieldSpec::resource_group(),
        FieldSpec::select("kms")
            .groups(validators::kms_groups)
            .on_state_change(validators::clear_encryption_key),
        FieldSpec::select("encryption_key").groups(validators::kms_key_groups),
        FieldSpec::select("cos")
            .groups(validators::cos_groups)
            .hide_when(not_openshift)
            .invalid(missing_registry_cos, "OpenShift clusters require object storage"),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::subnet_groups),
        FieldSpec::number("workers_per_subnet")
            .default_int(2)
            .invalid_with(invalid_workers, workers_text),
        FieldSpec::text("flavor").default_text("bx2.16x64").required(),
        FieldSpec::select("kube_type")
            .default_text(OPENSHIFT)
            .options(&[OPENSHIFT, "iks"]),
        FieldSpec::text("kube_version")
            .invalid(invalid_kube_version, "Invalid Kubernetes version"),
        FieldSpec::toggle("update_all_workers", false),
        FieldSpec::toggle("private_endpoint", true),
        FieldSpec::records("worker_pools"),
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
    ReferenceSpec::one("cos", Target::Collection(OBJECT_STORAGE)),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnets"]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
])
.children(&[ChildSpec::new(&WORKER_POOL)
    .back_ref("cluster")
    .inherit(&["vpc", "resource_group"])]);

pub struct Clusters;

impl EntityDefinition for Clusters {
    fn spec(&self) -> &'static EntitySpec {
        &CLUSTER
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Document, StorePath, ValidationContext};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn issues(data: serde_json::Value) -> Vec<String> {
        let doc = Document::from_value(json!({ "clusters": [] })).unwrap();
        let path = StorePath::collection(CLUSTERS);
        Clusters
            .invalid_fields(&doc, &path, data.as_object().unwrap(), &ValidationContext::creating())
            .unwrap()
            .into_iter()
            .map(|issue| issue.field)
            .collect()
    }

    #[test]
    fn openshift_needs_cos_and_two_workers() {
        let found = issues(json!({
            "name": "workload", "resource_group": "rg", "vpc": "v",
            "subnets": ["a"], "workers_per_subnet": 1,
        }));
        assert_eq!(found, ["cos", "workers_per_subnet"]);
    }

    #[test]
    fn iks_hides_cos_and_allows_one_worker() {
        let found = issues(json!({
            "name": "workload", "resource_group": "rg", "vpc": "v",
            "subnets": ["a"], "workers_per_subnet": 1, "kube_type": "iks",
        }));
        assert!(found.is_empty());
    }
}
