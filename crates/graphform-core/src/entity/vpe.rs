// ── Virtual private endpoints ──

use super::definition::EntityDefinition;
use super::spec::{EntitySpec, ReferenceSpec, Target};
use super::{SECURITY_GROUPS, VIRTUAL_PRIVATE_ENDPOINTS, VPCS};
use crate::schema::{FieldSpec, validators};

/// Subnets of the record's own vpc.
pub(crate) const VPC_SUBNETS: Target = Target::ChildrenOf {
    collection: VPCS,
    child: "subnets",
    via: "vpc",
};

/// Security groups attached to the record's own vpc.
pub(crate) const VPC_SECURITY_GROUPS: Target = Target::Where {
    collection: SECURITY_GROUPS,
    field: "vpc",
    via: "vpc",
};

pub static VPE: EntitySpec = EntitySpec::list(
    VIRTUAL_PRIVATE_ENDPOINTS,
    &[
        FieldSpec::name(),
        FieldSpec::select("service")
            .default_text("cos")
            .required()
            .options(&["cos"]),
        FieldSpec::select("vpc")
            .required()
            .groups(validators::vpc_groups)
            .on_state_change(validators::clear_vpc_scoped),
        FieldSpec::multiselect("subnets")
            .required()
            .groups(validators::subnet_groups),
        FieldSpec::multiselect("security_groups").groups(validators::security_group_groups),
        FieldSpec::resource_group(),
    ],
)
.references(&[
    ReferenceSpec::resource_group(),
    ReferenceSpec::one("vpc", Target::Collection(VPCS)).clears(&["subnets", "security_groups"]),
    ReferenceSpec::many("subnets", VPC_SUBNETS),
    ReferenceSpec::many("security_groups", VPC_SECURITY_GROUPS),
]);

pub struct VirtualPrivateEndpoints;

impl EntityDefinition for VirtualPrivateEndpoints {
    fn spec(&self) -> &'static EntitySpec {
        &VPE
    }
}
