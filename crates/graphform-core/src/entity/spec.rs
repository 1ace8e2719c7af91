// ── Entity specifications ──
//
// Static, declarative description of one entity type: its fields, the
// references it holds into other lists, the child lists it owns, and the
// policies the store applies on rename and uniqueness. Everything here is
// read-only data; the reconciler and the default `EntityDefinition`
// methods are driven by it.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::{Document, FormContext, NAME, Record, RecordExt, StorePath};
use crate::schema::{self, FieldSpec};
use crate::views;

/// Normalization hook run by the reconciler after references are repaired.
pub type NormalizeFn = fn(&mut Record, &FormContext<'_>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Ordered list of records.
    List,
    /// A single settings record.
    Singleton,
}

/// What happens to references when a record is renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Every reference holding the old name is rewritten to the new one.
    Cascade,
    /// References to the old name decay and are cleared by reconciliation.
    Clear,
}

/// Scope in which record keys must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Uniqueness {
    /// Unique within the owning list.
    WithinParent,
    /// Unique across every list of the same shape (all subnets of all vpcs).
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Scalar: cleared to the sentinel when it stops resolving.
    One,
    /// List: filtered, survivors keep their order.
    Many,
}

/// Where the valid names of a reference come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Names of a top-level collection.
    Collection(&'static str),
    /// Every child in list `child` across all records of `collection`.
    AllChildren {
        collection: &'static str,
        child: &'static str,
    },
    /// Children of the `collection` record named by this record's `via`.
    ChildrenOf {
        collection: &'static str,
        child: &'static str,
        via: &'static str,
    },
    /// Children of the `collection` record named by the parent's `via`.
    OfParent {
        collection: &'static str,
        child: &'static str,
        via: &'static str,
    },
    /// Children in list `child` of this record's parent.
    Siblings(&'static str),
    /// Values held in the parent's list field.
    ParentList(&'static str),
    /// Records of `collection` whose `field` equals this record's `via`.
    Where {
        collection: &'static str,
        field: &'static str,
        via: &'static str,
    },
}

impl Target {
    /// Names this target currently resolves to.
    pub fn names<'a>(
        &self,
        doc: &'a Document,
        record: &Record,
        parent: Option<&'a Record>,
    ) -> Vec<&'a str> {
        match *self {
            Self::Collection(collection) => doc.names(collection),
            Self::AllChildren { collection, child } => {
                views::all_child_names(doc, collection, child)
            }
            Self::ChildrenOf {
                collection,
                child,
                via,
            } => record
                .str_field(via)
                .map(|owner| views::child_names(doc, collection, owner, child))
                .unwrap_or_default(),
            Self::OfParent {
                collection,
                child,
                via,
            } => parent
                .and_then(|p| p.str_field(via))
                .map(|owner| views::child_names(doc, collection, owner, child))
                .unwrap_or_default(),
            Self::Siblings(child) => parent
                .map(|p| views::names_in(p.records(child)))
                .unwrap_or_default(),
            Self::ParentList(field) => parent.map(|p| p.str_list(field)).unwrap_or_default(),
            Self::Where {
                collection,
                field,
                via,
            } => record
                .str_field(via)
                .map(|value| views::names_where(doc, collection, field, value))
                .unwrap_or_default(),
        }
    }

    /// Shape of the list the names are drawn from, given the shape of the
    /// referencing record's own list. `None` when the target is not a list
    /// of keyed records.
    pub fn shape(&self, referrer: &str) -> Option<String> {
        match *self {
            Self::Collection(collection) | Self::Where { collection, .. } => {
                Some(collection.to_owned())
            }
            Self::AllChildren { collection, child }
            | Self::ChildrenOf {
                collection, child, ..
            }
            | Self::OfParent {
                collection, child, ..
            } => Some(format!("{collection}/*/{child}")),
            Self::Siblings(child) => referrer
                .rsplit_once("/*/")
                .map(|(parent, _)| format!("{parent}/*/{child}")),
            Self::ParentList(_) => None,
        }
    }

    /// Top-level collection the names are drawn from. `None` for targets
    /// local to the referencing record's parent.
    pub fn collection(&self) -> Option<&'static str> {
        match *self {
            Self::Collection(collection)
            | Self::AllChildren { collection, .. }
            | Self::ChildrenOf { collection, .. }
            | Self::OfParent { collection, .. }
            | Self::Where { collection, .. } => Some(collection),
            Self::Siblings(_) | Self::ParentList(_) => None,
        }
    }
}

/// One reference field on an entity.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSpec {
    pub field: &'static str,
    pub target: Target,
    pub cardinality: Cardinality,
    /// Fields cleared whenever this scalar reference is invalidated.
    pub dependents: &'static [&'static str],
    /// Fixed values accepted besides resolvable names.
    pub literals: &'static [&'static str],
}

impl ReferenceSpec {
    pub const fn one(field: &'static str, target: Target) -> Self {
        Self {
            field,
            target,
            cardinality: Cardinality::One,
            dependents: &[],
            literals: &[],
        }
    }

    pub const fn many(field: &'static str, target: Target) -> Self {
        Self {
            cardinality: Cardinality::Many,
            ..Self::one(field, target)
        }
    }

    /// The standard `resource_group` reference.
    pub const fn resource_group() -> Self {
        Self::one("resource_group", Target::Collection(super::RESOURCE_GROUPS))
    }

    pub const fn clears(self, dependents: &'static [&'static str]) -> Self {
        Self { dependents, ..self }
    }

    pub const fn allow(self, literals: &'static [&'static str]) -> Self {
        Self { literals, ..self }
    }

    pub fn accepts(&self, value: &str, names: &[&str]) -> bool {
        self.literals.iter().any(|literal| *literal == value) || names.iter().any(|name| *name == value)
    }
}

/// An owned child list.
#[derive(Debug, Clone, Copy)]
pub struct ChildSpec {
    pub entity: &'static EntitySpec,
    /// Child field set to the parent's key.
    pub back_ref: Option<&'static str>,
    /// Fields copied verbatim from the parent.
    pub inherit: &'static [&'static str],
}

impl ChildSpec {
    pub const fn new(entity: &'static EntitySpec) -> Self {
        Self {
            entity,
            back_ref: None,
            inherit: &[],
        }
    }

    pub const fn back_ref(self, field: &'static str) -> Self {
        Self {
            back_ref: Some(field),
            ..self
        }
    }

    pub const fn inherit(self, fields: &'static [&'static str]) -> Self {
        Self {
            inherit: fields,
            ..self
        }
    }

    /// List field on the parent record.
    pub fn field(&self) -> &'static str {
        self.entity.name
    }
}

/// Declarative description of one entity type.
#[derive(Clone, Copy)]
pub struct EntitySpec {
    /// Collection name, or the list field name for child entities.
    pub name: &'static str,
    pub shape: Shape,
    /// Field that identifies a record within its list.
    pub key: &'static str,
    pub fields: &'static [FieldSpec],
    pub references: &'static [ReferenceSpec],
    pub children: &'static [ChildSpec],
    pub rename: RenamePolicy,
    pub unique: Uniqueness,
    pub normalize: Option<NormalizeFn>,
    /// Drop the record when its key reference stops resolving.
    pub drop_unresolved: bool,
}

impl fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySpec")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("key", &self.key)
            .field("rename", &self.rename)
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

impl EntitySpec {
    pub const fn list(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            shape: Shape::List,
            key: NAME,
            fields,
            references: &[],
            children: &[],
            rename: RenamePolicy::Clear,
            unique: Uniqueness::WithinParent,
            normalize: None,
            drop_unresolved: false,
        }
    }

    pub const fn singleton(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            shape: Shape::Singleton,
            ..Self::list(name, fields)
        }
    }

    /// Records are identified by a reference field instead of `name` and
    /// are dropped when that reference decays.
    pub const fn keyed_by(self, key: &'static str) -> Self {
        Self {
            key,
            drop_unresolved: true,
            ..self
        }
    }

    pub const fn references(self, references: &'static [ReferenceSpec]) -> Self {
        Self { references, ..self }
    }

    pub const fn children(self, children: &'static [ChildSpec]) -> Self {
        Self { children, ..self }
    }

    pub const fn cascade(self) -> Self {
        Self {
            rename: RenamePolicy::Cascade,
            ..self
        }
    }

    pub const fn global(self) -> Self {
        Self {
            unique: Uniqueness::Global,
            ..self
        }
    }

    pub const fn normalize(self, hook: NormalizeFn) -> Self {
        Self {
            normalize: Some(hook),
            ..self
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn child(&self, field: &str) -> Option<&'static ChildSpec> {
        self.children.iter().find(|c| c.field() == field)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        schema::find(self.fields, name)
    }

    pub fn reference(&self, field: &str) -> Option<&'static ReferenceSpec> {
        self.references.iter().find(|r| r.field == field)
    }

    /// The sentinel a field is cleared to.
    pub fn sentinel(&self, field: &str) -> serde_json::Value {
        self.field(field)
            .map_or(serde_json::Value::Null, FieldSpec::sentinel)
    }

    /// Spec of the entity addressed by `path`, walking owned child lists.
    pub fn resolve(&'static self, path: &StorePath) -> Result<&'static EntitySpec, CoreError> {
        let mut spec = self;
        for (_, field) in path.steps() {
            spec = spec
                .child(field)
                .map(|c| c.entity)
                .ok_or_else(|| CoreError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("{} has no child list '{field}'", spec.name),
                })?;
        }
        Ok(spec)
    }

    /// Visit this spec and every nested child spec with its list shape.
    pub fn walk(&'static self, shape: &str, visit: &mut dyn FnMut(&'static EntitySpec, &str)) {
        visit(self, shape);
        for child in self.children {
            let child_shape = format!("{shape}/*/{}", child.field());
            child.entity.walk(&child_shape, visit);
        }
    }

    /// Other top-level collections referenced from this entity or any of
    /// its owned children, in declaration order.
    pub fn dependencies(&'static self) -> Vec<&'static str> {
        let mut collections = Vec::new();
        self.walk(self.name, &mut |spec, _| {
            for reference in spec.references {
                if let Some(collection) = reference.target.collection() {
                    if collection != self.name && !collections.contains(&collection) {
                        collections.push(collection);
                    }
                }
            }
        });
        collections
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{VPCS, vpcs};
    use pretty_assertions::assert_eq;

    #[test]
    fn target_shapes() {
        assert_eq!(Target::Collection(VPCS).shape("vsi").as_deref(), Some("vpcs"));
        assert_eq!(
            Target::Siblings("acls").shape("vpcs/*/subnets").as_deref(),
            Some("vpcs/*/acls")
        );
        assert_eq!(Target::Siblings("acls").shape("vpcs"), None);
        assert_eq!(
            Target::AllChildren {
                collection: VPCS,
                child: "subnets"
            }
            .shape("vsi")
            .as_deref(),
            Some("vpcs/*/subnets")
        );
    }

    #[test]
    fn resolve_walks_child_lists() {
        let path: StorePath = "vpcs/management/acls/management-acl/rules".parse().unwrap();
        let spec = vpcs::VPC.resolve(&path).unwrap();
        assert_eq!(spec.name, "rules");

        let bad: StorePath = "vpcs/management/routers".parse().unwrap();
        assert!(matches!(
            vpcs::VPC.resolve(&bad),
            Err(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn dependencies_include_child_references() {
        let dependencies = vpcs::VPC.dependencies();
        assert!(dependencies.contains(&"resource_groups"));
        assert!(dependencies.contains(&"object_storage"));
        assert!(!dependencies.contains(&VPCS));
        assert_eq!(Target::Siblings("acls").collection(), None);
    }

    #[test]
    fn literals_are_accepted() {
        let reference = ReferenceSpec::one("bucket", Target::Collection("buckets")).allow(&["$disabled"]);
        assert!(reference.accepts("$disabled", &[]));
        assert!(reference.accepts("flow-logs", &["flow-logs"]));
        assert!(!reference.accepts("gone", &["flow-logs"]));
    }
}
