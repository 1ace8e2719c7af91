// ── Entity registry ──
//
// Ordered set of entity definitions keyed by collection name. Iteration
// order is the reconciliation order: every collection comes after the
// collections it references, so one pass settles the document. Ties keep
// `RECONCILE_ORDER`, then registration order.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{trace, warn};

use crate::entity::{self, EntityDefinition, EntitySpec};
use crate::error::CoreError;
use crate::model::{Document, StorePath};

/// Records changed in one collection by one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionRepair {
    pub collection: &'static str,
    pub changed: usize,
}

pub struct EntityRegistry {
    definitions: IndexMap<&'static str, Box<dyn EntityDefinition>>,
}

impl EntityRegistry {
    /// Registry over `definitions`, sorted into dependency order. A later
    /// definition for the same collection replaces the earlier one.
    pub fn new(definitions: impl IntoIterator<Item = Box<dyn EntityDefinition>>) -> Self {
        let mut registered: IndexMap<&'static str, Box<dyn EntityDefinition>> = definitions
            .into_iter()
            .map(|definition| (definition.collection(), definition))
            .collect();
        let definitions = dependency_order(&registered)
            .into_iter()
            .filter_map(|collection| {
                registered
                    .swap_remove(collection)
                    .map(|definition| (collection, definition))
            })
            .collect();
        Self { definitions }
    }

    /// The built-in topology catalog, in [`entity::RECONCILE_ORDER`].
    pub fn standard() -> Self {
        Self::new(entity::standard_definitions())
    }

    pub fn get(&self, collection: &str) -> Option<&dyn EntityDefinition> {
        self.definitions.get(collection).map(|definition| &**definition)
    }

    /// Definition owning the top-level collection of `path`.
    pub fn for_path(&self, path: &StorePath) -> Result<&dyn EntityDefinition, CoreError> {
        self.get(path.root())
            .ok_or_else(|| CoreError::UnknownCollection {
                collection: path.root().to_owned(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn EntityDefinition> {
        self.definitions.values().map(|definition| &**definition)
    }

    pub fn collections(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.keys().copied()
    }

    pub fn specs(&self) -> Vec<&'static EntitySpec> {
        self.iter().map(|definition| definition.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Run every definition's `on_store_update` once, in order.
    pub fn reconcile(&self, doc: &mut Document) -> Vec<CollectionRepair> {
        self.iter()
            .map(|definition| {
                let changed = definition.on_store_update(doc);
                trace!(collection = definition.collection(), changed, "reconciled");
                CollectionRepair {
                    collection: definition.collection(),
                    changed,
                }
            })
            .collect()
    }
}

type Pending = (usize, &'static str, Vec<&'static str>);

/// Collections ordered so that every reference target precedes its
/// referrers. Among ready collections the lowest `RECONCILE_ORDER`
/// position wins, then the earliest registration. A reference cycle is
/// broken at the lowest-ranked collection still pending.
fn dependency_order(
    definitions: &IndexMap<&'static str, Box<dyn EntityDefinition>>,
) -> Vec<&'static str> {
    let rank = |(index, collection, _): &&Pending| {
        let declared = entity::RECONCILE_ORDER
            .iter()
            .position(|name| name == collection)
            .unwrap_or(entity::RECONCILE_ORDER.len());
        (declared, *index)
    };

    let mut pending: Vec<Pending> = definitions
        .iter()
        .enumerate()
        .map(|(index, (collection, definition))| {
            let dependencies = definition
                .spec()
                .dependencies()
                .into_iter()
                .filter(|target| definitions.contains_key(target))
                .collect();
            (index, *collection, dependencies)
        })
        .collect();

    let mut order: Vec<&'static str> = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .filter(|(_, _, dependencies)| dependencies.iter().all(|d| order.contains(d)))
            .min_by_key(rank)
            .or_else(|| {
                let next = pending.iter().min_by_key(rank);
                if let Some((_, collection, _)) = next {
                    warn!(collection, "reference cycle between collections");
                }
                next
            })
            .map(|(_, collection, _)| *collection);
        let Some(next) = ready else { break };
        pending.retain(|(_, collection, _)| *collection != next);
        order.push(next);
    }
    order
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.definitions.keys()).finish()
    }
}
