// ── Cross-reference reconciler ──
//
// Repairs one collection at a time against the live document. Planning
// is a pure pass over `&Document` that produces the replacement value;
// applying writes it back in place. Running the pass twice on the same
// document changes nothing the second time.

pub mod audit;
pub mod cascade;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::entity::{Cardinality, ChildSpec, EntitySpec, ReferenceSpec, Shape};
use crate::model::{Document, FormContext, NAME, Record, RecordExt, StorePath, document};
use crate::schema;

pub use audit::{Finding, audit};
pub use cascade::cascade_rename;

/// Replacement for one collection, produced by [`plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct Repair {
    pub collection: &'static str,
    pub value: Value,
    /// Top-level records that changed or were dropped.
    pub changed: usize,
}

/// Repair `spec`'s collection in place. Returns the number of records changed.
pub fn reconcile_collection(doc: &mut Document, spec: &'static EntitySpec) -> usize {
    match plan(doc, spec) {
        Some(repair) => apply(doc, repair),
        None => 0,
    }
}

/// Compute the repaired collection, or `None` when it is already consistent.
pub fn plan(doc: &Document, spec: &'static EntitySpec) -> Option<Repair> {
    let path = StorePath::collection(spec.name);
    let current = doc.get(spec.name);

    let (value, changed) = match (spec.shape, current) {
        (Shape::List, Some(Value::Array(items))) => {
            let mut changed = 0;
            let repaired: Vec<Value> = items
                .iter()
                .filter_map(|item| {
                    let repaired = item
                        .as_object()
                        .and_then(|record| repair_record(doc, spec, record, &path, None));
                    if repaired.as_ref().is_none_or(|r| item.as_object() != Some(r)) {
                        changed += 1;
                    }
                    repaired.map(Value::Object)
                })
                .collect();
            (Value::Array(repaired), changed)
        }
        (Shape::List, Some(other)) => {
            warn!(
                collection = spec.name,
                found = document::kind(other),
                "collection is not a list, discarding it"
            );
            (Value::Array(Vec::new()), 1)
        }
        (Shape::List, None) => (Value::Array(Vec::new()), 1),
        (Shape::Singleton, Some(Value::Object(record))) => {
            let repaired = repair_record(doc, spec, record, &path, None)
                .unwrap_or_else(|| schema::defaults(spec.fields));
            let changed = usize::from(&repaired != record);
            (Value::Object(repaired), changed)
        }
        (Shape::Singleton, Some(other)) => {
            warn!(
                collection = spec.name,
                found = document::kind(other),
                "singleton is not an object, discarding it"
            );
            (Value::Object(schema::defaults(spec.fields)), 1)
        }
        (Shape::Singleton, None) => (Value::Object(schema::defaults(spec.fields)), 1),
    };

    if current == Some(&value) {
        return None;
    }
    Some(Repair {
        collection: spec.name,
        value,
        changed,
    })
}

/// Write a planned repair back into the document.
pub fn apply(doc: &mut Document, repair: Repair) -> usize {
    if repair.changed > 0 {
        debug!(
            collection = repair.collection,
            changed = repair.changed,
            "repaired references"
        );
    }
    doc.set(repair.collection, repair.value);
    repair.changed
}

// ── Record repair ────────────────────────────────────────────────────

/// Repair one record and its owned children. `None` drops the record.
fn repair_record(
    doc: &Document,
    spec: &'static EntitySpec,
    original: &Record,
    path: &StorePath,
    link: Option<(&Record, &ChildSpec)>,
) -> Option<Record> {
    let mut draft = original.clone();

    schema::backfill(spec.fields, &mut draft);
    for child in spec.children {
        if !draft.get(child.field()).is_some_and(Value::is_array) {
            draft.insert(child.field().to_owned(), Value::Array(Vec::new()));
        }
    }

    let parent = link.map(|(parent, _)| parent);
    if let Some((parent, child)) = link {
        if let Some(field) = child.back_ref {
            let owner = parent.get(NAME).cloned().unwrap_or(Value::Null);
            draft.insert(field.to_owned(), owner);
        }
        for field in child.inherit {
            let value = parent.get(*field).cloned().unwrap_or(Value::Null);
            draft.insert((*field).to_owned(), value);
        }
    }

    for reference in spec.references {
        resolve_reference(doc, spec, reference, &mut draft, parent);
    }

    if spec.drop_unresolved && draft.is_blank(spec.key) {
        trace!(%path, key = spec.key, "dropping record with unresolved key");
        return None;
    }

    if let Some(normalize) = spec.normalize {
        let ctx = FormContext::new(doc, path).with_parent(parent);
        normalize(&mut draft, &ctx);
    }

    if !spec.children.is_empty() {
        let owner = draft.clone();
        let owner_name = owner.name().unwrap_or_default();
        for child in spec.children {
            let child_path = path.clone().child(owner_name, child.field());
            let repaired: Vec<Value> = owner
                .records(child.field())
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|record| {
                    repair_record(doc, child.entity, record, &child_path, Some((&owner, child)))
                })
                .map(Value::Object)
                .collect();
            draft.insert(child.field().to_owned(), Value::Array(repaired));
        }
    }

    Some(draft)
}

/// Null or filter one reference field against its live target names.
fn resolve_reference(
    doc: &Document,
    spec: &EntitySpec,
    reference: &ReferenceSpec,
    draft: &mut Record,
    parent: Option<&Record>,
) {
    let names = reference.target.names(doc, draft, parent);
    let field = reference.field;

    match reference.cardinality {
        Cardinality::One => {
            let dangling = match draft.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(value)) => {
                    !value.is_empty() && !reference.accepts(value, &names)
                }
                Some(_) => true,
            };
            if dangling {
                trace!(field, "clearing dangling reference");
                draft.insert(field.to_owned(), Value::Null);
                for dependent in reference.dependents {
                    draft.insert((*dependent).to_owned(), spec.sentinel(dependent));
                }
            }
        }
        Cardinality::Many => match draft.get_mut(field) {
            Some(Value::Array(items)) => items.retain(|item| {
                item.as_str()
                    .is_some_and(|value| reference.accepts(value, &names))
            }),
            Some(other) => *other = Value::Array(Vec::new()),
            None => {}
        },
    }
}
