// ── Integrity audit ──
//
// Read-only check of a document against the entity specs: every
// reference that does not resolve and every key used twice in its
// uniqueness scope. A reconciled document produces no findings.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::entity::{Cardinality, EntitySpec, Shape, Uniqueness};
use crate::model::{Document, Record, RecordExt, StorePath, is_blank_value};

/// One integrity problem found by [`audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    DanglingReference {
        path: String,
        record: String,
        field: String,
        value: String,
    },
    DuplicateName {
        scope: String,
        name: String,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                path,
                record,
                field,
                value,
            } => write!(f, "{path}/{record}: {field} references missing '{value}'"),
            Self::DuplicateName { scope, name } => write!(f, "{scope}: name '{name}' used more than once"),
        }
    }
}

/// Every dangling reference and duplicate key in `doc`, in document order.
pub fn audit<'s>(doc: &Document, roots: impl IntoIterator<Item = &'s &'static EntitySpec>) -> Vec<Finding> {
    let mut auditor = Auditor {
        doc,
        findings: Vec::new(),
        seen: HashSet::new(),
    };
    for &root in roots {
        let path = StorePath::collection(root.name);
        match (root.shape, doc.get(root.name)) {
            (Shape::List, Some(Value::Array(items))) => auditor.list(root, &path, items, None),
            (Shape::Singleton, Some(Value::Object(record))) => {
                auditor.record(root, &path, record, None);
            }
            _ => {}
        }
    }
    auditor.findings
}

struct Auditor<'d> {
    doc: &'d Document,
    findings: Vec<Finding>,
    /// `(scope, key)` pairs already seen.
    seen: HashSet<(String, String)>,
}

impl Auditor<'_> {
    fn list(&mut self, spec: &'static EntitySpec, path: &StorePath, items: &[Value], parent: Option<&Record>) {
        let scope = match spec.unique {
            Uniqueness::WithinParent => path.to_string(),
            Uniqueness::Global => path.shape(),
        };
        for record in items.iter().filter_map(Value::as_object) {
            if let Some(key) = record.str_field(spec.key) {
                if !self.seen.insert((scope.clone(), key.to_owned())) {
                    self.findings.push(Finding::DuplicateName {
                        scope: scope.clone(),
                        name: key.to_owned(),
                    });
                }
            }
            self.record(spec, path, record, parent);
        }
    }

    fn record(&mut self, spec: &'static EntitySpec, path: &StorePath, record: &Record, parent: Option<&Record>) {
        let label = record.str_field(spec.key).unwrap_or("?").to_owned();

        for reference in spec.references {
            let names = reference.target.names(self.doc, record, parent);
            let value = record.get(reference.field);
            let dangling: Vec<String> = match (reference.cardinality, value) {
                (_, None) => Vec::new(),
                (Cardinality::One, Some(v)) if is_blank_value(Some(v)) => Vec::new(),
                (Cardinality::One, Some(Value::String(s))) if reference.accepts(s, &names) => Vec::new(),
                (Cardinality::One, Some(v)) => vec![display(v)],
                (Cardinality::Many, Some(Value::Array(items))) => items
                    .iter()
                    .filter(|item| !item.as_str().is_some_and(|s| reference.accepts(s, &names)))
                    .map(display)
                    .collect(),
                (Cardinality::Many, Some(v)) => vec![display(v)],
            };
            for value in dangling {
                self.findings.push(Finding::DanglingReference {
                    path: path.to_string(),
                    record: label.clone(),
                    field: reference.field.to_owned(),
                    value,
                });
            }
        }

        for child in spec.children {
            let child_path = path.clone().child(label.as_str(), child.field());
            let items = record.records(child.field());
            self.list(child.entity, &child_path, items, Some(record));
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{security_groups, vpcs};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    static ROOTS: [&EntitySpec; 2] = [&vpcs::VPC, &security_groups::SECURITY_GROUP];

    #[test]
    fn reports_dangling_and_duplicates() {
        let doc = Document::from_value(json!({
            "vpcs": [
                { "name": "management", "subnets": [{ "name": "zone-1" }] },
                { "name": "workload", "subnets": [{ "name": "zone-1" }] },
            ],
            "security_groups": [{ "name": "sg", "vpc": "edge", "rules": [] }],
        }))
        .unwrap();

        let findings = audit(&doc, &ROOTS);
        assert_eq!(
            findings,
            vec![
                Finding::DuplicateName {
                    scope: "vpcs/*/subnets".into(),
                    name: "zone-1".into(),
                },
                Finding::DanglingReference {
                    path: "security_groups".into(),
                    record: "sg".into(),
                    field: "vpc".into(),
                    value: "edge".into(),
                },
            ]
        );
        insta::assert_snapshot!(findings[1].to_string(), @"security_groups/sg: vpc references missing 'edge'");
    }

    #[test]
    fn clean_document_has_no_findings() {
        let doc = Document::from_value(json!({
            "vpcs": [{ "name": "management", "subnets": [] }],
            "security_groups": [{ "name": "sg", "vpc": "management", "rules": [] }],
        }))
        .unwrap();
        assert!(audit(&doc, &ROOTS).is_empty());
    }
}
