// ── Store paths ──
//
// A path addresses one list of records inside the document:
// `vpcs`, `vpcs/management/subnets`, `vpcs/management/acls/edge/rules`.
// Segments alternate list field and record name, so a valid path always
// has an odd number of segments.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Location of a record list (or singleton) inside a [`Document`](super::Document).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    collection: String,
    /// `(parent record name, child list field)` pairs, outermost first.
    steps: Vec<(String, String)>,
}

impl StorePath {
    /// Path to a top-level collection.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            steps: Vec::new(),
        }
    }

    /// Descend into the child list `field` of the record named `record`.
    #[must_use]
    pub fn child(mut self, record: impl Into<String>, field: impl Into<String>) -> Self {
        self.steps.push((record.into(), field.into()));
        self
    }

    /// Top-level collection name.
    pub fn root(&self) -> &str {
        &self.collection
    }

    pub fn steps(&self) -> &[(String, String)] {
        &self.steps
    }

    pub fn is_top_level(&self) -> bool {
        self.steps.is_empty()
    }

    /// Depth below the top-level collection (0 for `vpcs`).
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// The list field names along the path, starting with the collection:
    /// `vpcs/a/acls/b/rules` yields `["vpcs", "acls", "rules"]`.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.collection.as_str()).chain(self.steps.iter().map(|(_, f)| f.as_str()))
    }

    /// Name of the list this path ends in (`subnets` for `vpcs/a/subnets`).
    pub fn leaf(&self) -> &str {
        self.steps
            .last()
            .map_or(self.collection.as_str(), |(_, field)| field.as_str())
    }

    /// Path of the list holding the parent record, plus the parent's name.
    pub fn parent(&self) -> Option<(StorePath, &str)> {
        let (last, rest) = self.steps.split_last()?;
        Some((
            Self {
                collection: self.collection.clone(),
                steps: rest.to_vec(),
            },
            last.0.as_str(),
        ))
    }

    /// Shape key with record names erased, e.g. `vpcs/*/subnets`.
    pub fn shape(&self) -> String {
        self.fields().collect::<Vec<_>>().join("/*/")
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for (record, field) in &self.steps {
            write!(f, "/{record}/{field}")?;
        }
        Ok(())
    }
}

impl FromStr for StorePath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(CoreError::InvalidPath {
                path: s.to_owned(),
                reason: "empty segment".into(),
            });
        }
        if segments.len() % 2 == 0 {
            return Err(CoreError::InvalidPath {
                path: s.to_owned(),
                reason: "expected <collection>[/<record>/<field>]*".into(),
            });
        }

        let mut iter = segments.into_iter();
        let mut path = Self::collection(iter.next().unwrap_or_default());
        while let (Some(record), Some(field)) = (iter.next(), iter.next()) {
            path = path.child(record, field);
        }
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_level_collection() {
        let path: StorePath = "vpcs".parse().unwrap();
        assert!(path.is_top_level());
        assert_eq!(path.root(), "vpcs");
        assert_eq!(path.leaf(), "vpcs");
    }

    #[test]
    fn parses_nested_path() {
        let path: StorePath = "vpcs/management/acls/edge/rules".parse().unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.fields().collect::<Vec<_>>(), ["vpcs", "acls", "rules"]);
        assert_eq!(path.leaf(), "rules");
        assert_eq!(path.to_string(), "vpcs/management/acls/edge/rules");
        assert_eq!(path.shape(), "vpcs/*/acls/*/rules");
    }

    #[test]
    fn rejects_even_segment_count() {
        let err = "vpcs/management".parse::<StorePath>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPath { .. }));
    }

    #[test]
    fn rejects_empty_segment() {
        assert!("vpcs//subnets".parse::<StorePath>().is_err());
        assert!("".parse::<StorePath>().is_err());
    }

    #[test]
    fn parent_strips_last_step() {
        let path = StorePath::collection("vpcs").child("edge", "subnets");
        let (parent, name) = path.parent().unwrap();
        assert_eq!(parent, StorePath::collection("vpcs"));
        assert_eq!(name, "edge");
        assert!(StorePath::collection("vpcs").parent().is_none());
    }
}
