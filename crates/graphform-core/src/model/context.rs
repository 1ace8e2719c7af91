// ── Operation contexts ──
//
// Each mutation carries only what it needs: a save always knows the
// identity the edit session opened with, a delete knows its target.

use super::{Document, Record, StorePath};

/// Context for `create`.
#[derive(Debug, Clone, Default)]
pub struct CreateContext {
    /// Insert at this index instead of appending.
    pub position: Option<usize>,
}

impl CreateContext {
    pub fn at(position: usize) -> Self {
        Self {
            position: Some(position),
        }
    }
}

/// Context for `save`: the record's name when the edit session opened.
///
/// Singleton collections ignore `original_name`.
#[derive(Debug, Clone)]
pub struct SaveContext {
    pub original_name: String,
}

impl SaveContext {
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
        }
    }
}

/// Context for `delete`: the name of the record to remove.
#[derive(Debug, Clone)]
pub struct DeleteContext {
    pub name: String,
}

impl DeleteContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Context for `should_disable_save`: `None` while creating a new record.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub original_name: Option<String>,
}

impl ValidationContext {
    pub fn creating() -> Self {
        Self::default()
    }

    pub fn editing(original_name: impl Into<String>) -> Self {
        Self {
            original_name: Some(original_name.into()),
        }
    }
}

/// Read-only view handed to field predicates (`invalid`, `hide_when`,
/// `groups`, `on_state_change`).
#[derive(Debug, Clone, Copy)]
pub struct FormContext<'a> {
    pub document: &'a Document,
    pub path: &'a StorePath,
    /// Name of the record being edited, `None` while creating.
    pub original_name: Option<&'a str>,
    /// Parent record for child collections (`vpcs/x/subnets` -> vpc `x`).
    pub parent: Option<&'a Record>,
}

impl<'a> FormContext<'a> {
    pub fn new(document: &'a Document, path: &'a StorePath) -> Self {
        Self {
            document,
            path,
            original_name: None,
            parent: None,
        }
    }

    #[must_use]
    pub fn editing(mut self, original_name: Option<&'a str>) -> Self {
        self.original_name = original_name;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Option<&'a Record>) -> Self {
        self.parent = parent;
        self
    }

    /// The `_options` singleton, if seeded.
    pub fn options(&self) -> Option<&'a Record> {
        self.document.singleton(crate::entity::OPTIONS)
    }
}
