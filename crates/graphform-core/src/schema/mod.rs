// ── Field schema ──
//
// Declarative per-field metadata. Every entity's fields are a static
// slice of `FieldSpec`, built with `const fn` builders so the whole
// catalog lives in read-only data. Predicates are plain `fn` pointers
// over shared references, which keeps them pure.

pub mod patterns;
pub mod validators;

use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};

use crate::model::{FormContext, Record, RecordExt};

/// Validity / visibility predicate over a draft record.
pub type Predicate = fn(&Record, &FormContext<'_>) -> bool;
/// Computes an invalid-text message from the draft.
pub type TextFn = fn(&Record, &FormContext<'_>) -> String;
/// Option list for select and multi-select fields.
pub type GroupsFn = fn(&Record, &FormContext<'_>) -> Vec<String>;
/// Companion-field update run by a form session after the field changes.
pub type StateChangeFn = fn(&mut Record, &FormContext<'_>, &Value);

/// Widget-independent field cardinality and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Toggle,
    Select,
    MultiSelect,
    /// An owned child collection: a list of nested records.
    Records,
}

impl FieldKind {
    /// The "no value" sentinel for this kind.
    pub fn sentinel(self) -> Value {
        match self {
            Self::MultiSelect | Self::Records => Value::Array(Vec::new()),
            Self::Text | Self::Textarea | Self::Number | Self::Toggle | Self::Select => Value::Null,
        }
    }
}

/// Default value populated on create and on schema-evolution backfill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Text(&'static str),
    Bool(bool),
    Int(i64),
    List(&'static [&'static str]),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(s) => Value::String(s.to_owned()),
            Self::Bool(b) => Value::Bool(b),
            Self::Int(n) => json!(n),
            Self::List(items) => Value::Array(items.iter().map(|s| json!(s)).collect()),
        }
    }
}

#[derive(Clone, Copy)]
pub enum InvalidText {
    Static(&'static str),
    Dynamic(TextFn),
}

/// Metadata for one field on one entity type.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
    pub required: bool,
    pub invalid: Option<Predicate>,
    pub invalid_text: Option<InvalidText>,
    pub hide_when: Option<Predicate>,
    pub groups: Option<GroupsFn>,
    /// Fixed choices for selects; values outside them are invalid.
    pub options: &'static [&'static str],
    pub on_state_change: Option<StateChangeFn>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self {
            name,
            kind,
            default,
            required: false,
            invalid: None,
            invalid_text: None,
            hide_when: None,
            groups: None,
            options: &[],
            on_state_change: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text, FieldDefault::Text(""))
    }

    pub const fn textarea(name: &'static str) -> Self {
        Self::new(name, FieldKind::Textarea, FieldDefault::Text(""))
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number, FieldDefault::Null)
    }

    pub const fn toggle(name: &'static str, default: bool) -> Self {
        Self::new(name, FieldKind::Toggle, FieldDefault::Bool(default))
    }

    pub const fn select(name: &'static str) -> Self {
        Self::new(name, FieldKind::Select, FieldDefault::Null)
    }

    pub const fn multiselect(name: &'static str) -> Self {
        Self::new(name, FieldKind::MultiSelect, FieldDefault::List(&[]))
    }

    /// An owned child list (`subnets` on a vpc, `rules` on a group).
    pub const fn records(name: &'static str) -> Self {
        Self::new(name, FieldKind::Records, FieldDefault::List(&[]))
    }

    /// The standard `name` field: required, pattern-checked.
    pub const fn name() -> Self {
        Self::text("name")
            .required()
            .invalid_with(validators::invalid_name, validators::invalid_name_text)
    }

    /// The standard `resource_group` select.
    pub const fn resource_group() -> Self {
        Self::select("resource_group")
            .required()
            .groups(validators::resource_group_groups)
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub const fn default(self, default: FieldDefault) -> Self {
        Self { default, ..self }
    }

    pub const fn default_text(self, text: &'static str) -> Self {
        self.default(FieldDefault::Text(text))
    }

    pub const fn default_int(self, n: i64) -> Self {
        self.default(FieldDefault::Int(n))
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn invalid(self, predicate: Predicate, text: &'static str) -> Self {
        Self {
            invalid: Some(predicate),
            invalid_text: Some(InvalidText::Static(text)),
            ..self
        }
    }

    pub const fn invalid_with(self, predicate: Predicate, text: TextFn) -> Self {
        Self {
            invalid: Some(predicate),
            invalid_text: Some(InvalidText::Dynamic(text)),
            ..self
        }
    }

    pub const fn hide_when(self, predicate: Predicate) -> Self {
        Self {
            hide_when: Some(predicate),
            ..self
        }
    }

    pub const fn groups(self, groups: GroupsFn) -> Self {
        Self {
            groups: Some(groups),
            ..self
        }
    }

    pub const fn options(self, options: &'static [&'static str]) -> Self {
        Self { options, ..self }
    }

    pub const fn on_state_change(self, hook: StateChangeFn) -> Self {
        Self {
            on_state_change: Some(hook),
            ..self
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────

    pub fn sentinel(&self) -> Value {
        self.kind.sentinel()
    }

    pub fn default_value(&self) -> Value {
        self.default.to_value()
    }

    pub fn is_hidden(&self, record: &Record, ctx: &FormContext<'_>) -> bool {
        self.hide_when.is_some_and(|hide| hide(record, ctx))
    }

    /// Hidden fields are never invalid.
    pub fn is_invalid(&self, record: &Record, ctx: &FormContext<'_>) -> bool {
        if self.is_hidden(record, ctx) {
            return false;
        }
        if self.required && record.is_blank(self.name) {
            return true;
        }
        if self.outside_options(record) {
            return true;
        }
        self.invalid.is_some_and(|invalid| invalid(record, ctx))
    }

    /// A fixed-choice value (or list element) that is not one of the choices.
    fn outside_options(&self, record: &Record) -> bool {
        if self.options.is_empty() {
            return false;
        }
        let allowed = |v: &Value| {
            v.as_str()
                .is_some_and(|s| self.options.iter().any(|option| *option == s))
        };
        match record.get(self.name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) if s.is_empty() => false,
            Some(Value::Array(items)) => !items.iter().all(allowed),
            Some(value) => !allowed(value),
        }
    }

    pub fn invalid_text(&self, record: &Record, ctx: &FormContext<'_>) -> String {
        if self.required && record.is_blank(self.name) {
            return format!("{} is required", label(self.name));
        }
        if self.outside_options(record) {
            return format!("{} must be one of: {}", label(self.name), self.options.join(", "));
        }
        match self.invalid_text {
            Some(InvalidText::Static(text)) => text.to_owned(),
            Some(InvalidText::Dynamic(text)) => text(record, ctx),
            None => format!("Invalid {}", label(self.name).to_lowercase()),
        }
    }

    /// Choices offered for a select: computed groups, else the fixed options.
    pub fn groups_for(&self, record: &Record, ctx: &FormContext<'_>) -> Vec<String> {
        match self.groups {
            Some(groups) => groups(record, ctx),
            None => self.options.iter().map(|&o| o.to_owned()).collect(),
        }
    }
}

/// Human label for a snake_case field name: `resource_group` -> `Resource group`.
pub fn label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// One failed field, as surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub text: String,
}

// ── Schema-level helpers ─────────────────────────────────────────────

/// A record holding every field's default, in schema order.
pub fn defaults(fields: &[FieldSpec]) -> Record {
    fields
        .iter()
        .map(|f| (f.name.to_owned(), f.default_value()))
        .collect()
}

/// Defaults overlaid with `data`: schema fields first in schema order,
/// then any extra fields from `data` in their own order.
pub fn overlay(fields: &[FieldSpec], mut data: Record) -> Record {
    let mut record = Record::new();
    for field in fields {
        let value = data
            .remove(field.name)
            .unwrap_or_else(|| field.default_value());
        record.insert(field.name.to_owned(), value);
    }
    for (key, value) in data {
        record.insert(key, value);
    }
    record
}

/// Insert defaults for fields the record predates. Returns `true` if
/// anything was added.
pub fn backfill(fields: &[FieldSpec], record: &mut Record) -> bool {
    let mut changed = false;
    for field in fields {
        if !record.contains_key(field.name) {
            record.insert(field.name.to_owned(), field.default_value());
            changed = true;
        }
    }
    changed
}

/// Every visible field whose predicate fails, with its invalid text.
pub fn invalid_fields(fields: &[FieldSpec], record: &Record, ctx: &FormContext<'_>) -> Vec<FieldIssue> {
    fields
        .iter()
        .filter(|f| f.is_invalid(record, ctx))
        .map(|f| FieldIssue {
            field: f.name.to_owned(),
            text: f.invalid_text(record, ctx),
        })
        .collect()
}

pub fn find<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}
