// ── Record helpers ──
//
// Records are JSON objects. These accessors keep the rest of the crate
// free of `Value` matching boilerplate.

use serde_json::{Map, Value};

/// A single entity record: field name -> JSON value, in insertion order.
pub type Record = Map<String, Value>;

/// Read accessors over a [`Record`].
pub trait RecordExt {
    fn str_field(&self, field: &str) -> Option<&str>;
    fn bool_field(&self, field: &str) -> bool;
    fn int_field(&self, field: &str) -> Option<i64>;
    fn str_list(&self, field: &str) -> Vec<&str>;
    fn records(&self, field: &str) -> &[Value];

    /// The record's `name`, if it has a string one.
    fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// `true` when the field is absent, `null`, an empty string or an empty list.
    fn is_blank(&self, field: &str) -> bool;
}

impl RecordExt for Record {
    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn bool_field(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    fn int_field(&self, field: &str) -> Option<i64> {
        match self.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn str_list(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    fn records(&self, field: &str) -> &[Value] {
        self.get(field)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    fn is_blank(&self, field: &str) -> bool {
        is_blank_value(self.get(field))
    }
}

/// Blank check shared by required-field validation and dependents.
pub fn is_blank_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// The value a record field holds under `key` when matched by key field.
pub fn key_of<'a>(record: &'a Value, key_field: &str) -> Option<&'a str> {
    record.get(key_field).and_then(Value::as_str)
}
