//! Value comparison, dotted-path resolution, and canonical rendering.
//!
//! This module provides the evaluation primitives shared by filters and
//! sorts: a type-erased comparable view over BSON values, field lookup by
//! dotted key, and the deterministic string encoding used for statement
//! cache keys.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime};

/// Type-erased, comparable representation of BSON values.
///
/// This enum wraps BSON values and provides comparison operations for
/// filtering and sorting. It normalizes numeric types to f64 so that
/// `Int32(5)`, `Int64(5)`, and `Double(5.0)` compare equal.
#[derive(Debug)]
pub enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted key (e.g. `"sub.str"`) against a record.
///
/// Walks nested documents segment by segment. Resolution that hits a
/// non-document along the path yields `None`, never an error. The `id`
/// field is stored on every record like any other field, so no special
/// lookup is needed for it.
pub fn resolve_path<'a>(record: &'a Document, key: &str) -> Option<&'a Bson> {
    let mut segments = key.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Renders a BSON value to its canonical string form.
///
/// The encoding is deterministic: document keys are sorted, strings are
/// JSON-escaped, and numbers use their shortest display form. Two
/// structurally equal values always render identically, which makes the
/// output usable as a cache/subscription key component.
pub fn canonical(value: &Bson) -> String {
    match value {
        Bson::Null => "null".to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(n) => n.to_string(),
        Bson::DateTime(dt) => dt.timestamp_millis().to_string(),
        Bson::String(s) => quoted(s),
        Bson::Array(items) => {
            let rendered = items
                .iter()
                .map(canonical)
                .collect::<Vec<_>>()
                .join(",");

            format!("[{rendered}]")
        }
        Bson::Document(doc) => {
            let mut entries = doc
                .iter()
                .map(|(k, v)| format!("{}:{}", quoted(k), canonical(v)))
                .collect::<Vec<_>>();
            entries.sort();

            format!("{{{}}}", entries.join(","))
        }
        other => quoted(&format!("{other:?}")),
    }
}

/// JSON-escapes a string, including the surrounding quotes.
pub(crate) fn quoted(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
