//! The update expression algebra consumed by `update_item`/`update_query`.
//!
//! An [`Update`] is an ordered list of per-field operations: set, unset,
//! numeric increment, array push/pull, and recursive sub-updates for nested
//! documents. Applying an update builds a new record and never mutates the
//! old instance, so structural comparison between old and new remains a
//! valid change-detection test.

use bson::{Bson, Document};

use crate::value::Comparable;

/// A single per-field update operation.
#[derive(Debug, Clone)]
pub enum UpdateOp {
    /// Replace the field with the given value.
    Set(Bson),
    /// Remove the field.
    Unset,
    /// Add to a numeric field. A missing or non-numeric prior value counts
    /// as zero; integer results saturate at the `i64` bounds.
    Inc(i64),
    /// Append the given items to an array field, creating it if missing.
    Push(Vec<Bson>),
    /// Remove all structurally equal occurrences of the given items from an
    /// array field. A no-op if the field is missing or not an array.
    Pull(Vec<Bson>),
    /// Apply a sub-update to a nested document field, creating it if missing.
    Nested(Update),
}

/// An ordered collection of field updates.
///
/// Built fluently; each method consumes and returns the builder:
///
/// ```ignore
/// let update = Update::new()
///     .set("name", "gamma")
///     .inc("num", 5)
///     .push("tag", ["odd"])
///     .nested("sub", Update::new().unset("stale"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Update {
    ops: Vec<(String, UpdateOp)>,
}

impl Update {
    /// Creates an empty update. Applying it reproduces the record unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field-set operation.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.ops.push((field.into(), UpdateOp::Set(value.into())));
        self
    }

    /// Adds a field-unset operation.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push((field.into(), UpdateOp::Unset));
        self
    }

    /// Adds a numeric increment operation.
    pub fn inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.ops.push((field.into(), UpdateOp::Inc(by)));
        self
    }

    /// Adds an array-append operation.
    pub fn push<V: Into<Bson>>(
        mut self,
        field: impl Into<String>,
        items: impl IntoIterator<Item = V>,
    ) -> Self {
        self.ops.push((
            field.into(),
            UpdateOp::Push(items.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Adds an array-remove operation.
    pub fn pull<V: Into<Bson>>(
        mut self,
        field: impl Into<String>,
        items: impl IntoIterator<Item = V>,
    ) -> Self {
        self.ops.push((
            field.into(),
            UpdateOp::Pull(items.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Adds a nested sub-update operation.
    pub fn nested(mut self, field: impl Into<String>, update: Update) -> Self {
        self.ops.push((field.into(), UpdateOp::Nested(update)));
        self
    }

    /// True if this update holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies this update to a record, producing a new record.
    ///
    /// Operations apply in insertion order, so a later operation on the same
    /// field observes the effect of an earlier one. The input record is left
    /// untouched.
    pub fn apply(&self, record: &Document) -> Document {
        let mut next = record.clone();

        for (field, op) in &self.ops {
            apply_op(&mut next, field, op);
        }

        next
    }
}

fn apply_op(record: &mut Document, field: &str, op: &UpdateOp) {
    match op {
        UpdateOp::Set(value) => {
            record.insert(field, value.clone());
        }
        UpdateOp::Unset => {
            record.remove(field);
        }
        UpdateOp::Inc(by) => {
            let next = match record.get(field) {
                Some(Bson::Double(current)) => Bson::Double(current + *by as f64),
                Some(Bson::Int64(current)) => Bson::Int64(current.saturating_add(*by)),
                Some(Bson::Int32(current)) => Bson::Int64((*current as i64).saturating_add(*by)),
                _ => Bson::Int64(*by),
            };

            record.insert(field, next);
        }
        UpdateOp::Push(items) => {
            let mut array = match record.get(field) {
                Some(Bson::Array(current)) => current.clone(),
                _ => Vec::new(),
            };
            array.extend(items.iter().cloned());

            record.insert(field, Bson::Array(array));
        }
        UpdateOp::Pull(items) => {
            if let Some(Bson::Array(current)) = record.get(field) {
                let retained = current
                    .iter()
                    .filter(|member| {
                        !items
                            .iter()
                            .any(|item| Comparable::from(item) == Comparable::from(*member))
                    })
                    .cloned()
                    .collect::<Vec<_>>();

                record.insert(field, Bson::Array(retained));
            }
        }
        UpdateOp::Nested(update) => {
            let current = match record.get(field) {
                Some(Bson::Document(sub)) => sub.clone(),
                _ => Document::new(),
            };

            record.insert(field, update.apply(&current));
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::{bson, doc};

    use super::*;

    #[test]
    fn set_and_unset() {
        let record = doc! { "a": 1, "b": 2 };
        let next = Update::new().set("a", 10).unset("b").apply(&record);

        assert_eq!(next, doc! { "a": 10 });
        // The input record is untouched.
        assert_eq!(record, doc! { "a": 1, "b": 2 });
    }

    #[test]
    fn empty_update_reproduces_record() {
        let record = doc! { "a": 1, "sub": { "x": true } };

        assert_eq!(Update::new().apply(&record), record);
    }

    #[test]
    fn inc_treats_missing_as_zero() {
        let record = doc! { "n": 10, "f": 1.5 };
        let next = Update::new()
            .inc("n", 5)
            .inc("f", 1)
            .inc("fresh", 3)
            .apply(&record);

        assert_eq!(next.get("n"), Some(&Bson::Int64(15)));
        assert_eq!(next.get("f"), Some(&Bson::Double(2.5)));
        assert_eq!(next.get("fresh"), Some(&Bson::Int64(3)));
    }

    #[test]
    fn inc_saturates_at_integer_bounds() {
        let record = doc! { "top": i64::MAX, "bottom": i64::MIN };
        let next = Update::new()
            .inc("top", 1)
            .inc("bottom", -1)
            .apply(&record);

        assert_eq!(next.get("top"), Some(&Bson::Int64(i64::MAX)));
        assert_eq!(next.get("bottom"), Some(&Bson::Int64(i64::MIN)));
    }

    #[test]
    fn push_and_pull_arrays() {
        let record = doc! { "tag": ["a", "b"] };
        let next = Update::new()
            .push("tag", ["c"])
            .pull("tag", ["a"])
            .apply(&record);

        assert_eq!(next.get("tag"), Some(&bson!(["b", "c"])));

        // Push creates a missing array; pull on a missing field is a no-op.
        let next = Update::new()
            .push("fresh", [1, 2])
            .pull("absent", [1])
            .apply(&doc! {});
        assert_eq!(next.get("fresh"), Some(&bson!([1, 2])));
        assert!(!next.contains_key("absent"));
    }

    #[test]
    fn nested_updates_recurse() {
        let record = doc! { "sub": { "keep": 1, "drop": 2 } };
        let next = Update::new()
            .nested("sub", Update::new().unset("drop").set("add", 3))
            .nested("fresh", Update::new().set("x", true))
            .apply(&record);

        assert_eq!(next.get("sub"), Some(&bson!({ "keep": 1, "add": 3 })));
        assert_eq!(next.get("fresh"), Some(&bson!({ "x": true })));
    }

    #[test]
    fn operations_apply_in_order() {
        let next = Update::new()
            .set("n", 1)
            .inc("n", 1)
            .apply(&doc! {});

        assert_eq!(next.get("n"), Some(&Bson::Int64(2)));
    }
}
