//! Query statements: filter set + sort set + result limit.
//!
//! A [`Statement`] combines a [`FilterSet`], a [`SortSet`], and an optional
//! result-count limit into one queryable unit. Statements are immutable;
//! every builder operation returns a new statement, so a shared empty
//! statement is always safe to reuse.
//!
//! # Building statements
//!
//! ```ignore
//! use datakit_core::{statement::Statement, constraint::{Operator, Direction}};
//!
//! let statement = Statement::new()
//!     .with_filter("num", Operator::Gt, 150)
//!     .with_sort("num", Direction::Desc)
//!     .with_limit(Some(10));
//! ```

use bson::{Bson, Document};

use crate::constraint::{Direction, Filter, FilterSet, Operator, Sort, SortSet};

/// A query statement: the combination of filters, sorts, and a limit that
/// defines one query.
///
/// `limit == None` means unbounded; `limit == Some(0)` is valid and yields
/// empty results. Negative and fractional limits are unrepresentable.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    /// Filter constraints, combined with AND semantics.
    pub filters: FilterSet,
    /// Sort constraints, in primary-key-then-tie-breaker order.
    pub sorts: SortSet,
    /// Maximum number of records to return, or `None` for unbounded.
    pub limit: Option<usize>,
}

impl Statement {
    /// Creates a new empty statement: no filters, no sorts, no limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new statement with the given filter appended.
    pub fn with_filter(
        &self,
        key: impl Into<String>,
        op: Operator,
        value: impl Into<Bson>,
    ) -> Self {
        Self {
            filters: self.filters.with(Filter::new(key, op, value)),
            sorts: self.sorts.clone(),
            limit: self.limit,
        }
    }

    /// Returns a new statement with the given sort appended as the next
    /// tie-breaker.
    pub fn with_sort(&self, key: impl Into<String>, direction: Direction) -> Self {
        Self {
            filters: self.filters.clone(),
            sorts: self.sorts.with(Sort::new(key, direction)),
            limit: self.limit,
        }
    }

    /// Returns a new statement with the limit replaced.
    pub fn with_limit(&self, limit: Option<usize>) -> Self {
        Self {
            filters: self.filters.clone(),
            sorts: self.sorts.clone(),
            limit,
        }
    }

    /// Applies this statement to a sequence of records: filter, then sort,
    /// then limit, in that order.
    ///
    /// When no sort constraints are present the original iteration order is
    /// preserved. That is an optimization for the write path, not an
    /// ordering guarantee.
    pub fn transform<'a, I>(&self, records: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        if self.limit == Some(0) {
            return Vec::new();
        }

        let mut matched = records
            .into_iter()
            .filter(|record| self.filters.matches(record))
            .collect::<Vec<_>>();

        if !self.sorts.is_empty() {
            matched.sort_by(|a, b| self.sorts.compare(a, b));
        }

        match self.limit {
            Some(limit) => matched
                .into_iter()
                .take(limit)
                .cloned()
                .collect(),
            None => matched.into_iter().cloned().collect(),
        }
    }

    /// Canonical string form of this statement, built by concatenating the
    /// filter, sort, and limit renderings.
    ///
    /// The encoding is deterministic and distinguishes any two semantically
    /// different statements, so it is usable as a cache/subscription key.
    pub fn key(&self) -> String {
        format!(
            "{}{}{}",
            self.filters.render(),
            self.sorts.render(),
            self.limit
                .map(|limit| limit.to_string())
                .unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn records() -> Vec<Document> {
        vec![
            doc! { "id": "a", "num": 100 },
            doc! { "id": "b", "num": 200 },
            doc! { "id": "c", "num": 300 },
        ]
    }

    fn ids(results: &[Document]) -> Vec<&str> {
        results
            .iter()
            .filter_map(|r| r.get_str("id").ok())
            .collect()
    }

    #[test]
    fn filter_then_sort_descending() {
        let statement = Statement::new()
            .with_filter("num", Operator::Gt, 150)
            .with_sort("num", Direction::Desc);

        let results = statement.transform(&records());
        assert_eq!(ids(&results), ["c", "b"]);
    }

    #[test]
    fn no_sort_preserves_iteration_order() {
        let statement = Statement::new().with_limit(Some(1));
        let results = statement.transform(&records());

        assert_eq!(results.len(), 1);
        assert_eq!(ids(&results), ["a"]);
    }

    #[test]
    fn limit_boundaries() {
        let all = records();

        assert!(Statement::new().with_limit(Some(0)).transform(&all).is_empty());
        assert_eq!(Statement::new().with_limit(None).transform(&all).len(), 3);
        assert_eq!(Statement::new().with_limit(Some(10)).transform(&all).len(), 3);
    }

    #[test]
    fn limit_applies_after_sort() {
        let statement = Statement::new()
            .with_sort("num", Direction::Desc)
            .with_limit(Some(2));

        assert_eq!(ids(&statement.transform(&records())), ["c", "b"]);
    }

    #[test]
    fn transform_is_deterministic() {
        let statement = Statement::new().with_sort("group", Direction::Asc);
        let tied = vec![
            doc! { "id": "x", "group": 1 },
            doc! { "id": "y", "group": 1 },
            doc! { "id": "z", "group": 0 },
        ];

        let first = statement.transform(&tied);
        let second = statement.transform(&tied);
        assert_eq!(first, second);
        // Stable sort: tied records keep their input order.
        assert_eq!(ids(&first), ["z", "x", "y"]);
    }

    #[test]
    fn builder_operations_do_not_mutate() {
        let base = Statement::new();
        let derived = base
            .with_filter("num", Operator::Gt, 0)
            .with_limit(Some(1));

        assert!(base.filters.is_empty());
        assert_eq!(base.limit, None);
        assert_eq!(derived.limit, Some(1));
    }

    #[test]
    fn key_distinguishes_statements() {
        let base = Statement::new().with_filter("num", Operator::Gt, 150);

        assert_ne!(base.key(), base.with_limit(Some(0)).key());
        assert_ne!(base.key(), base.with_sort("num", Direction::Desc).key());
        assert_eq!(
            base.with_sort("num", Direction::Desc).with_limit(Some(2)).key(),
            r#"{"num>":150}["!num"]2"#,
        );
    }
}
