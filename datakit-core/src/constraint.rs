//! Filter and sort constraints over record fields.
//!
//! A constraint is a single predicate or ordering rule applied to one field
//! of a record. Constraints are pure and stateless; they compose into
//! [`FilterSet`] (AND semantics) and [`SortSet`] (tie-break chaining),
//! which are the building blocks of a query [`Statement`](crate::statement::Statement).
//!
//! # Field resolution
//!
//! Constraint keys are dotted paths into the record (e.g. `"sub.str"`).
//! Resolution that hits a non-document along the path yields "missing"
//! rather than an error; missing fields never match equality-style
//! operators and sort as lowest.
//!
//! # Canonical form
//!
//! Every constraint and set renders to a deterministic string used both for
//! debugging and as a cache/subscription key. Filter sets render identically
//! regardless of construction order (AND is order-insensitive); sort sets
//! render in sequence order, which is semantically significant.

use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::value::{Comparable, canonical, quoted, resolve_path};

/// Field comparison operators for filter constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal to (deep structural match).
    Is,
    /// Not equal to.
    Not,
    /// Field value is a member of the given array.
    In,
    /// Field value is not a member of the given array.
    Out,
    /// Array-valued field contains the given scalar.
    Contains,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
}

impl Operator {
    /// Suffix appended to the key in the canonical rendering.
    fn suffix(&self) -> &'static str {
        match self {
            Operator::Is => "",
            Operator::Not => "!=",
            Operator::In => "?=",
            Operator::Out => "!?=",
            Operator::Contains => "[]",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }
}

/// Sort direction for ordering constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// A single filter constraint: one predicate over one field of a record.
///
/// The shape of `value` depends on the operator: [`Operator::In`] and
/// [`Operator::Out`] take an array of scalars to match against,
/// [`Operator::Contains`] takes a scalar to find inside an array-valued
/// field, and the rest take a single scalar.
#[derive(Debug, Clone)]
pub struct Filter {
    /// The dotted key of the field to test.
    pub key: String,
    /// The comparison operator.
    pub op: Operator,
    /// The value to compare against.
    pub value: Bson,
}

impl Filter {
    /// Creates a new filter constraint.
    pub fn new(key: impl Into<String>, op: Operator, value: impl Into<Bson>) -> Self {
        Self { key: key.into(), op, value: value.into() }
    }

    /// Tests whether a record satisfies this constraint.
    ///
    /// Missing fields never satisfy `Is`, `In`, `Contains`, or the ordering
    /// operators; `Not` and `Out` are their exact complements, so a missing
    /// field satisfies both.
    pub fn matches(&self, record: &Document) -> bool {
        let field = resolve_path(record, &self.key);

        match self.op {
            Operator::Is => field
                .map(|f| Comparable::from(f) == Comparable::from(&self.value))
                .unwrap_or(false),
            Operator::Not => !field
                .map(|f| Comparable::from(f) == Comparable::from(&self.value))
                .unwrap_or(false),
            Operator::In => self.member_of(field),
            Operator::Out => !self.member_of(field),
            Operator::Contains => match field {
                Some(Bson::Array(items)) => items
                    .iter()
                    .any(|item| Comparable::from(item) == Comparable::from(&self.value)),
                _ => false,
            },
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                match field.and_then(|f| {
                    Comparable::from(f).partial_cmp(&Comparable::from(&self.value))
                }) {
                    Some(ordering) => match self.op {
                        Operator::Gt => ordering == Ordering::Greater,
                        Operator::Gte => ordering != Ordering::Less,
                        Operator::Lt => ordering == Ordering::Less,
                        Operator::Lte => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
        }
    }

    /// Membership of the resolved field value in this constraint's array value.
    ///
    /// An empty array has no members, so `In` with `[]` matches nothing and
    /// `Out` with `[]` matches everything.
    fn member_of(&self, field: Option<&Bson>) -> bool {
        match (field, &self.value) {
            (Some(f), Bson::Array(options)) => options
                .iter()
                .any(|option| Comparable::from(option) == Comparable::from(f)),
            _ => false,
        }
    }

    /// Canonical `key+operator` rendering used inside [`FilterSet::render`].
    fn render_key(&self) -> String {
        format!("{}{}", self.key, self.op.suffix())
    }
}

/// A single sort constraint: one ordering rule over one field of a record.
#[derive(Debug, Clone)]
pub struct Sort {
    /// The dotted key of the field to order by.
    pub key: String,
    /// The sort direction.
    pub direction: Direction,
}

impl Sort {
    /// Creates a new sort constraint.
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self { key: key.into(), direction }
    }

    /// Compares two records by this constraint's field.
    ///
    /// Uses the natural ordering of the resolved value (numeric,
    /// lexicographic string, datetime). Missing values sort as lowest;
    /// incomparable values compare as equal.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let left = resolve_path(a, &self.key).map(Comparable::from);
        let right = resolve_path(b, &self.key).map(Comparable::from);

        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        };

        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// An ordered, immutable collection of filter constraints combined with
/// AND semantics.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Creates an empty filter set, which matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new set with the given filter appended.
    pub fn with(&self, filter: Filter) -> Self {
        let mut filters = self.filters.clone();
        filters.push(filter);

        Self { filters }
    }

    /// True if the set holds no constraints.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates the member constraints in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Logical AND over all member constraints; vacuously true if empty.
    pub fn matches(&self, record: &Document) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.matches(record))
    }

    /// Canonical rendering: a JSON-style object with entries sorted by
    /// `key+operator`, so that two sets with the same members render
    /// identically regardless of construction order.
    pub fn render(&self) -> String {
        let mut entries = self
            .filters
            .iter()
            .map(|f| format!("{}:{}", quoted(&f.render_key()), canonical(&f.value)))
            .collect::<Vec<_>>();
        entries.sort();

        format!("{{{}}}", entries.join(","))
    }
}

/// An ordered, immutable collection of sort constraints.
///
/// Order matters: earlier entries are primary sort keys, later entries are
/// tie-breakers only.
#[derive(Debug, Clone, Default)]
pub struct SortSet {
    sorts: Vec<Sort>,
}

impl SortSet {
    /// Creates an empty sort set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new set with the given sort appended as the next tie-breaker.
    pub fn with(&self, sort: Sort) -> Self {
        let mut sorts = self.sorts.clone();
        sorts.push(sort);

        Self { sorts }
    }

    /// True if the set holds no constraints.
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    /// Iterates the member constraints in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Sort> {
        self.sorts.iter()
    }

    /// Evaluates members in sequence, returning the first non-equal
    /// comparison; equal if all tie.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for sort in &self.sorts {
            let ordering = sort.compare(a, b);

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }

    /// Canonical rendering: a JSON-style array of keys in priority order,
    /// `!`-prefixed when descending.
    pub fn render(&self) -> String {
        let rendered = self
            .sorts
            .iter()
            .map(|s| match s.direction {
                Direction::Asc => quoted(&s.key),
                Direction::Desc => quoted(&format!("!{}", s.key)),
            })
            .collect::<Vec<_>>()
            .join(",");

        format!("[{rendered}]")
    }
}
