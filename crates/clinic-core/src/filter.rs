//! The filter predicate engine.
//!
//! A query accumulates predicates keyed by `FilterKey` (column plus
//! comparison operator). Registering the same key twice keeps the last value.
//! At execution time every predicate is applied as a logical AND, walking the
//! keys in their sorted order (operator first, then column) rather than the
//! order they were registered. With AND-only composition the result set does
//! not depend on that order.
//!
//! Key encoding, as used by the legacy string form:
//!
//! | Operator | Key           |
//! |----------|---------------|
//! | Eq       | `column`      |
//! | Neq      | `column_neq`  |
//! | In       | `column_in`   |
//! | Gte      | `column_gte`  |
//! | Lte      | `column_lte`  |
//! | Gt       | `column_gt`   |
//! | Lt       | `column_lt`   |

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterOp {
    Eq,
    Neq,
    In,
    Gte,
    Lte,
    Gt,
    Lt,
}

impl FilterOp {
    /// Operators that carry a suffix, longest first so `_gte` is tried
    /// before `_gt`.
    const SUFFIXED: [FilterOp; 6] = [
        FilterOp::Neq,
        FilterOp::Gte,
        FilterOp::Lte,
        FilterOp::Gt,
        FilterOp::Lt,
        FilterOp::In,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            FilterOp::Eq => "",
            FilterOp::Neq => "_neq",
            FilterOp::In => "_in",
            FilterOp::Gte => "_gte",
            FilterOp::Lte => "_lte",
            FilterOp::Gt => "_gt",
            FilterOp::Lt => "_lt",
        }
    }
}

/// Column name plus operator; the map key of a `FilterSet`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterKey {
    pub op: FilterOp,
    pub column: String,
}

impl FilterKey {
    pub fn new(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            op,
            column: column.into(),
        }
    }

    /// Decode the legacy `column_suffix` form. A key without a known suffix
    /// is an equality filter on the whole key.
    pub fn parse(key: &str) -> Self {
        for op in FilterOp::SUFFIXED {
            if let Some(column) = key.strip_suffix(op.suffix()) {
                if !column.is_empty() {
                    return Self::new(column, op);
                }
            }
        }
        Self::new(key, FilterOp::Eq)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.op.suffix())
    }
}

/// Accumulated predicates of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: BTreeMap<FilterKey, Value>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate, replacing any earlier value for the same key.
    pub fn register(&mut self, key: FilterKey, value: Value) {
        self.predicates.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Predicates in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&FilterKey, &Value)> {
        self.predicates.iter()
    }

    /// True when `row` satisfies every registered predicate.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.predicates
            .iter()
            .all(|(key, expected)| evaluate(key.op, row.get(&key.column), expected))
    }
}

/// Evaluate one predicate against a row's field.
///
/// A missing or `null` field fails every operator except `Neq`. Ordered
/// comparisons between incompatible JSON types are false.
pub fn evaluate(op: FilterOp, field: Option<&Value>, expected: &Value) -> bool {
    let field = field.filter(|v| !v.is_null());

    match op {
        FilterOp::Eq => field.is_some_and(|f| values_equal(f, expected)),
        FilterOp::Neq => !field.is_some_and(|f| values_equal(f, expected)),
        FilterOp::In => match (field, expected.as_array()) {
            (Some(f), Some(candidates)) => candidates.iter().any(|c| values_equal(f, c)),
            _ => false,
        },
        FilterOp::Gte => ordered(field, expected, |o| o != Ordering::Less),
        FilterOp::Lte => ordered(field, expected, |o| o != Ordering::Greater),
        FilterOp::Gt => ordered(field, expected, |o| o == Ordering::Greater),
        FilterOp::Lt => ordered(field, expected, |o| o == Ordering::Less),
    }
}

fn ordered(field: Option<&Value>, expected: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    field
        .and_then(|f| compare_values(f, expected))
        .is_some_and(accept)
}

/// Equality that treats `1` and `1.0` as the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Order two JSON scalars of the same kind. Strings compare
/// lexicographically, which is chronological for ISO dates.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
