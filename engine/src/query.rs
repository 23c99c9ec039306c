//! Query descriptors for collection targets.
//!
//! A [`Query`] is a conjunction of filters plus an optional ordering and
//! limit. Bindings never evaluate queries; they only need a canonical form
//! to decide whether two renders ask for the same thing. [`Query::matches`]
//! and [`Query::apply`] are provided for in-memory document sources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Field value equals one of the values in the filter's array.
    In,
    /// Field is an array containing the filter value.
    ArrayContains,
}

impl FilterOp {
    /// Operator name used in canonical keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::In => "in",
            FilterOp::ArrayContains => "array-contains",
        }
    }

    /// A missing field never matches, not even `Ne`.
    fn test(self, actual: Option<&Value>, expected: &Value) -> bool {
        let Some(actual) = actual else {
            return false;
        };

        match self {
            FilterOp::Eq => values_equal(actual, expected),
            FilterOp::Ne => !values_equal(actual, expected),
            FilterOp::Lt => compare_values(actual, expected) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare_values(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare_values(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::In => expected
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
            FilterOp::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, expected))),
        }
    }
}

/// Sort direction for an [`OrderBy`] clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// A single `field op value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Dotted path into the document data, e.g. `"author.name"`.
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn canonical(&self) -> String {
        let value = match (self.op, &self.value) {
            // `in` compares each candidate on its own, so order and repeats
            // do not matter.
            (FilterOp::In, Value::Array(candidates)) => {
                let mut items: Vec<String> = candidates.iter().map(canonical_value).collect();
                items.sort();
                items.dedup();
                format!("[{}]", items.join(","))
            }
            (_, value) => canonical_value(value),
        };
        format!(
            "{} {} {}",
            Value::from(self.field.as_str()),
            self.op.as_str(),
            value
        )
    }
}

/// Print a filter operand so that operands `values_equal` treats as equal
/// print the same.
///
/// Only top-level numbers are folded: inside arrays and objects equality is
/// structural, so `[300]` and `[300.0]` stay distinct. Value's Display is
/// compact JSON with sorted object keys.
fn canonical_value(value: &Value) -> String {
    // Largest magnitude below which every integer is exact in an f64.
    const EXACT: f64 = 9_007_199_254_740_992.0;

    if let Value::Number(n) = value {
        if !n.is_i64() && !n.is_u64() {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < EXACT {
                    return (f as i64).to_string();
                }
            }
        }
    }
    value.to_string()
}

/// An ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    fn canonical(&self) -> String {
        let direction = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        format!("{} {}", Value::from(self.field.as_str()), direction)
    }
}

/// A collection query: filters (AND-ed), ordering, limit.
///
/// The default query selects every document in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Query {
    /// Query matching every document in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Shorthand for an equality filter.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Append an ordering clause. Earlier clauses take precedence.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of returned documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the query selects the whole collection unchanged.
    pub fn is_all(&self) -> bool {
        self.filters.is_empty() && self.order_by.is_empty() && self.limit.is_none()
    }

    /// Canonical, order-independent serialization used for identity keys.
    ///
    /// Filters form a conjunction, so they are sorted and de-duplicated.
    /// Ordering clauses keep their position because it changes the result.
    pub fn canonical(&self) -> String {
        let mut filters: Vec<String> = self.filters.iter().map(Filter::canonical).collect();
        filters.sort();
        filters.dedup();

        let mut out = format!("where[{}]", filters.join(","));
        if !self.order_by.is_empty() {
            let order: Vec<String> = self.order_by.iter().map(OrderBy::canonical).collect();
            out.push_str(&format!(";order[{}]", order.join(",")));
        }
        if let Some(limit) = self.limit {
            out.push_str(&format!(";limit={limit}"));
        }
        out
    }

    /// Check whether document data satisfies every filter.
    pub fn matches(&self, data: &Value) -> bool {
        self.filters
            .iter()
            .all(|f| f.op.test(lookup(data, &f.field), &f.value))
    }

    /// Filter, order and limit a sequence of documents.
    ///
    /// Sorting is stable, so documents that compare equal keep the order
    /// they were supplied in.
    pub fn apply<D: Fields>(&self, docs: impl IntoIterator<Item = D>) -> Vec<D> {
        let mut selected: Vec<D> = docs
            .into_iter()
            .filter(|d| self.matches(d.fields()))
            .collect();

        if !self.order_by.is_empty() {
            selected.sort_by(|a, b| self.compare(a.fields(), b.fields()));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for clause in &self.order_by {
            let ordering = match (lookup(a, &clause.field), lookup(b, &clause.field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            };
            let ordering = match clause.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Exposes the field tree that filters and orderings are evaluated on.
pub trait Fields {
    fn fields(&self) -> &Value;
}

impl Fields for Value {
    fn fields(&self) -> &Value {
        self
    }
}

impl<T: Fields + ?Sized> Fields for &T {
    fn fields(&self) -> &Value {
        (**self).fields()
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |value, segment| value.get(segment))
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}
