//! Query description handed to the host's entity manager
//!
//! The pipeline never builds SQL. It describes what it needs as a [`Query`]
//! and the host translates it into its own select builder.

use std::cmp::Ordering;

use serde_json::Value;

use crate::transfer::Row;

/// A where-clause item
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    NotEq(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Or(Vec<Filter>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(attribute.into(), value.into())
    }

    pub fn gte(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(attribute.into(), value.into())
    }

    /// Evaluate this filter against stored values
    ///
    /// Used by in-process hosts. Missing attributes behave like null.
    pub fn matches(&self, values: &Row) -> bool {
        let get = |attribute: &str| values.get(attribute).unwrap_or(&Value::Null);

        match self {
            Filter::Eq(a, v) => loose_eq(get(a), v),
            Filter::NotEq(a, v) => !loose_eq(get(a), v),
            Filter::In(a, list) => list.iter().any(|v| loose_eq(get(a), v)),
            Filter::NotIn(a, list) => !list.iter().any(|v| loose_eq(get(a), v)),
            Filter::IsNull(a) => get(a).is_null(),
            Filter::IsNotNull(a) => !get(a).is_null(),
            Filter::Gt(a, v) => compare(get(a), v) == Some(Ordering::Greater),
            Filter::Gte(a, v) => matches!(
                compare(get(a), v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(a, v) => compare(get(a), v) == Some(Ordering::Less),
            Filter::Lte(a, v) => matches!(compare(get(a), v), Some(Ordering::Less | Ordering::Equal)),
            Filter::Or(items) => items.iter().any(|f| f.matches(values)),
            Filter::And(items) => items.iter().all(|f| f.matches(values)),
        }
    }
}

/// SQL-like equality: numbers compare by value, everything else structurally
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Ordering for range filters and sorting; null never compares
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// A select query against one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub entity_type: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Order)>,
    pub limit: Option<usize>,
    /// Include soft-deleted records
    pub with_deleted: bool,
}

impl Query {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Query {
            entity_type: entity_type.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            with_deleted: false,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn order_by(mut self, attribute: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((attribute.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    /// Whether a stored record satisfies every filter of this query
    pub fn matches(&self, values: &Row) -> bool {
        if !self.with_deleted && values.get("deleted").and_then(Value::as_bool).unwrap_or(false) {
            return false;
        }
        self.filters.iter().all(|f| f.matches(values))
    }
}
