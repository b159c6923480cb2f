//! SQL comparison semantics over `Value`.
//!
//! `sql_*` follow three-valued logic: any comparison involving null, or two
//! values from different type families, is unknown (`None`). `sort_cmp` and
//! `group_eq` are total and exist for ordering and grouping only.

use crate::value::Value;
use std::cmp::Ordering;

/// SQL equality. `None` is unknown.
#[must_use]
pub fn sql_eq(left: &Value, right: &Value) -> Option<bool> {
    sql_cmp(left, right).map(Ordering::is_eq)
}

/// SQL ordering comparison. `None` is unknown.
#[must_use]
pub fn sql_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (a, b) if a.as_text().is_some() && b.as_text().is_some() => {
            Some(a.as_text()?.cmp(b.as_text()?))
        }
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Total order for sorting. Null placement is decided by the caller:
/// `nulls_first` puts nulls before every non-null value.
#[must_use]
pub fn sort_cmp(left: &Value, right: &Value, nulls_first: bool) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => sql_cmp(left, right).unwrap_or_else(|| family(left).cmp(&family(right))),
    }
}

/// Grouping / distinct equality: nulls group together.
#[must_use]
pub fn group_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        _ => sql_eq(left, right).unwrap_or(false),
    }
}

// Stable rank between type families, for incomparable pairs only.
const fn family(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Text(_) | Value::Enum(_) => 3,
    }
}
