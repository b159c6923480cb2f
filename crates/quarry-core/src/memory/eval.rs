//! Expression evaluation over row tuples.

use crate::{
    expr::{AggregateFn, BinaryOp, CaseExpr, Expr, ExprKind, UnaryOp},
    memory::{MemoryError, MemoryTable},
    value::{Value, group_eq, sort_cmp, sql_cmp, sql_eq},
};
use quarry_schema::Column;
use std::{cmp::Ordering, collections::BTreeMap};

/// One candidate row: a slot per source, `None` for a null-extended side.
pub(super) type Tuple<'d> = Vec<Option<&'d [Value]>>;

///
/// Source
/// A table binding as seen by the evaluator.
///

#[derive(Clone, Copy, Debug)]
pub(super) struct Source<'d> {
    pub(super) binding: &'d str,
    pub(super) table: &'d MemoryTable,
}

///
/// Frame
///
/// Evaluation context: the sources in scope, the current tuple, the rows of
/// the current group (grouped selects only) and the enclosing frame for
/// correlated subqueries.
///

#[derive(Clone, Copy)]
pub(super) struct Frame<'a, 'd> {
    pub(super) sources: &'a [Source<'d>],
    pub(super) tuple: &'a [Option<&'d [Value]>],
    pub(super) group: Option<&'a [Tuple<'d>]>,
    pub(super) outer: Option<&'a Frame<'a, 'd>>,
}

impl<'d> Frame<'_, 'd> {
    fn column(&self, column: &Column) -> Result<Value, MemoryError> {
        let position = self
            .sources
            .iter()
            .position(|source| source.binding == column.binding());

        match position {
            Some(index) => match self.tuple.get(index).copied().flatten() {
                Some(row) => {
                    let source = &self.sources[index];
                    let column_index = source.table.column_index(column.name())?;
                    Ok(row[column_index].clone())
                }
                None => Ok(Value::Null),
            },
            None => match self.outer {
                Some(outer) => outer.column(column),
                None => Err(MemoryError::UnboundBinding {
                    binding: column.binding().to_string(),
                }),
            },
        }
    }
}

/// Three-valued truth of a boolean value; null (unknown) is `None`.
pub(super) const fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

const fn from_truth(truth: Option<bool>) -> Value {
    match truth {
        Some(b) => Value::Bool(b),
        None => Value::Null,
    }
}

///
/// Evaluator
///

pub(super) struct Evaluator<'d> {
    tables: &'d BTreeMap<String, MemoryTable>,
}

impl<'d> Evaluator<'d> {
    pub(super) const fn new(tables: &'d BTreeMap<String, MemoryTable>) -> Self {
        Self { tables }
    }

    pub(super) fn table(&self, name: &str) -> Result<&'d MemoryTable, MemoryError> {
        self.tables
            .get(name)
            .ok_or_else(|| MemoryError::UnknownTable {
                table: name.to_string(),
            })
    }

    /// True only when the predicate is definitely true.
    pub(super) fn test(&self, expr: &'d Expr, frame: &Frame<'_, 'd>) -> Result<bool, MemoryError> {
        Ok(truth(&self.eval(expr, frame)?) == Some(true))
    }

    pub(super) fn eval(&self, expr: &'d Expr, frame: &Frame<'_, 'd>) -> Result<Value, MemoryError> {
        match expr.kind() {
            ExprKind::Column(column) => frame.column(column),
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, frame),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, frame)?;
                Ok(unary(*op, &value))
            }
            ExprKind::Between { operand, low, high } => {
                let value = self.eval(operand, frame)?;
                let low = sql_cmp(&value, &self.eval(low, frame)?).map(Ordering::is_ge);
                let high = sql_cmp(&value, &self.eval(high, frame)?).map(Ordering::is_le);
                Ok(from_truth(and3(low, high)))
            }
            ExprKind::List(items) => Err(MemoryError::Operands {
                op: "list",
                left: format!("{} item(s)", items.len()),
                right: "no operator".to_string(),
            }),
            ExprKind::Case(case) => self.case(case, frame),
            ExprKind::Subquery(select) => {
                let mut rows = self.run_select(select, Some(frame))?;
                match rows.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(rows.swap_remove(0).swap_remove(0)),
                    rows => Err(MemoryError::ScalarSubqueryRows { rows }),
                }
            }
            ExprKind::Aggregate { func, arg } => self.aggregate(*func, arg.as_deref(), frame),
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: &'d Expr,
        right: &'d Expr,
        frame: &Frame<'_, 'd>,
    ) -> Result<Value, MemoryError> {
        let lhs = self.eval(left, frame)?;

        match op {
            BinaryOp::And => {
                let l = truth(&lhs);
                if l == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let r = truth(&self.eval(right, frame)?);
                Ok(from_truth(and3(l, r)))
            }
            BinaryOp::Or => {
                let l = truth(&lhs);
                if l == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let r = truth(&self.eval(right, frame)?);
                Ok(from_truth(or3(l, r)))
            }
            BinaryOp::In | BinaryOp::NotIn => {
                let candidates = self.members(right, frame)?;
                let found = in3(&lhs, &candidates);
                Ok(from_truth(if op == BinaryOp::In {
                    found
                } else {
                    found.map(|b| !b)
                }))
            }
            _ => {
                let rhs = self.eval(right, frame)?;
                binary_scalar(op, &lhs, &rhs)
            }
        }
    }

    // Right-hand side of IN: a literal list or a one-column subquery.
    fn members(&self, expr: &'d Expr, frame: &Frame<'_, 'd>) -> Result<Vec<Value>, MemoryError> {
        match expr.kind() {
            ExprKind::List(items) => items.iter().map(|item| self.eval(item, frame)).collect(),
            ExprKind::Subquery(select) => Ok(self
                .run_select(select, Some(frame))?
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect()),
            _ => Ok(vec![self.eval(expr, frame)?]),
        }
    }

    fn case(&self, case: &'d CaseExpr, frame: &Frame<'_, 'd>) -> Result<Value, MemoryError> {
        let operand = case
            .operand()
            .map(|operand| self.eval(operand, frame))
            .transpose()?;

        for branch in case.branches() {
            let when = self.eval(branch.when(), frame)?;
            let matched = match &operand {
                Some(operand) => sql_eq(operand, &when) == Some(true),
                None => truth(&when) == Some(true),
            };
            if matched {
                return self.eval(branch.then(), frame);
            }
        }

        case.otherwise()
            .map_or(Ok(Value::Null), |otherwise| self.eval(otherwise, frame))
    }

    fn aggregate(
        &self,
        func: AggregateFn,
        arg: Option<&'d Expr>,
        frame: &Frame<'_, 'd>,
    ) -> Result<Value, MemoryError> {
        let group = frame.group.ok_or(MemoryError::AggregateOutsideGroup)?;

        let Some(arg) = arg else {
            return Ok(Value::Int(len_i64(group.len())));
        };

        let mut values = Vec::with_capacity(group.len());
        for tuple in group {
            let row_frame = Frame {
                sources: frame.sources,
                tuple,
                group: None,
                outer: frame.outer,
            };
            let value = self.eval(arg, &row_frame)?;
            if !value.is_null() {
                values.push(value);
            }
        }

        aggregate_values(func, values)
    }
}

// ---------------------------------------------------------------------
// Scalar operators
// ---------------------------------------------------------------------

fn binary_scalar(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, MemoryError> {
    let compare = |test: fn(Ordering) -> bool| from_truth(sql_cmp(lhs, rhs).map(test));

    Ok(match op {
        BinaryOp::Eq => compare(Ordering::is_eq),
        BinaryOp::Ne => compare(Ordering::is_ne),
        BinaryOp::Lt => compare(Ordering::is_lt),
        BinaryOp::Lte => compare(Ordering::is_le),
        BinaryOp::Gt => compare(Ordering::is_gt),
        BinaryOp::Gte => compare(Ordering::is_ge),
        BinaryOp::Like => match (lhs.as_text(), rhs.as_text()) {
            (Some(text), Some(pattern)) => Value::Bool(like(text, pattern)),
            _ => Value::Null,
        },
        BinaryOp::Concat => match (lhs.as_text(), rhs.as_text()) {
            (Some(a), Some(b)) => Value::Text(format!("{a}{b}")),
            _ => Value::Null,
        },
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            return arithmetic(op, lhs, rhs);
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::In | BinaryOp::NotIn => {
            return Err(operands(op, lhs, rhs));
        }
    })
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, MemoryError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            _ if b == 0 => return Err(MemoryError::DivisionByZero),
            _ => a.checked_div(b),
        };

        return result
            .map(Value::Int)
            .ok_or(MemoryError::Overflow { op: op.as_str() });
    }

    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(operands(op, lhs, rhs));
    };

    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        _ if b == 0.0 => return Err(MemoryError::DivisionByZero),
        _ => a / b,
    }))
}

fn unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Not => from_truth(truth(value).map(|b| !b)),
        UnaryOp::IsNull => Value::Bool(value.is_null()),
        UnaryOp::IsNotNull => Value::Bool(!value.is_null()),
        UnaryOp::ToText => value.to_text().map_or(Value::Null, Value::Text),
    }
}

fn aggregate_values(func: AggregateFn, values: Vec<Value>) -> Result<Value, MemoryError> {
    Ok(match func {
        AggregateFn::Count => Value::Int(len_i64(values.len())),
        AggregateFn::CountDistinct => {
            let mut distinct: Vec<Value> = Vec::with_capacity(values.len());
            for value in values {
                if !distinct.iter().any(|seen| group_eq(seen, &value)) {
                    distinct.push(value);
                }
            }
            Value::Int(len_i64(distinct.len()))
        }
        AggregateFn::Max => extreme(values, Ordering::Greater),
        AggregateFn::Min => extreme(values, Ordering::Less),
        AggregateFn::Sum => {
            let mut total: Option<Value> = None;
            for value in values {
                total = Some(match total {
                    Some(total) => arithmetic(BinaryOp::Add, &total, &value)?,
                    None => value,
                });
            }
            total.unwrap_or(Value::Null)
        }
        AggregateFn::Avg => {
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let mut sum = 0.0;
            for value in &values {
                sum += value
                    .as_f64()
                    .ok_or_else(|| operands(BinaryOp::Add, value, value))?;
            }
            #[expect(clippy::cast_precision_loss)]
            let count = values.len() as f64;
            Value::Float(sum / count)
        }
    })
}

fn extreme(values: Vec<Value>, keep: Ordering) -> Value {
    values
        .into_iter()
        .reduce(|best, value| {
            if sort_cmp(&value, &best, true) == keep {
                value
            } else {
                best
            }
        })
        .unwrap_or(Value::Null)
}

fn and3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

// SQL IN: true on any match, unknown if no match but a null took part.
// Nothing is in an empty set, not even null.
fn in3(value: &Value, candidates: &[Value]) -> Option<bool> {
    if candidates.is_empty() {
        return Some(false);
    }

    let mut unknown = value.is_null();
    for candidate in candidates {
        match sql_eq(value, candidate) {
            Some(true) => return Some(true),
            Some(false) => {}
            None => unknown = true,
        }
    }

    if unknown { None } else { Some(false) }
}

/// SQL `LIKE`: `%` matches any run, `_` exactly one character.
pub(super) fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp + 1;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

fn operands(op: BinaryOp, lhs: &Value, rhs: &Value) -> MemoryError {
    MemoryError::Operands {
        op: op.as_str(),
        left: format!("{lhs:?}"),
        right: format!("{rhs:?}"),
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
