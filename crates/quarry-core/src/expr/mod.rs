//! Module: expr
//! Responsibility: immutable, typed expression nodes and their builders.
//! Does not own: scope resolution (query::scope) or evaluation (memory).
//!
//! Every node carries its semantic result type, fixed at construction. Type
//! errors therefore surface where the expression is written, not when the
//! statement runs.

mod case;
pub(crate) mod check;
mod ops;
mod order;
mod predicate;


pub use case::{CaseBranch, CaseBuilder, CaseExpr};
pub use order::{NullOrdering, OrderDirection, OrderTerm};
pub use predicate::{Predicate, PredicateBuilder, all, and, any, or};

use crate::{
    error::QueryError,
    query::{IntoSubquery, Select},
    value::Value,
};
use derive_more::Display;
use quarry_schema::{Column, ColumnType, SchemaError, Table};

///
/// ExprType
///
/// Semantic result type of an expression. `Opaque` is the type of an untyped
/// null and is compatible with everything.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ExprType {
    #[display("boolean")]
    Boolean,
    #[display("numeric")]
    Numeric,
    #[display("opaque")]
    Opaque,
    #[display("text")]
    Text,
}

impl ExprType {
    #[must_use]
    pub const fn of_column(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Bool => Self::Boolean,
            ColumnType::Int | ColumnType::Long => Self::Numeric,
            ColumnType::Enum { .. } | ColumnType::Text => Self::Text,
        }
    }

    /// Whether two operands of these types may meet in one comparison.
    #[must_use]
    pub const fn is_compatible(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Opaque, _)
                | (_, Self::Opaque)
                | (Self::Boolean, Self::Boolean)
                | (Self::Numeric, Self::Numeric)
                | (Self::Text, Self::Text)
        )
    }

    /// The more specific of two compatible types.
    #[must_use]
    pub const fn unify(self, other: Self) -> Self {
        match self {
            Self::Opaque => other,
            _ => self,
        }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum BinaryOp {
    Add,
    And,
    Concat,
    Div,
    Eq,
    Gt,
    Gte,
    In,
    Like,
    Lt,
    Lte,
    Mul,
    Ne,
    NotIn,
    Or,
    Sub,
}

impl BinaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::And => "AND",
            Self::Concat => "||",
            Self::Div => "/",
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "IN",
            Self::Like => "LIKE",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Mul => "*",
            Self::Ne => "<>",
            Self::NotIn => "NOT IN",
            Self::Or => "OR",
            Self::Sub => "-",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Lte
            | Self::Gt
            | Self::Gte
            | Self::Like
            | Self::In
            | Self::NotIn => 4,
            Self::Add | Self::Sub | Self::Concat => 5,
            Self::Mul | Self::Div => 6,
        }
    }
}

///
/// UnaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum UnaryOp {
    IsNotNull,
    IsNull,
    Not,
    ToText,
}

///
/// AggregateFn
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum AggregateFn {
    Avg,
    Count,
    CountDistinct,
    Max,
    Min,
    Sum,
}

impl AggregateFn {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Count | Self::CountDistinct => "COUNT",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Sum => "SUM",
        }
    }
}

///
/// ExprKind
/// Node shape. Read-only outside this module; build nodes through `Expr`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Aggregate {
        func: AggregateFn,
        arg: Option<Box<Expr>>,
    },
    Between {
        operand: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Case(Box<CaseExpr>),
    Column(Column),
    List(Vec<Expr>),
    Literal(Value),
    Subquery(Box<Select>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

///
/// Expr
///
/// Typed expression node. Cloning is cheap relative to building a statement;
/// combinators never mutate their inputs.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    kind: ExprKind,
    ty: ExprType,
}

impl Expr {
    pub(crate) const fn new(kind: ExprKind, ty: ExprType) -> Self {
        Self { kind, ty }
    }

    #[must_use]
    pub fn column(column: Column) -> Self {
        let ty = ExprType::of_column(column.ty());

        Self::new(ExprKind::Column(column), ty)
    }

    /// Literal value; rendered as a bound parameter (null is inlined).
    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.expr_type();

        Self::new(ExprKind::Literal(value), ty)
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::new(ExprKind::Literal(Value::Null), ExprType::Opaque)
    }

    /// `COUNT(*)`
    #[must_use]
    pub const fn count_all() -> Self {
        Self::new(
            ExprKind::Aggregate {
                func: AggregateFn::Count,
                arg: None,
            },
            ExprType::Numeric,
        )
    }

    /// Scalar subquery. The select must project exactly one expression.
    pub fn subquery(select: impl IntoSubquery) -> Result<Self, QueryError> {
        let select = select.into_subquery()?;
        let ty = check::single_projection(&select)?;

        Ok(Self::new(ExprKind::Subquery(Box::new(select)), ty))
    }

    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[must_use]
    pub const fn expr_type(&self) -> ExprType {
        self.ty
    }

    #[must_use]
    pub const fn as_column(&self) -> Option<&Column> {
        match &self.kind {
            ExprKind::Column(column) => Some(column),
            _ => None,
        }
    }

    /// True when an aggregate appears anywhere outside nested subqueries.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        matches!(self.kind, ExprKind::Aggregate { .. })
            || self.children().into_iter().any(Self::contains_aggregate)
    }

    /// Direct children, in evaluation order. Subqueries are opaque.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            ExprKind::Aggregate { arg, .. } => arg.as_deref().into_iter().collect(),
            ExprKind::Between { operand, low, high } => vec![&**operand, &**low, &**high],
            ExprKind::Binary { left, right, .. } => vec![&**left, &**right],
            ExprKind::Case(case) => case.children(),
            ExprKind::List(items) => items.iter().collect(),
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Column(_) | ExprKind::Literal(_) | ExprKind::Subquery(_) => Vec::new(),
        }
    }

    /// Every column this expression needs from its enclosing scope,
    /// including the outer references of nested subqueries.
    pub(crate) fn referenced_columns(&self) -> Vec<&Column> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match &self.kind {
            ExprKind::Column(column) => out.push(column),
            ExprKind::Subquery(select) => out.extend(select.free_columns()),
            _ => {
                for child in self.children() {
                    child.collect_columns(out);
                }
            }
        }
    }

    // Unchecked binary node; callers validate operand types first.
    pub(crate) fn binary(op: BinaryOp, left: Self, right: Self, ty: ExprType) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub(crate) fn unary(op: UnaryOp, operand: Self, ty: ExprType) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }
}

// ---------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Self::column(column)
    }
}

impl From<&Column> for Expr {
    fn from(column: &Column) -> Self {
        Self::column(column.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::constant(value)
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        predicate.into_expr()
    }
}

macro_rules! impl_from_literal {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Self::constant(v)
                }
            }
        )*
    };
}

impl_from_literal!(bool, i32, i64, u32, f64, &str, String);

impl<T: Into<Value>> From<Option<T>> for Expr {
    fn from(v: Option<T>) -> Self {
        Self::constant(v)
    }
}

///
/// TableExt
///
/// Column expressions straight off a table binding:
/// `member.col("age")?.gt(10)?`.
///

pub trait TableExt {
    fn col(&self, name: &str) -> Result<Expr, SchemaError>;

    /// Every column in declaration order.
    fn all_columns(&self) -> Vec<Expr>;
}

impl TableExt for Table {
    fn col(&self, name: &str) -> Result<Expr, SchemaError> {
        self.column(name).map(Expr::column)
    }

    fn all_columns(&self) -> Vec<Expr> {
        self.columns().map(Expr::column).collect()
    }
}
