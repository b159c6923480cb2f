use crate::{
    error::TypeMismatch,
    expr::{BinaryOp, Expr, ExprType, UnaryOp, check},
};
use std::ops::{BitAnd, BitOr, Not};

///
/// Predicate
///
/// An expression proven boolean when it was built.
/// Absent predicates are `None`; combining `None` with `and`/`or` yields the
/// other operand unchanged, which is what dynamic where-clauses rely on.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Predicate(Expr);

impl Predicate {
    // Callers guarantee `expr` is boolean.
    pub(crate) const fn from_boolean(expr: Expr) -> Self {
        Self(expr)
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    /// `self AND other`; an absent `other` leaves `self` unchanged.
    #[must_use]
    pub fn and(self, other: impl Into<Option<Self>>) -> Self {
        match other.into() {
            Some(other) => self.combine(BinaryOp::And, other),
            None => self,
        }
    }

    /// `self OR other`; an absent `other` leaves `self` unchanged.
    #[must_use]
    pub fn or(self, other: impl Into<Option<Self>>) -> Self {
        match other.into() {
            Some(other) => self.combine(BinaryOp::Or, other),
            None => self,
        }
    }

    fn combine(self, op: BinaryOp, other: Self) -> Self {
        Self(Expr::binary(op, self.0, other.0, ExprType::Boolean))
    }
}

impl TryFrom<Expr> for Predicate {
    type Error = TypeMismatch;

    /// Accepts boolean expressions, e.g. a `Bool` column.
    fn try_from(expr: Expr) -> Result<Self, Self::Error> {
        check::boolean("predicate", &expr)?;

        Ok(Self(expr))
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(Expr::unary(UnaryOp::Not, self.0, ExprType::Boolean))
    }
}

// ---------------------------------------------------------------------
// Option-level combinators
// ---------------------------------------------------------------------

/// AND of two optional predicates. Absent operands are neutral.
#[must_use]
pub fn and(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
    match (left, right) {
        (Some(left), right) => Some(left.and(right)),
        (None, right) => right,
    }
}

/// OR of two optional predicates. Absent operands are neutral.
#[must_use]
pub fn or(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
    match (left, right) {
        (Some(left), right) => Some(left.or(right)),
        (None, right) => right,
    }
}

/// AND over any number of optional predicates, left to right.
pub fn all<I>(predicates: I) -> Option<Predicate>
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    predicates.into_iter().fold(None, and)
}

/// OR over any number of optional predicates, left to right.
pub fn any<I>(predicates: I) -> Option<Predicate>
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    predicates.into_iter().fold(None, or)
}

///
/// PredicateBuilder
///
/// Mutable accumulator for search forms: add conditions as parameters turn
/// out to be present, then hand the result to `where_`.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredicateBuilder {
    current: Option<Predicate>,
}

impl PredicateBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Start from an initial predicate.
    #[must_use]
    pub fn with(predicate: impl Into<Option<Predicate>>) -> Self {
        Self {
            current: predicate.into(),
        }
    }

    pub fn and(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        self.current = and(self.current.take(), predicate.into());
        self
    }

    pub fn or(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        self.current = or(self.current.take(), predicate.into());
        self
    }

    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Predicate> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn build(self) -> Option<Predicate> {
        self.current
    }
}

impl From<PredicateBuilder> for Option<Predicate> {
    fn from(builder: PredicateBuilder) -> Self {
        builder.current
    }
}
