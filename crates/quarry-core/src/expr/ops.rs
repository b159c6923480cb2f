//! Fluent builders on `Expr`: comparisons, arithmetic, aggregates and
//! ordering. Methods take `&self` so one column expression can feed many
//! predicates.

use crate::{
    error::{QueryError, StructuralError},
    expr::{
        AggregateFn, BinaryOp, CaseBuilder, Expr, ExprKind, ExprType, OrderTerm, Predicate,
        UnaryOp, check,
    },
    query::{IntoSubquery, Projection},
};

impl Expr {
    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    pub fn eq(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Eq, rhs.into())
    }

    pub fn ne(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Ne, rhs.into())
    }

    pub fn gt(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Gt, rhs.into())
    }

    /// Greater than or equal.
    pub fn goe(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Gte, rhs.into())
    }

    pub fn lt(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Lt, rhs.into())
    }

    /// Less than or equal.
    pub fn loe(&self, rhs: impl Into<Self>) -> Result<Predicate, QueryError> {
        self.compare(BinaryOp::Lte, rhs.into())
    }

    /// SQL `LIKE` with `%` and `_` wildcards. Both sides must be text.
    pub fn like(&self, pattern: impl Into<Self>) -> Result<Predicate, QueryError> {
        let pattern = pattern.into();
        check::operand("LIKE", self, ExprType::Text)?;
        check::operand("LIKE", &pattern, ExprType::Text)?;

        Ok(Predicate::from_boolean(Self::binary(
            BinaryOp::Like,
            self.clone(),
            pattern,
            ExprType::Boolean,
        )))
    }

    pub fn in_list<I>(&self, values: I) -> Result<Predicate, QueryError>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        self.membership(BinaryOp::In, values)
    }

    pub fn not_in_list<I>(&self, values: I) -> Result<Predicate, QueryError>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        self.membership(BinaryOp::NotIn, values)
    }

    /// `self IN (subquery)`. The subquery must project one compatible column.
    pub fn in_subquery(&self, select: impl IntoSubquery) -> Result<Predicate, QueryError> {
        let subquery = Self::subquery(select)?;
        check::comparable("IN", self, &subquery)?;

        Ok(Predicate::from_boolean(Self::binary(
            BinaryOp::In,
            self.clone(),
            subquery,
            ExprType::Boolean,
        )))
    }

    /// Inclusive range.
    pub fn between(
        &self,
        low: impl Into<Self>,
        high: impl Into<Self>,
    ) -> Result<Predicate, QueryError> {
        let (low, high) = (low.into(), high.into());
        check::comparable("BETWEEN", self, &low)?;
        check::comparable("BETWEEN", self, &high)?;

        Ok(Predicate::from_boolean(Self::new(
            ExprKind::Between {
                operand: Box::new(self.clone()),
                low: Box::new(low),
                high: Box::new(high),
            },
            ExprType::Boolean,
        )))
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::from_boolean(Self::unary(UnaryOp::IsNull, self.clone(), ExprType::Boolean))
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::from_boolean(Self::unary(
            UnaryOp::IsNotNull,
            self.clone(),
            ExprType::Boolean,
        ))
    }

    fn compare(&self, op: BinaryOp, rhs: Self) -> Result<Predicate, QueryError> {
        check::comparable(op.as_str(), self, &rhs)?;

        Ok(Predicate::from_boolean(Self::binary(
            op,
            self.clone(),
            rhs,
            ExprType::Boolean,
        )))
    }

    fn membership<I>(&self, op: BinaryOp, values: I) -> Result<Predicate, QueryError>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        let items: Vec<Self> = values.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(StructuralError::EmptyInList.into());
        }

        let mut ty = ExprType::Opaque;
        for item in &items {
            check::comparable(op.as_str(), self, item)?;
            ty = ty.unify(item.expr_type());
        }

        Ok(Predicate::from_boolean(Self::binary(
            op,
            self.clone(),
            Self::new(ExprKind::List(items), ty),
            ExprType::Boolean,
        )))
    }

    // ------------------------------------------------------------------
    // Arithmetic and text
    // ------------------------------------------------------------------

    pub fn add(&self, rhs: impl Into<Self>) -> Result<Self, QueryError> {
        self.arithmetic(BinaryOp::Add, rhs.into())
    }

    pub fn sub(&self, rhs: impl Into<Self>) -> Result<Self, QueryError> {
        self.arithmetic(BinaryOp::Sub, rhs.into())
    }

    pub fn mul(&self, rhs: impl Into<Self>) -> Result<Self, QueryError> {
        self.arithmetic(BinaryOp::Mul, rhs.into())
    }

    pub fn div(&self, rhs: impl Into<Self>) -> Result<Self, QueryError> {
        self.arithmetic(BinaryOp::Div, rhs.into())
    }

    /// Text concatenation (`||`).
    pub fn concat(&self, rhs: impl Into<Self>) -> Result<Self, QueryError> {
        let rhs = rhs.into();
        check::operand("||", self, ExprType::Text)?;
        check::operand("||", &rhs, ExprType::Text)?;

        Ok(Self::binary(
            BinaryOp::Concat,
            self.clone(),
            rhs,
            ExprType::Text,
        ))
    }

    /// Cast to text.
    #[must_use]
    pub fn string_value(&self) -> Self {
        Self::unary(UnaryOp::ToText, self.clone(), ExprType::Text)
    }

    fn arithmetic(&self, op: BinaryOp, rhs: Self) -> Result<Self, QueryError> {
        check::operand(op.as_str(), self, ExprType::Numeric)?;
        check::operand(op.as_str(), &rhs, ExprType::Numeric)?;

        Ok(Self::binary(op, self.clone(), rhs, ExprType::Numeric))
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    pub fn avg(&self) -> Result<Self, QueryError> {
        check::operand("AVG", self, ExprType::Numeric)?;

        Ok(self.aggregate(AggregateFn::Avg, ExprType::Numeric))
    }

    pub fn sum(&self) -> Result<Self, QueryError> {
        check::operand("SUM", self, ExprType::Numeric)?;

        Ok(self.aggregate(AggregateFn::Sum, ExprType::Numeric))
    }

    #[must_use]
    pub fn max(&self) -> Self {
        self.aggregate(AggregateFn::Max, self.expr_type())
    }

    #[must_use]
    pub fn min(&self) -> Self {
        self.aggregate(AggregateFn::Min, self.expr_type())
    }

    #[must_use]
    pub fn count(&self) -> Self {
        self.aggregate(AggregateFn::Count, ExprType::Numeric)
    }

    #[must_use]
    pub fn count_distinct(&self) -> Self {
        self.aggregate(AggregateFn::CountDistinct, ExprType::Numeric)
    }

    fn aggregate(&self, func: AggregateFn, ty: ExprType) -> Self {
        Self::new(
            ExprKind::Aggregate {
                func,
                arg: Some(Box::new(self.clone())),
            },
            ty,
        )
    }

    // ------------------------------------------------------------------
    // Ordering, aliasing, case
    // ------------------------------------------------------------------

    #[must_use]
    pub fn asc(&self) -> OrderTerm {
        OrderTerm::asc(self.clone())
    }

    #[must_use]
    pub fn desc(&self) -> OrderTerm {
        OrderTerm::desc(self.clone())
    }

    /// Projection under an explicit label.
    #[must_use]
    pub fn alias(&self, label: &str) -> Projection {
        Projection::aliased(self.clone(), label)
    }

    /// Simple case over this operand: `CASE self WHEN v THEN r ... END`.
    #[must_use]
    pub fn case(&self) -> CaseBuilder {
        CaseBuilder::simple(self.clone())
    }
}
