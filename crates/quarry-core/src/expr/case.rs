use crate::{
    error::{QueryError, StructuralError, TypeMismatch},
    expr::{Expr, ExprKind, ExprType, check},
};

///
/// CaseBranch
///

#[derive(Clone, Debug, PartialEq)]
pub struct CaseBranch {
    when: Expr,
    then: Expr,
}

impl CaseBranch {
    /// Value compared against the operand (simple case) or the condition
    /// (searched case).
    #[must_use]
    pub const fn when(&self) -> &Expr {
        &self.when
    }

    #[must_use]
    pub const fn then(&self) -> &Expr {
        &self.then
    }
}

///
/// CaseExpr
///
/// Branches are kept in declaration order; the first match wins and no match
/// yields `otherwise`, or null when there is none.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CaseExpr {
    operand: Option<Expr>,
    branches: Vec<CaseBranch>,
    otherwise: Option<Expr>,
}

impl CaseExpr {
    #[must_use]
    pub const fn operand(&self) -> Option<&Expr> {
        self.operand.as_ref()
    }

    #[must_use]
    pub fn branches(&self) -> &[CaseBranch] {
        &self.branches
    }

    #[must_use]
    pub const fn otherwise(&self) -> Option<&Expr> {
        self.otherwise.as_ref()
    }

    pub(super) fn children(&self) -> Vec<&Expr> {
        let mut out = Vec::with_capacity(self.branches.len() * 2 + 2);
        out.extend(&self.operand);
        for branch in &self.branches {
            out.push(&branch.when);
            out.push(&branch.then);
        }
        out.extend(&self.otherwise);
        out
    }
}

///
/// CaseBuilder
///
/// Collects branches; the first type error is kept and reported when the
/// case is finished, so branches chain without intermediate `?`.
///

#[derive(Debug)]
#[must_use]
pub struct CaseBuilder {
    operand: Option<Expr>,
    branches: Vec<CaseBranch>,
    result: ExprType,
    error: Option<QueryError>,
}

impl CaseBuilder {
    pub(super) const fn simple(operand: Expr) -> Self {
        Self {
            operand: Some(operand),
            branches: Vec::new(),
            result: ExprType::Opaque,
            error: None,
        }
    }

    /// `CASE WHEN condition THEN r ... END`
    pub const fn searched() -> Self {
        Self {
            operand: None,
            branches: Vec::new(),
            result: ExprType::Opaque,
            error: None,
        }
    }

    /// Add a branch. For a simple case `when` is compared with the operand;
    /// for a searched case it must be boolean.
    pub fn when(mut self, when: impl Into<Expr>, then: impl Into<Expr>) -> Self {
        let (when, then) = (when.into(), then.into());

        if self.error.is_none()
            && let Err(err) = self.check_branch(&when, &then)
        {
            self.error = Some(err);
        }

        self.result = self.result.unify(then.expr_type());
        self.branches.push(CaseBranch { when, then });
        self
    }

    /// Finish with a fallback value.
    pub fn otherwise(mut self, value: impl Into<Expr>) -> Result<Expr, QueryError> {
        let value = value.into();
        self.check_result(&value)?;
        self.result = self.result.unify(value.expr_type());

        self.finish(Some(value))
    }

    /// Finish without a fallback; unmatched rows yield null.
    pub fn end(self) -> Result<Expr, QueryError> {
        self.finish(None)
    }

    fn finish(self, otherwise: Option<Expr>) -> Result<Expr, QueryError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.branches.is_empty() {
            return Err(StructuralError::CaseWithoutBranches.into());
        }

        Ok(Expr::new(
            ExprKind::Case(Box::new(CaseExpr {
                operand: self.operand,
                branches: self.branches,
                otherwise,
            })),
            self.result,
        ))
    }

    fn check_branch(&self, when: &Expr, then: &Expr) -> Result<(), QueryError> {
        match &self.operand {
            Some(operand) => check::comparable("CASE", operand, when)?,
            None => check::boolean("case condition", when)?,
        }

        self.check_result(then)
    }

    fn check_result(&self, then: &Expr) -> Result<(), QueryError> {
        if self.result.is_compatible(then.expr_type()) {
            Ok(())
        } else {
            Err(QueryError::TypeMismatch(TypeMismatch::Operands {
                op: "CASE",
                left: self.result,
                right: then.expr_type(),
            }))
        }
    }
}
