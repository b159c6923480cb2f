use crate::expr::Expr;
use derive_more::Display;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum OrderDirection {
    #[default]
    #[display("ASC")]
    Asc,
    #[display("DESC")]
    Desc,
}

///
/// NullOrdering
///
/// `Default` leaves placement to the engine; the reference engine treats
/// null as the smallest value.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

///
/// OrderTerm
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderTerm {
    expr: Expr,
    direction: OrderDirection,
    nulls: NullOrdering,
}

impl OrderTerm {
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
            nulls: NullOrdering::Default,
        }
    }

    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
            nulls: NullOrdering::Default,
        }
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }

    #[must_use]
    pub const fn nulls(&self) -> NullOrdering {
        self.nulls
    }

    /// Effective placement: explicit, else nulls-smallest.
    #[must_use]
    pub const fn nulls_sort_first(&self) -> bool {
        match self.nulls {
            NullOrdering::First => true,
            NullOrdering::Last => false,
            NullOrdering::Default => matches!(self.direction, OrderDirection::Asc),
        }
    }
}

impl From<Expr> for OrderTerm {
    fn from(expr: Expr) -> Self {
        Self::asc(expr)
    }
}

impl From<&Expr> for OrderTerm {
    fn from(expr: &Expr) -> Self {
        Self::asc(expr.clone())
    }
}
