use crate::{
    error::{QueryError, StructuralError},
    expr::ExprType,
    query::Select,
};

///
/// PagedSelect
///
/// A page query paired with the query that counts the full result. The
/// derived count keeps sources, joins and filter and drops projections,
/// ordering and the window. Distinct and grouped selects cannot derive a
/// correct count that way; the caller must supply one.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PagedSelect {
    page: Select,
    count: Select,
}

impl PagedSelect {
    pub fn new(page: Select) -> Result<Self, QueryError> {
        if page.is_distinct() {
            return Err(StructuralError::CountQueryRequired {
                reason: "distinct selects cannot derive a count",
            }
            .into());
        }
        if page.is_grouped() {
            return Err(StructuralError::CountQueryRequired {
                reason: "grouped selects cannot derive a count",
            }
            .into());
        }

        let count = page.derive_count();

        Ok(Self { page, count })
    }

    /// Pair `page` with a caller-supplied, usually cheaper, count query.
    /// It must project exactly one numeric expression.
    pub fn with_count_query(page: Select, count: Select) -> Result<Self, QueryError> {
        match count.projections() {
            [projection] if projection.expr().expr_type().is_compatible(ExprType::Numeric) => {}
            [projection] => {
                return Err(StructuralError::InvalidCountQuery {
                    reason: format!(
                        "projection must be numeric, found {}",
                        projection.expr().expr_type()
                    ),
                }
                .into());
            }
            other => {
                return Err(StructuralError::InvalidCountQuery {
                    reason: format!("expected one projection, found {}", other.len()),
                }
                .into());
            }
        }

        Ok(Self { page, count })
    }

    #[must_use]
    pub const fn page(&self) -> &Select {
        &self.page
    }

    #[must_use]
    pub const fn count(&self) -> &Select {
        &self.count
    }
}

impl Select {
    /// Pair this select with its derived count query.
    pub fn paged(self) -> Result<PagedSelect, QueryError> {
        PagedSelect::new(self)
    }
}
