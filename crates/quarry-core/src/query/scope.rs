//! Scope resolution and clause checks shared by every statement builder.

use crate::{
    error::{Clause, QueryError, StructuralError},
    expr::{Expr, ExprKind},
};
use quarry_schema::{Column, SchemaError, Table};

///
/// Resolver
///
/// Bindings visible to one statement, in the order they were introduced.
/// In correlated mode a column whose binding is not visible is recorded as
/// free instead of failing; the enclosing statement resolves it.
///

#[derive(Debug)]
pub(super) struct Resolver {
    bindings: Vec<(String, String)>,
    correlated: bool,
    free: Vec<Column>,
}

impl Resolver {
    pub(super) const fn new(correlated: bool) -> Self {
        Self {
            bindings: Vec::new(),
            correlated,
            free: Vec::new(),
        }
    }

    /// Bring a table binding into scope.
    pub(super) fn bind(&mut self, table: &Table) -> Result<(), StructuralError> {
        if self.is_bound(table.binding()) {
            return Err(StructuralError::DuplicateBinding {
                binding: table.binding().to_string(),
            });
        }

        self.bindings
            .push((table.binding().to_string(), table.name().to_string()));

        Ok(())
    }

    pub(super) fn is_bound(&self, binding: &str) -> bool {
        self.bindings.iter().any(|(b, _)| b == binding)
    }

    /// Resolve every column `expr` reads.
    pub(super) fn resolve(&mut self, expr: &Expr) -> Result<(), QueryError> {
        for column in expr.referenced_columns() {
            self.resolve_column(column)?;
        }

        Ok(())
    }

    pub(super) fn resolve_column(&mut self, column: &Column) -> Result<(), QueryError> {
        let bound = self
            .bindings
            .iter()
            .find(|(binding, _)| binding == column.binding());

        match bound {
            Some((_, table)) if table == column.table() => Ok(()),
            Some((_, table)) => Err(SchemaError::UnknownColumn {
                table: table.clone(),
                column: column.name().to_string(),
            }
            .into()),
            None if self.correlated => {
                if !self.free.contains(column) {
                    self.free.push(column.clone());
                }
                Ok(())
            }
            None => Err(SchemaError::UnboundTable {
                binding: column.binding().to_string(),
            }
            .into()),
        }
    }

    pub(super) fn into_free(self) -> Vec<Column> {
        self.free
    }
}

/// Reject aggregates in clauses evaluated per row.
pub(super) fn no_aggregate(expr: &Expr, clause: Clause) -> Result<(), StructuralError> {
    if expr.contains_aggregate() {
        Err(StructuralError::AggregateNotAllowed { clause })
    } else {
        Ok(())
    }
}

/// Reject aggregates nested inside aggregate arguments.
pub(super) fn flat_aggregates(expr: &Expr) -> Result<(), StructuralError> {
    if let ExprKind::Aggregate { arg: Some(arg), .. } = expr.kind() {
        return no_aggregate(arg, Clause::AggregateArgument);
    }

    expr.children().into_iter().try_for_each(flat_aggregates)
}

/// In a grouped select every column outside an aggregate must be covered by
/// a group-by expression.
pub(super) fn grouped(expr: &Expr, group_by: &[Expr], clause: Clause) -> Result<(), StructuralError> {
    if group_by.contains(expr) {
        return Ok(());
    }

    match expr.kind() {
        ExprKind::Aggregate { .. } | ExprKind::Literal(_) | ExprKind::Subquery(_) => Ok(()),
        ExprKind::Column(column) => Err(StructuralError::UngroupedColumn {
            clause,
            column: column.to_string(),
        }),
        _ => expr
            .children()
            .into_iter()
            .try_for_each(|child| grouped(child, group_by, clause)),
    }
}

/// A distinct select may only order by what it projects.
pub(super) fn projected(expr: &Expr, projections: &[&Expr]) -> Result<(), StructuralError> {
    if projections.contains(&expr) {
        return Ok(());
    }

    match expr.kind() {
        ExprKind::Literal(_) => Ok(()),
        ExprKind::Column(column) => Err(StructuralError::DistinctOrderNotProjected {
            expr: column.to_string(),
        }),
        ExprKind::Aggregate { func, .. } => Err(StructuralError::DistinctOrderNotProjected {
            expr: func.as_str().to_string(),
        }),
        ExprKind::Subquery(_) => Err(StructuralError::DistinctOrderNotProjected {
            expr: "subquery".to_string(),
        }),
        _ => expr
            .children()
            .into_iter()
            .try_for_each(|child| projected(child, projections)),
    }
}
