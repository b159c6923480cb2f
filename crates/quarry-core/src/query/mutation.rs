//! Bulk update and delete.
//!
//! Bulk statements go straight to the storage engine and bypass anything the
//! caller has already materialized; see `Session::is_stale`.

use crate::{
    error::{Clause, QueryError, StructuralError, TypeMismatch},
    expr::{Expr, ExprKind, Predicate, and, check},
    query::scope::{self, Resolver},
    value::Value,
};
use quarry_schema::{Column, Table};
use std::collections::BTreeSet;

///
/// Assignment
///

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    column: Column,
    value: Expr,
}

impl Assignment {
    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    #[must_use]
    pub const fn value(&self) -> &Expr {
        &self.value
    }
}

///
/// Update
///

#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    table: Table,
    assignments: Vec<Assignment>,
    filter: Option<Predicate>,
}

impl Update {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    pub(crate) fn read_tables(&self) -> BTreeSet<String> {
        let mut exprs: Vec<&Expr> = self.assignments.iter().map(Assignment::value).collect();
        exprs.extend(self.filter.iter().map(Predicate::expr));

        tables_of(&self.table, exprs)
    }
}

///
/// Delete
///

#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    table: Table,
    filter: Option<Predicate>,
}

impl Delete {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    pub(crate) fn read_tables(&self) -> BTreeSet<String> {
        tables_of(&self.table, self.filter.iter().map(Predicate::expr).collect())
    }
}

fn tables_of(table: &Table, exprs: Vec<&Expr>) -> BTreeSet<String> {
    let mut out = BTreeSet::from([table.name().to_string()]);
    let mut stack = exprs;
    while let Some(expr) = stack.pop() {
        if let ExprKind::Subquery(select) = expr.kind() {
            out.extend(select.read_tables());
        }
        stack.extend(expr.children());
    }
    out
}

// ---------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------

/// `UPDATE table SET ...`
pub fn update(table: &Table) -> UpdateBuilder {
    UpdateBuilder {
        table: table.clone(),
        assignments: Vec::new(),
        filter: None,
    }
}

/// `DELETE FROM table ...`
pub fn delete(table: &Table) -> DeleteBuilder {
    DeleteBuilder {
        table: table.clone(),
        filter: None,
    }
}

///
/// UpdateBuilder
///

#[derive(Clone, Debug)]
#[must_use]
pub struct UpdateBuilder {
    table: Table,
    assignments: Vec<(Expr, Expr)>,
    filter: Option<Predicate>,
}

impl UpdateBuilder {
    /// Assign `value` to `column`. Values are evaluated against the row as
    /// it was before the statement.
    pub fn set(mut self, column: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    pub fn where_(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.filter = and(self.filter.take(), predicate.into());
        self
    }

    pub fn build(self) -> Result<Update, QueryError> {
        if self.assignments.is_empty() {
            return Err(StructuralError::EmptyAssignments.into());
        }

        let mut resolver = Resolver::new(false);
        resolver.bind(&self.table)?;

        let mut assignments: Vec<Assignment> = Vec::with_capacity(self.assignments.len());
        for (target, value) in self.assignments {
            let column = assignment_target(&self.table, &target)?;

            if assignments.iter().any(|a| a.column == column) {
                return Err(StructuralError::DuplicateAssignment {
                    column: column.name().to_string(),
                }
                .into());
            }

            scope::no_aggregate(&value, Clause::Assignment)?;
            resolver.resolve(&value)?;
            check::comparable("SET", &target, &value)?;

            if matches!(value.kind(), ExprKind::Literal(Value::Null)) && !column.is_nullable() {
                return Err(TypeMismatch::NullAssignment {
                    column: column.name().to_string(),
                }
                .into());
            }

            assignments.push(Assignment { column, value });
        }

        let filter = check_filter(self.filter, &mut resolver)?;

        let update = Update {
            table: self.table,
            assignments,
            filter,
        };
        log::debug!(
            target: "quarry::query",
            "update on '{}' built with {} assignment(s)",
            update.table.name(),
            update.assignments.len()
        );

        Ok(update)
    }
}

///
/// DeleteBuilder
///

#[derive(Clone, Debug)]
#[must_use]
pub struct DeleteBuilder {
    table: Table,
    filter: Option<Predicate>,
}

impl DeleteBuilder {
    pub fn where_(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.filter = and(self.filter.take(), predicate.into());
        self
    }

    pub fn build(self) -> Result<Delete, QueryError> {
        let mut resolver = Resolver::new(false);
        resolver.bind(&self.table)?;
        let filter = check_filter(self.filter, &mut resolver)?;

        Ok(Delete {
            table: self.table,
            filter,
        })
    }
}

fn assignment_target(table: &Table, target: &Expr) -> Result<Column, StructuralError> {
    match target.as_column() {
        Some(column) if column.binding() == table.binding() && column.table() == table.name() => {
            Ok(column.clone())
        }
        Some(column) => Err(StructuralError::AssignmentTarget {
            found: column.to_string(),
        }),
        None => Err(StructuralError::AssignmentTarget {
            found: format!("{} expression", target.expr_type()),
        }),
    }
}

fn check_filter(
    filter: Option<Predicate>,
    resolver: &mut Resolver,
) -> Result<Option<Predicate>, QueryError> {
    if let Some(filter) = &filter {
        scope::no_aggregate(filter.expr(), Clause::Where)?;
        resolver.resolve(filter.expr())?;
    }

    Ok(filter)
}
