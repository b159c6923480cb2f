//! Module: query
//! Responsibility: fluent statement builders and the immutable statement IR.
//! Does not own: SQL text (render) or execution (exec, memory).
//!
//! Every builder validates in `build()`: scope resolution, clause
//! placement of aggregates, join conditions and assignment types all fail
//! there, before anything reaches an executor.

mod mutation;
mod paged;
mod scope;
mod select;

#[cfg(test)]
mod tests;

pub use mutation::{Assignment, Delete, DeleteBuilder, Update, UpdateBuilder, delete, update};
pub use paged::PagedSelect;
pub use select::{Join, JoinKind, Projection, Select, SelectBuilder, select, select_from};

use crate::error::QueryError;
use derive_more::Display;
use std::collections::BTreeSet;

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum StatementKind {
    #[display("delete")]
    Delete,
    #[display("select")]
    Select,
    #[display("update")]
    Update,
}

///
/// Statement
/// Validated, immutable statement IR.
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum Statement {
    Delete(Delete),
    Select(Select),
    Update(Update),
}

impl Statement {
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::Delete(_) => StatementKind::Delete,
            Self::Select(_) => StatementKind::Select,
            Self::Update(_) => StatementKind::Update,
        }
    }

    /// Physical table written by a bulk mutation.
    #[must_use]
    pub fn mutated_table(&self) -> Option<&str> {
        match self {
            Self::Delete(delete) => Some(delete.table().name()),
            Self::Update(update) => Some(update.table().name()),
            Self::Select(_) => None,
        }
    }

    /// Every physical table the statement reads, subqueries included.
    #[must_use]
    pub fn read_tables(&self) -> BTreeSet<String> {
        match self {
            Self::Select(select) => select.read_tables(),
            Self::Update(update) => update.read_tables(),
            Self::Delete(delete) => delete.read_tables(),
        }
    }
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

impl From<Update> for Statement {
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}

impl From<Delete> for Statement {
    fn from(delete: Delete) -> Self {
        Self::Delete(delete)
    }
}

///
/// IntoSubquery
///
/// Anything usable as a nested select. An unbuilt `SelectBuilder` is built
/// in correlated mode: columns of enclosing bindings stay free and are
/// resolved by the outer statement.
///

pub trait IntoSubquery {
    fn into_subquery(self) -> Result<Select, QueryError>;
}

impl IntoSubquery for Select {
    fn into_subquery(self) -> Result<Select, QueryError> {
        Ok(self)
    }
}

impl IntoSubquery for &Select {
    fn into_subquery(self) -> Result<Select, QueryError> {
        Ok(self.clone())
    }
}

impl IntoSubquery for SelectBuilder {
    fn into_subquery(self) -> Result<Select, QueryError> {
        self.build_correlated()
    }
}
