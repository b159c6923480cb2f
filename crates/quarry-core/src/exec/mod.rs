//! Module: exec
//! Responsibility: the contract between built statements and a storage
//! engine.
//!
//! An engine receives a `CompiledQuery`: the immutable statement plus its
//! rendering. SQL backends send the text and parameters; engines that
//! interpret the IR directly (see `memory`) ignore the text.

use crate::{
    project::ResultRow,
    query::Statement,
    render::{RenderedQuery, Renderer},
    value::Value,
};
use std::{error::Error, sync::Arc};

/// Engine failure, surfaced to callers unmodified as `QueryError::Storage`.
pub type ExecutorError = Box<dyn Error + Send + Sync + 'static>;

///
/// CompiledQuery
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    statement: Arc<Statement>,
    rendered: RenderedQuery,
}

impl CompiledQuery {
    #[must_use]
    pub fn compile(statement: Statement, renderer: &Renderer) -> Self {
        let rendered = renderer.render(&statement);

        Self {
            statement: Arc::new(statement),
            rendered,
        }
    }

    #[must_use]
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    #[must_use]
    pub const fn rendered(&self) -> &RenderedQuery {
        &self.rendered
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.rendered.text()
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        self.rendered.params()
    }
}

///
/// Executor
///
/// A single blocking call per statement. Cancellation is abandoning the
/// call; the contract has no retry or transaction semantics.
///

pub trait Executor {
    /// Run a select and return its rows in result order.
    fn query(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>, ExecutorError>;

    /// Run an update or delete and return the number of affected rows.
    fn execute(&self, query: &CompiledQuery) -> Result<u64, ExecutorError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn query(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>, ExecutorError> {
        (**self).query(query)
    }

    fn execute(&self, query: &CompiledQuery) -> Result<u64, ExecutorError> {
        (**self).execute(query)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn query(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>, ExecutorError> {
        (**self).query(query)
    }

    fn execute(&self, query: &CompiledQuery) -> Result<u64, ExecutorError> {
        (**self).execute(query)
    }
}
