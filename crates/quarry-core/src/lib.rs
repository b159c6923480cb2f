//! Core runtime for Quarry: expression tree, statement builders, the
//! renderer, result mapping, the execution boundary and the in-memory
//! reference engine.
//!
//! Control flow is strictly one-way:
//! schema → expression → builder → statement IR → renderer → executor → rows.

pub mod config;
pub mod error;
pub mod exec;
pub mod expr;
pub mod memory;
pub mod obs;
pub mod project;
pub mod query;
pub mod render;
pub mod session;
pub mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;

// re-exports
pub use quarry_schema as schema;

///
/// Prelude
///
/// Builder-facing surface: everything needed to declare a query, render it
/// and run it through a session.
///

pub mod prelude {
    pub use crate::{
        config::QuarryConfig,
        error::QueryError,
        exec::{CompiledQuery, Executor},
        expr::{
            CaseBuilder, Expr, ExprType, OrderTerm, Predicate, PredicateBuilder, TableExt,
            and, or,
        },
        memory::MemoryEngine,
        project::{Record, ResultRow, TargetDescriptor},
        query::{PagedSelect, Select, Statement, delete, select, select_from, update},
        render::Renderer,
        session::{BulkOutcome, Page, Session, Tracked},
        value::Value,
    };
    pub use quarry_schema::prelude::*;
}
