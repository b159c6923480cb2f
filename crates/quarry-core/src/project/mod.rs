//! Module: project
//! Responsibility: result rows and their binding into typed records.
//! Does not own: row production (exec) or statement shape (query).
//!
//! A binding strategy is chosen explicitly per target type through a
//! `TargetDescriptor`. Constructor binding is the preferred strategy: it is
//! checked positionally and needs no per-name lookup tables. Field and
//! setter binding match by label and are the less portable choice.

mod binding;
mod descriptor;
mod from_value;
mod row;


pub use binding::{RowBinding, TypedSelect, map_row};
pub use descriptor::{Record, TargetDescriptor};
pub use from_value::{ConstructorArgs, FromValue, ValueMismatch};
pub use row::{ResultRow, RowHeader};

use crate::expr::ExprType;
use thiserror::Error as ThisError;

///
/// MappingError
///
/// A projection could not be bound to the target type, either when the
/// binding was resolved (build time) or when a row was mapped.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum MappingError {
    #[error("target '{target}' takes {expected} constructor argument(s), projection has {found}")]
    Arity {
        target: String,
        expected: usize,
        found: usize,
    },

    #[error("descriptor for '{target}' is malformed: {reason}")]
    Descriptor { target: String, reason: String },

    #[error("row has {found} value(s), header has {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("column '{column}' is {found}, target '{target}' expects {expected}")]
    Type {
        target: String,
        column: String,
        expected: ExprType,
        found: ExprType,
    },

    #[error("column '{column}' has no binding on target '{target}'")]
    Unbound { target: String, column: String },

    #[error("column '{column}' cannot be bound on target '{target}': {reason}")]
    Value {
        target: String,
        column: String,
        reason: String,
    },
}
