use crate::{
    exec::ExecutorError, expr::ExprType, project::MappingError, query::StatementKind,
    session::ResponseError,
};
use derive_more::Display;
use quarry_schema::SchemaError;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Every failure a query can hit between declaration and typed results.
/// Build-time variants (`Schema`, `TypeMismatch`, `Structural`) never reach an
/// executor; `Storage` carries the engine's own error unmodified.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum QueryError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("storage engine failed: {0}")]
    Storage(#[source] ExecutorError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
}

impl QueryError {
    /// Stable classification, independent of the message text.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Mapping(_) => ErrorClass::Mapping,
            Self::Response(ResponseError::NotFound) => ErrorClass::NotFound,
            Self::Response(ResponseError::NotUnique { .. }) => ErrorClass::NotUnique,
            Self::Storage(_) => ErrorClass::Storage,
            Self::Structural(StructuralError::UnsupportedStatement { .. }) => {
                ErrorClass::Unsupported
            }
            Self::Schema(_) | Self::Structural(_) | Self::TypeMismatch(_) => ErrorClass::Invalid,
        }
    }

    /// True for failures detected before anything was sent to an executor.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::Structural(_) | Self::TypeMismatch(_)
        )
    }

    pub(crate) fn storage(err: ExecutorError) -> Self {
        Self::Storage(err)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Invalid,
    Mapping,
    NotFound,
    NotUnique,
    Storage,
    Unsupported,
}

///
/// Clause
/// Statement clause named in structural errors.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Clause {
    #[display("aggregate argument")]
    AggregateArgument,
    #[display("assignment")]
    Assignment,
    #[display("group by")]
    GroupBy,
    #[display("having")]
    Having,
    #[display("join on")]
    On,
    #[display("order by")]
    OrderBy,
    #[display("projection")]
    Projection,
    #[display("where")]
    Where,
}

///
/// StructuralError
///
/// Statement shapes that no schema or type could make valid.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum StructuralError {
    #[error("aggregate functions are not allowed in {clause}")]
    AggregateNotAllowed { clause: Clause },

    #[error("assignment target must be a column of the updated table, found {found}")]
    AssignmentTarget { found: String },

    #[error("case expression has no when branches")]
    CaseWithoutBranches,

    #[error("a count query must be supplied: {reason}")]
    CountQueryRequired { reason: &'static str },

    #[error("distinct select orders by '{expr}', which is not projected")]
    DistinctOrderNotProjected { expr: String },

    #[error("column '{column}' is assigned more than once")]
    DuplicateAssignment { column: String },

    #[error("binding '{binding}' appears more than once in from/joins")]
    DuplicateBinding { binding: String },

    #[error("update has no assignments")]
    EmptyAssignments,

    #[error("in-list is empty")]
    EmptyInList,

    #[error("select has no projections")]
    EmptyProjection,

    #[error("having requires a group by clause")]
    HavingWithoutGroupBy,

    #[error("invalid count query: {reason}")]
    InvalidCountQuery { reason: String },

    #[error("select has no from source")]
    MissingFrom,

    #[error("join on '{binding}' has neither an on condition nor a relation")]
    MissingJoinCondition { binding: String },

    #[error("on must follow a join")]
    OnWithoutJoin,

    #[error("page size {requested} exceeds the configured maximum of {max}")]
    PageTooLarge { requested: String, max: u64 },

    #[error("relation '{relation}' starts from '{binding}', which is not joined before it")]
    RelationSourceOutOfScope { relation: String, binding: String },

    #[error("relation '{relation}' targets table '{expected}', but the join target is '{found}'")]
    RelationTargetMismatch {
        relation: String,
        expected: String,
        found: String,
    },

    #[error("subquery must project exactly one column, found {found}")]
    SubqueryArity { found: usize },

    #[error("column '{column}' in {clause} is neither grouped nor aggregated")]
    UngroupedColumn { clause: Clause, column: String },

    #[error("{operation} does not accept a {kind} statement")]
    UnsupportedStatement {
        kind: StatementKind,
        operation: &'static str,
    },
}

///
/// TypeMismatch
///
/// Operand types rejected while an expression was being built.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum TypeMismatch {
    #[error("'{variant}' is not a variant of enum column '{column}'")]
    EnumVariant { column: String, variant: String },

    #[error("{context} must be boolean, found {found}")]
    NonBoolean {
        context: &'static str,
        found: ExprType,
    },

    #[error("column '{column}' is not nullable and cannot be set to null")]
    NullAssignment { column: String },

    #[error("'{op}' expects a {expected} operand, found {found}")]
    Operand {
        op: &'static str,
        expected: ExprType,
        found: ExprType,
    },

    #[error("'{op}' cannot combine {left} with {right}")]
    Operands {
        op: &'static str,
        left: ExprType,
        right: ExprType,
    },
}
