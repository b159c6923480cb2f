use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Declaration, lookup and scope-resolution failures.
/// Scope resolution lives in the query builder but reports through this type
/// so that every "unknown table/column" condition shares one taxonomy.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum SchemaError {
    #[error("schema already installed")]
    AlreadyInstalled,

    #[error("duplicate column '{column}' on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("duplicate relation '{relation}' on table '{table}'")]
    DuplicateRelation { table: String, relation: String },

    #[error("duplicate table '{table}'")]
    DuplicateTable { table: String },

    #[error("table '{table}' declares no columns")]
    EmptyTable { table: String },

    #[error("invalid identifier '{ident}': {reason}")]
    InvalidIdentifier { ident: String, reason: &'static str },

    #[error("relation '{table}.{relation}' is invalid: {reason}")]
    InvalidRelation {
        table: String,
        relation: String,
        reason: String,
    },

    #[error("schema not installed")]
    NotInstalled,

    #[error("table or alias '{binding}' is not in scope")]
    UnboundTable { binding: String },

    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("unknown relation '{relation}' on table '{table}'")]
    UnknownRelation { table: String, relation: String },

    #[error("unknown table '{table}'")]
    UnknownTable { table: String },

    #[error("schema validation failed: {}", join_errors(.0))]
    Validation(Vec<Self>),
}

impl SchemaError {
    /// Collapse a list of validation failures into one error.
    ///
    /// A single failure is returned as-is; several are wrapped in `Validation`.
    pub(crate) fn collect(mut errors: Vec<Self>) -> Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Validation(errors)),
        }
    }
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
