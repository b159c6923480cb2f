//! Schema model for Quarry: tables, typed columns, foreign-key relations and
//! the process-wide registry they are published through.
//!
//! Everything here is an immutable value once built. Tables are cheap to clone
//! (column metadata is shared behind an `Arc`), and an aliased clone is a
//! distinct binding for scope resolution while pointing at the same metadata.

pub mod column;
pub mod error;
pub mod registry;
pub mod relation;
pub mod schema;
pub mod table;
pub mod types;


/// Maximum length for table, column, relation and alias identifiers.
pub const MAX_IDENT_LEN: usize = 64;

// re-exports
pub use column::{Column, ColumnDef};
pub use error::SchemaError;
pub use relation::{Relation, RelationDef};
pub use schema::{Schema, SchemaBuilder};
pub use table::{Table, TableBuilder, declare_table};
pub use types::ColumnType;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        column::Column,
        relation::Relation,
        schema::Schema,
        table::{Table, declare_table},
        types::ColumnType,
    };
}

/// Identifiers are rendered verbatim when quoting is disabled, so they are
/// restricted to `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_ident(ident: &str) -> Result<(), SchemaError> {
    let reason = if ident.is_empty() {
        Some("identifier is empty")
    } else if ident.len() > MAX_IDENT_LEN {
        Some("identifier exceeds maximum length")
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        Some("identifier starts with a digit")
    } else if !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some("identifier contains characters outside [A-Za-z0-9_]")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SchemaError::InvalidIdentifier {
            ident: ident.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
