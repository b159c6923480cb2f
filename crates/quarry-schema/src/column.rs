use crate::types::ColumnType;
use std::{fmt, sync::Arc};

///
/// ColumnDef
/// Declared column metadata, shared by every binding of its table.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ColumnDef {
    pub(crate) name: Arc<str>,
    pub(crate) ty: ColumnType,
    pub(crate) nullable: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ty(&self) -> ColumnType {
        self.ty
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// Column
///
/// A column resolved against one table binding. Two columns of the same
/// physical table under different aliases are different columns.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Column {
    pub(crate) table: Arc<str>,
    pub(crate) binding: Arc<str>,
    pub(crate) def: ColumnDef,
}

impl Column {
    /// Physical table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table name or alias this column is reached through.
    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    #[must_use]
    pub const fn ty(&self) -> ColumnType {
        self.def.ty
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.def.nullable
    }

    #[must_use]
    pub const fn def(&self) -> &ColumnDef {
        &self.def
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.binding, self.def.name)
    }
}
