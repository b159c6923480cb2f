use crate::column::Column;
use std::sync::Arc;

///
/// RelationDef
///
/// Declared many-to-one foreign key: `source.column` references
/// `target_table.target_column`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationDef {
    pub(crate) name: Arc<str>,
    pub(crate) column: Arc<str>,
    pub(crate) target_table: Arc<str>,
    pub(crate) target_column: Arc<str>,
}

impl RelationDef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local foreign-key column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    #[must_use]
    pub fn target_column(&self) -> &str {
        &self.target_column
    }
}

///
/// Relation
/// A relation resolved against one binding of its source table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Relation {
    pub(crate) def: RelationDef,
    pub(crate) source: Column,
}

impl Relation {
    #[must_use]
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// Foreign-key column, bound to the source table's binding.
    #[must_use]
    pub const fn source_column(&self) -> &Column {
        &self.source
    }

    #[must_use]
    pub fn target_table(&self) -> &str {
        self.def.target_table()
    }

    #[must_use]
    pub fn target_column(&self) -> &str {
        self.def.target_column()
    }
}
