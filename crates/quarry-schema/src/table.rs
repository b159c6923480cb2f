use crate::{
    column::{Column, ColumnDef},
    error::SchemaError,
    relation::{Relation, RelationDef},
    types::ColumnType,
    validate_ident,
};
use std::{collections::BTreeSet, fmt, sync::Arc};

///
/// TableDef
/// Shared, immutable declaration behind every binding of a table.
///

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct TableDef {
    name: Arc<str>,
    columns: Vec<ColumnDef>,
    relations: Vec<RelationDef>,
}

///
/// Table
///
/// A table binding: the shared declaration plus an optional alias.
/// Equality is binding identity (name + alias), which is what scope
/// resolution cares about.
///

#[derive(Clone, Debug)]
pub struct Table {
    def: Arc<TableDef>,
    alias: Option<Arc<str>>,
}

impl Table {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name columns of this table are qualified with: alias, else name.
    #[must_use]
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.def.name)
    }

    /// Clone this table under a fresh alias.
    ///
    /// The clone shares column metadata but is a distinct binding, which is
    /// what self-joins and correlated subqueries need.
    pub fn aliased(&self, alias: &str) -> Result<Self, SchemaError> {
        validate_ident(alias)?;

        Ok(Self {
            def: Arc::clone(&self.def),
            alias: Some(Arc::from(alias)),
        })
    }

    /// Resolve a column against this binding.
    pub fn column(&self, name: &str) -> Result<Column, SchemaError> {
        self.def
            .columns
            .iter()
            .find(|column| &*column.name == name)
            .map(|def| self.bind(def))
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    /// All columns in declaration order, bound to this binding.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.def.columns.iter().map(|def| self.bind(def))
    }

    #[must_use]
    pub fn column_defs(&self) -> &[ColumnDef] {
        &self.def.columns
    }

    /// Declaration-order position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.def
            .columns
            .iter()
            .position(|column| &*column.name == name)
    }

    /// Resolve a declared relation against this binding.
    pub fn relation(&self, name: &str) -> Result<Relation, SchemaError> {
        let def = self
            .def
            .relations
            .iter()
            .find(|relation| &*relation.name == name)
            .ok_or_else(|| SchemaError::UnknownRelation {
                table: self.name().to_string(),
                relation: name.to_string(),
            })?;
        let source = self.column(def.column())?;

        Ok(Relation {
            def: def.clone(),
            source,
        })
    }

    #[must_use]
    pub fn relations(&self) -> &[RelationDef] {
        &self.def.relations
    }

    /// True when both bindings point at the same declaration.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) || self.def == other.def
    }

    fn bind(&self, def: &ColumnDef) -> Column {
        Column {
            table: Arc::clone(&self.def.name),
            binding: self
                .alias
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.def.name)),
            def: def.clone(),
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name && self.alias == other.alias
    }
}

impl Eq for Table {}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} {alias}", self.def.name),
            None => f.write_str(&self.def.name),
        }
    }
}

///
/// TableBuilder
/// Declarative table construction; validated once in `build`.
///

#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDef>,
    relations: Vec<RelationDef>,
}

/// Start declaring a table.
#[must_use]
pub fn declare_table(name: &str) -> TableBuilder {
    TableBuilder {
        name: name.to_string(),
        columns: Vec::new(),
        relations: Vec::new(),
    }
}

impl TableBuilder {
    /// Declare a non-nullable column.
    #[must_use]
    pub fn column(self, name: &str, ty: ColumnType) -> Self {
        self.push_column(name, ty, false)
    }

    /// Declare a nullable column.
    #[must_use]
    pub fn nullable_column(self, name: &str, ty: ColumnType) -> Self {
        self.push_column(name, ty, true)
    }

    /// Declare a many-to-one relation through a local foreign-key column.
    #[must_use]
    pub fn relation(
        mut self,
        name: &str,
        column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Self {
        self.relations.push(RelationDef {
            name: Arc::from(name),
            column: Arc::from(column),
            target_table: Arc::from(target_table),
            target_column: Arc::from(target_column),
        });
        self
    }

    pub fn build(self) -> Result<Table, SchemaError> {
        validate_ident(&self.name)?;

        if self.columns.is_empty() {
            return Err(SchemaError::EmptyTable { table: self.name });
        }

        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if let Err(err) = validate_ident(&column.name) {
                errors.push(err);
            }
            if !seen.insert(column.name.clone()) {
                errors.push(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.to_string(),
                });
            }
        }

        let mut relation_names = BTreeSet::new();
        for relation in &self.relations {
            if let Err(err) = validate_ident(&relation.name) {
                errors.push(err);
            }
            if !relation_names.insert(relation.name.clone()) {
                errors.push(SchemaError::DuplicateRelation {
                    table: self.name.clone(),
                    relation: relation.name.to_string(),
                });
            }
            if !seen.contains(&relation.column) {
                errors.push(SchemaError::InvalidRelation {
                    table: self.name.clone(),
                    relation: relation.name.to_string(),
                    reason: format!("foreign-key column '{}' is not declared", relation.column),
                });
            }
        }

        SchemaError::collect(errors)?;

        Ok(Table {
            def: Arc::new(TableDef {
                name: Arc::from(self.name),
                columns: self.columns,
                relations: self.relations,
            }),
            alias: None,
        })
    }

    fn push_column(mut self, name: &str, ty: ColumnType, nullable: bool) -> Self {
        self.columns.push(ColumnDef {
            name: Arc::from(name),
            ty,
            nullable,
        });
        self
    }
}
