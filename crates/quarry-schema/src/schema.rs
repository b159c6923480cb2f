use crate::{error::SchemaError, table::Table};
use std::collections::BTreeMap;

///
/// Schema
///
/// Validated set of tables, keyed by table name.
/// Built once at start-up and read-only afterwards.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up an unaliased table binding by name.
    pub fn table(&self, name: &str) -> Result<Table, SchemaError> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownTable {
                table: name.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

///
/// SchemaBuilder
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Validate cross-table invariants and freeze the schema.
    ///
    /// Phase 1 rejects duplicate and aliased tables; phase 2 checks that every
    /// relation resolves to a declared target column of a compatible type.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut errors = Vec::new();
        let mut tables = BTreeMap::new();

        for table in self.tables {
            if table.alias().is_some() {
                errors.push(SchemaError::InvalidIdentifier {
                    ident: table.binding().to_string(),
                    reason: "aliased tables cannot be registered",
                });
                continue;
            }

            let name = table.name().to_string();
            if tables.insert(name.clone(), table).is_some() {
                errors.push(SchemaError::DuplicateTable { table: name });
            }
        }

        for table in tables.values() {
            validate_relations(table, &tables, &mut errors);
        }

        SchemaError::collect(errors)?;

        Ok(Schema { tables })
    }
}

fn validate_relations(
    table: &Table,
    tables: &BTreeMap<String, Table>,
    errors: &mut Vec<SchemaError>,
) {
    for relation in table.relations() {
        let invalid = |reason: String| SchemaError::InvalidRelation {
            table: table.name().to_string(),
            relation: relation.name().to_string(),
            reason,
        };

        let Some(target) = tables.get(relation.target_table()) else {
            errors.push(invalid(format!(
                "target table '{}' is not declared",
                relation.target_table()
            )));
            continue;
        };

        let Ok(target_column) = target.column(relation.target_column()) else {
            errors.push(invalid(format!(
                "target column '{}.{}' is not declared",
                relation.target_table(),
                relation.target_column()
            )));
            continue;
        };

        // The local column was checked when the table was built.
        let Ok(source_column) = table.column(relation.column()) else {
            continue;
        };

        if !source_column.ty().is_join_compatible(target_column.ty()) {
            errors.push(invalid(format!(
                "column types {} and {} cannot be joined",
                source_column.ty(),
                target_column.ty()
            )));
        }
    }
}
