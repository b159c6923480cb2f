//! Module: memory
//! Responsibility: in-process reference engine that evaluates the statement
//! IR directly.
//! Does not own: durability, transactions, identity caching.
//!
//! Joins are nested loops, grouping is first-appearance ordered, and every
//! comparison follows SQL three-valued logic. The engine exists so the
//! builder's semantics can be exercised end to end without a database.

mod eval;
mod mutate;
mod select;


use crate::{
    exec::{CompiledQuery, Executor, ExecutorError},
    project::{ResultRow, RowHeader},
    query::{Statement, StatementKind},
    value::Value,
};
use eval::Evaluator;
use parking_lot::RwLock;
use quarry_schema::{ColumnDef, ColumnType, Schema, Table};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// MemoryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum MemoryError {
    #[error("aggregate evaluated outside a grouped context")]
    AggregateOutsideGroup,

    #[error("column '{table}.{column}' rejects {value}: {reason}")]
    ColumnValue {
        table: String,
        column: String,
        value: String,
        reason: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{op}' cannot be applied to {left} and {right}")]
    Operands {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("integer overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("scalar subquery returned {rows} rows")]
    ScalarSubqueryRows { rows: usize },

    #[error("binding '{binding}' is not available at runtime")]
    UnboundBinding { binding: String },

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("table '{table}' is not registered")]
    UnknownTable { table: String },

    #[error("{operation} does not accept {kind} statements")]
    WrongStatement {
        kind: StatementKind,
        operation: &'static str,
    },
}

///
/// MemoryTable
///

#[derive(Clone, Debug)]
pub(crate) struct MemoryTable {
    table: Table,
    rows: Vec<Vec<Value>>,
}

impl MemoryTable {
    fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            rows: Vec::new(),
        }
    }

    fn column_index(&self, column: &str) -> Result<usize, MemoryError> {
        self.table
            .column_index(column)
            .ok_or_else(|| MemoryError::UnknownColumn {
                table: self.table.name().to_string(),
                column: column.to_string(),
            })
    }

    /// Check and normalize a value for storage in column `index`.
    fn coerce(&self, index: usize, value: Value) -> Result<Value, MemoryError> {
        let def = &self.table.column_defs()[index];
        let reject = |value: &Value, reason| MemoryError::ColumnValue {
            table: self.table.name().to_string(),
            column: def.name().to_string(),
            value: format!("{value:?}"),
            reason,
        };

        match (def.ty(), value) {
            (_, Value::Null) if def.is_nullable() => Ok(Value::Null),
            (_, Value::Null) => Err(reject(&Value::Null, "column is not nullable")),
            (ColumnType::Bool, v @ Value::Bool(_)) | (ColumnType::Long, v @ Value::Int(_)) => {
                Ok(v)
            }
            (ColumnType::Int, Value::Int(i)) if i32::try_from(i).is_ok() => Ok(Value::Int(i)),
            (ColumnType::Text, Value::Text(s) | Value::Enum(s)) => Ok(Value::Text(s)),
            (ty @ ColumnType::Enum { .. }, Value::Text(s) | Value::Enum(s))
                if ty.accepts_variant(&s) =>
            {
                Ok(Value::Enum(s))
            }
            (_, other) => Err(reject(&other, type_reason(def))),
        }
    }
}

const fn type_reason(def: &ColumnDef) -> &'static str {
    match def.ty() {
        ColumnType::Bool => "expected a boolean",
        ColumnType::Enum { .. } => "expected a declared enum variant",
        ColumnType::Int => "expected a 32-bit integer",
        ColumnType::Long => "expected an integer",
        ColumnType::Text => "expected text",
    }
}

///
/// MemoryEngine
///
/// Tables are guarded by one `RwLock`: selects share it, bulk mutations
/// take it exclusively for the whole statement.
///

#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with an empty table for every table of `schema`.
    #[must_use]
    pub fn with_schema(schema: &Schema) -> Self {
        let engine = Self::new();
        for table in schema.tables() {
            engine.register(table);
        }
        engine
    }

    /// Register a table by name. Existing rows are kept.
    pub fn register(&self, table: &Table) {
        self.tables
            .write()
            .entry(table.name().to_string())
            .or_insert_with(|| MemoryTable::new(table));
    }

    /// Insert one row given as `(column, value)` pairs. Omitted columns are
    /// null. The table is registered on first use.
    pub fn insert<I, K, V>(&self, table: &Table, row: I) -> Result<(), MemoryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut tables = self.tables.write();
        let target = tables
            .entry(table.name().to_string())
            .or_insert_with(|| MemoryTable::new(table));

        let mut values = vec![Value::Null; target.table.column_defs().len()];
        for (column, value) in row {
            let index = target.column_index(column.as_ref())?;
            values[index] = value.into();
        }

        let values = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| target.coerce(index, value))
            .collect::<Result<Vec<_>, _>>()?;
        target.rows.push(values);

        Ok(())
    }

    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    /// Snapshot of a table's rows in storage order.
    pub fn rows(&self, table: &str) -> Result<Vec<Vec<Value>>, MemoryError> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.rows.clone())
            .ok_or_else(|| MemoryError::UnknownTable {
                table: table.to_string(),
            })
    }
}

impl Executor for MemoryEngine {
    fn query(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>, ExecutorError> {
        let Statement::Select(select) = query.statement() else {
            return Err(Box::new(MemoryError::WrongStatement {
                kind: query.statement().kind(),
                operation: "query",
            }));
        };

        let rows = {
            let tables = self.tables.read();
            Evaluator::new(&tables).run_select(select, None)?
        };
        log::debug!(target: "quarry::memory", "select produced {} row(s)", rows.len());

        let header = Arc::new(RowHeader::from_select(select));
        rows.into_iter()
            .map(|values| ResultRow::new(Arc::clone(&header), values).map_err(Into::into))
            .collect()
    }

    fn execute(&self, query: &CompiledQuery) -> Result<u64, ExecutorError> {
        let mut tables = self.tables.write();
        let affected = match query.statement() {
            Statement::Update(update) => mutate::update(&mut tables, update)?,
            Statement::Delete(delete) => mutate::delete(&mut tables, delete)?,
            Statement::Select(_) => {
                return Err(Box::new(MemoryError::WrongStatement {
                    kind: StatementKind::Select,
                    operation: "execute",
                }));
            }
        };
        log::debug!(target: "quarry::memory", "mutation affected {affected} row(s)");

        Ok(affected)
    }
}
