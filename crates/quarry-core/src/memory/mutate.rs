//! Bulk update and delete.
//!
//! Both run in two phases: plan against an immutable view of the tables,
//! then apply. A failure while planning leaves every row untouched.

use crate::{
    memory::{
        MemoryError, MemoryTable,
        eval::{Evaluator, Frame, Source},
    },
    query::{Delete, Update},
    value::Value,
};
use quarry_schema::Table;
use std::collections::BTreeMap;

pub(super) fn update(
    tables: &mut BTreeMap<String, MemoryTable>,
    update: &Update,
) -> Result<u64, MemoryError> {
    let changes = {
        let evaluator = Evaluator::new(tables);
        let target = evaluator.table(update.table().name())?;
        let sources = [source(update.table(), target)];

        let columns = update
            .assignments()
            .iter()
            .map(|assignment| target.column_index(assignment.column().name()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut changes: Vec<(usize, Vec<Value>)> = Vec::new();
        for (position, row) in target.rows.iter().enumerate() {
            let tuple = [Some(row.as_slice())];
            let frame = Frame {
                sources: &sources,
                tuple: &tuple,
                group: None,
                outer: None,
            };

            if let Some(filter) = update.filter()
                && !evaluator.test(filter.expr(), &frame)?
            {
                continue;
            }

            // Every right-hand side sees the row as it was before the update.
            let mut next = row.clone();
            for (assignment, &index) in update.assignments().iter().zip(&columns) {
                let value = evaluator.eval(assignment.value(), &frame)?;
                next[index] = target.coerce(index, value)?;
            }
            changes.push((position, next));
        }

        changes
    };

    let target = table_mut(tables, update.table())?;
    let affected = changes.len();
    for (position, next) in changes {
        target.rows[position] = next;
    }

    Ok(count(affected))
}

pub(super) fn delete(
    tables: &mut BTreeMap<String, MemoryTable>,
    delete: &Delete,
) -> Result<u64, MemoryError> {
    let keep = {
        let evaluator = Evaluator::new(tables);
        let target = evaluator.table(delete.table().name())?;
        let sources = [source(delete.table(), target)];

        let mut keep = Vec::with_capacity(target.rows.len());
        for row in &target.rows {
            let removed = match delete.filter() {
                Some(filter) => {
                    let tuple = [Some(row.as_slice())];
                    let frame = Frame {
                        sources: &sources,
                        tuple: &tuple,
                        group: None,
                        outer: None,
                    };
                    evaluator.test(filter.expr(), &frame)?
                }
                None => true,
            };
            keep.push(!removed);
        }

        keep
    };

    let target = table_mut(tables, delete.table())?;
    let before = target.rows.len();
    let mut mask = keep.into_iter();
    target.rows.retain(|_| mask.next().unwrap_or(true));

    Ok(count(before - target.rows.len()))
}

fn source<'d>(table: &'d Table, memory: &'d MemoryTable) -> Source<'d> {
    Source {
        binding: table.binding(),
        table: memory,
    }
}

fn table_mut<'t>(
    tables: &'t mut BTreeMap<String, MemoryTable>,
    table: &Table,
) -> Result<&'t mut MemoryTable, MemoryError> {
    tables
        .get_mut(table.name())
        .ok_or_else(|| MemoryError::UnknownTable {
            table: table.name().to_string(),
        })
}

fn count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}
