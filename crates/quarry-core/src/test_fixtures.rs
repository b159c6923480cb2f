//! Shared tables and data for unit tests.
//!
//! Two teams, four members:
//! `member1` (10, teamA), `member2` (20, teamA), `member3` (30, teamB),
//! `member4` (40, teamB).

use crate::{
    expr::{Expr, TableExt},
    memory::MemoryEngine,
    value::Value,
};
use quarry_schema::{ColumnType, Schema, Table, declare_table};

pub(crate) const ROLES: &[&str] = &["ADMIN", "USER"];

pub(crate) fn team() -> Table {
    declare_table("team")
        .column("id", ColumnType::Long)
        .column("name", ColumnType::Text)
        .build()
        .expect("team table")
}

pub(crate) fn member() -> Table {
    declare_table("member")
        .column("id", ColumnType::Long)
        .nullable_column("username", ColumnType::Text)
        .column("age", ColumnType::Int)
        .column("role", ColumnType::Enum { variants: ROLES })
        .nullable_column("team_id", ColumnType::Long)
        .relation("team", "team_id", "team", "id")
        .build()
        .expect("member table")
}

pub(crate) fn schema() -> Schema {
    Schema::builder()
        .table(team())
        .table(member())
        .build()
        .expect("schema")
}

/// Column expression shorthand.
pub(crate) fn col(table: &Table, name: &str) -> Expr {
    table.col(name).expect("column")
}

pub(crate) fn insert_member(
    engine: &MemoryEngine,
    id: i64,
    username: Option<&str>,
    age: i32,
    team_id: Option<i64>,
) {
    engine
        .insert(
            &member(),
            [
                ("id", Value::from(id)),
                ("username", Value::from(username)),
                ("age", Value::from(age)),
                ("role", Value::from("USER")),
                ("team_id", Value::from(team_id)),
            ],
        )
        .expect("insert member");
}

/// Engine holding the two teams and four members.
pub(crate) fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::with_schema(&schema());

    for (id, name) in [(1, "teamA"), (2, "teamB")] {
        engine
            .insert(&team(), [("id", Value::from(id)), ("name", Value::from(name))])
            .expect("insert team");
    }

    insert_member(&engine, 1, Some("member1"), 10, Some(1));
    insert_member(&engine, 2, Some("member2"), 20, Some(1));
    insert_member(&engine, 3, Some("member3"), 30, Some(2));
    insert_member(&engine, 4, Some("member4"), 40, Some(2));

    engine
}
