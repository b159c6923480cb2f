//! Shared schema and seed data for integration tests.
//!
//! Two teams, four members:
//! `member1` (10, teamA), `member2` (20, teamA), `member3` (30, teamB),
//! `member4` (40, teamB).

#![allow(dead_code)]

use quarry::prelude::*;

pub const ROLES: &[&str] = &["ADMIN", "USER"];

pub fn team() -> Table {
    declare_table("team")
        .column("id", ColumnType::Long)
        .column("name", ColumnType::Text)
        .build()
        .expect("team table")
}

pub fn member() -> Table {
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

pub fn schema() -> Schema {
    Schema::builder()
        .table(team())
        .table(member())
        .build()
        .expect("schema")
}

pub fn col(table: &Table, name: &str) -> Expr {
    table.col(name).expect("column")
}

pub fn add_member(engine: &MemoryEngine, id: i64, username: Option<&str>, age: i32) {
    engine
        .insert(
            &member(),
            [
                ("id", Value::from(id)),
                ("username", Value::from(username)),
                ("age", Value::from(age)),
                ("role", Value::from("USER")),
            ],
        )
        .expect("insert member");
}

pub fn seeded_engine() -> MemoryEngine {
    let engine = MemoryEngine::with_schema(&schema());
    let (team, member) = (team(), member());

    for (id, name) in [(1, "teamA"), (2, "teamB")] {
        engine
            .insert(&team, [("id", Value::from(id)), ("name", Value::from(name))])
            .expect("insert team");
    }
    for (id, age, team_id) in [(1, 10, 1), (2, 20, 1), (3, 30, 2), (4, 40, 2)] {
        engine
            .insert(
                &member,
                [
                    ("id", Value::from(id)),
                    ("username", Value::from(format!("member{id}"))),
                    ("age", Value::from(age)),
                    ("role", Value::from(if id == 1 { "ADMIN" } else { "USER" })),
                    ("team_id", Value::from(team_id)),
                ],
            )
            .expect("insert member");
    }

    engine
}

pub fn seeded() -> Session<MemoryEngine> {
    Session::new(seeded_engine())
}

/// First column of every row, as text.
pub fn names(session: &Session<MemoryEngine>, select: &Select) -> Vec<String> {
    session
        .fetch(select)
        .expect("fetch")
        .iter()
        .map(|row| row.get_as::<String>(0).expect("text column"))
        .collect()
}
