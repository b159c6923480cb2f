use crate::{
    error::{Clause, QueryError, StructuralError, TypeMismatch},
    expr::{Expr, TableExt},
    query::{JoinKind, PagedSelect, Statement, delete, select, select_from, update},
    test_fixtures::{col, member, team},
};
use quarry_schema::SchemaError;

// ---------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------

#[test]
fn select_from_projects_every_column() {
    let member = member();
    let select = select_from(&member).build().unwrap();

    assert_eq!(select.projections().len(), 5);
    assert_eq!(select.from(), [member]);
    assert!(!select.is_grouped());
}

#[test]
fn column_of_unlisted_table_is_rejected() {
    let member = member();
    let team = team();

    let err = select([col(&team, "name")]).from(&member).build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnboundTable { ref binding }) if binding == "team"
    ));
}

#[test]
fn alias_is_its_own_binding() {
    let member = member();
    let m = member.aliased("m").unwrap();

    // `member.age` is not visible when only `m` is in scope.
    let err = select([col(&member, "age")]).from(&m).build().unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::UnboundTable { .. })));

    let ok = select([col(&m, "age")]).from(&m).build();
    assert!(ok.is_ok());
}

#[test]
fn duplicate_binding_is_rejected() {
    let member = member();

    let err = select([col(&member, "id")])
        .from(&member)
        .from(&member)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::DuplicateBinding { .. })
    ));
}

#[test]
fn empty_projection_and_missing_from_are_rejected() {
    let err = select(Vec::<Expr>::new()).from(&member()).build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::EmptyProjection)
    ));

    let err = select([Expr::constant(1)]).build().unwrap_err();
    assert!(matches!(err, QueryError::Structural(StructuralError::MissingFrom)));
}

#[test]
fn invalid_projection_alias_is_rejected() {
    let member = member();

    let err = select([col(&member, "age").alias("not valid")])
        .from(&member)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::InvalidIdentifier { .. })
    ));
}

#[test]
fn distinct_orders_only_by_projected_expressions() {
    let member = member();
    let team_id = col(&member, "team_id");

    let err = select([team_id.clone()])
        .distinct()
        .from(&member)
        .order_by(col(&member, "age").desc())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::DistinctOrderNotProjected { ref expr })
            if expr == "member.age"
    ));

    let ok = select([team_id.clone()])
        .distinct()
        .from(&member)
        .order_by(team_id.desc())
        .build();
    assert!(ok.is_ok());

    // Without distinct the same ordering is fine.
    let plain = select([team_id])
        .from(&member)
        .order_by(col(&member, "age").desc())
        .build();
    assert!(plain.is_ok());
}

// ---------------------------------------------------------------------
// Aggregates and grouping
// ---------------------------------------------------------------------

#[test]
fn having_without_group_by_is_rejected() {
    let member = member();
    let age = col(&member, "age");

    let err = select([age.avg().unwrap()])
        .from(&member)
        .having(age.avg().unwrap().gt(10).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::HavingWithoutGroupBy)
    ));
}

#[test]
fn aggregates_are_rejected_in_row_clauses() {
    let member = member();
    let age = col(&member, "age");

    let err = select([age.clone()])
        .from(&member)
        .where_(age.max().gt(10).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::AggregateNotAllowed {
            clause: Clause::Where
        })
    ));

    let err = select([age.max()])
        .from(&member)
        .group_by(age.max())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::AggregateNotAllowed {
            clause: Clause::GroupBy
        })
    ));
}

#[test]
fn nested_aggregates_are_rejected() {
    let member = member();

    let err = select([col(&member, "age").max().avg().unwrap()])
        .from(&member)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::AggregateNotAllowed {
            clause: Clause::AggregateArgument
        })
    ));
}

#[test]
fn ungrouped_columns_are_rejected() {
    let member = member();

    let err = select([col(&member, "username"), col(&member, "age").max()])
        .from(&member)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::UngroupedColumn {
            clause: Clause::Projection,
            ..
        })
    ));
}

#[test]
fn grouped_select_with_having_builds() {
    let member = member();
    let team = team();
    let name = col(&team, "name");

    let select = select([name.clone(), col(&member, "age").avg().unwrap()])
        .from(&member)
        .join_relation(&member.relation("team").unwrap(), &team)
        .group_by(name.clone())
        .having(name.like("%A").unwrap())
        .build()
        .unwrap();

    assert!(select.is_grouped());
    assert_eq!(select.group_by(), [name]);
}

// ---------------------------------------------------------------------
// Joins
// ---------------------------------------------------------------------

#[test]
fn relation_join_derives_the_condition() {
    let member = member();
    let team = team();

    let select = select([col(&member, "username")])
        .from(&member)
        .join_relation(&member.relation("team").unwrap(), &team)
        .build()
        .unwrap();

    let join = &select.joins()[0];
    assert_eq!(join.kind(), JoinKind::Inner);
    assert_eq!(join.relation(), Some("team"));
    assert_eq!(
        join.condition(),
        &col(&member, "team_id").eq(col(&team, "id")).unwrap()
    );
}

#[test]
fn relation_join_with_on_combines_conditions() {
    let member = member();
    let team = team();
    let on = col(&team, "name").eq("teamA").unwrap();

    let select = select([col(&member, "username")])
        .from(&member)
        .left_join_relation(&member.relation("team").unwrap(), &team)
        .on(on.clone())
        .build()
        .unwrap();

    let expected = col(&member, "team_id")
        .eq(col(&team, "id"))
        .unwrap()
        .and(on);
    assert_eq!(select.joins()[0].condition(), &expected);
    assert_eq!(select.joins()[0].kind(), JoinKind::Left);
}

#[test]
fn relation_join_checks_target_and_source_scope() {
    let member = member();
    let team = team();
    let relation = member.relation("team").unwrap();

    let err = select([col(&member, "id")])
        .from(&member)
        .join_relation(&relation, &member.aliased("other").unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::RelationTargetMismatch { .. })
    ));

    let err = select([col(&team, "id")])
        .from(&team.aliased("t").unwrap())
        .join_relation(&relation, &team)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::RelationSourceOutOfScope { .. })
    ));
}

#[test]
fn theta_join_needs_a_condition() {
    let member = member();
    let team = team();

    let err = select([col(&member, "id")])
        .from(&member)
        .join(&team)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::MissingJoinCondition { .. })
    ));

    let err = select([col(&member, "id")])
        .from(&member)
        .on(col(&member, "age").gt(1).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::OnWithoutJoin)
    ));
}

#[test]
fn on_may_not_reference_later_joins() {
    let member = member();
    let team = team();
    let other = team.aliased("other").unwrap();

    let err = select([col(&member, "id")])
        .from(&member)
        .left_join(&team)
        .on(col(&other, "id").eq(col(&member, "team_id")).unwrap())
        .left_join(&other)
        .on(col(&other, "id").eq(col(&team, "id")).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::UnboundTable { .. })));
}

// ---------------------------------------------------------------------
// Subqueries
// ---------------------------------------------------------------------

#[test]
fn correlated_subquery_resolves_against_the_outer_scope() {
    let member = member();
    let sub = member.aliased("member_sub").unwrap();

    let inner = select([col(&sub, "age").max()])
        .from(&sub)
        .where_(col(&sub, "team_id").eq(col(&member, "team_id")).unwrap());

    let outer = select([col(&member, "username")])
        .from(&member)
        .where_(col(&member, "age").eq(Expr::subquery(inner.clone()).unwrap()).unwrap())
        .build()
        .unwrap();
    assert!(outer.free_columns().is_empty());

    // The same subquery cannot stand alone.
    let err = inner.build().unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::UnboundTable { .. })));
}

#[test]
fn correlated_subquery_with_unknown_outer_binding_fails() {
    let member = member();
    let sub = member.aliased("member_sub").unwrap();
    let stranger = member.aliased("stranger").unwrap();

    let inner = select([col(&sub, "age").max()])
        .from(&sub)
        .where_(col(&sub, "team_id").eq(col(&stranger, "team_id")).unwrap());

    let err = select([col(&member, "username")])
        .from(&member)
        .where_(col(&member, "age").in_subquery(inner).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::Schema(SchemaError::UnboundTable { .. })));
}

#[test]
fn read_tables_include_subqueries() {
    let member = member();
    let team = team();

    let team_ids = select([col(&team, "id")]).from(&team).build().unwrap();
    let select = select([col(&member, "id")])
        .from(&member)
        .where_(col(&member, "team_id").in_subquery(team_ids).unwrap())
        .build()
        .unwrap();

    let tables: Vec<_> = select.read_tables().into_iter().collect();
    assert_eq!(tables, ["member", "team"]);
}

// ---------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------

#[test]
fn derived_count_drops_projection_order_and_window() {
    let member = member();

    let page = select_from(&member)
        .where_(col(&member, "age").gt(10).unwrap())
        .order_by(col(&member, "age").desc())
        .offset(1)
        .limit(2)
        .build()
        .unwrap()
        .paged()
        .unwrap();

    let count = page.count();
    assert_eq!(count.projections().len(), 1);
    assert_eq!(count.projections()[0].expr(), &Expr::count_all());
    assert!(count.order_by().is_empty());
    assert_eq!(count.limit(), None);
    assert_eq!(count.offset(), None);
    assert_eq!(count.filter(), page.page().filter());
}

#[test]
fn distinct_and_grouped_pages_need_a_count_query() {
    let member = member();
    let age = col(&member, "age");

    let distinct = select([age.clone()]).distinct().from(&member).build().unwrap();
    let err = PagedSelect::new(distinct.clone()).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::CountQueryRequired { .. })
    ));

    let count = select([age.count_distinct()]).from(&member).build().unwrap();
    assert!(PagedSelect::with_count_query(distinct, count).is_ok());
}

#[test]
fn supplied_count_query_must_be_one_numeric_column() {
    let member = member();
    let page = select_from(&member).build().unwrap();

    let text = select([col(&member, "username").max()]).from(&member).build().unwrap();
    let err = PagedSelect::with_count_query(page.clone(), text).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::InvalidCountQuery { .. })
    ));

    let cheap = select([Expr::count_all()]).from(&member).build().unwrap();
    assert!(PagedSelect::with_count_query(page, cheap).is_ok());
}

// ---------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------

#[test]
fn update_checks_targets_and_types() {
    let member = member();
    let team = team();

    let ok = update(&member)
        .set(col(&member, "username"), "X")
        .where_(col(&member, "age").lt(28).unwrap())
        .build()
        .unwrap();
    assert_eq!(ok.assignments().len(), 1);

    let err = update(&member).set(col(&team, "name"), "X").build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::AssignmentTarget { .. })
    ));

    let err = update(&member).set(col(&member, "age"), "old").build().unwrap_err();
    assert!(matches!(err, QueryError::TypeMismatch(_)));

    let err = update(&member)
        .set(col(&member, "age"), Expr::null())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::TypeMismatch(TypeMismatch::NullAssignment { .. })
    ));

    assert!(
        update(&member)
            .set(col(&member, "username"), Expr::null())
            .build()
            .is_ok()
    );
}

#[test]
fn update_rejects_duplicates_empties_and_aggregates() {
    let member = member();
    let age = col(&member, "age");

    let err = update(&member).build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::EmptyAssignments)
    ));

    let err = update(&member)
        .set(age.clone(), 1)
        .set(age.clone(), 2)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::DuplicateAssignment { .. })
    ));

    let err = update(&member).set(age.clone(), age.max()).build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::AggregateNotAllowed {
            clause: Clause::Assignment
        })
    ));
}

#[test]
fn statements_report_kind_and_tables() {
    let member = member();

    let delete = delete(&member)
        .where_(col(&member, "age").gt(18).unwrap())
        .build()
        .unwrap();
    let statement = Statement::from(delete);

    assert_eq!(statement.kind().to_string(), "delete");
    assert_eq!(statement.mutated_table(), Some("member"));

    let bulk_add = update(&member)
        .set(col(&member, "age"), member.col("age").unwrap().add(1).unwrap())
        .build()
        .unwrap();
    assert_eq!(Statement::from(bulk_add).mutated_table(), Some("member"));
}
