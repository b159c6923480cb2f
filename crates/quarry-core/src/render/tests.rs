use super::*;
use crate::{
    expr::{CaseBuilder, Expr, TableExt},
    query::{delete, select, select_from, update},
    test_fixtures::{col, member, team},
};

fn render(statement: impl Into<Statement>) -> RenderedQuery {
    Renderer::default().render(&statement.into())
}

#[test]
fn select_with_filter_order_and_window() {
    let member = member();
    let age = col(&member, "age");

    let q = render(
        select([col(&member, "username"), age.clone()])
            .from(&member)
            .where_(age.goe(10).unwrap().and(age.loe(30).unwrap()))
            .order_by(age.desc())
            .order_by(col(&member, "username").asc().nulls_last())
            .offset(1)
            .limit(2)
            .build()
            .unwrap(),
    );

    assert_eq!(
        q.text(),
        "SELECT member.username, member.age FROM member \
         WHERE member.age >= ? AND member.age <= ? \
         ORDER BY member.age DESC, member.username ASC NULLS LAST LIMIT 2 OFFSET 1"
    );
    assert_eq!(q.params(), [Value::Int(10), Value::Int(30)]);
}

#[test]
fn placeholders_follow_textual_order() {
    let member = member();

    let q = Renderer::new(RenderOptions {
        placeholder: PlaceholderStyle::Numbered,
        quote_identifiers: false,
    })
    .render(
        &select([col(&member, "username").concat("-").unwrap()])
            .from(&member)
            .where_(col(&member, "age").in_list([10, 20]).unwrap())
            .build()
            .unwrap()
            .into(),
    );

    assert_eq!(
        q.text(),
        "SELECT member.username || $1 FROM member WHERE member.age IN ($2, $3)"
    );
    assert_eq!(
        q.params(),
        [Value::from("-"), Value::Int(10), Value::Int(20)]
    );
}

#[test]
fn null_is_inlined() {
    let member = member();

    let q = render(
        update(&member)
            .set(col(&member, "username"), Expr::null())
            .where_(col(&member, "team_id").is_null())
            .build()
            .unwrap(),
    );

    assert_eq!(
        q.text(),
        "UPDATE member SET username = NULL WHERE member.team_id IS NULL"
    );
    assert!(q.params().is_empty());
}

#[test]
fn or_inside_and_is_parenthesized() {
    let member = member();
    let age = col(&member, "age");

    let p = age
        .eq(10)
        .unwrap()
        .or(age.eq(20).unwrap())
        .and(col(&member, "username").is_not_null());
    let q = render(select([age.clone()]).from(&member).where_(p).build().unwrap());

    assert_eq!(
        q.text(),
        "SELECT member.age FROM member \
         WHERE (member.age = ? OR member.age = ?) AND member.username IS NOT NULL"
    );
}

#[test]
fn arithmetic_keeps_left_associativity() {
    let member = member();
    let age = col(&member, "age");

    let minus = age.sub(1).unwrap().sub(age.sub(2).unwrap()).unwrap();
    let times = age.add(1).unwrap().mul(2).unwrap();
    let q = render(select([minus, times]).from(&member).build().unwrap());

    assert_eq!(
        q.text(),
        "SELECT member.age - ? - (member.age - ?), (member.age + ?) * ? FROM member"
    );
}

#[test]
fn not_and_between_render_without_redundant_parens() {
    let member = member();
    let age = col(&member, "age");

    let q = render(
        select([age.clone()])
            .from(&member)
            .where_(!age.between(10, 20).unwrap())
            .build()
            .unwrap(),
    );

    assert_eq!(
        q.text(),
        "SELECT member.age FROM member WHERE NOT member.age BETWEEN ? AND ?"
    );
}

#[test]
fn joins_aliases_and_grouping() {
    let member = member();
    let team = team();
    let t = team.aliased("t").unwrap();
    let name = col(&t, "name");

    let q = render(
        select([name.clone().into(), col(&member, "age").avg().unwrap().alias("avg_age")])
            .from(&member)
            .left_join_relation(&member.relation("team").unwrap(), &team)
            .join(&t)
            .on(name.eq(col(&team, "name")).unwrap())
            .group_by(name.clone())
            .having(name.like("%A").unwrap())
            .build()
            .unwrap(),
    );

    assert_eq!(
        q.text(),
        "SELECT t.name, AVG(member.age) AS avg_age FROM member \
         LEFT JOIN team ON member.team_id = team.id \
         INNER JOIN team AS t ON t.name = team.name \
         GROUP BY t.name HAVING t.name LIKE ?"
    );
    assert_eq!(q.params(), [Value::from("%A")]);
}

#[test]
fn subqueries_and_aggregates() {
    let member = member();
    let sub = member.aliased("member_sub").unwrap();

    let avg = select([col(&sub, "age").avg().unwrap()]).from(&sub);
    let q = render(
        select([
            col(&member, "username"),
            Expr::subquery(avg.clone()).unwrap(),
        ])
        .from(&member)
        .where_(col(&member, "age").goe(Expr::subquery(avg).unwrap()).unwrap())
        .build()
        .unwrap(),
    );

    assert_eq!(
        q.text(),
        "SELECT member.username, (SELECT AVG(member_sub.age) FROM member AS member_sub) \
         FROM member \
         WHERE member.age >= (SELECT AVG(member_sub.age) FROM member AS member_sub)"
    );

    let counts = render(
        select([Expr::count_all(), col(&member, "team_id").count_distinct()])
            .from(&member)
            .build()
            .unwrap(),
    );
    assert_eq!(
        counts.text(),
        "SELECT COUNT(*), COUNT(DISTINCT member.team_id) FROM member"
    );
}

#[test]
fn case_and_cast() {
    let member = member();
    let age = col(&member, "age");

    let simple = age.case().when(10, "ten").otherwise("other").unwrap();
    let searched = CaseBuilder::searched()
        .when(age.between(0, 20).unwrap(), "young")
        .end()
        .unwrap();
    let q = render(
        select([simple, searched, age.string_value()])
            .from(&member)
            .build()
            .unwrap(),
    );

    assert_eq!(
        q.text(),
        "SELECT CASE member.age WHEN ? THEN ? ELSE ? END, \
         CASE WHEN member.age BETWEEN ? AND ? THEN ? END, \
         CAST(member.age AS VARCHAR) FROM member"
    );
    assert_eq!(q.params().len(), 6);
}

#[test]
fn delete_and_distinct() {
    let member = member();

    let q = render(
        delete(&member)
            .where_(col(&member, "age").gt(18).unwrap())
            .build()
            .unwrap(),
    );
    assert_eq!(q.text(), "DELETE FROM member WHERE member.age > ?");

    let q = render(
        select([col(&member, "team_id")])
            .distinct()
            .from(&member)
            .build()
            .unwrap(),
    );
    assert_eq!(q.text(), "SELECT DISTINCT member.team_id FROM member");
}

#[test]
fn quoted_identifiers() {
    let team = team();
    let options = RenderOptions {
        placeholder: PlaceholderStyle::Question,
        quote_identifiers: true,
    };

    let q = Renderer::new(options).render(&select_from(&team).build().unwrap().into());
    assert_eq!(q.text(), r#"SELECT "team"."id", "team"."name" FROM "team""#);
}

#[test]
fn fingerprint_tracks_text_and_parameters() {
    let member = member();
    let by_age = |age: i32| {
        render(
            select([col(&member, "id")])
                .from(&member)
                .where_(col(&member, "age").eq(age).unwrap())
                .build()
                .unwrap(),
        )
    };

    let a = by_age(10);
    assert_eq!(a.fingerprint(), by_age(10).fingerprint());
    assert_ne!(a.fingerprint(), by_age(11).fingerprint());
    assert_eq!(a.fingerprint().len(), 64);

    let text = render(
        select([col(&member, "id")])
            .from(&member)
            .where_(col(&member, "username").eq("10").unwrap())
            .build()
            .unwrap(),
    );
    assert_ne!(
        fingerprint::digest("x", &[Value::Int(1)]),
        fingerprint::digest("x", &[Value::from("1")])
    );
    assert_ne!(a.fingerprint(), text.fingerprint());
}

#[test]
fn rendering_is_deterministic() {
    let member = member();
    let statement: Statement = select_from(&member)
        .where_(member.col("age").unwrap().gt(1).unwrap())
        .build()
        .unwrap()
        .into();
    let renderer = Renderer::default();

    assert_eq!(renderer.render(&statement), renderer.render(&statement));
}
