mod common;

use common::{col, member, seeded};
use quarry::{ErrorKind, QueryErrorKind, core::query::Projection, prelude::*};

#[derive(Debug, Default, PartialEq)]
struct MemberDto {
    username: Option<String>,
    age: i32,
}

impl MemberDto {
    fn set_name(&mut self, username: Option<String>) {
        self.username = username;
    }

    fn set_age(&mut self, age: i32) {
        self.age = age;
    }
}

impl Record for MemberDto {
    fn descriptor() -> TargetDescriptor<Self> {
        TargetDescriptor::constructor("MemberDto", |(username, age): (Option<String>, i32)| {
            Self { username, age }
        })
    }
}

fn dto(username: &str, age: i32) -> MemberDto {
    MemberDto {
        username: Some(username.to_string()),
        age,
    }
}

fn youngest_two(username: impl Into<Projection>) -> Select {
    let member = member();
    let username: Projection = username.into();
    select([username])
        .select(col(&member, "age"))
        .from(&member)
        .order_by(col(&member, "age").asc())
        .limit(2)
        .build()
        .unwrap()
}

#[test]
fn constructor_binding() {
    let session = seeded();
    let member = member();

    let typed = youngest_two(col(&member, "username"))
        .into_typed::<MemberDto>()
        .unwrap();

    assert_eq!(
        session.fetch_into(&typed).unwrap(),
        [dto("member1", 10), dto("member2", 20)]
    );
}

#[test]
fn field_binding() {
    let session = seeded();
    let member = member();
    let descriptor = TargetDescriptor::fields("MemberDto", MemberDto::default)
        .field("username", |m: &mut MemberDto, v: Option<String>| m.username = v)
        .field("age", |m: &mut MemberDto, v: i32| m.age = v);

    let typed = youngest_two(col(&member, "username"))
        .bind(descriptor)
        .unwrap();

    assert_eq!(
        session.fetch_into(&typed).unwrap(),
        [dto("member1", 10), dto("member2", 20)]
    );
}

#[test]
fn setter_binding_follows_the_projection_alias() {
    let session = seeded();
    let member = member();
    let descriptor = || {
        TargetDescriptor::setters("MemberDto", MemberDto::default)
            .setter("set_name", MemberDto::set_name)
            .setter("set_age", MemberDto::set_age)
    };

    // `username` would need `set_username`; the alias steers it to `set_name`.
    let err = youngest_two(col(&member, "username"))
        .bind(descriptor())
        .unwrap_err();
    assert_eq!(
        quarry::Error::from(err).kind,
        ErrorKind::Query(QueryErrorKind::Mapping)
    );

    let typed = youngest_two(col(&member, "username").alias("name"))
        .bind(descriptor())
        .unwrap();
    assert_eq!(
        session.fetch_into(&typed).unwrap(),
        [dto("member1", 10), dto("member2", 20)]
    );
}

#[test]
fn constructor_arity_mismatch_fails_before_execution() {
    let member = member();

    let select = select([
        col(&member, "username"),
        col(&member, "age"),
        col(&member, "team_id"),
    ])
    .from(&member)
    .build()
    .unwrap();

    let err = quarry::Error::from(select.into_typed::<MemberDto>().unwrap_err());
    assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::Mapping));
    assert!(err.message.contains("takes 2 constructor argument(s)"));
}

#[test]
fn computed_projection_binds_through_an_alias() {
    let session = seeded();
    let member = member();
    let descriptor = TargetDescriptor::fields("MemberDto", MemberDto::default)
        .field("username", |m: &mut MemberDto, v: Option<String>| m.username = v)
        .field("age", |m: &mut MemberDto, v: i32| m.age = v);

    let typed = select([
        col(&member, "username").alias("username"),
        col(&member, "age").mul(2).unwrap().alias("age"),
    ])
    .from(&member)
    .where_(col(&member, "id").eq(3).unwrap())
    .build()
    .unwrap()
    .bind(descriptor)
    .unwrap();

    assert_eq!(
        session.fetch_one_into(&typed).unwrap(),
        Some(dto("member3", 60))
    );
}
