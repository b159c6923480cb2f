use super::*;
use crate::{
    config::QuarryConfig,
    error::ErrorClass,
    memory::MemoryEngine,
    project::{Record, TargetDescriptor},
    query::{delete, select, update},
    test_fixtures::{col, member, seeded, team},
    value::Value,
};
use std::sync::atomic::{AtomicU64, Ordering};

///
/// CountingSink
///

#[derive(Debug, Default)]
struct CountingSink {
    compiled: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
    mapping_failed: AtomicU64,
}

impl MetricsSink for CountingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        let counter = match event {
            MetricsEvent::Compiled { .. } => &self.compiled,
            MetricsEvent::Executed { .. } => &self.executed,
            MetricsEvent::ExecutionFailed { .. } => &self.failed,
            MetricsEvent::MappingFailed { .. } => &self.mapping_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, PartialEq)]
struct Username(String);

impl Record for Username {
    fn descriptor() -> TargetDescriptor<Self> {
        TargetDescriptor::constructor("Username", |(name,): (String,)| Self(name))
    }
}

fn session() -> Session<MemoryEngine> {
    Session::new(seeded())
}

fn counted() -> (Session<MemoryEngine>, Arc<CountingSink>) {
    let sink = Arc::new(CountingSink::default());
    let session = Session::new(seeded()).with_sink(sink.clone());

    (session, sink)
}

fn by_age() -> Select {
    let member = member();
    select([col(&member, "username")])
        .from(&member)
        .order_by(col(&member, "age").asc())
        .build()
        .unwrap()
}

fn with_age(age: i32) -> Select {
    let member = member();
    select([col(&member, "username")])
        .from(&member)
        .where_(col(&member, "age").eq(age).unwrap())
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------
// Single rows
// ---------------------------------------------------------------------

#[test]
fn fetch_one_distinguishes_empty_single_and_many() {
    let session = session();

    assert!(session.fetch_one(&with_age(99)).unwrap().is_none());

    let row = session.fetch_one(&with_age(20)).unwrap().unwrap();
    assert_eq!(row.get(0), Some(&Value::from("member2")));

    let err = session.fetch_one(&by_age()).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Response(ResponseError::NotUnique { count: 4 })
    ));
    assert_eq!(err.class(), ErrorClass::NotUnique);
}

#[test]
fn fetch_required_fails_on_empty_result() {
    let session = session();

    let err = session.fetch_required(&with_age(99)).unwrap_err();
    assert!(matches!(err, QueryError::Response(ResponseError::NotFound)));

    let row = session.fetch_required(&with_age(30)).unwrap();
    assert_eq!(row.get(0), Some(&Value::from("member3")));
}

#[test]
fn fetch_first_limits_to_one_row() {
    let session = session();

    let first = session.fetch_first(&by_age()).unwrap().unwrap();
    assert_eq!(first.get(0), Some(&Value::from("member1")));
    assert!(session.fetch_first(&with_age(99)).unwrap().is_none());
}

// ---------------------------------------------------------------------
// Typed rows
// ---------------------------------------------------------------------

#[test]
fn fetch_into_binds_every_row() {
    let session = session();
    let typed = by_age().into_typed::<Username>().unwrap();

    let names = session.fetch_into(&typed).unwrap();
    assert_eq!(
        names,
        ["member1", "member2", "member3", "member4"].map(|n| Username(n.to_string()))
    );

    let one = session
        .fetch_one_into(&with_age(40).into_typed::<Username>().unwrap())
        .unwrap();
    assert_eq!(one, Some(Username("member4".to_string())));
}

#[test]
fn mapping_failures_are_reported_to_the_sink() {
    let (session, sink) = counted();
    let engine = session.executor();
    crate::test_fixtures::insert_member(engine, 5, None, 50, None);

    let typed = with_age(50).into_typed::<Username>().unwrap();
    let err = session.fetch_into(&typed).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Mapping);
    assert_eq!(sink.mapping_failed.load(Ordering::Relaxed), 1);
}

// ---------------------------------------------------------------------
// Counts and pages
// ---------------------------------------------------------------------

#[test]
fn fetch_count_ignores_the_window() {
    let session = session();
    let windowed = by_age().with_window(Some(1), Some(1));

    assert_eq!(session.fetch_count(&windowed).unwrap(), 4);
    assert_eq!(session.fetch_count(&with_age(99)).unwrap(), 0);
}

#[test]
fn fetch_page_returns_items_and_total() {
    let session = session();
    let paged = by_age().with_window(Some(4), Some(2)).paged().unwrap();

    let page = session.fetch_page(&paged).unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.limit, Some(4));
    assert_eq!(page.offset, Some(2));
    assert!(!page.has_more());

    let names = page
        .try_map(|row| row.get_as::<String>(0))
        .unwrap()
        .items;
    assert_eq!(names, ["member3", "member4"]);
}

#[test]
fn negative_count_is_a_mapping_error() {
    let session = session();
    let member = member();
    let negative = select([col(&member, "age").sub(100).unwrap()])
        .from(&member)
        .where_(col(&member, "id").eq(1).unwrap())
        .build()
        .unwrap();
    let paged = PagedSelect::with_count_query(by_age(), negative).unwrap();

    let err = session.fetch_page(&paged).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Mapping);
    assert!(matches!(
        err,
        QueryError::Mapping(MappingError::Value { ref target, .. }) if target == "count"
    ));
}

#[test]
fn page_size_is_capped_by_configuration() {
    let config = QuarryConfig::from_toml_str("[session]\nmax_page_size = 3\n").unwrap();
    let session = Session::with_config(seeded(), &config);

    let too_large = by_age().with_window(Some(4), None).paged().unwrap();
    let err = session.fetch_page(&too_large).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::PageTooLarge { max: 3, .. })
    ));

    let unbounded = by_age().paged().unwrap();
    assert!(matches!(
        session.fetch_page(&unbounded).unwrap_err(),
        QueryError::Structural(StructuralError::PageTooLarge { ref requested, .. })
            if requested == "unbounded"
    ));

    let page = session
        .fetch_page(&by_age().with_window(Some(3), None).paged().unwrap())
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.has_more());
}

// ---------------------------------------------------------------------
// Bulk mutations
// ---------------------------------------------------------------------

#[test]
fn execute_rejects_selects() {
    let (session, sink) = counted();

    let err = session.execute(by_age()).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Structural(StructuralError::UnsupportedStatement {
            kind: StatementKind::Select,
            ..
        })
    ));
    assert_eq!(sink.compiled.load(Ordering::Relaxed), 0);
}

#[test]
fn bulk_update_makes_tracked_results_stale() {
    let session = session();
    let member = member();

    let tracked = session.fetch_tracked(&by_age()).unwrap();
    assert!(!session.is_stale(&tracked));

    let outcome = session
        .execute(
            update(&member)
                .set(col(&member, "username"), "X")
                .where_(col(&member, "age").lt(28).unwrap())
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(outcome.affected, 2);
    assert_eq!(outcome.table, "member");
    assert_eq!(outcome.generation, 1);

    // Earlier results keep their values and report staleness.
    assert!(session.is_stale(&tracked));
    assert_eq!(tracked.value()[0].get(0), Some(&Value::from("member1")));

    let fresh = session.fetch_tracked(&by_age()).unwrap();
    assert!(!session.is_stale(&fresh));
    let names: Vec<_> = fresh
        .into_value()
        .into_iter()
        .map(|row| row.get_as::<String>(0).unwrap())
        .collect();
    assert_eq!(names, ["X", "X", "member3", "member4"]);
}

#[test]
fn mutations_only_stale_their_own_table() {
    let session = session();
    let (member, team) = (member(), team());

    let teams = select([col(&team, "name")]).from(&team).build().unwrap();
    let tracked = session.fetch_tracked(&teams).unwrap();

    let outcome = session
        .execute(
            delete(&member)
                .where_(col(&member, "age").gt(25).unwrap())
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(outcome.affected, 2);
    assert_eq!(session.generation("member"), 1);
    assert_eq!(session.generation("team"), 0);
    assert!(!session.is_stale(&tracked));
    assert_eq!(session.fetch_count(&by_age()).unwrap(), 2);
}

#[test]
fn storage_failures_keep_the_engine_error() {
    let (session, sink) = counted();
    let member = member();
    let select = select([col(&member, "age").div(0).unwrap()])
        .from(&member)
        .build()
        .unwrap();

    let err = session.fetch(&select).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Storage);
    assert!(!err.is_build_error());
    assert_eq!(sink.failed.load(Ordering::Relaxed), 1);
    assert_eq!(sink.executed.load(Ordering::Relaxed), 0);
}

#[test]
fn sink_sees_compile_and_execute_events() {
    let (session, sink) = counted();

    session.fetch(&by_age()).unwrap();
    session.fetch_count(&by_age()).unwrap();

    assert_eq!(sink.compiled.load(Ordering::Relaxed), 2);
    assert_eq!(sink.executed.load(Ordering::Relaxed), 2);
}
