use super::*;
use crate::query::StatementKind;
use std::sync::atomic::{AtomicU64, Ordering};

// The global counters are shared with every other test in the process, so
// these assertions stick to table names nothing else uses.

fn table_counters(table: &str) -> TableCounters {
    metrics_report()
        .tables
        .into_iter()
        .find(|summary| summary.table == table)
        .map(|summary| summary.counters)
        .unwrap_or_default()
}

#[test]
fn global_sink_accumulates_per_table() {
    let sink = GlobalMetricsSink;

    sink.record(MetricsEvent::Executed {
        kind: StatementKind::Select,
        table: "obs_tests_select",
        rows: 3,
    });
    sink.record(MetricsEvent::Executed {
        kind: StatementKind::Select,
        table: "obs_tests_select",
        rows: 1,
    });

    let counters = table_counters("obs_tests_select");
    assert_eq!(counters.select_calls, 2);
    assert_eq!(counters.rows_returned, 4);

    let summary = metrics_report()
        .tables
        .into_iter()
        .find(|summary| summary.table == "obs_tests_select")
        .expect("summary for table");
    assert!((summary.avg_rows_per_select - 2.0).abs() < f64::EPSILON);
}

#[test]
fn mutations_and_failures_are_counted_separately() {
    let sink = GlobalMetricsSink;

    sink.record(MetricsEvent::Executed {
        kind: StatementKind::Delete,
        table: "obs_tests_mutation",
        rows: 5,
    });
    sink.record(MetricsEvent::ExecutionFailed {
        kind: StatementKind::Update,
        table: "obs_tests_mutation",
    });

    let counters = table_counters("obs_tests_mutation");
    assert_eq!(counters.delete_calls, 1);
    assert_eq!(counters.rows_deleted, 5);
    assert_eq!(counters.update_calls, 0);
    assert_eq!(counters.failures, 1);
}

#[test]
fn custom_sink_receives_events() {
    #[derive(Default)]
    struct Counting {
        calls: AtomicU64,
    }

    impl MetricsSink for Counting {
        fn record(&self, _: MetricsEvent<'_>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    let sink = Counting::default();
    sink.record(MetricsEvent::Compiled {
        kind: StatementKind::Select,
    });
    sink.record(MetricsEvent::MappingFailed { target: "Dto" });

    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
}
