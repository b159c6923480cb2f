//! Metrics sink boundary.
//!
//! Session code never touches `obs::metrics` directly: every counter update
//! flows through a `MetricsEvent` and a `MetricsSink`.

use crate::{obs::metrics, query::StatementKind};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    /// A statement was rendered for execution.
    Compiled { kind: StatementKind },

    /// The executor returned successfully; `table` is the mutated table or
    /// the first source of a select.
    Executed {
        kind: StatementKind,
        table: &'a str,
        rows: u64,
    },

    ExecutionFailed {
        kind: StatementKind,
        table: &'a str,
    },

    /// A row could not be bound to its target type.
    MappingFailed { target: &'a str },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
/// Default process-wide sink writing into the global counters.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Compiled { .. } => {
                metrics::with_state_mut(|m| m.ops.compiled = m.ops.compiled.saturating_add(1));
            }

            MetricsEvent::Executed { kind, table, rows } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        StatementKind::Select => {
                            m.ops.select_calls = m.ops.select_calls.saturating_add(1);
                            m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows);
                        }
                        StatementKind::Update => {
                            m.ops.update_calls = m.ops.update_calls.saturating_add(1);
                            m.ops.rows_updated = m.ops.rows_updated.saturating_add(rows);
                        }
                        StatementKind::Delete => {
                            m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                            m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows);
                        }
                    }

                    let entry = m.tables.entry(table.to_string()).or_default();
                    match kind {
                        StatementKind::Select => {
                            entry.select_calls = entry.select_calls.saturating_add(1);
                            entry.rows_returned = entry.rows_returned.saturating_add(rows);
                        }
                        StatementKind::Update => {
                            entry.update_calls = entry.update_calls.saturating_add(1);
                            entry.rows_updated = entry.rows_updated.saturating_add(rows);
                        }
                        StatementKind::Delete => {
                            entry.delete_calls = entry.delete_calls.saturating_add(1);
                            entry.rows_deleted = entry.rows_deleted.saturating_add(rows);
                        }
                    }
                });
            }

            MetricsEvent::ExecutionFailed { table, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.failures = m.ops.failures.saturating_add(1);
                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.failures = entry.failures.saturating_add(1);
                });
            }

            MetricsEvent::MappingFailed { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.mapping_failures = m.ops.mapping_failures.saturating_add(1);
                });
            }
        }
    }
}

/// Snapshot the global counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all global counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}
