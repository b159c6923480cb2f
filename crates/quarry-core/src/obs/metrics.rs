use parking_lot::{Mutex, const_mutex};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Process-wide counters since `since_ms`.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
    pub since_ms: u64,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Session entrypoints
    pub compiled: u64,
    pub select_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,

    // Rows touched
    pub rows_returned: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,

    // Failures
    pub failures: u64,
    pub mapping_failures: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub select_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub rows_returned: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub failures: u64,
}

static EVENT_STATE: Mutex<Option<EventState>> = const_mutex(None);

/// Mutate the counters, starting a fresh window on first use.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut guard = EVENT_STATE.lock();
    let state = guard.get_or_insert_with(fresh_state);
    f(state)
}

pub(crate) fn reset_all() {
    *EVENT_STATE.lock() = Some(fresh_state());
}

fn fresh_state() -> EventState {
    EventState {
        since_ms: now_millis(),
        ..EventState::default()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventReport {
    pub since_ms: u64,
    pub ops: EventOps,
    /// Per-table counters with derived averages, sorted by table name.
    pub tables: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub counters: TableCounters,
    pub avg_rows_per_select: f64,
}

#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state_mut(|m| m.clone());

    let tables = snap
        .tables
        .into_iter()
        .map(|(table, counters)| {
            let avg_rows_per_select = if counters.select_calls > 0 {
                counters.rows_returned as f64 / counters.select_calls as f64
            } else {
                0.0
            };

            TableSummary {
                table,
                counters,
                avg_rows_per_select,
            }
        })
        .collect();

    EventReport {
        since_ms: snap.since_ms,
        ops: snap.ops,
        tables,
    }
}
