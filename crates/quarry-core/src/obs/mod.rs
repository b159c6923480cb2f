//! Observability: statement counters and the sink they are recorded through.
//!
//! Builders never record anything; events originate from a `Session` only.

pub(crate) mod metrics;
pub(crate) mod sink;

#[cfg(test)]
mod tests;

// re-exports
pub use metrics::{EventOps, EventReport, TableCounters, TableSummary};
pub use sink::{GlobalMetricsSink, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
