//! Module: session
//! Responsibility: run built statements through an executor and shape the
//! results (single rows, typed rows, pages, counts, bulk outcomes).
//! Does not own: statement validation (query) or storage (exec, memory).
//!
//! A session holds no result cache. Bulk mutations bump a per-table
//! generation so callers holding `Tracked` results can ask whether they are
//! stale.

mod response;

#[cfg(test)]
mod tests;

pub use response::{BulkOutcome, Page, ResponseError, Tracked};

use crate::{
    config::{QuarryConfig, SessionOptions},
    error::{QueryError, StructuralError},
    exec::{CompiledQuery, Executor},
    obs::{GlobalMetricsSink, MetricsEvent, MetricsSink},
    project::{MappingError, ResultRow, TypedSelect},
    query::{PagedSelect, Select, Statement, StatementKind},
    render::Renderer,
};
use parking_lot::Mutex;
use std::{collections::BTreeMap, fmt, sync::Arc};

///
/// Session
///

pub struct Session<X> {
    executor: X,
    renderer: Renderer,
    options: SessionOptions,
    sink: Arc<dyn MetricsSink>,
    generations: Mutex<BTreeMap<String, u64>>,
}

impl<X> Session<X> {
    /// Session with default render and session options, recording into the
    /// global metrics sink.
    pub fn new(executor: X) -> Self {
        Self::with_config(executor, &QuarryConfig::default())
    }

    pub fn with_config(executor: X, config: &QuarryConfig) -> Self {
        Self {
            executor,
            renderer: Renderer::new(config.render.clone()),
            options: config.session.clone(),
            sink: Arc::new(GlobalMetricsSink),
            generations: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub const fn executor(&self) -> &X {
        &self.executor
    }

    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Current bulk-mutation generation of a table; zero until first mutated.
    pub fn generation(&self, table: &str) -> u64 {
        self.generations.lock().get(table).copied().unwrap_or(0)
    }

    /// True when any table behind `tracked` was mutated after it was read.
    pub fn is_stale<T>(&self, tracked: &Tracked<T>) -> bool {
        let generations = self.generations.lock();

        tracked
            .observed()
            .iter()
            .any(|(table, seen)| generations.get(table).copied().unwrap_or(0) != *seen)
    }

    /// Render a statement for execution.
    pub fn compile(&self, statement: impl Into<Statement>) -> CompiledQuery {
        let query = CompiledQuery::compile(statement.into(), &self.renderer);
        let kind = query.statement().kind();
        self.sink.record(MetricsEvent::Compiled { kind });

        if self.options.log_statements {
            log::debug!(
                target: "quarry::session",
                "{kind} [{}] {} params={:?}",
                query.rendered().fingerprint(),
                query.text(),
                query.params()
            );
        }

        query
    }
}

impl<X: Executor> Session<X> {
    // ------------------------------------------------------------------
    // Selects
    // ------------------------------------------------------------------

    /// All rows of a select, in result order.
    pub fn fetch(&self, select: &Select) -> Result<Vec<ResultRow>, QueryError> {
        let query = self.compile(select.clone());
        let table = primary_table(select);

        match self.executor.query(&query) {
            Ok(rows) => {
                self.sink.record(MetricsEvent::Executed {
                    kind: StatementKind::Select,
                    table,
                    rows: row_count(rows.len()),
                });
                Ok(rows)
            }
            Err(err) => {
                self.sink.record(MetricsEvent::ExecutionFailed {
                    kind: StatementKind::Select,
                    table,
                });
                log::debug!(target: "quarry::session", "select on {table} failed: {err}");
                Err(QueryError::storage(err))
            }
        }
    }

    /// At most one row: `None` when empty, `NotUnique` when several match.
    pub fn fetch_one(&self, select: &Select) -> Result<Option<ResultRow>, QueryError> {
        let mut rows = self.fetch(select)?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(ResponseError::NotUnique { count }.into()),
        }
    }

    /// Exactly one row; an empty result fails with `NotFound`.
    pub fn fetch_required(&self, select: &Select) -> Result<ResultRow, QueryError> {
        self.fetch_one(select)?
            .ok_or_else(|| ResponseError::NotFound.into())
    }

    /// First row of the select's order, fetched with `LIMIT 1`.
    pub fn fetch_first(&self, select: &Select) -> Result<Option<ResultRow>, QueryError> {
        let first = select.with_window(Some(1), select.offset());

        Ok(self.fetch(&first)?.into_iter().next())
    }

    /// Rows bound to `T` through the select's resolved binding.
    pub fn fetch_into<T: 'static>(&self, typed: &TypedSelect<T>) -> Result<Vec<T>, QueryError> {
        self.fetch(typed.select())?
            .into_iter()
            .map(|row| self.map(typed, row))
            .collect()
    }

    pub fn fetch_one_into<T: 'static>(
        &self,
        typed: &TypedSelect<T>,
    ) -> Result<Option<T>, QueryError> {
        self.fetch_one(typed.select())?
            .map(|row| self.map(typed, row))
            .transpose()
    }

    /// Total rows the select would return without its window.
    pub fn fetch_count(&self, select: &Select) -> Result<u64, QueryError> {
        let paged = PagedSelect::new(select.clone())?;

        self.count(paged.count())
    }

    /// One page plus the total from the page's count query.
    pub fn fetch_page(&self, paged: &PagedSelect) -> Result<Page<ResultRow>, QueryError> {
        let page = paged.page();

        if let Some(max) = self.options.max_page_size {
            match page.limit() {
                Some(limit) if limit <= max => {}
                requested => {
                    return Err(StructuralError::PageTooLarge {
                        requested: requested
                            .map_or_else(|| "unbounded".to_string(), |limit| limit.to_string()),
                        max,
                    }
                    .into());
                }
            }
        }

        let items = self.fetch(page)?;
        let total = self.count(paged.count())?;

        Ok(Page {
            items,
            total,
            limit: page.limit(),
            offset: page.offset(),
        })
    }

    /// Rows plus the generations of every table they were read from.
    pub fn fetch_tracked(&self, select: &Select) -> Result<Tracked<Vec<ResultRow>>, QueryError> {
        let observed = {
            let generations = self.generations.lock();
            select
                .read_tables()
                .into_iter()
                .map(|table| {
                    let generation = generations.get(&table).copied().unwrap_or(0);
                    (table, generation)
                })
                .collect()
        };

        Ok(Tracked::new(self.fetch(select)?, observed))
    }

    // ------------------------------------------------------------------
    // Bulk mutations
    // ------------------------------------------------------------------

    /// Run a bulk update or delete.
    ///
    /// Results read earlier from the mutated table are not touched; they
    /// become stale and `is_stale` reports it.
    pub fn execute(&self, statement: impl Into<Statement>) -> Result<BulkOutcome, QueryError> {
        let statement = statement.into();
        let kind = statement.kind();
        let Some(table) = statement.mutated_table().map(ToString::to_string) else {
            return Err(StructuralError::UnsupportedStatement {
                kind,
                operation: "execute",
            }
            .into());
        };

        let query = self.compile(statement);
        let affected = match self.executor.execute(&query) {
            Ok(affected) => affected,
            Err(err) => {
                self.sink.record(MetricsEvent::ExecutionFailed {
                    kind,
                    table: &table,
                });
                log::debug!(target: "quarry::session", "{kind} on {table} failed: {err}");
                return Err(QueryError::storage(err));
            }
        };
        self.sink.record(MetricsEvent::Executed {
            kind,
            table: &table,
            rows: affected,
        });

        let generation = {
            let mut generations = self.generations.lock();
            let generation = generations.entry(table.clone()).or_insert(0);
            *generation = generation.saturating_add(1);
            *generation
        };
        log::info!(
            target: "quarry::session",
            "{kind} on {table} affected {affected} row(s); results read from {table} earlier are stale"
        );

        Ok(BulkOutcome {
            affected,
            table,
            generation,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn map<T: 'static>(&self, typed: &TypedSelect<T>, row: ResultRow) -> Result<T, QueryError> {
        typed.binding().map_row(row).map_err(|err| {
            self.sink.record(MetricsEvent::MappingFailed {
                target: typed.binding().target(),
            });
            err.into()
        })
    }

    // Runs a count query; an empty result counts as zero.
    fn count(&self, select: &Select) -> Result<u64, QueryError> {
        let Some(row) = self.fetch(select)?.into_iter().next() else {
            return Ok(0);
        };
        let total = row.get_as::<i64>(0)?;

        u64::try_from(total).map_err(|_| {
            MappingError::Value {
                target: "count".to_string(),
                column: row.header().display_label(0),
                reason: format!("total {total} is negative"),
            }
            .into()
        })
    }
}

impl<X: fmt::Debug> fmt::Debug for Session<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("executor", &self.executor)
            .field("renderer", &self.renderer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn primary_table(select: &Select) -> &str {
    select.sources().next().map_or("", |table| table.name())
}

fn row_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}
