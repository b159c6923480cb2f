use thiserror::Error as ThisError;

///
/// ResponseError
/// Cardinality failures of single-row fetches.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ResponseError {
    #[error("expected one row, found none")]
    NotFound,

    #[error("expected at most one row, found {count}")]
    NotUnique { count: usize },
}

///
/// Page
///
/// One page of results together with the total the count query reported.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl<T> Page<T> {
    /// Convert every item, keeping the paging metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        })
    }

    /// True when rows exist beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        let shown = u64::try_from(self.items.len()).unwrap_or(u64::MAX);
        let seen = self.offset.unwrap_or(0).saturating_add(shown);
        seen < self.total
    }
}

///
/// Tracked
///
/// Materialized results plus the generation of every table they were read
/// from. A later bulk mutation of any of those tables makes them stale; the
/// session only reports that, refreshing is up to the caller.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Tracked<T> {
    value: T,
    observed: Vec<(String, u64)>,
}

impl<T> Tracked<T> {
    pub(super) const fn new(value: T, observed: Vec<(String, u64)>) -> Self {
        Self { value, observed }
    }

    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// `(table, generation)` pairs captured at read time.
    #[must_use]
    pub fn observed(&self) -> &[(String, u64)] {
        &self.observed
    }
}

///
/// BulkOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BulkOutcome {
    pub affected: u64,
    pub table: String,

    /// Generation of `table` after this mutation.
    pub generation: u64,
}
