use crate::{
    error::{Clause, QueryError, StructuralError},
    expr::{Expr, ExprKind, OrderTerm, Predicate, TableExt, and},
    query::scope::{self, Resolver},
};
use quarry_schema::{Column, Relation, Table, validate_ident};
use std::collections::BTreeSet;

///
/// Projection
///
/// One select-list entry. The label is the alias when given, else the
/// column name for bare columns; other expressions are unlabeled.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    expr: Expr,
    alias: Option<String>,
}

impl Projection {
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub(crate) fn aliased(expr: Expr, alias: &str) -> Self {
        Self {
            expr,
            alias: Some(alias.to_string()),
        }
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .or_else(|| self.expr.as_column().map(Column::name))
    }
}

impl From<Expr> for Projection {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

impl From<&Expr> for Projection {
    fn from(expr: &Expr) -> Self {
        Self::new(expr.clone())
    }
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

///
/// Join
///
/// A resolved join. For relation joins `condition` is the foreign-key
/// equality, ANDed with any explicit `on` predicate.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    kind: JoinKind,
    table: Table,
    relation: Option<String>,
    condition: Predicate,
}

impl Join {
    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    /// Name of the relation this join was declared through, if any.
    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    #[must_use]
    pub const fn condition(&self) -> &Predicate {
        &self.condition
    }
}

///
/// Select
///
/// Immutable select statement. Only `SelectBuilder` produces one, so every
/// instance has passed scope and clause validation.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    distinct: bool,
    projections: Vec<Projection>,
    from: Vec<Table>,
    joins: Vec<Join>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    having: Option<Predicate>,
    order_by: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
    free_columns: Vec<Column>,
}

impl Select {
    #[must_use]
    pub fn builder() -> SelectBuilder {
        SelectBuilder::default()
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    #[must_use]
    pub fn from(&self) -> &[Table] {
        &self.from
    }

    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    #[must_use]
    pub const fn having(&self) -> Option<&Predicate> {
        self.having.as_ref()
    }

    #[must_use]
    pub fn order_by(&self) -> &[OrderTerm] {
        &self.order_by
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// True when rows collapse into groups: explicit `group_by`, or
    /// aggregates in the projection or ordering.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
            || self
                .projections
                .iter()
                .any(|p| p.expr().contains_aggregate())
            || self
                .order_by
                .iter()
                .any(|term| term.expr().contains_aggregate())
    }

    /// Columns of enclosing bindings this select reads (correlated
    /// subqueries only).
    #[must_use]
    pub fn free_columns(&self) -> &[Column] {
        &self.free_columns
    }

    /// Table bindings in evaluation order: `from` sources, then joins.
    pub fn sources(&self) -> impl Iterator<Item = &Table> {
        self.from.iter().chain(self.joins.iter().map(Join::table))
    }

    /// Every physical table read, nested subqueries included.
    #[must_use]
    pub fn read_tables(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self.sources().map(|t| t.name().to_string()).collect();
        for expr in self.expressions() {
            collect_subquery_tables(expr, &mut out);
        }
        out
    }

    /// Same statement with a different window.
    #[must_use]
    pub fn with_window(&self, limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit,
            offset,
            ..self.clone()
        }
    }

    // Every expression that belongs to this select (not nested selects).
    pub(crate) fn expressions(&self) -> Vec<&Expr> {
        let mut out: Vec<&Expr> = self.projections.iter().map(Projection::expr).collect();
        out.extend(self.joins.iter().map(|j| j.condition().expr()));
        out.extend(self.filter.iter().map(Predicate::expr));
        out.extend(&self.group_by);
        out.extend(self.having.iter().map(Predicate::expr));
        out.extend(self.order_by.iter().map(OrderTerm::expr));
        out
    }

    // Count query over the same sources and filter.
    pub(crate) fn derive_count(&self) -> Self {
        Self {
            distinct: false,
            projections: vec![Projection::new(Expr::count_all())],
            from: self.from.clone(),
            joins: self.joins.clone(),
            filter: self.filter.clone(),
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            free_columns: self.free_columns.clone(),
        }
    }
}

fn collect_subquery_tables(expr: &Expr, out: &mut BTreeSet<String>) {
    if let ExprKind::Subquery(select) = expr.kind() {
        out.extend(select.read_tables());
    }
    for child in expr.children() {
        collect_subquery_tables(child, out);
    }
}

// ---------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------

/// Start a select with the given projections.
pub fn select<I>(projections: I) -> SelectBuilder
where
    I: IntoIterator,
    I::Item: Into<Projection>,
{
    SelectBuilder {
        projections: projections.into_iter().map(Into::into).collect(),
        ..SelectBuilder::default()
    }
}

/// `SELECT <every column of table> FROM table`
pub fn select_from(table: &Table) -> SelectBuilder {
    select(table.all_columns()).from(table)
}

#[derive(Clone, Debug)]
struct JoinSpec {
    kind: JoinKind,
    table: Table,
    relation: Option<Relation>,
    on: Option<Predicate>,
}

///
/// SelectBuilder
///
/// Consumed by value; misuse that cannot be expressed in the types (an `on`
/// with no join before it) is remembered and reported by `build()`.
///

#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SelectBuilder {
    distinct: bool,
    projections: Vec<Projection>,
    from: Vec<Table>,
    joins: Vec<JoinSpec>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    having: Option<Predicate>,
    order_by: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
    error: Option<StructuralError>,
}

impl SelectBuilder {
    /// Append one projection.
    pub fn select(mut self, projection: impl Into<Projection>) -> Self {
        self.projections.push(projection.into());
        self
    }

    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add a `from` source. Several sources form a cross product, filtered
    /// by `where_` (theta join).
    pub fn from(mut self, table: &Table) -> Self {
        self.from.push(table.clone());
        self
    }

    /// Inner join; needs an `on` predicate.
    pub fn join(self, table: &Table) -> Self {
        self.push_join(JoinKind::Inner, table, None)
    }

    /// Left outer join; needs an `on` predicate.
    pub fn left_join(self, table: &Table) -> Self {
        self.push_join(JoinKind::Left, table, None)
    }

    /// Inner join through a declared relation.
    pub fn join_relation(self, relation: &Relation, table: &Table) -> Self {
        self.push_join(JoinKind::Inner, table, Some(relation.clone()))
    }

    /// Left outer join through a declared relation.
    pub fn left_join_relation(self, relation: &Relation, table: &Table) -> Self {
        self.push_join(JoinKind::Left, table, Some(relation.clone()))
    }

    /// Condition for the most recent join. It filters only the joined side;
    /// it is never moved into `where`.
    pub fn on(mut self, predicate: Predicate) -> Self {
        match self.joins.last_mut() {
            Some(join) => join.on = Some(predicate.and(join.on.take())),
            None => {
                self.error.get_or_insert(StructuralError::OnWithoutJoin);
            }
        }
        self
    }

    /// AND a predicate into `where`; `None` leaves it unchanged.
    pub fn where_(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.filter = and(self.filter.take(), predicate.into());
        self
    }

    pub fn group_by(mut self, expr: impl Into<Expr>) -> Self {
        self.group_by.push(expr.into());
        self
    }

    /// AND a predicate into `having`; `None` leaves it unchanged.
    pub fn having(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.having = and(self.having.take(), predicate.into());
        self
    }

    pub fn order_by(mut self, term: impl Into<OrderTerm>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Validate and freeze. Every column must resolve to a binding of this
    /// statement.
    pub fn build(self) -> Result<Select, QueryError> {
        self.finish(false).inspect_err(|err| {
            log::debug!(target: "quarry::query", "select rejected: {err}");
        })
    }

    pub(crate) fn build_correlated(self) -> Result<Select, QueryError> {
        self.finish(true)
    }

    fn push_join(mut self, kind: JoinKind, table: &Table, relation: Option<Relation>) -> Self {
        self.joins.push(JoinSpec {
            kind,
            table: table.clone(),
            relation,
            on: None,
        });
        self
    }

    fn finish(self, correlated: bool) -> Result<Select, QueryError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        if self.projections.is_empty() {
            return Err(StructuralError::EmptyProjection.into());
        }
        if self.from.is_empty() {
            return Err(StructuralError::MissingFrom.into());
        }

        let mut resolver = Resolver::new(correlated);
        for table in &self.from {
            resolver.bind(table)?;
        }

        let mut joins = Vec::with_capacity(self.joins.len());
        for spec in self.joins {
            joins.push(resolve_join(spec, &mut resolver)?);
        }

        if let Some(filter) = &self.filter {
            scope::no_aggregate(filter.expr(), Clause::Where)?;
            resolver.resolve(filter.expr())?;
        }

        for expr in &self.group_by {
            scope::no_aggregate(expr, Clause::GroupBy)?;
            resolver.resolve(expr)?;
        }

        if let Some(having) = &self.having {
            if self.group_by.is_empty() {
                return Err(StructuralError::HavingWithoutGroupBy.into());
            }
            scope::flat_aggregates(having.expr())?;
            resolver.resolve(having.expr())?;
        }

        for projection in &self.projections {
            if let Some(alias) = projection.alias() {
                validate_ident(alias)?;
            }
            scope::flat_aggregates(projection.expr())?;
            resolver.resolve(projection.expr())?;
        }

        for term in &self.order_by {
            scope::flat_aggregates(term.expr())?;
            resolver.resolve(term.expr())?;
        }

        let select = Select {
            distinct: self.distinct,
            projections: self.projections,
            from: self.from,
            joins,
            filter: self.filter,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            free_columns: resolver.into_free(),
        };

        if select.is_grouped() {
            check_grouping(&select)?;
        }
        if select.distinct {
            let projected: Vec<&Expr> = select.projections.iter().map(Projection::expr).collect();
            for term in &select.order_by {
                scope::projected(term.expr(), &projected)?;
            }
        }

        Ok(select)
    }
}

fn resolve_join(spec: JoinSpec, resolver: &mut Resolver) -> Result<Join, QueryError> {
    let JoinSpec {
        kind,
        table,
        relation,
        on,
    } = spec;

    // The relation source must already be in scope; the target becomes
    // visible from this join on.
    let implied = match &relation {
        Some(relation) => Some(relation_predicate(relation, &table, resolver)?),
        None => None,
    };

    resolver.bind(&table)?;

    if let Some(on) = &on {
        scope::no_aggregate(on.expr(), Clause::On)?;
        resolver.resolve(on.expr())?;
    }

    let condition = match (implied, on) {
        (Some(implied), on) => implied.and(on),
        (None, Some(on)) => on,
        (None, None) => {
            return Err(StructuralError::MissingJoinCondition {
                binding: table.binding().to_string(),
            }
            .into());
        }
    };

    Ok(Join {
        kind,
        relation: relation.map(|r| r.name().to_string()),
        table,
        condition,
    })
}

fn relation_predicate(
    relation: &Relation,
    table: &Table,
    resolver: &Resolver,
) -> Result<Predicate, QueryError> {
    if relation.target_table() != table.name() {
        return Err(StructuralError::RelationTargetMismatch {
            relation: relation.name().to_string(),
            expected: relation.target_table().to_string(),
            found: table.name().to_string(),
        }
        .into());
    }

    let source = relation.source_column();
    if !resolver.is_bound(source.binding()) {
        return Err(StructuralError::RelationSourceOutOfScope {
            relation: relation.name().to_string(),
            binding: source.binding().to_string(),
        }
        .into());
    }

    let target = table.col(relation.target_column())?;

    Expr::column(source.clone()).eq(target)
}

fn check_grouping(select: &Select) -> Result<(), StructuralError> {
    let group_by = select.group_by();

    for projection in select.projections() {
        scope::grouped(projection.expr(), group_by, Clause::Projection)?;
    }
    for term in select.order_by() {
        scope::grouped(term.expr(), group_by, Clause::OrderBy)?;
    }
    if let Some(having) = select.having() {
        scope::grouped(having.expr(), group_by, Clause::Having)?;
    }

    Ok(())
}
