//! Module: render
//! Responsibility: statement IR → parameterized SQL text.
//! Does not own: validation; every statement reaching here is already built.
//!
//! Rendering is a pure function of the statement and the options. Literals
//! become placeholders in textual order, `NULL` is inlined, and `LIMIT` /
//! `OFFSET` are inlined integers.

mod fingerprint;

#[cfg(test)]
mod tests;

use crate::{
    expr::{AggregateFn, BinaryOp, CaseExpr, Expr, ExprKind, NullOrdering, OrderTerm, UnaryOp},
    query::{Delete, Projection, Select, Statement, Update},
    value::Value,
};
use serde::Deserialize;
use std::fmt::Write as _;

// Precedence of forms not covered by `BinaryOp::precedence`.
const PREC_NOT: u8 = 3;
const PREC_PREDICATE: u8 = 4;
const PREC_ATOM: u8 = 9;

///
/// PlaceholderStyle
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Question,
    /// `$1`, `$2`, ...
    Numbered,
}

///
/// RenderOptions
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub placeholder: PlaceholderStyle,
    pub quote_identifiers: bool,
}

///
/// RenderedQuery
///

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedQuery {
    text: String,
    params: Vec<Value>,
}

impl RenderedQuery {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Hex SHA-256 over the text and a canonical encoding of the parameters.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint::digest(&self.text, &self.params)
    }
}

///
/// Renderer
///

#[derive(Clone, Debug, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    #[must_use]
    pub fn render(&self, statement: &Statement) -> RenderedQuery {
        let mut writer = Writer::new(&self.options);
        match statement {
            Statement::Select(select) => writer.select(select),
            Statement::Update(update) => writer.update(update),
            Statement::Delete(delete) => writer.delete(delete),
        }

        RenderedQuery {
            text: writer.out,
            params: writer.params,
        }
    }
}

///
/// Writer
/// Single-pass SQL writer; parameters are collected as text is emitted.
///

struct Writer<'a> {
    options: &'a RenderOptions,
    out: String,
    params: Vec<Value>,
}

impl<'a> Writer<'a> {
    const fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            out: String::new(),
            params: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn select(&mut self, select: &Select) {
        self.out.push_str("SELECT ");
        if select.is_distinct() {
            self.out.push_str("DISTINCT ");
        }
        self.list(select.projections(), |w, p| w.projection(p));

        self.out.push_str(" FROM ");
        self.list(select.from(), |w, table| {
            w.table(table.name(), table.alias());
        });

        for join in select.joins() {
            let _ = write!(self.out, " {} ", join.kind().as_str());
            self.table(join.table().name(), join.table().alias());
            self.out.push_str(" ON ");
            self.expr(join.condition().expr(), 0);
        }

        if let Some(filter) = select.filter() {
            self.out.push_str(" WHERE ");
            self.expr(filter.expr(), 0);
        }

        if !select.group_by().is_empty() {
            self.out.push_str(" GROUP BY ");
            self.list(select.group_by(), |w, e| w.expr(e, 0));
        }

        if let Some(having) = select.having() {
            self.out.push_str(" HAVING ");
            self.expr(having.expr(), 0);
        }

        if !select.order_by().is_empty() {
            self.out.push_str(" ORDER BY ");
            self.list(select.order_by(), Self::order_term);
        }

        if let Some(limit) = select.limit() {
            let _ = write!(self.out, " LIMIT {limit}");
        }
        if let Some(offset) = select.offset() {
            let _ = write!(self.out, " OFFSET {offset}");
        }
    }

    fn update(&mut self, update: &Update) {
        self.out.push_str("UPDATE ");
        self.table(update.table().name(), update.table().alias());
        self.out.push_str(" SET ");
        self.list(update.assignments(), |w, assignment| {
            w.ident(assignment.column().name());
            w.out.push_str(" = ");
            w.expr(assignment.value(), 0);
        });

        if let Some(filter) = update.filter() {
            self.out.push_str(" WHERE ");
            self.expr(filter.expr(), 0);
        }
    }

    fn delete(&mut self, delete: &Delete) {
        self.out.push_str("DELETE FROM ");
        self.table(delete.table().name(), delete.table().alias());

        if let Some(filter) = delete.filter() {
            self.out.push_str(" WHERE ");
            self.expr(filter.expr(), 0);
        }
    }

    // ------------------------------------------------------------------
    // Clause parts
    // ------------------------------------------------------------------

    fn projection(&mut self, projection: &Projection) {
        self.expr(projection.expr(), 0);
        if let Some(alias) = projection.alias() {
            self.out.push_str(" AS ");
            self.ident(alias);
        }
    }

    fn order_term(&mut self, term: &OrderTerm) {
        self.expr(term.expr(), 0);
        let _ = write!(self.out, " {}", term.direction());
        match term.nulls() {
            NullOrdering::First => self.out.push_str(" NULLS FIRST"),
            NullOrdering::Last => self.out.push_str(" NULLS LAST"),
            NullOrdering::Default => {}
        }
    }

    fn table(&mut self, name: &str, alias: Option<&str>) {
        self.ident(name);
        if let Some(alias) = alias {
            self.out.push_str(" AS ");
            self.ident(alias);
        }
    }

    fn ident(&mut self, ident: &str) {
        if self.options.quote_identifiers {
            self.out.push('"');
            self.out.push_str(&ident.replace('"', "\"\""));
            self.out.push('"');
        } else {
            self.out.push_str(ident);
        }
    }

    fn list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            each(self, item);
        }
    }

    fn param(&mut self, value: &Value) {
        if value.is_null() {
            self.out.push_str("NULL");
            return;
        }

        self.params.push(value.clone());
        match self.options.placeholder {
            PlaceholderStyle::Question => self.out.push('?'),
            PlaceholderStyle::Numbered => {
                let _ = write!(self.out, "${}", self.params.len());
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Write `expr`, parenthesized when it binds looser than `parent`.
    fn expr(&mut self, expr: &Expr, parent: u8) {
        let prec = precedence(expr);
        let wrap = prec < parent;
        if wrap {
            self.out.push('(');
        }

        match expr.kind() {
            ExprKind::Column(column) => {
                self.ident(column.binding());
                self.out.push('.');
                self.ident(column.name());
            }
            ExprKind::Literal(value) => self.param(value),
            ExprKind::Binary { op, left, right } => {
                // Comparisons do not chain; arithmetic and boolean
                // operators are left-associative.
                let (left_prec, right_prec) = if prec == PREC_PREDICATE {
                    (prec + 1, prec + 1)
                } else {
                    (prec, prec + 1)
                };
                self.expr(left, left_prec);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(right, right_prec);
            }
            ExprKind::Unary { op, operand } => self.unary(*op, operand),
            ExprKind::Between { operand, low, high } => {
                self.expr(operand, PREC_PREDICATE + 1);
                self.out.push_str(" BETWEEN ");
                self.expr(low, PREC_PREDICATE + 1);
                self.out.push_str(" AND ");
                self.expr(high, PREC_PREDICATE + 1);
            }
            ExprKind::List(items) => {
                self.out.push('(');
                self.list(items, |w, item| w.expr(item, 0));
                self.out.push(')');
            }
            ExprKind::Case(case) => self.case(case),
            ExprKind::Subquery(select) => {
                self.out.push('(');
                self.select(select);
                self.out.push(')');
            }
            ExprKind::Aggregate { func, arg } => {
                self.out.push_str(func.as_str());
                self.out.push('(');
                match arg {
                    Some(arg) => {
                        if *func == AggregateFn::CountDistinct {
                            self.out.push_str("DISTINCT ");
                        }
                        self.expr(arg, 0);
                    }
                    None => self.out.push('*'),
                }
                self.out.push(')');
            }
        }

        if wrap {
            self.out.push(')');
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) {
        match op {
            UnaryOp::Not => {
                self.out.push_str("NOT ");
                self.expr(operand, PREC_NOT + 1);
            }
            UnaryOp::IsNull => {
                self.expr(operand, PREC_PREDICATE + 1);
                self.out.push_str(" IS NULL");
            }
            UnaryOp::IsNotNull => {
                self.expr(operand, PREC_PREDICATE + 1);
                self.out.push_str(" IS NOT NULL");
            }
            UnaryOp::ToText => {
                self.out.push_str("CAST(");
                self.expr(operand, 0);
                self.out.push_str(" AS VARCHAR)");
            }
        }
    }

    fn case(&mut self, case: &CaseExpr) {
        self.out.push_str("CASE");
        if let Some(operand) = case.operand() {
            self.out.push(' ');
            self.expr(operand, 0);
        }
        for branch in case.branches() {
            self.out.push_str(" WHEN ");
            self.expr(branch.when(), 0);
            self.out.push_str(" THEN ");
            self.expr(branch.then(), 0);
        }
        if let Some(otherwise) = case.otherwise() {
            self.out.push_str(" ELSE ");
            self.expr(otherwise, 0);
        }
        self.out.push_str(" END");
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr.kind() {
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary {
            op: UnaryOp::Not, ..
        } => PREC_NOT,
        ExprKind::Unary {
            op: UnaryOp::IsNull | UnaryOp::IsNotNull,
            ..
        }
        | ExprKind::Between { .. } => PREC_PREDICATE,
        ExprKind::Unary {
            op: UnaryOp::ToText,
            ..
        }
        | ExprKind::Column(_)
        | ExprKind::Literal(_)
        | ExprKind::List(_)
        | ExprKind::Case(_)
        | ExprKind::Subquery(_)
        | ExprKind::Aggregate { .. } => PREC_ATOM,
    }
}

// `BinaryOp::precedence` places comparisons at the predicate level; keep the
// two in step.
const _: () = assert!(BinaryOp::Eq.precedence() == PREC_PREDICATE);
