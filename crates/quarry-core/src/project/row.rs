use crate::{
    expr::{Expr, ExprType},
    project::{FromValue, MappingError},
    query::Select,
    value::Value,
};
use std::sync::Arc;

///
/// RowHeader
///
/// Labels and projected expressions shared by every row of one result.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RowHeader {
    labels: Vec<Option<String>>,
    exprs: Vec<Expr>,
}

impl RowHeader {
    #[must_use]
    pub fn from_select(select: &Select) -> Self {
        let (labels, exprs) = select
            .projections()
            .iter()
            .map(|p| (p.label().map(str::to_string), p.expr().clone()))
            .unzip();

        Self { labels, exprs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index)?.as_deref()
    }

    /// Label for messages: the projection label, else `#<position>`.
    #[must_use]
    pub fn display_label(&self, index: usize) -> String {
        self.label(index)
            .map_or_else(|| format!("#{}", index + 1), str::to_string)
    }

    #[must_use]
    pub fn expr(&self, index: usize) -> Option<&Expr> {
        self.exprs.get(index)
    }

    #[must_use]
    pub fn expr_type(&self, index: usize) -> Option<ExprType> {
        self.exprs.get(index).map(Expr::expr_type)
    }

    #[must_use]
    pub fn position_of_label(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| l.as_deref() == Some(label))
    }

    #[must_use]
    pub fn position_of_expr(&self, expr: &Expr) -> Option<usize> {
        self.exprs.iter().position(|e| e == expr)
    }
}

///
/// ResultRow
///
/// One result tuple. Access is positional, by label or by the projected
/// expression itself.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    header: Arc<RowHeader>,
    values: Vec<Value>,
}

impl ResultRow {
    pub fn new(header: Arc<RowHeader>, values: Vec<Value>) -> Result<Self, MappingError> {
        if header.len() != values.len() {
            return Err(MappingError::RowWidth {
                expected: header.len(),
                found: values.len(),
            });
        }

        Ok(Self { header, values })
    }

    #[must_use]
    pub fn header(&self) -> &RowHeader {
        &self.header
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn get_by_label(&self, label: &str) -> Option<&Value> {
        self.get(self.header.position_of_label(label)?)
    }

    /// Value of a projected expression, matched structurally.
    #[must_use]
    pub fn get_by_expr(&self, expr: &Expr) -> Option<&Value> {
        self.get(self.header.position_of_expr(expr)?)
    }

    /// Typed positional access.
    pub fn get_as<V: FromValue>(&self, index: usize) -> Result<V, MappingError> {
        let value = self.get(index).ok_or_else(|| MappingError::Unbound {
            target: "row".to_string(),
            column: format!("#{}", index + 1),
        })?;

        V::from_value(value.clone()).map_err(|err| MappingError::Value {
            target: "row".to_string(),
            column: self.header.display_label(index),
            reason: err.to_string(),
        })
    }
}
