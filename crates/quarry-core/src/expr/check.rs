//! Construction-time operand checks shared by the expression builders.

use crate::{
    error::{QueryError, StructuralError, TypeMismatch},
    expr::{Expr, ExprKind, ExprType},
    query::Select,
};
use quarry_schema::ColumnType;

/// Both sides may meet in one comparison. Enum columns compared against text
/// literals additionally require a declared variant.
pub(crate) fn comparable(op: &'static str, left: &Expr, right: &Expr) -> Result<(), TypeMismatch> {
    if !left.expr_type().is_compatible(right.expr_type()) {
        return Err(TypeMismatch::Operands {
            op,
            left: left.expr_type(),
            right: right.expr_type(),
        });
    }

    enum_variant(left, right)?;
    enum_variant(right, left)
}

/// One operand must be of `expected` type (or untyped null).
pub(super) const fn operand(
    op: &'static str,
    expr: &Expr,
    expected: ExprType,
) -> Result<(), TypeMismatch> {
    if expr.expr_type().is_compatible(expected) {
        Ok(())
    } else {
        Err(TypeMismatch::Operand {
            op,
            expected,
            found: expr.expr_type(),
        })
    }
}

pub(crate) const fn boolean(context: &'static str, expr: &Expr) -> Result<(), TypeMismatch> {
    match expr.expr_type() {
        ExprType::Boolean => Ok(()),
        found => Err(TypeMismatch::NonBoolean { context, found }),
    }
}

/// Result type of a select used as an expression.
pub(super) fn single_projection(select: &Select) -> Result<ExprType, QueryError> {
    match select.projections() {
        [projection] => Ok(projection.expr().expr_type()),
        other => Err(StructuralError::SubqueryArity { found: other.len() }.into()),
    }
}

fn enum_variant(column: &Expr, literal: &Expr) -> Result<(), TypeMismatch> {
    let (ExprKind::Column(col), ExprKind::Literal(value)) = (column.kind(), literal.kind()) else {
        return Ok(());
    };
    if !matches!(col.ty(), ColumnType::Enum { .. }) {
        return Ok(());
    }

    match value.as_text() {
        Some(variant) if !col.ty().accepts_variant(variant) => Err(TypeMismatch::EnumVariant {
            column: col.to_string(),
            variant: variant.to_string(),
        }),
        _ => Ok(()),
    }
}
