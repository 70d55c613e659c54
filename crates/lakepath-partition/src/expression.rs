//! Construction helpers for the partition expressions built by this crate.
//!
//! Partition expressions are plain [`Expr`] values. They are only built and
//! compared structurally here, never evaluated.

use datafusion_common::ScalarValue;
use datafusion_expr::utils::{conjunction, split_conjunction};
use datafusion_expr::{ident, lit, Expr};

pub fn scalar(value: ScalarValue) -> Expr {
    Expr::Literal(value)
}

/// The expression that holds for every row.
pub fn trivially_true() -> Expr {
    lit(true)
}

pub fn is_trivially_true(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(ScalarValue::Boolean(Some(true))))
}

/// An unqualified column reference. Field names containing `.` are kept whole.
pub fn field_ref(name: &str) -> Expr {
    ident(name)
}

pub fn equal(left: Expr, right: Expr) -> Expr {
    left.eq(right)
}

/// Conjoins the expressions, skipping trivially-true ones.
/// Returns the trivially-true expression when nothing is left.
pub fn and_(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    conjunction(exprs.into_iter().filter(|e| !is_trivially_true(e))).unwrap_or_else(trivially_true)
}

/// Splits nested conjunctions into their terms, dropping trivially-true ones.
pub fn conjunction_terms(expr: &Expr) -> Vec<Expr> {
    split_conjunction(expr)
        .into_iter()
        .filter(|e| !is_trivially_true(e))
        .cloned()
        .collect()
}

/// Conjoins the terms of all expressions in order, keeping
/// structurally equal terms once.
pub fn and_distinct<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> Expr {
    let mut terms: Vec<Expr> = vec![];
    for expr in exprs {
        for term in conjunction_terms(expr) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    and_(terms)
}
