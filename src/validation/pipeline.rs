//! # Expression and unit pipeline
//!
//! Pure functions between raw text and the math engine:
//!
//! | step | function |
//! |------|----------|
//! | parse plain text | [`parse_expr`] |
//! | parse text with units, check internal consistency | [`parse_expr_units`] |
//! | dimension of an expression, with simplify-and-retry fallback | [`get_dimension`] |
//! | consistency against an optional target | [`units_are_consistent`] |
//! | conversion to a target, promoting dimensionless values | [`convert_to`] |
//!
//! Empty text is not an error: the parse functions return `Ok(None)` for it.

use crate::symbolic::parse_expr::parse_expression_func;
use crate::symbolic::symbolic_engine::Expr;
use crate::units::dimension::Dimension;
use crate::units::dimension_analysis::{
    DimensionError, check_dimensions, collect_factor_and_dimension, convert_to_unit,
    quantity_simplify, si_units_expr,
};
use crate::units::unit_table::UnitTable;
use crate::validation::errors::{ExpressionError, UnitMismatchError, ValidationError};
use crate::validation::guard::guard;
use log::trace;
use std::fmt;

/// What a value should be checked against or converted to.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitTarget {
    /// unit table key, or text parsed with units when the key is unknown
    Name(String),
    Expr(Expr),
    Dimension(Dimension),
}

impl fmt::Display for UnitTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnitTarget::Name(name) => write!(f, "{}", name),
            UnitTarget::Expr(expr) => write!(f, "{}", expr),
            UnitTarget::Dimension(dim) => write!(f, "{}", dim),
        }
    }
}

impl From<&str> for UnitTarget {
    fn from(name: &str) -> Self {
        UnitTarget::Name(name.to_string())
    }
}

impl From<Expr> for UnitTarget {
    fn from(expr: Expr) -> Self {
        UnitTarget::Expr(expr)
    }
}

impl From<Dimension> for UnitTarget {
    fn from(dim: Dimension) -> Self {
        UnitTarget::Dimension(dim)
    }
}

/// `^` is accepted as the exponent operator
pub fn normalize_exponent(text: &str) -> String {
    text.replace('^', "**")
}

/// Guard, parse and render check on non-empty text.
fn parse_checked(text: &str, units: Option<&UnitTable>) -> Result<Expr, ExpressionError> {
    let text = normalize_exponent(text);
    guard(&text)?;
    let expr = parse_expression_func(&text, units)?;
    let rendered = expr.to_string();
    if !expr.is_finite_tree() {
        return Err(ExpressionError::Other {
            kind: "OverflowError".to_string(),
            detail: format!("numeric literal out of range in {}", rendered),
        });
    }
    Ok(expr)
}

/// Parses `text` into an unevaluated expression; `Ok(None)` for empty text.
pub fn parse_expr(text: &str) -> Result<Option<Expr>, ExpressionError> {
    trace!("parse_expr({:?})", text);
    if text.is_empty() {
        return Ok(None);
    }
    parse_checked(text, None).map(Some)
}

/// Parses `text` resolving unit names from `table`, merges same-dimension units and checks
/// that the units inside the expression are consistent.
pub fn parse_expr_units(text: &str, table: &UnitTable) -> Result<Option<Expr>, ValidationError> {
    trace!("parse_expr_units({:?})", text);
    if text.is_empty() {
        return Ok(None);
    }
    let expr = parse_checked(text, Some(table))?;
    let expr = quantity_simplify(&expr).unwrap_or(expr);
    units_are_consistent(&expr, None, table)?;
    Ok(Some(expr))
}

/// Dimension of `expr`, `None` when it cannot be determined.
/// Inconsistent terms give `None`; shapes that cannot be factored directly are
/// quantity-simplified, evaluated numerically and factored once more.
pub fn get_dimension(expr: Option<&Expr>) -> Option<Dimension> {
    let expr = expr?;
    let result = match collect_factor_and_dimension(expr) {
        Ok((_, dim)) => Some(dim),
        Err(DimensionError::Inconsistent(cause)) => {
            trace!("get_dimension({}) -> {}", expr, cause);
            None
        }
        Err(DimensionError::Unfactorable(cause)) => {
            trace!("get_dimension({}) -> {}, retrying on evaluated form", expr, cause);
            let evaluated = quantity_simplify(expr).unwrap_or_else(|| expr.clone()).evalf();
            collect_factor_and_dimension(&evaluated).ok().map(|(_, dim)| dim)
        }
    };
    trace!(
        "get_dimension({}) -> {}",
        expr,
        result.map(|d| d.name()).unwrap_or_else(|| "None".to_string())
    );
    result
}

fn target_dimension(
    target: &UnitTarget,
    table: &UnitTable,
) -> Result<Dimension, UnitMismatchError> {
    let unresolved = || UnitMismatchError::UnresolvedTarget(target.to_string());
    match target {
        UnitTarget::Dimension(dim) => Ok(*dim),
        UnitTarget::Expr(expr) => get_dimension(Some(expr)).ok_or_else(unresolved),
        UnitTarget::Name(name) => match table.get(name) {
            Some(expr) => get_dimension(Some(expr)).ok_or_else(unresolved),
            None => match parse_expr_units(name, table) {
                Ok(Some(expr)) => get_dimension(Some(&expr)).ok_or_else(unresolved),
                Ok(None) => Ok(Dimension::dimensionless()),
                Err(_) => Err(unresolved()),
            },
        },
    }
}

/// Checks the units inside `expr` and, with a target, that `expr` can be expressed in it.
/// A dimensionless expression is compatible with every target.
pub fn units_are_consistent(
    expr: &Expr,
    target: Option<&UnitTarget>,
    table: &UnitTable,
) -> Result<(), UnitMismatchError> {
    trace!(
        "units_are_consistent({}, {})",
        expr,
        target.map(|t| t.to_string()).unwrap_or_else(|| "None".to_string())
    );
    check_dimensions(expr)?;
    let expr_dim = get_dimension(Some(expr)).ok_or(UnitMismatchError::Indeterminate)?;
    let Some(target) = target else {
        return Ok(());
    };
    let target_dim = target_dimension(target, table)?;
    if expr_dim.is_dimensionless() || expr_dim == target_dim {
        Ok(())
    } else {
        Err(UnitMismatchError::Incompatible {
            found: expr_dim.name(),
            target: target_dim.name(),
        })
    }
}

/// unit expression a target stands for
pub fn resolve_unit(unit: &UnitTarget, table: &UnitTable) -> Result<Expr, ExpressionError> {
    match unit {
        UnitTarget::Expr(expr) => Ok(expr.clone()),
        UnitTarget::Dimension(dim) => Ok(si_units_expr(dim)),
        UnitTarget::Name(name) => match table.get(name) {
            Some(expr) => Ok(expr.clone()),
            None => Ok(parse_checked(name, Some(table))?),
        },
    }
}

/// Rewrites `expr` in terms of `unit`. Expressions without a determinable dimension or
/// without dimension are multiplied by the unit instead of being converted.
pub fn convert_to(
    expr: Option<&Expr>,
    unit: &UnitTarget,
    table: &UnitTable,
) -> Result<Option<Expr>, ExpressionError> {
    let Some(expr) = expr else {
        return Ok(None);
    };
    let unit = resolve_unit(unit, table)?;
    let converted = match get_dimension(Some(expr)) {
        Some(dim) if !dim.is_dimensionless() => convert_to_unit(expr, &unit),
        _ => expr.clone() * unit,
    };
    trace!("convert_to({}) -> {}", expr, converted);
    Ok(Some(converted))
}
