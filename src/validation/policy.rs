//! Variant-specific part of a validation cycle.
//!
//! The orchestrator owns the clear -> validate -> store -> emit skeleton; a policy only maps
//! non-empty text to an [`Evaluation`] or an error:
//!
//! - [`SymbolPolicy`]: the text must be a bare identifier
//! - [`ExpressionPolicy`]: any expression, no units
//! - [`UnitPolicy`]: expression with units, checked against and converted to the target unit
//! - [`DimensionPolicy`]: expression with units whose dimension must equal a required one

use crate::symbolic::symbolic_engine::Expr;
use crate::units::dimension::Dimension;
use crate::units::unit_table::UnitTable;
use crate::validation::errors::{ExpressionError, UnitMismatchError, ValidationError};
use crate::validation::guard::text_to_symbol;
use crate::validation::pipeline::{
    UnitTarget, convert_to, get_dimension, parse_expr, parse_expr_units, units_are_consistent,
};
use enum_dispatch::enum_dispatch;
use log::trace;

/// Result of a successful cycle: the stored expression and its evaluated value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub expr: Expr,
    pub value: Expr,
}

#[enum_dispatch(Policy)]
pub trait ValidationPolicy {
    /// Validates non-empty `text`; `target` is the unit currently chosen by the paired selector.
    fn evaluate(
        &self,
        text: &str,
        target: Option<&Expr>,
        table: &UnitTable,
    ) -> Result<Evaluation, ValidationError>;
    /// whether unit names resolve to units and a paired selector supplies the target
    fn uses_units(&self) -> bool;
    fn name(&self) -> &'static str;
}

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    Symbol(SymbolPolicy),
    Expression(ExpressionPolicy),
    Unit(UnitPolicy),
    Dimension(DimensionPolicy),
}

/// Bare symbol names only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolPolicy;

impl ValidationPolicy for SymbolPolicy {
    fn evaluate(
        &self,
        text: &str,
        _target: Option<&Expr>,
        _table: &UnitTable,
    ) -> Result<Evaluation, ValidationError> {
        let symbol = text_to_symbol(text)?;
        Ok(Evaluation {
            expr: symbol.clone(),
            value: symbol,
        })
    }

    fn uses_units(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "symbol"
    }
}

/// Expressions without units; the simplified expression is stored, its numeric evaluation
/// is the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionPolicy;

impl ValidationPolicy for ExpressionPolicy {
    fn evaluate(
        &self,
        text: &str,
        _target: Option<&Expr>,
        _table: &UnitTable,
    ) -> Result<Evaluation, ValidationError> {
        let expr = parse_expr(text)?.ok_or(ExpressionError::Syntax)?.simplify_();
        let value = expr.evalf();
        Ok(Evaluation { expr, value })
    }

    fn uses_units(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "expression"
    }
}

/// Expressions with units. With a target the expression must be compatible with it and is
/// stored converted to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitPolicy;

impl ValidationPolicy for UnitPolicy {
    fn evaluate(
        &self,
        text: &str,
        target: Option<&Expr>,
        table: &UnitTable,
    ) -> Result<Evaluation, ValidationError> {
        let expr = parse_expr_units(text, table)?.ok_or(UnitMismatchError::Indeterminate)?;
        let expr = match target {
            Some(unit) => {
                let unit = UnitTarget::Expr(unit.clone());
                units_are_consistent(&expr, Some(&unit), table)?;
                convert_to(Some(&expr), &unit, table)?.unwrap_or(expr)
            }
            None => expr,
        };
        let value = expr.evalf();
        trace!("unit policy: {:?} -> {}", text, expr);
        Ok(Evaluation { expr, value })
    }

    fn uses_units(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "unit"
    }
}

/// Expressions with units whose dimension must be exactly `required`.
/// Unlike the consistency check, a dimensionless value does not satisfy a dimensioned
/// requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionPolicy {
    pub required: Dimension,
}

impl DimensionPolicy {
    pub fn new(required: Dimension) -> Self {
        DimensionPolicy { required }
    }
}

impl Default for DimensionPolicy {
    fn default() -> Self {
        DimensionPolicy::new(Dimension::from_name("length").unwrap_or_default())
    }
}

impl ValidationPolicy for DimensionPolicy {
    fn evaluate(
        &self,
        text: &str,
        _target: Option<&Expr>,
        table: &UnitTable,
    ) -> Result<Evaluation, ValidationError> {
        let expr = parse_expr_units(text, table)?.ok_or(UnitMismatchError::Indeterminate)?;
        let dim = get_dimension(Some(&expr)).ok_or(UnitMismatchError::Indeterminate)?;
        if dim != self.required {
            return Err(UnitMismatchError::Incompatible {
                found: dim.name(),
                target: self.required.name(),
            }
            .into());
        }
        let value = expr.evalf();
        Ok(Evaluation { expr, value })
    }

    fn uses_units(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "dimension"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_policy() {
        let table = UnitTable::standard();
        let policy = Policy::from(SymbolPolicy);
        let eval = policy.evaluate("x", None, &table).unwrap();
        assert_eq!(eval.expr, Expr::Var("x".to_string()));
        assert_eq!(
            policy.evaluate("x+1", None, &table),
            Err(ValidationError::Expression(ExpressionError::NotIdentifier))
        );
        assert!(!policy.uses_units());
    }

    #[test]
    fn test_expression_policy_value() {
        let table = UnitTable::standard();
        let policy = Policy::from(ExpressionPolicy);
        let eval = policy.evaluate("2*cos(pi) + 20/5", None, &table).unwrap();
        assert_eq!(eval.expr, Expr::Const(2.0));
        assert_eq!(eval.value, Expr::Const(2.0));
        let eval = policy.evaluate("2*cos(pi) + pi + 0*x", None, &table).unwrap();
        assert_eq!(eval.expr, Expr::Const(-2.0) + Expr::Pi);
        assert_eq!(eval.value, Expr::Const(std::f64::consts::PI - 2.0));
        // no unit table: unit names are plain symbols
        let eval = policy.evaluate("2*mm", None, &table).unwrap();
        assert_eq!(eval.expr.extract_variables(), vec!["mm".to_string()]);
    }

    #[test]
    fn test_unit_policy_converts_to_target() {
        let table = UnitTable::standard();
        let policy = Policy::from(UnitPolicy);
        let inch = table.get("inch").unwrap();
        let eval = policy.evaluate("2*mm + 3*inch", Some(inch), &table).unwrap();
        assert_eq!(eval.expr.unit_atoms(), vec![table.quantity("inch").unwrap().clone()]);
        approx::assert_relative_eq!(
            eval.expr.coefficient(),
            2.0 / 25.4 + 3.0,
            max_relative = 1e-12
        );
        let kg = table.get("kg").unwrap();
        assert!(matches!(
            policy.evaluate("2*mm", Some(kg), &table),
            Err(ValidationError::UnitMismatch(UnitMismatchError::Incompatible { .. }))
        ));
    }

    #[test]
    fn test_dimension_policy_is_strict() {
        let table = UnitTable::standard();
        let force = Dimension::from_name("force").unwrap();
        let policy = Policy::from(DimensionPolicy::new(force));
        assert!(policy.evaluate("2*lbf", None, &table).is_ok());
        assert!(policy.evaluate("2*mm", None, &table).is_err());
        let length = Policy::from(DimensionPolicy::default());
        assert!(length.evaluate("sin(3*pi)", None, &table).is_err());
        assert!(length.evaluate("sin(3*pi)*mm", None, &table).is_ok());
        assert_eq!(length.name(), "dimension");
    }
}
