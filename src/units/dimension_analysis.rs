//! # Dimensional analysis on expression trees
//!
//! - [`collect_factor_and_dimension`] splits an expression into its SI-scaled factor and its
//!   dimension, failing on inconsistent sums or on shapes it cannot factor directly.
//! - [`check_dimensions`] is the structural check: it only fails on provable
//!   inconsistencies and tolerates sub-trees whose dimension is unknown (symbols).
//! - [`quantity_simplify`] merges same-dimension units inside products into one unit.
//! - [`convert_to_unit`] rewrites an expression in terms of a target unit expression.

use crate::symbolic::symbolic_engine::{Expr, snap_to_integer};
use crate::units::dimension::{BaseDimension, Dimension, Exponent, exponent_from_f64};
use crate::units::quantity::Quantity;
use log::trace;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionError {
    /// terms of a sum, a function argument or an exponent have unusable dimensions
    Inconsistent(String),
    /// the shape cannot be factored without simplifying it first
    Unfactorable(String),
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DimensionError::Inconsistent(msg) => write!(f, "ValueError: {}", msg),
            DimensionError::Unfactorable(msg) => write!(f, "AttributeError: {}", msg),
        }
    }
}

impl std::error::Error for DimensionError {}

fn overflow(expr: &Expr) -> DimensionError {
    DimensionError::Inconsistent(format!("dimension exponent of \"{}\" overflows", expr))
}

/// exponent written as a plain (possibly negated) number literal
fn literal_exponent(exp: &Expr) -> Option<f64> {
    match exp {
        Expr::Const(val) => Some(*val),
        Expr::Mul(lhs, rhs) if lhs.is_minus_one() => literal_exponent(rhs).map(|v| -v),
        _ => None,
    }
}

/// Splits `expr` into `(factor, dimension)`; the factor is the expression with every unit
/// replaced by its SI scale.
pub fn collect_factor_and_dimension(expr: &Expr) -> Result<(Expr, Dimension), DimensionError> {
    match expr {
        Expr::Unit(q) => Ok((Expr::Const(q.scale_factor), q.dimension)),
        Expr::Var(_) | Expr::Const(_) | Expr::Pi | Expr::Euler => {
            Ok((expr.clone(), Dimension::dimensionless()))
        }
        Expr::Mul(lhs, rhs) => {
            let (lf, ld) = collect_factor_and_dimension(lhs)?;
            let (rf, rd) = collect_factor_and_dimension(rhs)?;
            let dim = ld.checked_mul(&rd).ok_or_else(|| overflow(expr))?;
            Ok((lf * rf, dim))
        }
        Expr::Div(lhs, rhs) => {
            let (lf, ld) = collect_factor_and_dimension(lhs)?;
            let (rf, rd) = collect_factor_and_dimension(rhs)?;
            let dim = ld.checked_div(&rd).ok_or_else(|| overflow(expr))?;
            Ok((lf / rf, dim))
        }
        Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
            let (lf, ld) = collect_factor_and_dimension(lhs)?;
            let (rf, rd) = collect_factor_and_dimension(rhs)?;
            if ld != rd {
                return Err(DimensionError::Inconsistent(format!(
                    "Dimension of \"{}\" is {}, but it should be {}",
                    rhs,
                    rd.name(),
                    ld.name()
                )));
            }
            let factor = if matches!(expr, Expr::Add(_, _)) {
                lf + rf
            } else {
                lf - rf
            };
            Ok((factor, ld))
        }
        Expr::Pow(base, exp) => {
            let (bf, bd) = collect_factor_and_dimension(base)?;
            let (ef, ed) = collect_factor_and_dimension(exp)?;
            if !ed.is_dimensionless() {
                return Err(DimensionError::Inconsistent(format!(
                    "exponent \"{}\" must be dimensionless, got {}",
                    exp,
                    ed.name()
                )));
            }
            if bd.is_dimensionless() {
                return Ok((bf.pow(ef), bd));
            }
            match literal_exponent(exp) {
                Some(val) => match exponent_from_f64(val) {
                    Some(power) => {
                        let dim = bd.checked_powr(power).ok_or_else(|| overflow(expr))?;
                        Ok((bf.pow(Expr::Const(val)), dim))
                    }
                    None => Err(DimensionError::Inconsistent(format!(
                        "{} cannot be raised to the power {}",
                        bd.name(),
                        val
                    ))),
                },
                None if exp.is_number() => Err(DimensionError::Unfactorable(format!(
                    "exponent \"{}\" of a dimensioned base is not a number literal",
                    exp
                ))),
                None => Err(DimensionError::Inconsistent(format!(
                    "symbolic exponent \"{}\" on {}",
                    exp,
                    bd.name()
                ))),
            }
        }
        _ => {
            let Some(arg) = expr.function_arg() else {
                return Err(DimensionError::Unfactorable(format!("{:?}", expr)));
            };
            let (af, ad) = collect_factor_and_dimension(arg)?;
            match expr {
                Expr::Abs(_) => Ok((expr.with_function_arg(af), ad)),
                Expr::Sqrt(_) => {
                    let dim = ad
                        .checked_powr(Exponent::new(1, 2))
                        .ok_or_else(|| overflow(expr))?;
                    Ok((expr.with_function_arg(af), dim))
                }
                _ if ad.is_dimensionless() => Ok((expr.with_function_arg(af), ad)),
                _ => Err(DimensionError::Inconsistent(format!(
                    "argument of {}() must be dimensionless, got {}",
                    expr.function_name().unwrap_or("function"),
                    ad.name()
                ))),
            }
        }
    }
}

/// dimension of a sub-tree, `None` when it cannot be known structurally
fn structural_dimension(expr: &Expr) -> Result<Option<Dimension>, DimensionError> {
    match expr {
        Expr::Unit(q) => Ok(Some(q.dimension)),
        Expr::Const(_) | Expr::Pi | Expr::Euler => Ok(Some(Dimension::dimensionless())),
        Expr::Var(_) => Ok(None),
        Expr::Mul(lhs, rhs) | Expr::Div(lhs, rhs) => {
            let l = structural_dimension(lhs)?;
            let r = structural_dimension(rhs)?;
            match (l, r) {
                (Some(l), Some(r)) => {
                    let dim = if matches!(expr, Expr::Mul(_, _)) {
                        l.checked_mul(&r)
                    } else {
                        l.checked_div(&r)
                    };
                    dim.map(Some).ok_or_else(|| overflow(expr))
                }
                _ => Ok(None),
            }
        }
        Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
            let l = structural_dimension(lhs)?;
            let r = structural_dimension(rhs)?;
            match (l, r) {
                (Some(l), Some(r)) if l != r => Err(DimensionError::Inconsistent(format!(
                    "addends have incompatible dimensions: {} and {}",
                    l.name(),
                    r.name()
                ))),
                (Some(l), Some(_)) => Ok(Some(l)),
                _ => Ok(None),
            }
        }
        Expr::Pow(base, exp) => {
            structural_dimension(exp)?;
            let b = structural_dimension(base)?;
            match b {
                Some(d) if d.is_dimensionless() => Ok(Some(d)),
                Some(d) => match literal_exponent(exp).and_then(exponent_from_f64) {
                    Some(p) => d.checked_powr(p).map(Some).ok_or_else(|| overflow(expr)),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        }
        _ => match expr.function_arg() {
            Some(arg) => {
                let a = structural_dimension(arg)?;
                match (expr, a) {
                    (Expr::Abs(_), a) => Ok(a),
                    (Expr::Sqrt(_), Some(d)) => d
                        .checked_powr(Exponent::new(1, 2))
                        .map(Some)
                        .ok_or_else(|| overflow(expr)),
                    (Expr::Sqrt(_), None) => Ok(None),
                    _ => Ok(Some(Dimension::dimensionless())),
                }
            }
            None => Ok(None),
        },
    }
}

/// Structural check: fails only when two addends provably carry different dimensions.
pub fn check_dimensions(expr: &Expr) -> Result<(), DimensionError> {
    trace!("check_dimensions({})", expr);
    structural_dimension(expr).map(|_| ())
}

//___________________________________QUANTITY SIMPLIFICATION____________________________________

fn flatten_product(expr: &Expr, power: i32, out: &mut Vec<(Expr, i32)>) {
    match expr {
        Expr::Mul(lhs, rhs) => {
            flatten_product(lhs, power, out);
            flatten_product(rhs, power, out);
        }
        Expr::Div(lhs, rhs) => {
            flatten_product(lhs, power, out);
            flatten_product(rhs, -power, out);
        }
        Expr::Pow(base, exp) if matches!(base.as_ref(), Expr::Unit(_)) => {
            let n = literal_exponent(exp)
                .filter(|v| v.fract() == 0.0)
                .and_then(|v| v.to_i32())
                .and_then(|n| n.checked_mul(power));
            match n {
                Some(n) => out.push((base.as_ref().clone(), n)),
                None => out.push((expr.clone(), power)),
            }
        }
        _ => out.push((simplify_quantities(expr), power)),
    }
}

fn product_of(factors: Vec<Expr>) -> Option<Expr> {
    factors.into_iter().reduce(|acc, f| acc * f)
}

fn unit_power(q: &Quantity, power: u32) -> Expr {
    if power == 1 {
        Expr::Unit(q.clone())
    } else {
        Expr::Unit(q.clone()).pow(Expr::Const(power as f64))
    }
}

/// Merged product, `None` when an accumulated unit power overflows.
fn merge_product(expr: &Expr) -> Option<Expr> {
    let mut factors = Vec::new();
    flatten_product(expr, 1, &mut factors);
    let mut coefficient = 1.0;
    // canonical unit per dimension, with its accumulated power
    let mut units: Vec<(Quantity, i32)> = Vec::new();
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for (factor, power) in factors {
        match factor {
            Expr::Unit(q) => match units.iter_mut().find(|(u, _)| u.dimension == q.dimension) {
                Some((canonical, acc)) => {
                    let ratio = q.scale_factor / canonical.scale_factor;
                    coefficient *= ratio.powi(power);
                    *acc = acc.checked_add(power)?;
                }
                None => units.push((q, power)),
            },
            f if f.is_number() => match f.to_f64() {
                Some(val) if power > 0 => coefficient *= val,
                Some(val) if val != 0.0 => coefficient /= val,
                _ if power > 0 => numerator.push(f),
                _ => denominator.push(f),
            },
            f if power > 0 => numerator.push(f),
            f => denominator.push(f),
        }
    }
    for (q, power) in units {
        if power > 0 {
            numerator.push(unit_power(&q, power.unsigned_abs()));
        } else if power < 0 {
            denominator.push(unit_power(&q, power.unsigned_abs()));
        }
    }
    let coefficient = snap_to_integer(coefficient);
    if coefficient != 1.0 || numerator.is_empty() {
        numerator.insert(0, Expr::Const(coefficient));
    }
    let num = product_of(numerator).unwrap_or(Expr::Const(1.0));
    Some(match product_of(denominator) {
        Some(den) => num / den,
        None => num,
    })
}

fn simplify_quantities(expr: &Expr) -> Expr {
    match expr {
        Expr::Mul(_, _) | Expr::Div(_, _) => merge_product(expr).unwrap_or_else(|| {
            trace!("unit powers of {} overflow, left unmerged", expr);
            expr.clone()
        }),
        Expr::Add(lhs, rhs) => simplify_quantities(lhs) + simplify_quantities(rhs),
        Expr::Sub(lhs, rhs) => simplify_quantities(lhs) - simplify_quantities(rhs),
        Expr::Pow(base, exp) => simplify_quantities(base).pow(exp.as_ref().clone()),
        _ => match expr.function_arg() {
            Some(arg) => expr.with_function_arg(simplify_quantities(arg)),
            None => expr.clone(),
        },
    }
}

/// Merges units of equal dimension inside every product into the first such unit,
/// folding numeric factors: `3*inch/(1*ft)` becomes `0.25`, `2*mm*inch` becomes `50.8*mm**2`.
/// Returns `None` when the expression carries no units.
pub fn quantity_simplify(expr: &Expr) -> Option<Expr> {
    if !expr.has_units() {
        return None;
    }
    let simplified = simplify_quantities(expr);
    trace!("quantity_simplify({}) -> {}", expr, simplified);
    Some(simplified)
}

//___________________________________CONVERSION____________________________________

/// unit part of a product, dropping every numeric or symbolic coefficient
pub fn unit_part(expr: &Expr) -> Option<Expr> {
    let mut factors = Vec::new();
    flatten_product(expr, 1, &mut factors);
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for (factor, power) in factors {
        if let Expr::Unit(q) = &factor {
            if power > 0 {
                numerator.push(unit_power(q, power.unsigned_abs()));
            } else {
                denominator.push(unit_power(q, power.unsigned_abs()));
            }
        }
    }
    match (product_of(numerator), product_of(denominator)) {
        (Some(num), Some(den)) => Some(num / den),
        (Some(num), None) => Some(num),
        (None, Some(den)) => Some(Expr::Const(1.0) / den),
        (None, None) => None,
    }
}

/// Rewrites `expr` in terms of the units of `target`. A numeric coefficient on the target
/// (`1*ft`) is ignored. When the dimensions differ or the target has no units the
/// expression comes back unchanged.
pub fn convert_to_unit(expr: &Expr, target: &Expr) -> Expr {
    let Some(target_units) = unit_part(target) else {
        return expr.clone();
    };
    let (Ok((expr_factor, expr_dim)), Ok((target_factor, target_dim))) = (
        collect_factor_and_dimension(expr),
        collect_factor_and_dimension(&target_units),
    ) else {
        return expr.clone();
    };
    if expr_dim != target_dim {
        trace!(
            "convert_to_unit: {} and {} are incompatible",
            expr_dim.name(),
            target_dim.name()
        );
        return expr.clone();
    }
    let Some(target_scale) = target_factor.to_f64().filter(|s| *s != 0.0) else {
        return expr.clone();
    };
    let magnitude = (expr_factor / Expr::Const(target_scale)).simplify_();
    if magnitude.is_one() {
        target_units
    } else {
        magnitude * target_units
    }
}

/// unit part of the leading product term, e.g. `mm` for `5*mm + 1*inch`
pub fn leading_units(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Add(lhs, _) | Expr::Sub(lhs, _) => leading_units(lhs),
        _ => unit_part(expr),
    }
}

/// every unit atom replaced by `1`, then simplified
pub fn strip_units(expr: &Expr) -> Expr {
    fn strip(expr: &Expr) -> Expr {
        match expr {
            Expr::Unit(_) => Expr::Const(1.0),
            Expr::Add(lhs, rhs) => strip(lhs) + strip(rhs),
            Expr::Sub(lhs, rhs) => strip(lhs) - strip(rhs),
            Expr::Mul(lhs, rhs) => strip(lhs) * strip(rhs),
            Expr::Div(lhs, rhs) => strip(lhs) / strip(rhs),
            Expr::Pow(base, exp) => strip(base).pow(strip(exp)),
            _ => match expr.function_arg() {
                Some(arg) => expr.with_function_arg(strip(arg)),
                None => expr.clone(),
            },
        }
    }
    strip(expr).simplify_()
}

/// Splits `expr` into `(magnitude, units)` relative to its leading units; sums are converted
/// to those units first. Unit-less expressions give `(expr, 1)`.
pub fn magnitude_and_units(expr: &Expr) -> (Expr, Expr) {
    let Some(units) = leading_units(expr) else {
        return (expr.clone(), Expr::Const(1.0));
    };
    let in_units = match expr {
        Expr::Add(_, _) | Expr::Sub(_, _) => convert_to_unit(expr, &units),
        _ => expr.clone(),
    };
    (strip_units(&in_units), units)
}

/// coherent SI units of `dimension`, e.g. `kg*m/s**2` for force
pub fn si_units_expr(dimension: &Dimension) -> Expr {
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for base in BaseDimension::iter() {
        let e = dimension.exponent(base);
        if e.is_zero() {
            continue;
        }
        let unit = Expr::Unit(Quantity::si_base(base));
        let abs = if e < Exponent::zero() { -e } else { e };
        let factor = if abs == Exponent::from_integer(1) {
            unit
        } else {
            let val = *abs.numer() as f64 / *abs.denom() as f64;
            unit.pow(Expr::Const(val))
        };
        if e > Exponent::zero() {
            numerator.push(factor);
        } else {
            denominator.push(factor);
        }
    }
    let num = product_of(numerator).unwrap_or(Expr::Const(1.0));
    match product_of(denominator) {
        Some(den) => num / den,
        None => num,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::unit_table::UnitTable;
    use approx::assert_relative_eq;

    fn unit(name: &str) -> Expr {
        UnitTable::standard().get(name).unwrap().clone()
    }

    #[test]
    fn test_factor_and_dimension_of_product() {
        let expr = Expr::Const(2.0) * unit("mm");
        let (factor, dim) = collect_factor_and_dimension(&expr).unwrap();
        assert_eq!(dim.name(), "length");
        assert_relative_eq!(factor.to_f64().unwrap(), 2e-3, epsilon = 1e-15);
        let newton = unit("kg") * unit("m") / unit("s").pow(Expr::Const(2.0));
        let (_, dim) = collect_factor_and_dimension(&newton).unwrap();
        assert_eq!(dim.name(), "force");
    }

    #[test]
    fn test_inconsistent_sum() {
        let expr = Expr::Const(2.0) * unit("mm") + Expr::Const(3.0) * unit("kg");
        assert!(matches!(
            collect_factor_and_dimension(&expr),
            Err(DimensionError::Inconsistent(_))
        ));
        assert!(check_dimensions(&expr).is_err());
    }

    #[test]
    fn test_function_argument_must_be_dimensionless() {
        let ratio = Expr::Const(2.0) * unit("mm") / (Expr::Const(1.0) * unit("inch"));
        let (_, dim) = collect_factor_and_dimension(&Expr::sin(ratio.boxed())).unwrap();
        assert!(dim.is_dimensionless());
        assert!(collect_factor_and_dimension(&Expr::sin(unit("mm").boxed())).is_err());
        let (_, dim) = collect_factor_and_dimension(&Expr::Sqrt(unit("mm^2").boxed())).unwrap();
        assert_eq!(dim.name(), "length");
    }

    #[test]
    fn test_unevaluated_exponent_is_unfactorable() {
        let expr = unit("mm").pow(Expr::Const(1.0) + Expr::Const(1.0));
        assert!(matches!(
            collect_factor_and_dimension(&expr),
            Err(DimensionError::Unfactorable(_))
        ));
        let (_, dim) = collect_factor_and_dimension(&expr.evalf()).unwrap();
        assert_eq!(dim.name(), "area");
    }

    #[test]
    fn test_exponent_overflow_is_inconsistent() {
        let mm = unit("mm");
        let tower = mm
            .clone()
            .pow(Expr::Const(100000.0))
            .pow(Expr::Const(100000.0));
        assert!(matches!(
            collect_factor_and_dimension(&tower),
            Err(DimensionError::Inconsistent(_))
        ));
        assert!(check_dimensions(&tower).is_err());

        let product = mm.clone().pow(Expr::Const(2147483647.0)) * unit("inch");
        assert!(matches!(
            collect_factor_and_dimension(&product),
            Err(DimensionError::Inconsistent(_))
        ));
        // merging mm and inch would overflow the accumulated power
        assert_eq!(quantity_simplify(&product), Some(product.clone()));
    }

    #[test]
    fn test_structural_check_tolerates_symbols() {
        let expr = Expr::Var("x".to_string()) + Expr::Const(1.0) * unit("mm");
        assert!(check_dimensions(&expr).is_ok());
        let expr = Expr::Const(2.0) + Expr::Const(3.0) * unit("mm");
        assert!(check_dimensions(&expr).is_err());
    }

    #[test]
    fn test_quantity_simplify_merges_units() {
        let expr = Expr::Const(3.0) * unit("inch") / (Expr::Const(1.0) * unit("ft"));
        let simplified = quantity_simplify(&expr).unwrap();
        assert_relative_eq!(simplified.to_f64().unwrap(), 0.25, epsilon = 1e-12);

        let expr = Expr::Const(2.0) * unit("mm") * unit("inch");
        let simplified = quantity_simplify(&expr).unwrap();
        assert_eq!(simplified.unit_atoms().len(), 1);
        assert_relative_eq!(simplified.coefficient(), 50.8, epsilon = 1e-9);
        let (_, dim) = collect_factor_and_dimension(&simplified).unwrap();
        assert_eq!(dim.name(), "area");

        assert_eq!(quantity_simplify(&(Expr::Const(2.0) * Expr::Pi)), None);
    }

    #[test]
    fn test_convert_to_unit() {
        let converted = convert_to_unit(&(Expr::Const(1.0) * unit("mm")), &unit("ft"));
        assert_relative_eq!(converted.coefficient(), 5.0 / 127.0 / 12.0, max_relative = 1e-12);
        let length = Dimension::from_name("length").unwrap();
        assert_eq!(
            converted.unit_atoms(),
            vec![Quantity::new("foot", "ft", length, 0.3048)]
        );

        let target = Expr::Const(1.0) * unit("ft");
        let expr = Expr::Const(5.0) * unit("mm") + Expr::Const(1.0) * unit("inch");
        let converted = convert_to_unit(&expr, &target);
        assert_relative_eq!(
            converted.coefficient(),
            (1.0 + 25.0 / 127.0) / 12.0,
            max_relative = 1e-12
        );

        let expr = Expr::Const(2.0) * unit("mm");
        assert_eq!(convert_to_unit(&expr, &unit("kg")), expr);
    }

    #[test]
    fn test_convert_keeps_symbols() {
        let expr = Expr::Const(1.0) * Expr::Var("b".to_string()) * unit("mm");
        let converted = convert_to_unit(&expr, &unit("m"));
        assert_eq!(converted.extract_variables(), vec!["b".to_string()]);
        assert_relative_eq!(converted.coefficient(), 1e-3, max_relative = 1e-12);
    }

    #[test]
    fn test_si_units_expr() {
        let force = Dimension::from_name("force").unwrap();
        assert_eq!(si_units_expr(&force).to_string(), "m*kg/s**2");
        assert_eq!(si_units_expr(&Dimension::dimensionless()), Expr::Const(1.0));
    }

    #[test]
    fn test_magnitude_and_units() {
        let table = UnitTable::standard();
        let expr = Expr::parse_expression_units("2.0*mm", &table).unwrap();
        let (magnitude, units) = magnitude_and_units(&expr);
        assert_eq!(magnitude, Expr::Const(2.0));
        assert_eq!(units, unit("mm"));

        let expr = Expr::parse_expression_units("5*mm + 1*inch", &table).unwrap();
        let (magnitude, units) = magnitude_and_units(&expr);
        assert_eq!(units, unit("mm"));
        assert_relative_eq!(magnitude.to_f64().unwrap(), 30.4, max_relative = 1e-12);

        let expr = Expr::parse_expression_units("3*b/s", &table).unwrap();
        let (magnitude, units) = magnitude_and_units(&expr);
        assert_eq!(magnitude.to_string(), "3*b");
        assert_eq!(units.to_string(), "1/s");

        let expr = Expr::parse_expression("x + 1").unwrap();
        assert_eq!(magnitude_and_units(&expr), (expr.clone(), Expr::Const(1.0)));
    }
}
