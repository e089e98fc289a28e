//! # Symbolic Engine Module
//!
//! Core expression tree used by the validation pipeline. Expressions are kept unevaluated
//! (`2+2` stays an `Add` node) until evaluation is requested explicitly with
//! [`Expr::evalf`], [`Expr::simplify_`] or [`Expr::to_f64`].
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - free symbols like "x", "b", "text"
//! - **Constants**: `Const(f64)` plus the named constants `Pi` and `Euler`
//! - **Units**: `Unit(Quantity)` - physical unit atoms like `mm`, `kg`, `lbf`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `Sqrt`, `Abs`, `sin`, `cos`, `tg`, ... - one argument each
//!
//! ### Key Methods
//! - `set_variable()`, `set_variable_from_map()`, `substitute_variable()` - substitution
//! - `extract_variables()`, `free_symbols()` - free symbol extraction
//! - `unit_atoms()`, `has_units()` - unit atoms inside the tree
//! - `to_f64()` - numeric evaluation of a symbol-free, unit-free tree
//!
//! Negation is represented as `Mul(Const(-1), x)`, the same way `-x` is built by the
//! `Neg` operator.

#![allow(non_camel_case_types)]

use crate::units::quantity::Quantity;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::{E, PI};
use std::fmt;

/// Symbolic expression tree.
///
/// # Examples
/// ```rust, ignore
/// use SymEntry::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Free symbol
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// the number pi
    Pi,
    /// Euler's number, written `E`
    Euler,
    /// Physical unit atom
    Unit(Quantity),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ** exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm, accepts `log` and `ln`
    Ln(Box<Expr>),
    Sqrt(Box<Expr>),
    Abs(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    /// tangent, accepts `tan` and `tg`
    tg(Box<Expr>),
    /// cotangent, accepts `cot` and `ctg`
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    arcctg(Box<Expr>),
    sinh(Box<Expr>),
    cosh(Box<Expr>),
    tanh(Box<Expr>),
}

/// every spelling of a function name the parser accepts
pub const FUNCTION_NAMES: &[&str] = &[
    "exp", "log", "ln", "sqrt", "abs", "Abs", "sin", "cos", "tan", "tg", "cot", "ctg", "asin",
    "arcsin", "acos", "arccos", "atan", "arctan", "arctg", "acot", "arccot", "arcctg", "sinh",
    "cosh", "tanh",
];

fn format_const(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        format!("{}", val)
    }
}

/// Precedence-aware printing. The output parses back into the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", format_const(*val)),
            Expr::Pi => write!(f, "pi"),
            Expr::Euler => write!(f, "E"),
            Expr::Unit(q) => write!(f, "{}", q),
            Expr::Add(lhs, rhs) => write!(f, "{} + {}", lhs.wrapped(1), rhs.wrapped(1)),
            Expr::Sub(lhs, rhs) => write!(f, "{} - {}", lhs.wrapped(1), rhs.wrapped(2)),
            Expr::Mul(lhs, rhs) if lhs.is_minus_one() => write!(f, "-{}", rhs.wrapped(3)),
            Expr::Mul(lhs, rhs) => write!(f, "{}*{}", lhs.wrapped(2), rhs.wrapped(3)),
            Expr::Div(lhs, rhs) => write!(f, "{}/{}", lhs.wrapped(2), rhs.wrapped(3)),
            Expr::Pow(base, exp) => write!(f, "{}**{}", base.wrapped(4), exp.wrapped(3)),
            _ => match (self.function_name(), self.function_arg()) {
                (Some(name), Some(arg)) => write!(f, "{}({})", name, arg),
                _ => write!(f, "{:?}", self),
            },
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        *self = Expr::Mul(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Builds a one-argument function node from any accepted spelling of its name.
    pub fn function_from_name(name: &str, arg: Expr) -> Option<Expr> {
        let arg = arg.boxed();
        let expr = match name {
            "exp" => Expr::Exp(arg),
            "log" | "ln" => Expr::Ln(arg),
            "sqrt" => Expr::Sqrt(arg),
            "abs" | "Abs" => Expr::Abs(arg),
            "sin" => Expr::sin(arg),
            "cos" => Expr::cos(arg),
            "tan" | "tg" => Expr::tg(arg),
            "cot" | "ctg" => Expr::ctg(arg),
            "asin" | "arcsin" => Expr::arcsin(arg),
            "acos" | "arccos" => Expr::arccos(arg),
            "atan" | "arctan" | "arctg" => Expr::arctg(arg),
            "acot" | "arccot" | "arcctg" => Expr::arcctg(arg),
            "sinh" => Expr::sinh(arg),
            "cosh" => Expr::cosh(arg),
            "tanh" => Expr::tanh(arg),
            _ => return None,
        };
        Some(expr)
    }

    pub fn is_function_name(name: &str) -> bool {
        FUNCTION_NAMES.contains(&name)
    }

    /// canonical printed name of a function node
    pub fn function_name(&self) -> Option<&'static str> {
        let name = match self {
            Expr::Exp(_) => "exp",
            Expr::Ln(_) => "log",
            Expr::Sqrt(_) => "sqrt",
            Expr::Abs(_) => "Abs",
            Expr::sin(_) => "sin",
            Expr::cos(_) => "cos",
            Expr::tg(_) => "tg",
            Expr::ctg(_) => "ctg",
            Expr::arcsin(_) => "arcsin",
            Expr::arccos(_) => "arccos",
            Expr::arctg(_) => "arctg",
            Expr::arcctg(_) => "arcctg",
            Expr::sinh(_) => "sinh",
            Expr::cosh(_) => "cosh",
            Expr::tanh(_) => "tanh",
            _ => return None,
        };
        Some(name)
    }

    /// argument of a function node, `None` for everything else
    pub fn function_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::Sqrt(arg)
            | Expr::Abs(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tg(arg)
            | Expr::ctg(arg)
            | Expr::arcsin(arg)
            | Expr::arccos(arg)
            | Expr::arctg(arg)
            | Expr::arcctg(arg)
            | Expr::sinh(arg)
            | Expr::cosh(arg)
            | Expr::tanh(arg) => Some(arg),
            _ => None,
        }
    }

    /// Same function applied to a new argument; non-function nodes are returned unchanged.
    pub fn with_function_arg(&self, arg: Expr) -> Expr {
        match self.function_name() {
            Some(name) => Expr::function_from_name(name, arg).unwrap_or_else(|| self.clone()),
            None => self.clone(),
        }
    }

    /// numeric value of the function node at `x`
    pub fn apply_function(&self, x: f64) -> Option<f64> {
        let val = match self {
            Expr::Exp(_) => x.exp(),
            Expr::Ln(_) => x.ln(),
            Expr::Sqrt(_) => x.sqrt(),
            Expr::Abs(_) => x.abs(),
            Expr::sin(_) => x.sin(),
            Expr::cos(_) => x.cos(),
            Expr::tg(_) => x.tan(),
            Expr::ctg(_) => 1.0 / x.tan(),
            Expr::arcsin(_) => x.asin(),
            Expr::arccos(_) => x.acos(),
            Expr::arctg(_) => x.atan(),
            Expr::arcctg(_) => PI / 2.0 - x.atan(),
            Expr::sinh(_) => x.sinh(),
            Expr::cosh(_) => x.cosh(),
            Expr::tanh(_) => x.tanh(),
            _ => return None,
        };
        Some(val)
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Const(val) if *val < 0.0 => 2,
            Expr::Pow(_, _) => 3,
            _ => 4,
        }
    }

    fn wrapped(&self, min_precedence: u8) -> String {
        if self.precedence() < min_precedence {
            format!("({})", self)
        } else {
            self.to_string()
        }
    }

    pub fn is_minus_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == -1.0)
    }

    /// Checks if expression is exactly zero (constant 0.0).
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// Creates power expression self**rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// Substitutes multiple variables with constant values using a HashMap.
    /// Only variables present in the map are substituted.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) if var_map.contains_key(name) => Expr::Const(var_map[name]),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.set_variable_from_map(var_map)),
                Box::new(exp.set_variable_from_map(var_map)),
            ),
            _ => match self.function_arg() {
                Some(arg) => self.with_function_arg(arg.set_variable_from_map(var_map)),
                None => self.clone(),
            },
        }
    }

    /// Replaces every occurrence of the variable `var` with `expr`.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.substitute_variable(var, expr)),
                Box::new(exp.substitute_variable(var, expr)),
            ),
            _ => match self.function_arg() {
                Some(arg) => self.with_function_arg(arg.substitute_variable(var, expr)),
                None => self.clone(),
            },
        }
    }

    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            _ => self
                .function_arg()
                .is_some_and(|arg| arg.contains_variable(var_name)),
        }
    }

    fn visit<F: FnMut(&Expr)>(&self, visitor: &mut F) {
        visitor(self);
        match self {
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.visit(visitor);
                right.visit(visitor);
            }
            _ => {
                if let Some(arg) = self.function_arg() {
                    arg.visit(visitor);
                }
            }
        }
    }

    /// sorted, deduplicated names of the free symbols
    pub fn extract_variables(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        self.visit(&mut |e| {
            if let Expr::Var(name) = e {
                names.insert(name.clone());
            }
        });
        names.into_iter().collect()
    }

    /// `{name: Symbol}` mapping rebuilt from the tree on every call
    pub fn free_symbols(&self) -> BTreeMap<String, Expr> {
        self.extract_variables()
            .into_iter()
            .map(|name| (name.clone(), Expr::Var(name)))
            .collect()
    }

    /// unit atoms in order of first appearance, without repetitions
    pub fn unit_atoms(&self) -> Vec<Quantity> {
        let mut atoms: Vec<Quantity> = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Unit(q) = e {
                if !atoms.contains(q) {
                    atoms.push(q.clone());
                }
            }
        });
        atoms
    }

    pub fn has_units(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e| found |= matches!(e, Expr::Unit(_)));
        found
    }

    /// true when the tree holds neither symbols nor units
    pub fn is_number(&self) -> bool {
        let mut number = true;
        self.visit(&mut |e| number &= !matches!(e, Expr::Var(_) | Expr::Unit(_)));
        number
    }

    /// every numeric literal is finite
    pub fn is_finite_tree(&self) -> bool {
        let mut finite = true;
        self.visit(&mut |e| {
            if let Expr::Const(val) = e {
                finite &= val.is_finite();
            }
        });
        finite
    }

    /// Numeric value of a symbol-free, unit-free tree. Function values lying within
    /// rounding noise of an integer are snapped to it, so `sin(pi)` is exactly `0`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            Expr::Pi => Some(PI),
            Expr::Euler => Some(E),
            Expr::Var(_) | Expr::Unit(_) => None,
            Expr::Add(lhs, rhs) => Some(lhs.to_f64()? + rhs.to_f64()?),
            Expr::Sub(lhs, rhs) => Some(lhs.to_f64()? - rhs.to_f64()?),
            Expr::Mul(lhs, rhs) => Some(lhs.to_f64()? * rhs.to_f64()?),
            Expr::Div(lhs, rhs) => Some(lhs.to_f64()? / rhs.to_f64()?),
            Expr::Pow(base, exp) => Some(base.to_f64()?.powf(exp.to_f64()?)),
            _ => {
                let arg = self.function_arg()?.to_f64()?;
                self.apply_function(arg).map(snap_to_integer)
            }
        }
    }
}

/// rounds values within floating noise of an integer
pub fn snap_to_integer(val: f64) -> f64 {
    let rounded = val.round();
    if (val - rounded).abs() < 1e-12 * rounded.abs().max(1.0) {
        rounded
    } else {
        val
    }
}
