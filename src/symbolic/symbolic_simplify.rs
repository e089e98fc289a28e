//! # Symbolic Expression Simplification Module
//!
//! Light-weight simplification used by the validation pipeline:
//!
//! 1. **Constant Folding**: arithmetic on numerical constants is evaluated
//! 2. **Algebraic Identities**: `x + 0 = x`, `x * 1 = x`, `x ** 1 = x`, `x - x = 0`, `x / x = 1`
//! 3. **Coefficient Collection**: `2 * (3 * x) = 6 * x`, `(6 * x) / 2 = 3 * x`
//! 4. **Function Folding**: functions of pure numbers are evaluated, integral results snapped
//!
//! Named constants are kept symbolic by `simplify_` (`2*cos(pi) + pi` becomes `-2 + pi`)
//! and turned into floats by `evalf`. Symbols and unit atoms are never touched.

use crate::symbolic::symbolic_engine::{Expr, snap_to_integer};

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Recursive simplification with constant folding and the basic identities.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Add(lhs, rhs) => {
                let (l, r) = (lhs.simplify_(), rhs.simplify_());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                    (_, _) if l.is_zero() => r,
                    (_, _) if r.is_zero() => l,
                    (_, _) if l == r => Expr::Mul(Expr::Const(2.0).boxed(), l.boxed()).simplify_(),
                    _ => Expr::Add(l.boxed(), r.boxed()),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let (l, r) = (lhs.simplify_(), rhs.simplify_());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                    (_, _) if r.is_zero() => l,
                    (_, _) if l == r => Expr::Const(0.0),
                    (_, _) if l.is_zero() => (-r).simplify_(),
                    _ => Expr::Sub(l.boxed(), r.boxed()),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let (l, r) = (lhs.simplify_(), rhs.simplify_());
                simplify_product(l, r)
            }
            Expr::Div(lhs, rhs) => {
                let (l, r) = (lhs.simplify_(), rhs.simplify_());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Expr::Const(a / b),
                    (_, _) if r.is_one() => l,
                    (_, _) if l.is_zero() && !r.is_zero() => Expr::Const(0.0),
                    (_, _) if l == r && !r.is_zero() => Expr::Const(1.0),
                    (Expr::Mul(c, x), Expr::Const(b)) if *b != 0.0 => match c.as_ref() {
                        Expr::Const(a) => simplify_product(Expr::Const(a / b), x.as_ref().clone()),
                        _ => Expr::Div(l.boxed(), r.boxed()),
                    },
                    _ => Expr::Div(l.boxed(), r.boxed()),
                }
            }
            Expr::Pow(base, exp) => {
                let (b, e) = (base.simplify_(), exp.simplify_());
                match (&b, &e) {
                    (Expr::Const(x), Expr::Const(y)) if x.powf(*y).is_finite() => {
                        Expr::Const(x.powf(*y))
                    }
                    (_, _) if e.is_one() => b,
                    (_, _) if e.is_zero() => Expr::Const(1.0),
                    (_, _) if b.is_one() => Expr::Const(1.0),
                    _ => Expr::Pow(b.boxed(), e.boxed()),
                }
            }
            _ => match self.function_arg() {
                Some(arg) => {
                    let arg = arg.simplify_();
                    match arg.to_f64().and_then(|x| self.apply_function(x)) {
                        Some(val) if val.is_finite() => Expr::Const(snap_to_integer(val)),
                        _ => self.with_function_arg(arg),
                    }
                }
                None => self.clone(),
            },
        }
    }

    /// Numeric evaluation of every symbol-free, unit-free subtree; symbols and units stay.
    pub fn evalf(&self) -> Expr {
        if self.is_number() {
            if let Some(val) = self.to_f64() {
                return Expr::Const(val);
            }
        }
        match self {
            Expr::Add(lhs, rhs) => Expr::Add(lhs.evalf().boxed(), rhs.evalf().boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(lhs.evalf().boxed(), rhs.evalf().boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(lhs.evalf().boxed(), rhs.evalf().boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(lhs.evalf().boxed(), rhs.evalf().boxed()),
            Expr::Pow(base, exp) => Expr::Pow(base.evalf().boxed(), exp.evalf().boxed()),
            _ => match self.function_arg() {
                Some(arg) => self.with_function_arg(arg.evalf()),
                None => self.clone(),
            },
        }
    }

    /// numeric part of a product, `1` when there is none
    pub fn coefficient(&self) -> f64 {
        match self {
            Expr::Const(val) => *val,
            Expr::Mul(lhs, rhs) => lhs.coefficient() * rhs.coefficient(),
            Expr::Div(lhs, rhs) => {
                let den = rhs.coefficient();
                if den == 0.0 {
                    lhs.coefficient()
                } else {
                    lhs.coefficient() / den
                }
            }
            _ => 1.0,
        }
    }
}

fn simplify_product(l: Expr, r: Expr) -> Expr {
    match (&l, &r) {
        (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
        (_, _) if l.is_zero() || r.is_zero() => Expr::Const(0.0),
        (_, _) if l.is_one() => r,
        (_, _) if r.is_one() => l,
        // constants are gathered on the left
        (Expr::Const(a), Expr::Mul(c, x)) => match c.as_ref() {
            Expr::Const(b) => simplify_product(Expr::Const(a * b), x.as_ref().clone()),
            _ => Expr::Mul(l.boxed(), r.boxed()),
        },
        (Expr::Mul(c, x), Expr::Const(b)) => match c.as_ref() {
            Expr::Const(a) => simplify_product(Expr::Const(a * b), x.as_ref().clone()),
            _ => Expr::Mul(Expr::Const(*b).boxed(), l.boxed()),
        },
        (_, Expr::Const(b)) => Expr::Mul(Expr::Const(*b).boxed(), l.boxed()),
        _ => Expr::Mul(l.boxed(), r.boxed()),
    }
}
