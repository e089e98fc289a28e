use crate::symbolic::symbolic_engine::Expr;
use crate::units::unit_table::UnitTable;
use approx::assert_relative_eq;
use std::collections::HashMap;

fn x() -> Expr {
    Expr::Var("x".to_string())
}

fn y() -> Expr {
    Expr::Var("y".to_string())
}

#[test]
fn test_operators_build_unevaluated_nodes() {
    let expr = x() + Expr::Const(2.0) * y();
    assert_eq!(
        expr,
        Expr::Add(
            x().boxed(),
            Expr::Mul(Expr::Const(2.0).boxed(), y().boxed()).boxed()
        )
    );
    let neg = -x();
    assert_eq!(neg, Expr::Mul(Expr::Const(-1.0).boxed(), x().boxed()));
    assert_eq!(neg.to_string(), "-x");
    let mut product = x();
    product *= y();
    assert_eq!(product.to_string(), "x*y");
}

#[test]
fn test_display() {
    let expr = (x() + y()) * (x() - y());
    assert_eq!(expr.to_string(), "(x + y)*(x - y)");
    let expr = x().pow(Expr::Const(2.0)) / Expr::Const(3.5);
    assert_eq!(expr.to_string(), "x**2/3.5");
    let expr = Expr::Abs(Expr::Pi.boxed()) + Expr::Euler;
    assert_eq!(expr.to_string(), "Abs(pi) + E");
}

#[test]
fn test_set_variable() {
    let expr = Expr::parse_expression("x**2 + 3*y").unwrap();
    let with_x = expr.set_variable("x", 2.0);
    assert!(!with_x.contains_variable("x"));
    assert!(with_x.contains_variable("y"));
    let mut values = HashMap::new();
    values.insert("x".to_string(), 2.0);
    values.insert("y".to_string(), 1.0);
    assert_eq!(expr.set_variable_from_map(&values).to_f64(), Some(7.0));
}

#[test]
fn test_substitute_variable_inside_functions() {
    let expr = Expr::parse_expression("sin(x) + exp(x*y)").unwrap();
    let substituted = expr.substitute_variable("x", &(y() + Expr::Const(1.0)));
    assert_eq!(substituted.extract_variables(), vec!["y".to_string()]);
    assert_eq!(substituted.to_string(), "sin(y + 1) + exp((y + 1)*y)");
}

#[test]
fn test_free_symbols() {
    let expr = Expr::parse_expression("b*a + sin(c) - a").unwrap();
    let symbols = expr.free_symbols();
    assert_eq!(
        symbols.keys().cloned().collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
    assert_eq!(symbols["a"], Expr::Var("a".to_string()));
    assert!(Expr::parse_expression("2*pi").unwrap().free_symbols().is_empty());
}

#[test]
fn test_units_are_not_symbols() {
    let table = UnitTable::standard();
    let expr = Expr::parse_expression_units("1*b*mm + 2*mm", &table).unwrap();
    assert_eq!(expr.extract_variables(), vec!["b".to_string()]);
    assert!(expr.has_units());
    assert_eq!(expr.unit_atoms().len(), 1);
    assert!(!expr.is_number());
}

#[test]
fn test_to_f64() {
    let expr = Expr::parse_expression("2*cos(pi) + 20/5").unwrap();
    assert_eq!(expr.to_f64(), Some(2.0));
    assert_eq!(Expr::parse_expression("sin(pi)").unwrap().to_f64(), Some(0.0));
    assert_eq!(Expr::parse_expression("x + 1").unwrap().to_f64(), None);
    assert_relative_eq!(
        Expr::parse_expression("sin(pi/4)").unwrap().to_f64().unwrap(),
        2f64.sqrt() / 2.0,
        epsilon = 1e-15
    );
}

#[test]
fn test_simplify() {
    let simplify = |text: &str| Expr::parse_expression(text).unwrap().simplify_();
    assert_eq!(simplify("2*cos(pi) + 20/5"), Expr::Const(2.0));
    assert_eq!(simplify("2*cos(pi) + pi").to_string(), "-2 + pi");
    assert_eq!(simplify("x*1 + 0"), x());
    assert_eq!(simplify("x - x"), Expr::Const(0.0));
    assert_eq!(simplify("x/x"), Expr::Const(1.0));
    assert_eq!(simplify("x**1"), x());
    assert_eq!(simplify("x**0"), Expr::Const(1.0));
    assert_eq!(simplify("2*(3*x)").to_string(), "6*x");
    assert_eq!(simplify("(6*x)/2").to_string(), "3*x");
    assert_eq!(simplify("x + x").to_string(), "2*x");
    // division by zero is left alone
    assert_eq!(simplify("1/0").to_string(), "1/0");
}

#[test]
fn test_evalf_keeps_symbols_and_units() {
    let table = UnitTable::standard();
    let expr = Expr::parse_expression_units("sin(pi/2)*b*mm", &table).unwrap();
    let evaluated = expr.evalf();
    assert_eq!(evaluated.to_string(), "1*b*mm");
    let expr = Expr::parse_expression("sqrt(2)/2").unwrap().evalf();
    match expr {
        Expr::Const(val) => assert_relative_eq!(val, 0.5f64.sqrt(), epsilon = 1e-15),
        other => panic!("expected a constant, got {}", other),
    }
}

#[test]
fn test_coefficient() {
    let table = UnitTable::standard();
    let expr = Expr::parse_expression_units("3*mm/2", &table).unwrap();
    assert_relative_eq!(expr.coefficient(), 1.5);
    assert_relative_eq!(x().coefficient(), 1.0);
}

#[test]
fn test_finite_tree() {
    assert!(Expr::parse_expression("1e308*10").unwrap().is_finite_tree());
    assert!(!Expr::parse_expression("1e999").unwrap().is_finite_tree());
}
