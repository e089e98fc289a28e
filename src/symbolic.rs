#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use SymEntry::symbolic::parse_expr::parse_expression_func;
/// use SymEntry::units::unit_table::UnitTable;
/// let table = UnitTable::standard();
/// let parsed = parse_expression_func("2*mm + 3*inch", Some(&table)).unwrap();
/// println!("parsed_expression {}", parsed);
/// assert_eq!(parsed.unit_atoms().len(), 2);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the expression tree with unit atoms and named constants
/// 2) substitutes variables and extracts free symbols
/// 3) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use SymEntry::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("2*cos(pi) + b").unwrap();
/// println!("parsed_expression {}", parsed_expression);
/// let simplified = parsed_expression.simplify_();
/// assert_eq!(simplified.to_string(), "-2 + b");
/// let value = simplified.set_variable("b", 5.0).to_f64();
/// assert_eq!(value, Some(3.0));
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///______________________________________________________________________________________________________________________________________________
/// constant folding, algebraic identities and numeric evaluation
/// _____________________________________________________________________________________________________________________________________________
pub mod symbolic_simplify;
#[cfg(test)]
mod symbolic_engine_tests;
