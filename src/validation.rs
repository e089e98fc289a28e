#![allow(non_snake_case)]
/// error families: `ExpressionError`, `UnitMismatchError` and the `ValidationError` wrapper
pub mod errors;
/// ________________________________________________________________________________________________________________________________
/// # Guard
/// pure lexical checks before parsing
/// 1) attribute-access style `.` usage
/// 2) reserved words
/// 3) identifier rules for bare symbol names
///# Example
/// ```
/// use SymEntry::validation::guard::{expr_is_safe, text_to_symbol};
/// assert!(expr_is_safe("2+4.1"));
/// assert!(!expr_is_safe("x.real"));
/// assert!(text_to_symbol("for").is_err());
/// ```
pub mod guard;
///____________________________________________________________________________________________________________________________
/// # Entry validator
/// the validation cycle shared by every kind of entry, its events and status
///# Example
/// ```
/// use SymEntry::validation::orchestrator::EntryValidator;
/// let mut entry = EntryValidator::entry("2*mm + 3*inch", "length").unwrap();
/// entry.set_units("inch").unwrap();
/// println!("value {}", entry.value().unwrap());
/// assert!(entry.outcome().is_valid());
/// entry.set_text("2*mm + 3*kg");
/// println!("error {}", entry.error().unwrap());
/// assert!(entry.expr().is_none());
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod orchestrator;
///______________________________________________________________________________________________________________________________________________
/// parse, dimension, consistency and conversion steps as free functions
///# Example
/// ```
/// use SymEntry::units::unit_table::UnitTable;
/// use SymEntry::validation::pipeline::{parse_expr_units, units_are_consistent, convert_to, UnitTarget};
/// let table = UnitTable::standard();
/// let expr = parse_expr_units("sin(pi/2)", &table).unwrap().unwrap();
/// let target = UnitTarget::from("inch");
/// assert!(units_are_consistent(&expr, Some(&target), &table).is_ok());
/// let converted = convert_to(Some(&expr), &target, &table).unwrap().unwrap();
/// assert_eq!(converted.evalf().simplify_().to_string(), "inch");
/// ```
pub mod pipeline;
/// Symbol, Expression, Unit and Dimension policies dispatched through `Policy`
pub mod policy;
/// option selector paired with an entry
pub mod selector;
