//! physical units: dimensions, quantities, the unit table and dimensional analysis
/// rational exponent vectors over the SI base dimensions
pub mod dimension;
/// factor-and-dimension, structural checks, quantity simplification and unit conversion
///
///# Example
/// ```
/// use SymEntry::symbolic::symbolic_engine::Expr;
/// use SymEntry::units::dimension_analysis::{collect_factor_and_dimension, convert_to_unit};
/// use SymEntry::units::unit_table::UnitTable;
/// let table = UnitTable::standard();
/// let expr = Expr::parse_expression_units("5*mm + 1*inch", &table).unwrap();
/// let (_, dimension) = collect_factor_and_dimension(&expr).unwrap();
/// assert_eq!(dimension.name(), "length");
/// let in_feet = convert_to_unit(&expr, table.get("ft").unwrap());
/// println!("{} = {}", expr, in_feet);
/// ```
pub mod dimension_analysis;
/// named physical units with SI scale factors
pub mod quantity;
/// the immutable catalogue of unit names and selector groups
pub mod unit_table;
