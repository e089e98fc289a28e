//! examples of usage of SymEntry
/// validation of expressions with units: unit groups, guard, selectors, dimensions, events
/// and configured entries
pub mod validation_examples;
