use crate::symbolic::symbolic_engine::Expr;
use crate::units::unit_table::{UnitGroup, UnitTable};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// the label is not one of the options
    NotAnOption(String),
    /// the selector is fixed and rejects changes
    Fixed,
    /// no unit group of that name
    UnknownGroup(String),
    /// a label has no entry in the unit table
    UnknownUnit(String),
    /// the entry has no paired selector
    NoSelector,
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionError::NotAnOption(label) => write!(f, "{} is not an available option", label),
            SelectionError::Fixed => write!(f, "option is fixed"),
            SelectionError::UnknownGroup(name) => write!(f, "unknown unit group {}", name),
            SelectionError::UnknownUnit(name) => write!(f, "unknown unit {}", name),
            SelectionError::NoSelector => write!(f, "no option selector"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Option selector paired with an entry: ordered `(label, unit expression)` options and the
/// current choice (the first option after construction).
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSelector {
    options: Vec<(String, Expr)>,
    current: usize,
    fixed: bool,
}

impl UnitSelector {
    pub fn new(options: Vec<(String, Expr)>) -> UnitSelector {
        UnitSelector {
            options,
            current: 0,
            fixed: false,
        }
    }

    pub fn from_group(group: &UnitGroup) -> UnitSelector {
        UnitSelector::new(group.options.clone())
    }

    pub fn from_group_name(name: &str, table: &UnitTable) -> Result<UnitSelector, SelectionError> {
        table
            .group(name)
            .map(UnitSelector::from_group)
            .ok_or_else(|| SelectionError::UnknownGroup(name.to_string()))
    }

    /// options looked up by label in `table`
    pub fn from_labels(labels: &[&str], table: &UnitTable) -> Result<UnitSelector, SelectionError> {
        let options = labels
            .iter()
            .map(|label| {
                table
                    .get(label)
                    .map(|expr| (label.to_string(), expr.clone()))
                    .ok_or_else(|| SelectionError::UnknownUnit(label.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UnitSelector::new(options))
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn current_label(&self) -> Option<&str> {
        self.options.get(self.current).map(|(label, _)| label.as_str())
    }

    pub fn current_data(&self) -> Option<&Expr> {
        self.options.get(self.current).map(|(_, expr)| expr)
    }

    /// Selects by label. Returns whether the selection changed.
    pub fn select(&mut self, label: &str) -> Result<bool, SelectionError> {
        let index = self
            .options
            .iter()
            .position(|(l, _)| l == label)
            .ok_or_else(|| SelectionError::NotAnOption(label.to_string()))?;
        self.select_index(index)
    }

    /// Selects the option holding `unit`. Returns whether the selection changed.
    pub fn select_value(&mut self, unit: &Expr) -> Result<bool, SelectionError> {
        let index = self
            .options
            .iter()
            .position(|(_, expr)| expr == unit)
            .ok_or_else(|| SelectionError::NotAnOption(unit.to_string()))?;
        self.select_index(index)
    }

    fn select_index(&mut self, index: usize) -> Result<bool, SelectionError> {
        if index == self.current {
            return Ok(false);
        }
        if self.fixed {
            return Err(SelectionError::Fixed);
        }
        self.current = index;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        let table = UnitTable::standard();
        let mut selector = UnitSelector::from_group_name("length", &table).unwrap();
        assert_eq!(selector.current_label(), Some("mm"));
        assert_eq!(selector.select("inch"), Ok(true));
        assert_eq!(selector.select("inch"), Ok(false));
        assert_eq!(selector.current_data(), table.get("inch"));
        assert_eq!(
            selector.select("kg"),
            Err(SelectionError::NotAnOption("kg".to_string()))
        );
        assert_eq!(selector.current_label(), Some("inch"));
        let m = table.get("m").unwrap().clone();
        assert_eq!(selector.select_value(&m), Ok(true));
        assert_eq!(selector.current_label(), Some("m"));
    }

    #[test]
    fn test_fixed_selector() {
        let table = UnitTable::standard();
        let mut selector = UnitSelector::from_labels(&["N", "lbf"], &table)
            .unwrap()
            .with_fixed(true);
        assert_eq!(selector.select("N"), Ok(false));
        assert_eq!(selector.select("lbf"), Err(SelectionError::Fixed));
        assert_eq!(selector.current_label(), Some("N"));
    }

    #[test]
    fn test_unknown_sources() {
        let table = UnitTable::standard();
        assert_eq!(
            UnitSelector::from_group_name("colour", &table),
            Err(SelectionError::UnknownGroup("colour".to_string()))
        );
        assert_eq!(
            UnitSelector::from_labels(&["mm", "parsec"], &table),
            Err(SelectionError::UnknownUnit("parsec".to_string()))
        );
        let empty = UnitSelector::new(Vec::new());
        assert_eq!(empty.current_data(), None);
    }
}
