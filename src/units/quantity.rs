use crate::units::dimension::{BaseDimension, Dimension};
use std::fmt;

/// A named physical unit: its dimension and its scale relative to the coherent SI unit
/// of that dimension (`inch` has scale `0.0254` because `1 inch = 0.0254 m`).
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub name: String,
    pub abbrev: String,
    pub dimension: Dimension,
    pub scale_factor: f64,
}

impl Quantity {
    pub fn new(name: &str, abbrev: &str, dimension: Dimension, scale_factor: f64) -> Quantity {
        Quantity {
            name: name.to_string(),
            abbrev: abbrev.to_string(),
            dimension,
            scale_factor,
        }
    }

    /// coherent SI unit of a base dimension (meter, kilogram, second, ...)
    pub fn si_base(base: BaseDimension) -> Quantity {
        let name = match base {
            BaseDimension::Length => "meter",
            BaseDimension::Mass => "kilogram",
            BaseDimension::Time => "second",
            BaseDimension::Current => "ampere",
            BaseDimension::Temperature => "kelvin",
            BaseDimension::AmountOfSubstance => "mole",
            BaseDimension::LuminousIntensity => "candela",
        };
        Quantity::new(name, base.si_symbol(), Dimension::base(base), 1.0)
    }

    /// true when both quantities measure the same dimension
    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.dimension == other.dimension
    }

    /// factor turning a magnitude in `self` into a magnitude in `other`
    pub fn ratio_to(&self, other: &Quantity) -> Option<f64> {
        if self.is_compatible(other) {
            Some(self.scale_factor / other.scale_factor)
        } else {
            None
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.abbrev)
    }
}
