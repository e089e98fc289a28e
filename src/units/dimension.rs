//! # Physical dimensions
//!
//! A [`Dimension`] is a vector of rational exponents over the seven SI base dimensions.
//! Two units are convertible into each other exactly when their dimensions are equal.
//! The all-zero vector is the dimensionless dimension, named `1`.
//!
//! Named dimensions (`length`, `force`, `pressure`, ...) are only labels on top of the
//! exponent vector: `Dimension::from_name("force") == length * mass / time**2`.

use num::rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, ToPrimitive, Zero};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// exponent of a base dimension; rational so that `sqrt(m**2)` and `m**(1/2)` are representable
pub type Exponent = Ratio<i32>;

/// `None` for exponents whose numerator cannot be negated
fn bounded(e: Exponent) -> Option<Exponent> {
    (*e.numer() != i32::MIN).then_some(e)
}

/// the seven SI base dimensions in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    AmountOfSubstance,
    LuminousIntensity,
}

impl BaseDimension {
    pub fn index(self) -> usize {
        self as usize
    }
    /// symbol of the coherent SI unit of this base dimension
    pub fn si_symbol(self) -> &'static str {
        match self {
            BaseDimension::Length => "m",
            BaseDimension::Mass => "kg",
            BaseDimension::Time => "s",
            BaseDimension::Current => "A",
            BaseDimension::Temperature => "K",
            BaseDimension::AmountOfSubstance => "mol",
            BaseDimension::LuminousIntensity => "cd",
        }
    }
}

// exponents in the order length, mass, time, current, temperature, amount, luminous intensity
const NAMED_DIMENSIONS: &[(&str, [i32; 7])] = &[
    ("length", [1, 0, 0, 0, 0, 0, 0]),
    ("mass", [0, 1, 0, 0, 0, 0, 0]),
    ("time", [0, 0, 1, 0, 0, 0, 0]),
    ("current", [0, 0, 0, 1, 0, 0, 0]),
    ("temperature", [0, 0, 0, 0, 1, 0, 0]),
    ("amount_of_substance", [0, 0, 0, 0, 0, 1, 0]),
    ("luminous_intensity", [0, 0, 0, 0, 0, 0, 1]),
    ("area", [2, 0, 0, 0, 0, 0, 0]),
    ("volume", [3, 0, 0, 0, 0, 0, 0]),
    ("velocity", [1, 0, -1, 0, 0, 0, 0]),
    ("acceleration", [1, 0, -2, 0, 0, 0, 0]),
    ("momentum", [1, 1, -1, 0, 0, 0, 0]),
    ("force", [1, 1, -2, 0, 0, 0, 0]),
    ("energy", [2, 1, -2, 0, 0, 0, 0]),
    ("power", [2, 1, -3, 0, 0, 0, 0]),
    ("pressure", [-1, 1, -2, 0, 0, 0, 0]),
    ("frequency", [0, 0, -1, 0, 0, 0, 0]),
    ("density", [-3, 1, 0, 0, 0, 0, 0]),
    ("charge", [0, 0, 1, 1, 0, 0, 0]),
    ("voltage", [2, 1, -3, -1, 0, 0, 0]),
    ("resistance", [2, 1, -3, -2, 0, 0, 0]),
];

/// vector of rational exponents over [`BaseDimension`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    exps: [Exponent; 7],
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension::dimensionless()
    }
}

impl Dimension {
    pub fn dimensionless() -> Dimension {
        Dimension {
            exps: [Exponent::zero(); 7],
        }
    }

    pub fn from_exponents(exps: [i32; 7]) -> Dimension {
        Dimension {
            exps: exps.map(Exponent::from_integer),
        }
    }

    pub fn base(base: BaseDimension) -> Dimension {
        let mut dim = Dimension::dimensionless();
        dim.exps[base.index()] = Exponent::one();
        dim
    }

    /// Looks a dimension up by name: `"1"` (or an empty string) for dimensionless,
    /// a base dimension name or one of the named derived dimensions.
    pub fn from_name(name: &str) -> Option<Dimension> {
        let name = name.trim();
        if name.is_empty() || name == "1" {
            return Some(Dimension::dimensionless());
        }
        NAMED_DIMENSIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, exps)| Dimension::from_exponents(*exps))
            .or_else(|| BaseDimension::from_str(name).ok().map(Dimension::base))
    }

    pub fn exponent(&self, base: BaseDimension) -> Exponent {
        self.exps[base.index()]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exps.iter().all(|e| e.is_zero())
    }

    /// Every exponent multiplied by `power`; `None` when an exponent overflows.
    pub fn checked_powr(&self, power: Exponent) -> Option<Dimension> {
        let mut exps = self.exps;
        for e in exps.iter_mut() {
            *e = bounded(e.checked_mul(&power)?)?;
        }
        Some(Dimension { exps })
    }

    pub fn checked_powi(&self, power: i32) -> Option<Dimension> {
        self.checked_powr(bounded(Exponent::from_integer(power))?)
    }

    /// dimension of a product; `None` when an exponent overflows
    pub fn checked_mul(&self, rhs: &Dimension) -> Option<Dimension> {
        let mut exps = self.exps;
        for (e, r) in exps.iter_mut().zip(rhs.exps.iter()) {
            *e = bounded(e.checked_add(r)?)?;
        }
        Some(Dimension { exps })
    }

    /// dimension of a quotient; `None` when an exponent overflows
    pub fn checked_div(&self, rhs: &Dimension) -> Option<Dimension> {
        self.checked_mul(&rhs.checked_powi(-1)?)
    }

    /// Name of the dimension: `1` for dimensionless, the registered name when the exponent
    /// vector matches one, otherwise a product of base dimension powers like `length**2*time`.
    pub fn name(&self) -> String {
        if self.is_dimensionless() {
            return "1".to_string();
        }
        if let Some((name, _)) = NAMED_DIMENSIONS
            .iter()
            .find(|(_, exps)| Dimension::from_exponents(*exps) == *self)
        {
            return name.to_string();
        }
        self.composite_name(|b| b.to_string())
    }

    /// same layout as [`Dimension::name`] but with SI unit symbols, e.g. `kg*m/s**2`
    pub fn si_unit_string(&self) -> String {
        if self.is_dimensionless() {
            return "1".to_string();
        }
        self.composite_name(|b| b.si_symbol().to_string())
    }

    fn composite_name<F: Fn(BaseDimension) -> String>(&self, label: F) -> String {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for base in BaseDimension::iter() {
            let e = self.exponent(base);
            if e.is_zero() {
                continue;
            }
            let factor = power_label(&label(base), e.abs());
            if e.is_positive() {
                numerator.push(factor);
            } else {
                denominator.push(factor);
            }
        }
        let num = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join("*")
        };
        match denominator.len() {
            0 => num,
            1 => format!("{}/{}", num, denominator[0]),
            _ => format!("{}/({})", num, denominator.join("*")),
        }
    }
}

fn power_label(label: &str, e: Exponent) -> String {
    if e.is_one() {
        label.to_string()
    } else if e.is_integer() {
        format!("{}**{}", label, e.numer())
    } else {
        format!("{}**({}/{})", label, e.numer(), e.denom())
    }
}

/// Recovers a small rational exponent from a float literal, e.g. `0.5 -> 1/2`.
/// Denominators up to 12 are tried; anything else is not a usable exponent of a unit.
pub fn exponent_from_f64(x: f64) -> Option<Exponent> {
    if !x.is_finite() {
        return None;
    }
    (1..=12).find_map(|den: i32| {
        let num = (x * den as f64).round();
        if (num / den as f64 - x).abs() < 1e-9 {
            num.to_i32()
                .and_then(|n| bounded(Exponent::new(n, den)))
        } else {
            None
        }
    })
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dimension({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_dimensions() {
        let length = Dimension::from_name("length").unwrap();
        let mass = Dimension::from_name("mass").unwrap();
        let time = Dimension::from_name("time").unwrap();
        let force = length
            .checked_mul(&mass)
            .and_then(|d| d.checked_div(&time.checked_powi(2)?))
            .unwrap();
        assert_eq!(force, Dimension::from_name("force").unwrap());
        assert_eq!(force.name(), "force");
        assert_eq!(length.checked_powi(3).unwrap().name(), "volume");
        assert_eq!(Dimension::dimensionless().name(), "1");
        assert_eq!(Dimension::from_name("1"), Some(Dimension::dimensionless()));
        assert_eq!(Dimension::from_name("no_such_dimension"), None);
    }

    #[test]
    fn test_base_dimension_lookup() {
        assert_eq!(
            Dimension::from_name("amount_of_substance"),
            Some(Dimension::base(BaseDimension::AmountOfSubstance))
        );
        assert_eq!(BaseDimension::LuminousIntensity.to_string(), "luminous_intensity");
    }

    #[test]
    fn test_composite_names() {
        let length = Dimension::base(BaseDimension::Length);
        let time = Dimension::base(BaseDimension::Time);
        let current = Dimension::base(BaseDimension::Current);
        let l4t = length.checked_powi(4).unwrap().checked_mul(&time).unwrap();
        assert_eq!(l4t.name(), "length**4*time");
        let ct2 = current.checked_div(&time.checked_powi(2).unwrap()).unwrap();
        assert_eq!(ct2.name(), "current/time**2");
        let root = length.checked_powr(Exponent::new(1, 2)).unwrap();
        assert_eq!(root.name(), "length**(1/2)");
        let per_charge = length.checked_div(&time.checked_mul(&current).unwrap()).unwrap();
        assert_eq!(per_charge.si_unit_string(), "m/(s*A)");
        assert_eq!(time.checked_powi(-1).unwrap().name(), "frequency");
    }

    #[test]
    fn test_sqrt_of_area_is_length() {
        let area = Dimension::from_name("area").unwrap();
        assert_eq!(area.checked_powr(Exponent::new(1, 2)).unwrap().name(), "length");
        assert!(area.checked_div(&area).unwrap().is_dimensionless());
    }

    #[test]
    fn test_exponent_from_f64() {
        assert_eq!(exponent_from_f64(0.5), Some(Exponent::new(1, 2)));
        assert_eq!(exponent_from_f64(2.0), Some(Exponent::from_integer(2)));
        assert_eq!(exponent_from_f64(-1.0 / 3.0), Some(Exponent::new(-1, 3)));
        assert_eq!(exponent_from_f64(std::f64::consts::PI), None);
        assert_eq!(exponent_from_f64(f64::NAN), None);
        assert_eq!(exponent_from_f64(-2147483648.0), None);
        assert_eq!(exponent_from_f64(1e12), None);
    }

    #[test]
    fn test_exponent_overflow_is_none() {
        let length = Dimension::base(BaseDimension::Length);
        let huge = length.checked_powi(100_000).unwrap();
        assert_eq!(huge.checked_powi(100_000), None);
        let max = length.checked_powi(i32::MAX).unwrap();
        assert_eq!(max.checked_mul(&length), None);
        assert_eq!(length.checked_powi(i32::MIN), None);
        assert_eq!(
            max.checked_div(&length).unwrap().exponent(BaseDimension::Length),
            Exponent::from_integer(i32::MAX - 1)
        );
        let sqrt = Exponent::new(1, 2);
        let deep = (0..31).try_fold(length, |d, _| d.checked_powr(sqrt));
        assert_eq!(deep, None);
    }
}
