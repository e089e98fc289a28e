//! # Unit table
//!
//! Fixed catalogue of unit names and the option groups offered by unit selectors.
//! A table is assembled once with [`UnitTableBuilder`] (custom units such as pound-force or
//! the US gallon are ordinary builder entries) and is read-only afterwards; components
//! receive it by reference. [`UnitTable::shared`] hands out the process-wide standard table.

use crate::symbolic::symbolic_engine::Expr;
use crate::units::dimension::Dimension;
use crate::units::quantity::Quantity;
use itertools::Itertools;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Named, ordered set of `(label, unit expression)` options.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitGroup {
    pub name: String,
    pub options: Vec<(String, Expr)>,
}

impl UnitGroup {
    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&Expr> {
        self.options
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, expr)| expr)
    }
}

/// Immutable mapping from short names to unit expressions plus the selector groups.
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: HashMap<String, Expr>,
    groups: Vec<UnitGroup>,
}

impl UnitTable {
    pub fn builder() -> UnitTableBuilder {
        UnitTableBuilder::default()
    }

    /// Table with SI and customary length, mass, time, force, pressure, volume, energy and
    /// power units, plus the groups `length`, `mass`, `area`, `force`, `acceleration`,
    /// `volume`, `pressure` and `time`.
    pub fn standard() -> UnitTable {
        let dim = |name: &str| Dimension::from_name(name).unwrap_or_default();
        let length = dim("length");
        let mass = dim("mass");
        let time = dim("time");
        let force = dim("force");
        let pressure = dim("pressure");
        let volume = dim("volume");
        let energy = dim("energy");
        let power = dim("power");
        let inch_scale = 0.0254;

        let builder = UnitTable::builder()
            // length
            .quantity(Quantity::new("meter", "m", length, 1.0), &["m", "meter", "meters"])
            .quantity(
                Quantity::new("kilometer", "km", length, 1e3),
                &["km", "kilometer", "kilometers"],
            )
            .quantity(
                Quantity::new("centimeter", "cm", length, 1e-2),
                &["cm", "centimeter", "centimeters"],
            )
            .quantity(
                Quantity::new("millimeter", "mm", length, 1e-3),
                &["mm", "millimeter", "millimeters"],
            )
            .quantity(
                Quantity::new("micrometer", "um", length, 1e-6),
                &["um", "micrometer", "micrometers", "micron", "microns"],
            )
            .quantity(
                Quantity::new("nanometer", "nm", length, 1e-9),
                &["nm", "nanometer", "nanometers"],
            )
            .quantity(
                Quantity::new("inch", "inch", length, inch_scale),
                &["inch", "inches"],
            )
            .quantity(
                Quantity::new("foot", "ft", length, 0.3048),
                &["ft", "foot", "feet"],
            )
            .quantity(
                Quantity::new("yard", "yd", length, 0.9144),
                &["yd", "yard", "yards"],
            )
            .quantity(
                Quantity::new("mile", "mi", length, 1609.344),
                &["mi", "mile", "miles"],
            )
            // mass
            .quantity(
                Quantity::new("kilogram", "kg", mass, 1.0),
                &["kg", "kilogram", "kilograms"],
            )
            .quantity(Quantity::new("gram", "g", mass, 1e-3), &["g", "gram", "grams"])
            .quantity(
                Quantity::new("milligram", "mg", mass, 1e-6),
                &["mg", "milligram", "milligrams"],
            )
            .quantity(
                Quantity::new("pound", "lb", mass, 0.45359237),
                &["lb", "lbm", "pound", "pounds"],
            )
            .quantity(
                Quantity::new("metric_ton", "tonne", mass, 1e3),
                &["tonne", "metric_ton"],
            )
            // time
            .quantity(
                Quantity::new("second", "s", time, 1.0),
                &["s", "second", "seconds"],
            )
            .quantity(
                Quantity::new("millisecond", "ms", time, 1e-3),
                &["ms", "millisecond", "milliseconds"],
            )
            .quantity(
                Quantity::new("minute", "minute", time, 60.0),
                &["minute", "minutes"],
            )
            .quantity(Quantity::new("hour", "h", time, 3600.0), &["h", "hour", "hours"])
            .quantity(Quantity::new("day", "day", time, 86400.0), &["day", "days"])
            // force
            .quantity(
                Quantity::new("newton", "N", force, 1.0),
                &["N", "newton", "newtons"],
            )
            .quantity(
                Quantity::new("kilonewton", "kN", force, 1e3),
                &["kN", "kilonewton", "kilonewtons"],
            )
            .quantity(Quantity::new("dyne", "dyn", force, 1e-5), &["dyne", "dyn"])
            .quantity(
                Quantity::new("pound-force", "lbf", force, 4.4482216152605),
                &["lbf"],
            )
            .quantity(
                Quantity::new("kilogram-force", "kgf", force, 9.80665),
                &["kgf"],
            )
            // acceleration
            .quantity(
                Quantity::new("gee", "gee", dim("acceleration"), 9.80665),
                &["gee", "gees", "acceleration_due_to_gravity"],
            )
            // pressure
            .quantity(
                Quantity::new("pascal", "Pa", pressure, 1.0),
                &["Pa", "pa", "pascal", "pascals"],
            )
            .quantity(
                Quantity::new("kilopascal", "kPa", pressure, 1e3),
                &["kPa", "kilopascal"],
            )
            .quantity(
                Quantity::new("megapascal", "MPa", pressure, 1e6),
                &["MPa", "megapascal"],
            )
            .quantity(Quantity::new("bar", "bar", pressure, 1e5), &["bar", "bars"])
            .quantity(
                Quantity::new("atmosphere", "atm", pressure, 101325.0),
                &["atm", "atmosphere", "atmospheres"],
            )
            .quantity(
                Quantity::new("psi", "psi", pressure, 6894.757293168361),
                &["psi"],
            )
            .quantity(
                Quantity::new("mmHg", "mmHg", pressure, 133.322387415),
                &["mmHg", "mmhg"],
            )
            .quantity(
                Quantity::new("torr", "torr", pressure, 101325.0 / 760.0),
                &["torr"],
            )
            // volume
            .quantity(
                Quantity::new("liter", "l", volume, 1e-3),
                &["l", "L", "liter", "liters", "litre", "litres"],
            )
            .quantity(
                Quantity::new("deciliter", "dl", volume, 1e-4),
                &["dl", "dL", "deciliter", "deciliters"],
            )
            .quantity(
                Quantity::new("centiliter", "cl", volume, 1e-5),
                &["cl", "cL", "centiliter", "centiliters"],
            )
            .quantity(
                Quantity::new("milliliter", "ml", volume, 1e-6),
                &["ml", "mL", "milliliter", "milliliters"],
            )
            .quantity(
                Quantity::new("quart", "quart", volume, 0.000946352946),
                &["quart", "quarts"],
            )
            .quantity(
                Quantity::new("US_gallon", "USgal", volume, 231.0 * inch_scale.powi(3)),
                &["USgal"],
            )
            .quantity(
                Quantity::new("UK_gallon", "UKgal", volume, 4.54609e-3),
                &["UKgal"],
            )
            // energy and power
            .quantity(
                Quantity::new("joule", "J", energy, 1.0),
                &["J", "joule", "joules"],
            )
            .quantity(Quantity::new("kilojoule", "kJ", energy, 1e3), &["kJ", "kilojoule"])
            .quantity(
                Quantity::new("calorie", "cal", energy, 4.184),
                &["cal", "calorie", "calories"],
            )
            .quantity(Quantity::new("watt", "W", power, 1.0), &["W", "watt", "watts"])
            .quantity(Quantity::new("kilowatt", "kW", power, 1e3), &["kW", "kilowatt"])
            .quantity(
                Quantity::new("horsepower", "hp", power, 745.69987158227022),
                &["hp", "horsepower"],
            )
            .quantity(
                Quantity::new("hertz", "Hz", dim("frequency"), 1.0),
                &["Hz", "hz", "hertz"],
            );

        // string-lookup-only squared and cubed lengths
        let length_labels = ["mm", "cm", "inch", "ft", "yard", "m"];
        let builder = length_labels.iter().fold(builder, |b, label| {
            b.power_alias(label, 2).power_alias(label, 3)
        });

        builder
            .group("length", &length_labels)
            .group("mass", &["gram", "mg", "lbm", "kg"])
            .group(
                "area",
                &["mm^2", "cm^2", "inch^2", "ft^2", "yard^2", "m^2"],
            )
            .group("force", &["N", "kN", "lbf", "kgf", "dyne"])
            .group_with(
                "acceleration",
                vec![
                    (
                        "g".to_string(),
                        Expr::Unit(Quantity::new("gee", "gee", dim("acceleration"), 9.80665)),
                    ),
                    (
                        "m/s2".to_string(),
                        Expr::Div(
                            Expr::Unit(Quantity::new("meter", "m", length, 1.0)).boxed(),
                            Expr::Unit(Quantity::new("second", "s", time, 1.0))
                                .pow(Expr::Const(2.0))
                                .boxed(),
                        ),
                    ),
                    (
                        "ft/s2".to_string(),
                        Expr::Div(
                            Expr::Unit(Quantity::new("foot", "ft", length, 0.3048)).boxed(),
                            Expr::Unit(Quantity::new("second", "s", time, 1.0))
                                .pow(Expr::Const(2.0))
                                .boxed(),
                        ),
                    ),
                ],
            )
            .group(
                "volume",
                &[
                    "ml", "cl", "liter", "quarts", "USgal", "UKgal", "mm^3", "cm^3", "inch^3",
                    "ft^3", "yard^3", "m^3",
                ],
            )
            .group(
                "pressure",
                &["Pa", "kPa", "atm", "psi", "bar", "mmHg", "torr"],
            )
            .group("time", &["s", "minute", "h", "day"])
            .build()
    }

    /// process-wide standard table, built on first use
    pub fn shared() -> Arc<UnitTable> {
        static SHARED: OnceLock<Arc<UnitTable>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(UnitTable::standard()))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// the quantity behind a plain unit name (not for `mm^2`-style entries)
    pub fn quantity(&self, name: &str) -> Option<&Quantity> {
        match self.units.get(name) {
            Some(Expr::Unit(q)) => Some(q),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&UnitGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn groups(&self) -> &[UnitGroup] {
        &self.groups
    }

    /// Every plain unit name whose dimension equals `dimension`, sorted.
    pub fn find_units(&self, dimension: &Dimension) -> Vec<String> {
        self.units
            .iter()
            .filter_map(|(name, expr)| match expr {
                Expr::Unit(q) if q.dimension == *dimension => Some(name.clone()),
                _ => None,
            })
            .sorted()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Collects entries and groups; [`UnitTableBuilder::build`] freezes them into a [`UnitTable`].
#[derive(Debug, Default)]
pub struct UnitTableBuilder {
    units: HashMap<String, Expr>,
    groups: Vec<UnitGroup>,
}

impl UnitTableBuilder {
    /// registers `quantity` under every name in `names`
    pub fn quantity(mut self, quantity: Quantity, names: &[&str]) -> Self {
        for name in names {
            if self
                .units
                .insert(name.to_string(), Expr::Unit(quantity.clone()))
                .is_some()
            {
                warn!("unit name {} registered twice, last definition wins", name);
            }
        }
        self
    }

    /// registers an arbitrary unit expression under `name`
    pub fn alias(mut self, name: &str, expr: Expr) -> Self {
        self.units.insert(name.to_string(), expr);
        self
    }

    /// registers `name^power` as `name**power` if `name` is known
    pub fn power_alias(self, name: &str, power: i32) -> Self {
        match self.units.get(name).cloned() {
            Some(unit) => {
                let key = format!("{}^{}", name, power);
                self.alias(&key, unit.pow(Expr::Const(power as f64)))
            }
            None => {
                warn!("cannot build {}^{}: unknown unit {}", name, power, name);
                self
            }
        }
    }

    /// group whose options are existing entries; unknown labels are skipped with a warning
    pub fn group(self, name: &str, labels: &[&str]) -> Self {
        let options = labels
            .iter()
            .filter_map(|label| match self.units.get(*label) {
                Some(expr) => Some((label.to_string(), expr.clone())),
                None => {
                    warn!("group {}: unknown unit {}", name, label);
                    None
                }
            })
            .collect();
        self.group_with(name, options)
    }

    /// group with explicit `(label, unit expression)` options
    pub fn group_with(mut self, name: &str, options: Vec<(String, Expr)>) -> Self {
        self.groups.push(UnitGroup {
            name: name.to_string(),
            options,
        });
        self
    }

    pub fn build(self) -> UnitTable {
        debug!(
            "unit table built: {} names, groups [{}]",
            self.units.len(),
            self.groups.iter().map(|g| g.name.as_str()).join(", ")
        );
        UnitTable {
            units: self.units,
            groups: self.groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_groups() {
        let table = UnitTable::standard();
        let length = table.group("length").unwrap();
        assert_eq!(length.labels(), vec!["mm", "cm", "inch", "ft", "yard", "m"]);
        let force = table.group("force").unwrap();
        assert_eq!(force.labels(), vec!["N", "kN", "lbf", "kgf", "dyne"]);
        let force_dim = Dimension::from_name("force").unwrap();
        for (_, expr) in &force.options {
            match expr {
                Expr::Unit(q) => assert_eq!(q.dimension, force_dim),
                other => panic!("unexpected option {}", other),
            }
        }
        assert_eq!(table.group("acceleration").unwrap().labels(), vec!["g", "m/s2", "ft/s2"]);
        assert!(table.group("temperature").is_none());
    }

    #[test]
    fn test_custom_units() {
        let table = UnitTable::standard();
        let lbf = table.quantity("lbf").unwrap();
        assert_eq!(lbf.dimension, Dimension::from_name("force").unwrap());
        let usgal = table.quantity("USgal").unwrap();
        let inch = table.quantity("inch").unwrap();
        assert_relative_eq!(
            usgal.scale_factor,
            231.0 * inch.scale_factor.powi(3),
            max_relative = 1e-12
        );
        assert_eq!(table.quantity("lbm"), table.quantity("pound"));
    }

    #[test]
    fn test_power_aliases() {
        let table = UnitTable::standard();
        let mm2 = table.get("mm^2").unwrap();
        assert_eq!(mm2.to_string(), "mm**2");
        assert!(table.quantity("mm^2").is_none());
        assert_eq!(table.group("volume").unwrap().get("m^3").unwrap().to_string(), "m**3");
    }

    #[test]
    fn test_find_units() {
        let table = UnitTable::standard();
        let force = table.find_units(&Dimension::from_name("force").unwrap());
        assert!(force.contains(&"lbf".to_string()));
        assert!(force.contains(&"N".to_string()));
        assert!(!force.contains(&"kg".to_string()));
        let mut sorted = force.clone();
        sorted.sort();
        assert_eq!(force, sorted);
    }

    #[test]
    fn test_shared_table_is_single_instance() {
        let a = UnitTable::shared();
        let b = UnitTable::shared();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.is_empty());
    }
}
