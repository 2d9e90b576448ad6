//! Unit lookup for user-facing amounts
//!
//! Only the conversions the simulation needs at its configuration boundary:
//! everything inside the model runs in SI (kg, m, m^2, m^3).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Physical dimension of a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitFamily {
    Mass,
    Volume,
    Length,
    Area,
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitFamily::Mass => "mass",
            UnitFamily::Volume => "volume",
            UnitFamily::Length => "length",
            UnitFamily::Area => "area",
        };
        f.write_str(name)
    }
}

/// (aliases, family, factor to SI)
const UNITS: &[(&[&str], UnitFamily, f64)] = &[
    (&["kg", "kilogram", "kilograms"], UnitFamily::Mass, 1.0),
    (&["g", "gram", "grams"], UnitFamily::Mass, 1e-3),
    (&["mg", "milligram", "milligrams"], UnitFamily::Mass, 1e-6),
    (&["ton", "tonne", "tonnes", "metric ton"], UnitFamily::Mass, 1000.0),
    (&["lb", "lbs", "pound", "pounds"], UnitFamily::Mass, 0.453_592_37),
    (&["m^3", "m3", "cubic meter"], UnitFamily::Volume, 1.0),
    (&["cm^3", "cc"], UnitFamily::Volume, 1e-6),
    (&["l", "liter", "liters", "litre"], UnitFamily::Volume, 1e-3),
    (&["gal", "gallon", "gallons"], UnitFamily::Volume, 0.003_785_411_784),
    (&["bbl", "barrel", "barrels"], UnitFamily::Volume, 0.158_987_294_928),
    (&["m", "meter", "meters", "metre"], UnitFamily::Length, 1.0),
    (&["cm", "centimeter", "centimeters"], UnitFamily::Length, 0.01),
    (&["mm", "millimeter", "millimeters"], UnitFamily::Length, 0.001),
    (&["km", "kilometer", "kilometers"], UnitFamily::Length, 1000.0),
    (&["in", "inch", "inches"], UnitFamily::Length, 0.0254),
    (&["ft", "foot", "feet"], UnitFamily::Length, 0.3048),
    (&["m^2", "m2", "square meter"], UnitFamily::Area, 1.0),
    (&["cm^2", "cm2"], UnitFamily::Area, 1e-4),
    (&["km^2", "km2"], UnitFamily::Area, 1e6),
    (&["ft^2", "ft2"], UnitFamily::Area, 0.092_903_04),
    (&["ha", "hectare", "hectares"], UnitFamily::Area, 1e4),
    (&["acre", "acres"], UnitFamily::Area, 4_046.856_422_4),
];

fn lookup(unit: &str) -> Option<(UnitFamily, f64)> {
    let unit = unit.trim();
    UNITS
        .iter()
        .find(|(aliases, _, _)| aliases.iter().any(|a| a.eq_ignore_ascii_case(unit)))
        .map(|(_, family, factor)| (*family, *factor))
}

/// Family of a unit string, if known
pub fn family_of(unit: &str) -> Option<UnitFamily> {
    lookup(unit).map(|(family, _)| family)
}

/// Factor converting `unit` to SI, provided it belongs to `expected`
pub fn si_factor(unit: &str, expected: UnitFamily) -> Result<f64> {
    match lookup(unit) {
        Some((family, factor)) if family == expected => Ok(factor),
        _ => Err(Error::InvalidUnit {
            unit: unit.to_string(),
            expected,
        }),
    }
}

/// Convert `value` in `unit` to SI
pub fn to_si(value: f64, unit: &str, expected: UnitFamily) -> Result<f64> {
    Ok(value * si_factor(unit, expected)?)
}

/// Check that `unit` is a mass or volume unit, the two ways an oil amount can be given
pub fn amount_family(unit: &str) -> Result<UnitFamily> {
    match family_of(unit) {
        Some(family @ (UnitFamily::Mass | UnitFamily::Volume)) => Ok(family),
        _ => Err(Error::InvalidUnit {
            unit: unit.to_string(),
            expected: UnitFamily::Mass,
        }),
    }
}

/// Convert an oil amount to kg, using `density` (kg/m^3) for volume units
pub fn amount_to_kg(value: f64, unit: &str, density: f64) -> Result<f64> {
    match amount_family(unit)? {
        UnitFamily::Volume => Ok(to_si(value, unit, UnitFamily::Volume)? * density),
        _ => to_si(value, unit, UnitFamily::Mass),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        assert_eq!(to_si(100.0, "cm", UnitFamily::Length).unwrap(), 1.0);
        assert_eq!(to_si(2.0, "km", UnitFamily::Length).unwrap(), 2000.0);
        assert!((to_si(1.0, "in", UnitFamily::Length).unwrap() - 0.0254).abs() < 1e-15);
    }

    #[test]
    fn test_area_conversions() {
        assert_eq!(to_si(1.0, "km^2", UnitFamily::Area).unwrap(), 1e6);
        assert_eq!(to_si(3.0, "ha", UnitFamily::Area).unwrap(), 3e4);
    }

    #[test]
    fn test_wrong_family_is_invalid() {
        assert_eq!(
            si_factor("in", UnitFamily::Area),
            Err(Error::InvalidUnit {
                unit: "in".to_string(),
                expected: UnitFamily::Area
            })
        );
        assert!(si_factor("m^2", UnitFamily::Length).is_err());
        assert!(si_factor("l", UnitFamily::Length).is_err());
    }

    #[test]
    fn test_unknown_unit_is_invalid() {
        assert!(family_of("furlong").is_none());
        assert!(si_factor("furlong", UnitFamily::Length).is_err());
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(family_of(" KG "), Some(UnitFamily::Mass));
        assert_eq!(family_of("BBL"), Some(UnitFamily::Volume));
    }

    #[test]
    fn test_amount_to_kg() {
        assert_eq!(amount_to_kg(2.0, "ton", 900.0).unwrap(), 2000.0);
        assert_eq!(amount_to_kg(1.0, "m^3", 900.0).unwrap(), 900.0);
        assert!((amount_to_kg(1.0, "bbl", 900.0).unwrap() - 143.088_565_435_2).abs() < 1e-9);
        assert!(amount_to_kg(1.0, "m", 900.0).is_err());
    }
}
