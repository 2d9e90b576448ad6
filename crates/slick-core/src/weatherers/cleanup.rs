//! Efficiency and checks shared by the response operations

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::model::StepContext;
use crate::{Error, Result};

/// Efficiency lost per m/s of wind when it is derived from the wind
pub const WIND_EFFICIENCY_SLOPE: f64 = 0.07;

/// How much of the treated oil a response operation actually removes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Efficiency {
    /// Fraction in `(0, 1]`
    Fixed(f64),
    /// Recomputed every step from the wind speed over the treated oil
    FromWind,
}

impl Default for Efficiency {
    fn default() -> Self {
        Efficiency::Fixed(1.0)
    }
}

impl From<f64> for Efficiency {
    fn from(value: f64) -> Self {
        Efficiency::Fixed(value)
    }
}

impl Efficiency {
    /// Fails with `InvalidEfficiency` for a fixed value outside `(0, 1]`
    pub fn validate(self) -> Result<Self> {
        if let Efficiency::Fixed(value) = self {
            validate_efficiency(value)?;
        }
        Ok(self)
    }

    /// The fixed value, `None` when derived from the wind
    pub fn fixed(self) -> Option<f64> {
        match self {
            Efficiency::Fixed(value) => Some(value),
            Efficiency::FromWind => None,
        }
    }

    /// Efficiency for this step at `position`
    pub fn resolve(self, ctx: &StepContext<'_>, position: DVec3) -> Result<f64> {
        match self {
            Efficiency::Fixed(value) => Ok(value),
            Efficiency::FromWind => Ok(wind_efficiency(
                ctx.environment.wind_speed(ctx.model_time, position)?,
            )),
        }
    }
}

/// `1 - 0.07 * wind_speed`, zero from about 14.3 m/s
pub fn wind_efficiency(wind_speed: f64) -> f64 {
    (1.0 - WIND_EFFICIENCY_SLOPE * wind_speed).clamp(0.0, 1.0)
}

/// Efficiency must lie in `(0, 1]`
pub fn validate_efficiency(efficiency: f64) -> Result<f64> {
    if efficiency > 0.0 && efficiency <= 1.0 {
        Ok(efficiency)
    } else {
        Err(Error::InvalidEfficiency(efficiency))
    }
}

/// Fraction in `(0, 1]`, reported against `name`
pub(crate) fn validate_fraction(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter {
            name,
            reason: format!("{value} is outside (0, 1]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{ConstantEnvironment, Quantity};
    use crate::substance::Oil;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_wind_efficiency_falls_with_wind() {
        assert_eq!(wind_efficiency(0.0), 1.0);
        assert!((wind_efficiency(5.0) - 0.65).abs() < 1e-12);
        assert_eq!(wind_efficiency(20.0), 0.0);
    }

    #[test]
    fn test_resolve_from_environment() {
        let time = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let oil = Oil::default();
        let calm = ConstantEnvironment::new();
        let ctx = StepContext::new(time, 900.0, &calm, &oil);

        assert_eq!(Efficiency::Fixed(0.4).resolve(&ctx, DVec3::ZERO), Ok(0.4));
        assert!(matches!(
            Efficiency::FromWind.resolve(&ctx, DVec3::ZERO),
            Err(Error::EnvironmentDataMissing {
                quantity: Quantity::WindU,
                ..
            })
        ));

        let windy = ConstantEnvironment::new()
            .with(Quantity::WindU, 3.0)
            .with(Quantity::WindV, 4.0);
        let ctx = StepContext::new(time, 900.0, &windy, &oil);
        let efficiency = Efficiency::FromWind.resolve(&ctx, DVec3::ZERO).unwrap();
        assert!((efficiency - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_validate_only_checks_fixed_values() {
        assert_eq!(Efficiency::FromWind.validate(), Ok(Efficiency::FromWind));
        assert_eq!(Efficiency::Fixed(1.2).validate(), Err(Error::InvalidEfficiency(1.2)));
        assert_eq!(Efficiency::from(0.5).fixed(), Some(0.5));
        assert_eq!(Efficiency::FromWind.fixed(), None);
    }

    #[test]
    fn test_efficiency_range() {
        assert_eq!(validate_efficiency(1.0), Ok(1.0));
        assert_eq!(validate_efficiency(0.3), Ok(0.3));
        for bad in [0.0, -0.1, 1.01, f64::NAN] {
            assert!(validate_efficiency(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_fraction_names_parameter() {
        assert!(matches!(
            validate_fraction("fraction sprayed", 2.0),
            Err(Error::InvalidParameter {
                name: "fraction sprayed",
                ..
            })
        ));
    }
}
