//! Environment query interface
//!
//! Weatherers and movers read wind, water and wave state through
//! [`Environment::value_at`]. `None` means "no data" and is never confused with
//! a valid zero.

use chrono::{DateTime, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::process::seconds_between;
use crate::{Error, Result};

/// Physical quantities an environment can provide (SI units)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quantity {
    /// Eastward wind at 10 m, m/s
    WindU,
    /// Northward wind at 10 m, m/s
    WindV,
    /// Sea surface temperature, K
    WaterTemperature,
    /// Water density, kg/m^3
    WaterDensity,
    /// Significant wave height, m
    WaveHeight,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::WindU => "eastward wind",
            Quantity::WindV => "northward wind",
            Quantity::WaterTemperature => "water temperature",
            Quantity::WaterDensity => "water density",
            Quantity::WaveHeight => "wave height",
        };
        f.write_str(name)
    }
}

/// Source of environmental conditions
pub trait Environment {
    /// Value of `quantity` at `time` and `position`, `None` if unavailable
    fn value_at(&self, quantity: Quantity, time: DateTime<Utc>, position: DVec3) -> Option<f64>;

    /// Like [`value_at`](Self::value_at) but missing data is an error
    fn require(&self, quantity: Quantity, time: DateTime<Utc>, position: DVec3) -> Result<f64> {
        self.value_at(quantity, time, position)
            .ok_or(Error::EnvironmentDataMissing { quantity, time })
    }

    /// Wind speed magnitude from the two components
    fn wind_speed(&self, time: DateTime<Utc>, position: DVec3) -> Result<f64> {
        let u = self.require(Quantity::WindU, time, position)?;
        let v = self.require(Quantity::WindV, time, position)?;
        Ok(u.hypot(v))
    }
}

/// Spatially and temporally uniform conditions
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantEnvironment {
    values: BTreeMap<Quantity, f64>,
}

impl ConstantEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, quantity: Quantity, value: f64) -> Self {
        self.values.insert(quantity, value);
        self
    }

    /// Wind given as speed (m/s) and the direction it blows *from*
    /// (meteorological degrees, 0 = from north)
    pub fn with_wind(self, speed: f64, from_direction: f64) -> Self {
        let to = (from_direction + 180.0).to_radians();
        self.with(Quantity::WindU, speed * to.sin())
            .with(Quantity::WindV, speed * to.cos())
    }

    pub fn set(&mut self, quantity: Quantity, value: f64) {
        self.values.insert(quantity, value);
    }
}

impl Environment for ConstantEnvironment {
    fn value_at(&self, quantity: Quantity, _time: DateTime<Utc>, _position: DVec3) -> Option<f64> {
        self.values.get(&quantity).copied()
    }
}

/// Spatially uniform time series, linearly interpolated and held constant
/// beyond the first and last sample
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeseriesEnvironment {
    series: BTreeMap<Quantity, Vec<(DateTime<Utc>, f64)>>,
}

impl TimeseriesEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add samples for a quantity. Samples are kept sorted by time.
    pub fn with_series(
        mut self,
        quantity: Quantity,
        samples: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        let entry = self.series.entry(quantity).or_default();
        entry.extend(samples);
        entry.sort_by_key(|(t, _)| *t);
        self
    }
}

impl Environment for TimeseriesEnvironment {
    fn value_at(&self, quantity: Quantity, time: DateTime<Utc>, _position: DVec3) -> Option<f64> {
        let samples = self.series.get(&quantity)?;
        let first = samples.first()?;
        let last = samples.last()?;
        if time <= first.0 {
            return Some(first.1);
        }
        if time >= last.0 {
            return Some(last.1);
        }

        // First sample strictly after `time`; the one before it is at or before
        let upper = samples.partition_point(|(t, _)| *t <= time);
        let (t0, v0) = samples[upper - 1];
        let (t1, v1) = samples[upper];
        let span = seconds_between(t0, t1);
        if span <= 0.0 {
            return Some(v1);
        }
        let w = seconds_between(t0, time) / span;
        Some(v0 + (v1 - v0) * w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_constant_no_data_is_distinct_from_zero() {
        let env = ConstantEnvironment::new().with(Quantity::WaveHeight, 0.0);

        assert_eq!(env.value_at(Quantity::WaveHeight, t(0), DVec3::ZERO), Some(0.0));
        assert_eq!(env.value_at(Quantity::WindU, t(0), DVec3::ZERO), None);
        assert!(matches!(
            env.require(Quantity::WindU, t(0), DVec3::ZERO),
            Err(Error::EnvironmentDataMissing {
                quantity: Quantity::WindU,
                ..
            })
        ));
    }

    #[test]
    fn test_wind_from_direction() {
        // Wind from the west blows toward the east
        let env = ConstantEnvironment::new().with_wind(10.0, 270.0);
        let u = env.value_at(Quantity::WindU, t(0), DVec3::ZERO).unwrap();
        let v = env.value_at(Quantity::WindV, t(0), DVec3::ZERO).unwrap();

        assert!((u - 10.0).abs() < 1e-9);
        assert!(v.abs() < 1e-9);
        assert!((env.wind_speed(t(0), DVec3::ZERO).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_timeseries_interpolation() {
        let env = TimeseriesEnvironment::new().with_series(
            Quantity::WindU,
            [(t(2), 10.0), (t(0), 0.0)],
        );

        assert_eq!(env.value_at(Quantity::WindU, t(0), DVec3::ZERO), Some(0.0));
        assert_eq!(env.value_at(Quantity::WindU, t(1), DVec3::ZERO), Some(5.0));
        assert_eq!(env.value_at(Quantity::WindU, t(2), DVec3::ZERO), Some(10.0));
    }

    #[test]
    fn test_timeseries_clamps_outside_range() {
        let env = TimeseriesEnvironment::new()
            .with_series(Quantity::WaveHeight, [(t(1), 1.0), (t(2), 3.0)]);

        assert_eq!(env.value_at(Quantity::WaveHeight, t(0), DVec3::ZERO), Some(1.0));
        assert_eq!(env.value_at(Quantity::WaveHeight, t(5), DVec3::ZERO), Some(3.0));
        assert_eq!(env.value_at(Quantity::WindV, t(1), DVec3::ZERO), None);
    }
}
