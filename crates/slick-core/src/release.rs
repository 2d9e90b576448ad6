//! Release scheduling
//!
//! A [`Spill`] decides how many elements enter the water each step and what
//! they carry. Instantaneous releases put everything out in the first step at
//! or after `release_time`; continuous releases follow a uniform schedule
//! between `release_time` and `end_release_time`.

use chrono::{DateTime, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use slick_elements::{Fate, ReleaseBatch};

use crate::error::non_negative;
use crate::process::{add_seconds, seconds_between};
use crate::substance::Substance;
use crate::units::{amount_family, amount_to_kg};
use crate::{Error, Result};

/// When, where and how many elements a spill releases
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReleaseProfile {
    pub num_elements: usize,
    pub release_time: DateTime<Utc>,
    /// `None` for an instantaneous release
    #[serde(default)]
    pub end_release_time: Option<DateTime<Utc>>,
    pub start_position: DVec3,
    /// Elements are spread along the line to this point when set
    #[serde(default)]
    pub end_position: Option<DVec3>,
}

impl ReleaseProfile {
    /// Everything at once, at one point
    pub fn point(num_elements: usize, release_time: DateTime<Utc>, position: DVec3) -> Self {
        Self {
            num_elements,
            release_time,
            end_release_time: None,
            start_position: position,
            end_position: None,
        }
    }

    /// Spread uniformly over `duration` seconds
    pub fn continuous(mut self, duration: f64) -> Self {
        self.end_release_time = Some(add_seconds(self.release_time, duration));
        self
    }

    pub fn along_line_to(mut self, end_position: DVec3) -> Self {
        self.end_position = Some(end_position);
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(end) = self.end_release_time {
            if end <= self.release_time {
                return Err(Error::InvalidActiveWindow {
                    start: Some(self.release_time),
                    stop: Some(end),
                });
            }
        }
        Ok(())
    }

    /// Fraction of the schedule due by `time`, in `[0, 1]`
    fn fraction_due(&self, time: DateTime<Utc>) -> f64 {
        match self.end_release_time {
            None if time >= self.release_time => 1.0,
            None => 0.0,
            Some(end) => {
                let elapsed = seconds_between(self.release_time, time);
                (elapsed / seconds_between(self.release_time, end)).clamp(0.0, 1.0)
            }
        }
    }

    /// Position of the `index`-th element of the whole release
    fn position_of(&self, index: usize) -> DVec3 {
        match self.end_position {
            Some(end) if self.num_elements > 1 => {
                let t = index as f64 / (self.num_elements - 1) as f64;
                self.start_position.lerp(end, t)
            }
            _ => self.start_position,
        }
    }
}

/// A named release of oil
#[derive(Clone, Debug, PartialEq)]
pub struct Spill {
    pub name: String,
    pub on: bool,
    release: ReleaseProfile,
    amount: f64,
    units: String,
    num_released: usize,
    mass_per_element: f64,
}

impl Spill {
    /// `units` must be a mass or volume unit; volume amounts are converted
    /// with the substance density at the start of each run
    pub fn new(
        name: impl Into<String>,
        release: ReleaseProfile,
        amount: f64,
        units: &str,
    ) -> Result<Self> {
        non_negative("spill amount", amount)?;
        amount_family(units)?;
        release.validate()?;
        Ok(Self {
            name: name.into(),
            on: true,
            release,
            amount,
            units: units.to_string(),
            num_released: 0,
            mass_per_element: 0.0,
        })
    }

    pub fn release(&self) -> &ReleaseProfile {
        &self.release
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn num_elements(&self) -> usize {
        self.release.num_elements
    }

    pub fn num_released(&self) -> usize {
        self.num_released
    }

    /// Mass stamped onto each element, set by `prepare_for_model_run`
    pub fn mass_per_element(&self) -> f64 {
        self.mass_per_element
    }

    pub fn is_complete(&self) -> bool {
        self.num_released >= self.release.num_elements
    }

    /// Resolve the amount to kg and reset the release counter
    pub fn prepare_for_model_run(&mut self, substance: &dyn Substance) -> Result<()> {
        let density = substance.density(substance.reference_temperature());
        let total_kg = amount_to_kg(self.amount, &self.units, density)?;
        self.mass_per_element = if self.release.num_elements == 0 {
            0.0
        } else {
            total_kg / self.release.num_elements as f64
        };
        self.num_released = 0;
        log::debug!(
            "Spill '{}': {} elements of {:.3} kg",
            self.name,
            self.release.num_elements,
            self.mass_per_element
        );
        Ok(())
    }

    /// Elements due in the step `[model_time, model_time + time_step)` that
    /// have not been released yet. Does not change any state.
    pub fn num_elements_to_release(&self, model_time: DateTime<Utc>, time_step: f64) -> usize {
        if !self.on || self.is_complete() || model_time < self.release.release_time {
            return 0;
        }
        let step_end = add_seconds(model_time, time_step);
        let due = self.release.fraction_due(step_end) * self.release.num_elements as f64;
        let due = (due.round() as usize).min(self.release.num_elements);
        due.saturating_sub(self.num_released)
    }

    /// Batch for the next `n` elements, continuing along the release line
    pub fn release_batch(&self, n: usize) -> ReleaseBatch {
        let first = self.num_released;
        let last = first + n.saturating_sub(1);
        ReleaseBatch {
            mass_per_element: self.mass_per_element,
            start_position: self.release.position_of(first),
            end_position: self.release.position_of(last),
            fate: Fate::SURFACE_WEATHERING,
        }
    }

    /// Record that `n` elements were released
    pub fn mark_released(&mut self, n: usize) {
        self.num_released = (self.num_released + n).min(self.release.num_elements);
    }

    pub fn rewind(&mut self) {
        self.num_released = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substance::Oil;
    use chrono::TimeZone;

    const TIME_STEP: f64 = 900.0;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn continuous_spill(num_elements: usize, hours: f64) -> Spill {
        let release =
            ReleaseProfile::point(num_elements, start(), DVec3::ZERO).continuous(hours * 3600.0);
        Spill::new("well", release, 1000.0, "kg").unwrap()
    }

    fn run_schedule(spill: &mut Spill, steps: usize) -> Vec<usize> {
        let mut per_step = Vec::new();
        for step in 0..steps {
            let t = add_seconds(start(), step as f64 * TIME_STEP);
            let n = spill.num_elements_to_release(t, TIME_STEP);
            spill.mark_released(n);
            per_step.push(n);
        }
        per_step
    }

    #[test]
    fn test_instantaneous_release_all_in_first_step() {
        let mut spill = Spill::new(
            "tanker",
            ReleaseProfile::point(10, start(), DVec3::ZERO),
            500.0,
            "kg",
        )
        .unwrap();

        let per_step = run_schedule(&mut spill, 4);
        assert_eq!(per_step, vec![10, 0, 0, 0]);
    }

    #[test]
    fn test_nothing_before_release_time() {
        let spill = Spill::new(
            "late",
            ReleaseProfile::point(10, add_seconds(start(), 3600.0), DVec3::ZERO),
            500.0,
            "kg",
        )
        .unwrap();
        assert_eq!(spill.num_elements_to_release(start(), TIME_STEP), 0);
    }

    #[test]
    fn test_continuous_release_sums_exactly() {
        for (n, hours) in [(10, 1.0), (7, 3.0), (1000, 5.5), (3, 24.0)] {
            let mut spill = continuous_spill(n, hours);
            let per_step = run_schedule(&mut spill, 200);
            assert_eq!(per_step.iter().sum::<usize>(), n, "{n} over {hours} h");
            assert!(spill.is_complete());
        }
    }

    #[test]
    fn test_continuous_release_is_uniform() {
        let mut spill = continuous_spill(100, 1.0);
        let per_step = run_schedule(&mut spill, 6);
        assert_eq!(per_step, vec![25, 25, 25, 25, 0, 0]);
    }

    #[test]
    fn test_query_is_idempotent_until_committed() {
        let mut spill = continuous_spill(100, 1.0);
        let first = spill.num_elements_to_release(start(), TIME_STEP);
        assert_eq!(spill.num_elements_to_release(start(), TIME_STEP), first);

        spill.mark_released(first);
        assert_eq!(spill.num_elements_to_release(start(), TIME_STEP), 0);
    }

    #[test]
    fn test_off_spill_releases_nothing() {
        let mut spill = continuous_spill(10, 1.0);
        spill.on = false;
        assert_eq!(spill.num_elements_to_release(start(), TIME_STEP), 0);
    }

    #[test]
    fn test_volume_amount_uses_density() {
        let release = ReleaseProfile::point(4, start(), DVec3::ZERO);
        let mut spill = Spill::new("tank", release, 2.0, "m^3").unwrap();
        spill.prepare_for_model_run(&Oil::default()).unwrap();
        assert!((spill.mass_per_element() - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_configuration() {
        let release = ReleaseProfile::point(4, start(), DVec3::ZERO);
        assert!(matches!(
            Spill::new("a", release.clone(), 1.0, "m^2"),
            Err(Error::InvalidUnit { .. })
        ));
        assert!(matches!(
            Spill::new("b", release.clone(), -1.0, "kg"),
            Err(Error::NegativeQuantity { .. })
        ));
        assert!(Spill::new("c", release.continuous(0.0), 1.0, "kg").is_err());
    }

    #[test]
    fn test_line_release_positions() {
        let release = ReleaseProfile::point(5, start(), DVec3::ZERO)
            .along_line_to(DVec3::new(4.0, 0.0, 0.0))
            .continuous(3600.0);
        let mut spill = Spill::new("pipeline", release, 100.0, "kg").unwrap();

        let first = spill.release_batch(2);
        assert_eq!(first.start_position, DVec3::ZERO);
        assert_eq!(first.end_position, DVec3::new(1.0, 0.0, 0.0));

        spill.mark_released(2);
        let rest = spill.release_batch(3);
        assert_eq!(rest.start_position, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(rest.end_position, DVec3::new(4.0, 0.0, 0.0));
    }
}
