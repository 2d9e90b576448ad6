//! Activation windows and per-process on/active state shared by movers and weatherers

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Seconds from `from` to `to` (negative if `to` is earlier)
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

/// Longest span, in seconds, that time arithmetic accepts (100 years)
pub const MAX_SPAN_SECONDS: f64 = 100.0 * 365.0 * 86_400.0;

/// `time` advanced by `seconds`, `None` if the span exceeds
/// [`MAX_SPAN_SECONDS`] or the result leaves chrono's range
pub fn checked_add_seconds(time: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds.abs() > MAX_SPAN_SECONDS {
        return None;
    }
    time.checked_add_signed(Duration::nanoseconds((seconds * 1e9).round() as i64))
}

/// `time` advanced by a (possibly fractional) number of seconds, saturating
/// at the representable range
pub fn add_seconds(time: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    checked_add_seconds(time, seconds).unwrap_or(if seconds < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// `[start, stop)` interval during which a process may run. `None` bounds are open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    /// Always active
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Window with optional bounds; `stop` must come after `start` when both are set
    pub fn new(start: Option<DateTime<Utc>>, stop: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(a), Some(b)) = (start, stop) {
            if b <= a {
                return Err(Error::InvalidActiveWindow { start, stop });
            }
        }
        Ok(Self { start, stop })
    }

    /// Closed-form window `[start, stop)`
    pub fn between(start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Self> {
        Self::new(Some(start), Some(stop))
    }

    /// Open-ended window beginning at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            stop: None,
        }
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| s <= time) && self.stop.map_or(true, |s| time < s)
    }

    /// Length in seconds, `None` if either bound is open
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.start, self.stop) {
            (Some(a), Some(b)) => Some(seconds_between(a, b)),
            _ => None,
        }
    }

    /// Finite duration or an `InvalidActiveWindow` error
    pub fn require_finite(&self) -> Result<f64> {
        match self.duration_seconds() {
            Some(d) if d > 0.0 => Ok(d),
            _ => Err(Error::InvalidActiveWindow {
                start: self.start,
                stop: self.stop,
            }),
        }
    }

    /// Seconds of `[model_time, model_time + time_step)` inside the window,
    /// clipped to `[0, time_step]`
    pub fn overlap_seconds(&self, model_time: DateTime<Utc>, time_step: f64) -> f64 {
        let lo = self
            .start
            .map_or(0.0, |s| seconds_between(model_time, s).max(0.0));
        let hi = self
            .stop
            .map_or(time_step, |s| seconds_between(model_time, s).min(time_step));
        (hi - lo).clamp(0.0, time_step.max(0.0))
    }
}

/// Name, on/off switch, window and the per-step active flag of a process
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessState {
    pub name: String,
    pub on: bool,
    window: ActiveWindow,
    active: bool,
    timestep: f64,
}

impl ProcessState {
    pub fn new(name: impl Into<String>, window: ActiveWindow) -> Self {
        Self {
            name: name.into(),
            on: true,
            window,
            active: false,
            timestep: 0.0,
        }
    }

    pub fn window(&self) -> ActiveWindow {
        self.window
    }

    pub fn set_window(&mut self, window: ActiveWindow) {
        self.window = window;
    }

    /// Active in the current step
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds of the current step during which the process runs
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Recompute `active` and the effective sub-step for the step starting at `model_time`
    pub fn prepare_for_model_step(&mut self, model_time: DateTime<Utc>, time_step: f64) {
        self.timestep = if self.on {
            self.window.overlap_seconds(model_time, time_step)
        } else {
            0.0
        };
        self.active = self.timestep > 0.0;
    }

    /// Force inactive for the current step
    pub fn deactivate(&mut self) {
        self.active = false;
        self.timestep = 0.0;
    }

    pub fn reset(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TIME_STEP: f64 = 900.0;

    fn rel_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn skim_window() -> ActiveWindow {
        let start = add_seconds(rel_time(), TIME_STEP);
        ActiveWindow::between(start, add_seconds(start, 3600.0)).unwrap()
    }

    #[test]
    fn test_time_arithmetic_out_of_range() {
        let t = rel_time();
        assert_eq!(checked_add_seconds(t, 1.5), Some(t + Duration::milliseconds(1500)));
        assert_eq!(checked_add_seconds(t, 1e300), None);
        assert_eq!(checked_add_seconds(t, f64::NAN), None);
        assert_eq!(checked_add_seconds(DateTime::<Utc>::MAX_UTC, 60.0), None);

        assert_eq!(add_seconds(t, 1e300), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_seconds(t, -1e300), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let t = rel_time();
        assert!(matches!(
            ActiveWindow::between(t, t),
            Err(Error::InvalidActiveWindow { .. })
        ));
        assert!(ActiveWindow::between(add_seconds(t, 10.0), t).is_err());
        assert!(ActiveWindow::new(Some(t), None).is_ok());
    }

    #[test]
    fn test_contains_is_half_open() {
        let w = skim_window();
        let start = w.start.unwrap();
        let stop = w.stop.unwrap();

        assert!(w.contains(start));
        assert!(!w.contains(stop));
        assert!(!w.contains(rel_time()));
        assert!(ActiveWindow::unbounded().contains(rel_time()));
    }

    #[test]
    fn test_require_finite() {
        assert_eq!(skim_window().require_finite().unwrap(), 3600.0);
        assert!(ActiveWindow::starting_at(rel_time()).require_finite().is_err());
    }

    #[test]
    fn test_overlap_seconds() {
        let w = skim_window();
        let start = w.start.unwrap();
        let stop = w.stop.unwrap();

        let cases = [
            (start, TIME_STEP),
            (add_seconds(start, -TIME_STEP / 3.0), TIME_STEP * 2.0 / 3.0),
            (add_seconds(start, TIME_STEP / 2.0), TIME_STEP),
            (stop, 0.0),
            (add_seconds(stop, -TIME_STEP), TIME_STEP),
            (add_seconds(stop, -TIME_STEP / 3.0), TIME_STEP / 3.0),
            (add_seconds(start, -2.0 * TIME_STEP), 0.0),
        ];
        for (model_time, expected) in cases {
            let got = w.overlap_seconds(model_time, TIME_STEP);
            assert!(
                (got - expected).abs() < 1e-6,
                "at {model_time}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn test_process_state_respects_on_flag() {
        let mut state = ProcessState::new("skimmer", skim_window());
        state.prepare_for_model_step(skim_window().start.unwrap(), TIME_STEP);
        assert!(state.is_active());
        assert_eq!(state.timestep(), TIME_STEP);

        state.on = false;
        state.prepare_for_model_step(skim_window().start.unwrap(), TIME_STEP);
        assert!(!state.is_active());
        assert_eq!(state.timestep(), 0.0);
    }

    #[test]
    fn test_process_state_inactive_after_window() {
        let mut state = ProcessState::new("skimmer", skim_window());
        state.prepare_for_model_step(skim_window().stop.unwrap(), TIME_STEP);
        assert!(!state.is_active());
    }
}
