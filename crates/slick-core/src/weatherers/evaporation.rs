//! Evaporation after Fingas: the evaporated fraction of initial mass grows
//! with the logarithm of element age

use slick_elements::{ElementStore, Fate};

use super::Weatherer;
use crate::environment::Quantity;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::Result;

const KELVIN_OFFSET: f64 = 273.15;

/// Evaporated fraction after `age` seconds at `temp_c` °C, capped at `max_fraction`
pub fn fingas_fraction(a: f64, b: f64, temp_c: f64, age: f64, max_fraction: f64) -> f64 {
    let minutes = age / 60.0;
    if minutes <= 1.0 {
        return 0.0;
    }
    ((a + b * temp_c) * minutes.ln() / 100.0).clamp(0.0, max_fraction)
}

#[derive(Clone, Debug)]
pub struct Evaporation {
    process: ProcessState,
}

impl Evaporation {
    pub const LEDGER_KEY: &'static str = "evaporated";

    pub fn new() -> Self {
        Self {
            process: ProcessState::new("evaporation", ActiveWindow::unbounded()),
        }
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }
}

impl Default for Evaporation {
    fn default() -> Self {
        Self::new()
    }
}

impl Weatherer for Evaporation {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn ledger_key(&self) -> Option<&'static str> {
        Some(Self::LEDGER_KEY)
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()> {
        if !self.process.is_active() {
            return Ok(());
        }
        let dt = self.process.timestep();
        let (a, b) = ctx.substance.evaporation_coefficients();
        let max_fraction = ctx.substance.max_evaporable_fraction();

        let mut view = store.weathering_view(ctx.selection(Fate::SURFACE_WEATHERING))?;
        if view.is_empty() {
            return Ok(());
        }
        let temperatures = view
            .rows()
            .map(|row| {
                ctx.environment
                    .require(Quantity::WaterTemperature, ctx.model_time, row.position)
            })
            .collect::<Result<Vec<f64>>>()?;

        let evaporated = view.remove_each(Self::LEDGER_KEY, |k, row| {
            let temp_c = temperatures[k] - KELVIN_OFFSET;
            let before = fingas_fraction(a, b, temp_c, row.age, max_fraction);
            let after = fingas_fraction(a, b, temp_c, row.age + dt, max_fraction);
            row.init_mass * (after - before)
        });
        log::debug!("Evaporated {:.3} kg from {} elements", evaporated, view.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ConstantEnvironment;
    use crate::substance::Oil;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use glam::DVec3;
    use slick_elements::{ArrayId, ReleaseBatch};

    #[test]
    fn test_fingas_fraction_shape() {
        assert_eq!(fingas_fraction(2.3, 0.045, 15.0, 30.0, 0.35), 0.0);
        let hour = fingas_fraction(2.3, 0.045, 15.0, 3600.0, 0.35);
        let day = fingas_fraction(2.3, 0.045, 15.0, 86_400.0, 0.35);
        assert!(hour > 0.0 && day > hour);
        assert_eq!(fingas_fraction(2.3, 0.045, 15.0, 1e12, 0.35), 0.35);
    }

    #[test]
    fn test_evaporation_books_ledger() {
        let mut store = ElementStore::with_arrays(ArrayId::WEATHERING.iter().copied());
        store
            .release(4, &ReleaseBatch::at_point(100.0, DVec3::ZERO))
            .unwrap();
        let env = ConstantEnvironment::new().with(Quantity::WaterTemperature, 288.15);
        let oil = Oil::default();
        let time = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let ctx = StepContext::new(time, 3600.0, &env, &oil);

        let mut evaporation = Evaporation::new();
        evaporation.prepare_for_model_run(&mut store, &ctx).unwrap();
        evaporation.prepare_for_model_step(&mut store, &ctx).unwrap();
        evaporation.weather_elements(&mut store, &ctx).unwrap();

        let expected = 400.0 * fingas_fraction(2.3, 0.045, 15.0, 3600.0, 0.35);
        let booked = store.ledger().get(Evaporation::LEDGER_KEY);
        assert!((booked - expected).abs() < 1e-9);
        store.check_conservation(1e-12).unwrap();
    }

    #[test]
    fn test_missing_temperature_aborts() {
        let mut store = ElementStore::with_arrays(ArrayId::WEATHERING.iter().copied());
        store
            .release(1, &ReleaseBatch::at_point(100.0, DVec3::ZERO))
            .unwrap();
        let env = ConstantEnvironment::new();
        let oil = Oil::default();
        let time = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let ctx = StepContext::new(time, 3600.0, &env, &oil);

        let mut evaporation = Evaporation::new();
        evaporation.prepare_for_model_step(&mut store, &ctx).unwrap();
        assert!(matches!(
            evaporation.weather_elements(&mut store, &ctx),
            Err(Error::EnvironmentDataMissing {
                quantity: Quantity::WaterTemperature,
                ..
            })
        ));
    }
}
