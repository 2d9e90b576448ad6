//! Water uptake after Mackay
//!
//! `Y' = Y_max - (Y_max - Y) * exp(-K (1 + U)^2 dt / Y_max)` with `U` the wind
//! speed. Mass is unchanged; Skimmer and Burn read the resulting `frac_water`,
//! so this weatherer must be added before them.

use slick_elements::{ElementStore, Fate};

use super::Weatherer;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::Result;

#[derive(Clone, Debug)]
pub struct Emulsification {
    process: ProcessState,
    rate_constant: f64,
}

impl Emulsification {
    /// Mackay water uptake constant, s/m^2
    pub const DEFAULT_RATE_CONSTANT: f64 = 2.0e-6;

    pub fn new() -> Self {
        Self {
            process: ProcessState::new("emulsification", ActiveWindow::unbounded()),
            rate_constant: Self::DEFAULT_RATE_CONSTANT,
        }
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }
}

impl Default for Emulsification {
    fn default() -> Self {
        Self::new()
    }
}

/// Water fraction after `dt` seconds of wind `wind_speed`
pub fn mackay_uptake(frac_water: f64, max_water: f64, wind_speed: f64, k: f64, dt: f64) -> f64 {
    if max_water <= 0.0 {
        return frac_water;
    }
    let approach = (-k * (1.0 + wind_speed).powi(2) * dt / max_water).exp();
    let updated = max_water - (max_water - frac_water) * approach;
    updated.max(frac_water)
}

impl Weatherer for Emulsification {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn ledger_key(&self) -> Option<&'static str> {
        None
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()> {
        if !self.process.is_active() {
            return Ok(());
        }
        let dt = self.process.timestep();
        let max_water = ctx.substance.max_water_fraction();

        let mut view = store.weathering_view(ctx.selection(Fate::SURFACE_WEATHERING))?;
        let updates = view
            .rows()
            .map(|row| -> Result<f64> {
                let wind = ctx.environment.wind_speed(ctx.model_time, row.position)?;
                Ok(mackay_uptake(row.frac_water, max_water, wind, self.rate_constant, dt))
            })
            .collect::<Result<Vec<f64>>>()?;

        for (k, frac_water) in updates.into_iter().enumerate() {
            view.set_frac_water(k, frac_water);
        }
        log::debug!("Mean water fraction {:.3}", view.mean_frac_water());
        Ok(())
    }
}
