//! Natural dispersion by breaking waves
//!
//! First-order loss `dm/dt = -k m` with
//! `k = C * D_ba^0.57 * F_wc * min(1, sqrt(nu_ref / nu))`, where `D_ba` is the
//! breaking-wave energy per unit area (Delvigne and Sweeney) and `F_wc` the
//! whitecap coverage.

use slick_elements::{ElementStore, Fate};

use super::Weatherer;
use crate::environment::Quantity;
use crate::error::non_negative;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::Result;

const GRAVITY: f64 = 9.81;
const DEFAULT_WATER_DENSITY: f64 = 1025.0;
/// Viscosity (m^2/s) above which thicker oil disperses more slowly
const REFERENCE_VISCOSITY: f64 = 1e-4;

/// Breaking-wave energy dissipation per unit area, J/m^2
pub fn breaking_wave_energy(water_density: f64, wave_height: f64) -> f64 {
    0.0034 * water_density * GRAVITY * wave_height * wave_height
}

/// Fraction of the sea surface covered by whitecaps
pub fn whitecap_fraction(wind_speed: f64) -> f64 {
    (3e-6 * wind_speed.max(0.0).powf(3.5)).min(1.0)
}

#[derive(Clone, Debug)]
pub struct NaturalDispersion {
    process: ProcessState,
    coefficient: f64,
}

impl NaturalDispersion {
    pub const LEDGER_KEY: &'static str = "natural_dispersion";
    /// 1/s per (J/m^2)^0.57
    pub const DEFAULT_COEFFICIENT: f64 = 2.0e-5;

    pub fn new() -> Self {
        Self {
            process: ProcessState::new("natural_dispersion", ActiveWindow::unbounded()),
            coefficient: Self::DEFAULT_COEFFICIENT,
        }
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Result<Self> {
        self.coefficient = non_negative("dispersion coefficient", coefficient)?;
        Ok(self)
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Loss rate (1/s) for the given sea state and oil viscosity
    pub fn rate(&self, water_density: f64, wave_height: f64, wind_speed: f64, viscosity: f64) -> f64 {
        let energy = breaking_wave_energy(water_density, wave_height);
        let viscosity_factor = if viscosity > 0.0 {
            (REFERENCE_VISCOSITY / viscosity).sqrt().min(1.0)
        } else {
            1.0
        };
        self.coefficient * energy.powf(0.57) * whitecap_fraction(wind_speed) * viscosity_factor
    }
}

impl Default for NaturalDispersion {
    fn default() -> Self {
        Self::new()
    }
}

impl Weatherer for NaturalDispersion {
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

        let mut view = store.weathering_view(ctx.selection(Fate::SURFACE_WEATHERING))?;
        if view.is_empty() {
            return Ok(());
        }
        let env = ctx.environment;
        let rates = view
            .rows()
            .map(|row| -> Result<f64> {
                let wave_height = env.require(Quantity::WaveHeight, ctx.model_time, row.position)?;
                let wind_speed = env.wind_speed(ctx.model_time, row.position)?;
                let water_density = env
                    .value_at(Quantity::WaterDensity, ctx.model_time, row.position)
                    .unwrap_or(DEFAULT_WATER_DENSITY);
                let viscosity = ctx.substance.viscosity(ctx.water_temperature(row.position));
                Ok(self.rate(water_density, wave_height, wind_speed, viscosity))
            })
            .collect::<Result<Vec<f64>>>()?;

        let dispersed = view.remove_each(Self::LEDGER_KEY, |k, row| {
            row.mass * (1.0 - (-rates[k] * dt).exp())
        });
        log::debug!("Naturally dispersed {:.3} kg", dispersed);
        Ok(())
    }
}
