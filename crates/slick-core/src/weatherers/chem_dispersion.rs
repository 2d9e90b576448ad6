//! Dispersant application

use slick_elements::{ElementStore, Fate};

use super::cleanup::{validate_fraction, Efficiency};
use super::Weatherer;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::Result;

/// Sprays `fraction_sprayed` of the surface oil on the first active step that
/// finds any, then disperses `efficiency` of it at a constant rate over what
/// is left of the window
#[derive(Clone, Debug)]
pub struct ChemicalDispersion {
    process: ProcessState,
    fraction_sprayed: f64,
    efficiency: Efficiency,
    window_seconds: f64,
    rate: f64,
    sprayed: bool,
}

impl ChemicalDispersion {
    pub const LEDGER_KEY: &'static str = "chem_dispersed";

    pub fn new(
        fraction_sprayed: f64,
        efficiency: impl Into<Efficiency>,
        window: ActiveWindow,
    ) -> Result<Self> {
        let fraction_sprayed = validate_fraction("fraction sprayed", fraction_sprayed)?;
        let efficiency = efficiency.into().validate()?;
        let window_seconds = window.require_finite()?;
        Ok(Self {
            process: ProcessState::new("chemical_dispersion", window),
            fraction_sprayed,
            efficiency,
            window_seconds,
            rate: 0.0,
            sprayed: false,
        })
    }

    pub fn fraction_sprayed(&self) -> f64 {
        self.fraction_sprayed
    }

    pub fn efficiency(&self) -> Efficiency {
        self.efficiency
    }

    /// Rejects fixed values outside `(0, 1]` and keeps the previous efficiency
    pub fn set_efficiency(&mut self, efficiency: impl Into<Efficiency>) -> Result<()> {
        self.efficiency = efficiency.into().validate()?;
        Ok(())
    }

    /// Sprayed mass per second before efficiency, zero until the spray
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_sprayed(&self) -> bool {
        self.sprayed
    }
}

impl Weatherer for ChemicalDispersion {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn ledger_key(&self) -> Option<&'static str> {
        Some(Self::LEDGER_KEY)
    }

    fn fate(&self) -> Fate {
        Fate::DISPERSE
    }

    fn prepare_for_model_run(
        &mut self,
        store: &mut ElementStore,
        _ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process.reset();
        store.ledger_mut().register(Self::LEDGER_KEY);
        self.rate = 0.0;
        self.sprayed = false;
        Ok(())
    }

    fn prepare_for_model_step(
        &mut self,
        store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process
            .prepare_for_model_step(ctx.model_time, ctx.time_step);
        if !self.process.is_active() || self.sprayed {
            return Ok(());
        }

        let surface_mass = store
            .weathering_view(ctx.selection(Fate::SURFACE_WEATHERING))?
            .total_mass();
        if surface_mass <= 0.0 {
            return Ok(());
        }
        let target = self.fraction_sprayed * surface_mass;
        let covered = store.mark_for(ctx.status_filter(), Fate::DISPERSE, Fate::CLEANUP, target)?;
        if covered <= 0.0 {
            return Ok(());
        }

        let remaining = self
            .process
            .window()
            .overlap_seconds(ctx.model_time, self.window_seconds);
        self.rate = target / remaining;
        self.sprayed = true;
        log::info!(
            "Dispersant sprayed on {:.1} kg, {:.4} kg/s over {:.0} s",
            target,
            self.rate,
            remaining
        );
        Ok(())
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()> {
        if !self.process.is_active() {
            return Ok(());
        }
        let mut view = store.weathering_view(ctx.selection(Fate::DISPERSE))?;
        let position = match view.mean_position() {
            Some(position) => position,
            None => return Ok(()),
        };
        let efficiency = self.efficiency.resolve(ctx, position)?;
        let amount = self.rate * self.process.timestep() * efficiency;
        let dispersed = view.remove_by_mass_share(Self::LEDGER_KEY, amount);
        log::debug!("Chemically dispersed {:.3} kg", dispersed);
        Ok(())
    }
}
