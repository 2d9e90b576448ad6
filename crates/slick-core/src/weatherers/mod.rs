//! Weatherers: mass transformation of released elements
//!
//! Each weatherer acts on the rows carrying its fate bit and changes mass only
//! through a [`WeatheringView`](slick_elements::WeatheringView), which books
//! every removal to the weatherer's ledger entry. The model runs them in the
//! order they were added.
//!
//! Natural processes (evaporation, natural dispersion, emulsification) act on
//! all surface oil. Cleanup operations (skimming, burning, chemical dispersion)
//! first claim whole elements with their own fate bit, oldest first, then
//! remove mass from those elements only.

mod burn;
mod chem_dispersion;
mod cleanup;
mod dispersion;
mod emulsification;
mod evaporation;
mod skimmer;

pub use burn::{Burn, BURN_CONSTANT, MIN_THICKNESS};
pub use chem_dispersion::ChemicalDispersion;
pub use cleanup::{validate_efficiency, wind_efficiency, Efficiency, WIND_EFFICIENCY_SLOPE};
pub use dispersion::NaturalDispersion;
pub use emulsification::Emulsification;
pub use evaporation::Evaporation;
pub use skimmer::Skimmer;

use slick_elements::{ArrayId, ElementStore, Fate};

use crate::model::StepContext;
use crate::process::ProcessState;
use crate::Result;

/// Lifecycle of a weathering process
pub trait Weatherer {
    fn process(&self) -> &ProcessState;

    fn process_mut(&mut self) -> &mut ProcessState;

    fn name(&self) -> &str {
        &self.process().name
    }

    /// Ledger entry removed mass is booked to, `None` for processes that
    /// only transform elements
    fn ledger_key(&self) -> Option<&'static str>;

    /// Fate bits a row must carry to be weathered
    fn fate(&self) -> Fate {
        Fate::SURFACE_WEATHERING
    }

    /// Store columns this weatherer reads or writes
    fn required_arrays(&self) -> &'static [ArrayId] {
        ArrayId::WEATHERING
    }

    fn is_active(&self) -> bool {
        self.process().is_active()
    }

    /// Reset run-level state and register the ledger entry
    fn prepare_for_model_run(
        &mut self,
        store: &mut ElementStore,
        _ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process_mut().reset();
        if let Some(key) = self.ledger_key() {
            store.ledger_mut().register(key);
        }
        Ok(())
    }

    /// Decide activity for the step; cleanup operations also mark elements here
    fn prepare_for_model_step(
        &mut self,
        _store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process_mut()
            .prepare_for_model_step(ctx.model_time, ctx.time_step);
        Ok(())
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()>;

    fn model_step_is_done(&mut self, _store: &mut ElementStore) -> Result<()> {
        Ok(())
    }
}
