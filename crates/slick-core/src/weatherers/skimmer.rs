//! Mechanical recovery at a constant rate over a finite window

use slick_elements::{ElementStore, Fate};

use super::cleanup::Efficiency;
use super::Weatherer;
use crate::error::non_negative;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::units::{amount_family, amount_to_kg};
use crate::Result;

/// Removes `amount` of oil uniformly over its active window.
///
/// Per step the skimmer recovers `rate * timestep * efficiency`, shared by the
/// marked elements in proportion to their mass and reduced by each element's
/// water fraction.
#[derive(Clone, Debug)]
pub struct Skimmer {
    process: ProcessState,
    amount: f64,
    units: String,
    efficiency: Efficiency,
    window_seconds: f64,
    amount_kg: f64,
    rate: f64,
}

impl Skimmer {
    pub const LEDGER_KEY: &'static str = "skimmed";

    /// `window` must have a finite, positive duration; `units` a mass or volume unit
    pub fn new(
        amount: f64,
        units: &str,
        efficiency: impl Into<Efficiency>,
        window: ActiveWindow,
    ) -> Result<Self> {
        non_negative("skim amount", amount)?;
        amount_family(units)?;
        let efficiency = efficiency.into().validate()?;
        let window_seconds = window.require_finite()?;
        Ok(Self {
            process: ProcessState::new("skimmer", window),
            amount,
            units: units.to_string(),
            efficiency,
            window_seconds,
            amount_kg: 0.0,
            rate: 0.0,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn efficiency(&self) -> Efficiency {
        self.efficiency
    }

    /// Rejects fixed values outside `(0, 1]` and keeps the previous efficiency
    pub fn set_efficiency(&mut self, efficiency: impl Into<Efficiency>) -> Result<()> {
        self.efficiency = efficiency.into().validate()?;
        Ok(())
    }

    /// Replace the window; a window without a finite duration is rejected
    pub fn set_window(&mut self, window: ActiveWindow) -> Result<()> {
        self.window_seconds = window.require_finite()?;
        self.process.set_window(window);
        Ok(())
    }

    /// Removal rate in kg/s before efficiency, set by `prepare_for_model_run`
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Weatherer for Skimmer {
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
        Fate::SKIM
    }

    fn prepare_for_model_run(
        &mut self,
        store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process.reset();
        store.ledger_mut().register(Self::LEDGER_KEY);

        let density = ctx.substance.density(ctx.substance.reference_temperature());
        self.amount_kg = amount_to_kg(self.amount, &self.units, density)?;
        self.rate = self.amount_kg / self.window_seconds;
        Ok(())
    }

    fn prepare_for_model_step(
        &mut self,
        store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process
            .prepare_for_model_step(ctx.model_time, ctx.time_step);
        if self.process.is_active() {
            store.mark_for(ctx.status_filter(), Fate::SKIM, Fate::CLEANUP, self.amount_kg)?;
        }
        Ok(())
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()> {
        if !self.process.is_active() {
            return Ok(());
        }
        let mut view = store.weathering_view(ctx.selection(Fate::SKIM))?;
        let total = view.total_mass();
        let position = match view.mean_position() {
            Some(position) if total > 0.0 => position,
            _ => return Ok(()),
        };

        let efficiency = self.efficiency.resolve(ctx, position)?;
        let to_remove = self.rate * self.process.timestep() * efficiency;
        let skimmed = view.remove_each(Self::LEDGER_KEY, |_, row| {
            to_remove * row.mass / total * (1.0 - row.frac_water)
        });
        log::debug!(
            "Skimmed {:.3} kg from {} elements ({:.0} s active)",
            skimmed,
            view.len(),
            self.process.timestep()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{ConstantEnvironment, Quantity};
    use crate::process::add_seconds;
    use crate::substance::Oil;
    use crate::Error;
    use chrono::{DateTime, TimeZone, Utc};
    use glam::DVec3;
    use slick_elements::{ArrayId, ReleaseBatch};

    fn rel_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn window() -> ActiveWindow {
        let start = add_seconds(rel_time(), 900.0);
        ActiveWindow::between(start, add_seconds(start, 3600.0)).unwrap()
    }

    #[test]
    fn test_rate_is_amount_over_window() {
        let mut skimmer = Skimmer::new(3600.0, "kg", 0.3, window()).unwrap();
        let mut store = ElementStore::new();
        let env = ConstantEnvironment::new();
        let oil = Oil::default();
        let ctx = StepContext::new(rel_time(), 900.0, &env, &oil);

        skimmer.prepare_for_model_run(&mut store, &ctx).unwrap();
        assert_eq!(skimmer.rate(), 1.0);
        assert_eq!(store.ledger().get(Skimmer::LEDGER_KEY), 0.0);
        assert!(store.ledger().contains(Skimmer::LEDGER_KEY));
    }

    #[test]
    fn test_open_window_rejected() {
        assert!(matches!(
            Skimmer::new(100.0, "kg", 0.3, ActiveWindow::starting_at(rel_time())),
            Err(Error::InvalidActiveWindow { .. })
        ));
        assert!(Skimmer::new(100.0, "kg", 0.3, ActiveWindow::unbounded()).is_err());
    }

    #[test]
    fn test_invalid_units_and_amount() {
        assert!(matches!(
            Skimmer::new(100.0, "m", 0.3, window()),
            Err(Error::InvalidUnit { .. })
        ));
        assert!(Skimmer::new(-1.0, "kg", 0.3, window()).is_err());
    }

    #[test]
    fn test_efficiency_setter_keeps_old_value() {
        let mut skimmer = Skimmer::new(100.0, "bbl", 0.3, window()).unwrap();
        assert_eq!(skimmer.set_efficiency(1.5), Err(Error::InvalidEfficiency(1.5)));
        assert_eq!(skimmer.efficiency(), Efficiency::Fixed(0.3));
        skimmer.set_efficiency(0.9).unwrap();
        assert_eq!(skimmer.efficiency().fixed(), Some(0.9));
        skimmer.set_efficiency(Efficiency::FromWind).unwrap();
        assert_eq!(skimmer.efficiency(), Efficiency::FromWind);
    }

    #[test]
    fn test_efficiency_from_wind() {
        let start = rel_time();
        let window = ActiveWindow::between(start, add_seconds(start, 3600.0)).unwrap();
        let mut skimmer = Skimmer::new(3600.0, "kg", Efficiency::FromWind, window).unwrap();
        let mut store = ElementStore::with_arrays(ArrayId::WEATHERING.iter().copied());
        store
            .release(10, &ReleaseBatch::at_point(1000.0, DVec3::ZERO))
            .unwrap();
        let env = ConstantEnvironment::new()
            .with(Quantity::WindU, 4.0)
            .with(Quantity::WindV, 3.0);
        let oil = Oil::default();
        let ctx = StepContext::new(start, 900.0, &env, &oil);

        skimmer.prepare_for_model_run(&mut store, &ctx).unwrap();
        skimmer.prepare_for_model_step(&mut store, &ctx).unwrap();
        skimmer.weather_elements(&mut store, &ctx).unwrap();

        let skimmed = store.ledger().get(Skimmer::LEDGER_KEY);
        assert!((skimmed - 900.0 * 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_window_setter_keeps_old_window() {
        let mut skimmer = Skimmer::new(100.0, "kg", 0.3, window()).unwrap();
        assert!(skimmer
            .set_window(ActiveWindow::starting_at(rel_time()))
            .is_err());
        assert_eq!(skimmer.process().window(), window());
    }
}
