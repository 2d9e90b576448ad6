//! In-situ burning of a contained slick
//!
//! The burn consumes the oil/water layer inside a boom of fixed area. Its
//! thickness falls at `BURN_CONSTANT * (1 - frac_water)` m/s until only
//! `MIN_THICKNESS` is left, after which the burn stays out for the rest of the
//! run. Area and efficiency change how much mass burns, never how long.
//!
//! The burn ignites on the first active step that finds surface oil to claim.
//! Until then its thickness and duration stay untouched.

use chrono::{DateTime, Utc};

use slick_elements::{ElementStore, Fate};

use super::cleanup::Efficiency;
use super::Weatherer;
use crate::error::non_negative;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::units::{si_factor, UnitFamily};
use crate::Result;

/// Thickness (m) below which the slick no longer sustains a burn
pub const MIN_THICKNESS: f64 = 0.002;

/// Regression rate of the burning layer, m/s
pub const BURN_CONSTANT: f64 = 0.000058;

#[derive(Clone, Debug)]
pub struct Burn {
    process: ProcessState,
    area: f64,
    thickness: f64,
    area_units: String,
    thickness_units: String,
    efficiency: Efficiency,
    oilwater_thickness: f64,
    burn_duration: f64,
    density: f64,
    /// Claimed elements cover the target mass
    marked: bool,
    ignited: bool,
    /// Out for a reason other than reaching `MIN_THICKNESS`
    extinguished: bool,
}

impl Burn {
    pub const LEDGER_KEY: &'static str = "burned";

    /// Burn of `area` m^2 of oil `thickness` m thick, starting at `active_start`
    pub fn new(area: f64, thickness: f64, active_start: DateTime<Utc>) -> Result<Self> {
        non_negative("burn area", area)?;
        non_negative("burn thickness", thickness)?;
        Ok(Self {
            process: ProcessState::new("burn", ActiveWindow::starting_at(active_start)),
            area,
            thickness,
            area_units: "m^2".to_string(),
            thickness_units: "m".to_string(),
            efficiency: Efficiency::default(),
            oilwater_thickness: 0.0,
            burn_duration: 0.0,
            density: 0.0,
            marked: false,
            ignited: false,
            extinguished: false,
        })
    }

    /// Reinterpret area and thickness in other units
    pub fn with_units(mut self, area_units: &str, thickness_units: &str) -> Result<Self> {
        self.set_area_units(area_units)?;
        self.set_thickness_units(thickness_units)?;
        Ok(self)
    }

    pub fn with_efficiency(mut self, efficiency: impl Into<Efficiency>) -> Result<Self> {
        self.set_efficiency(efficiency)?;
        Ok(self)
    }

    /// Fails with `InvalidUnit` unless `units` is an area unit; the old units stay
    pub fn set_area_units(&mut self, units: &str) -> Result<()> {
        si_factor(units, UnitFamily::Area)?;
        self.area_units = units.to_string();
        Ok(())
    }

    /// Fails with `InvalidUnit` unless `units` is a length unit; the old units stay
    pub fn set_thickness_units(&mut self, units: &str) -> Result<()> {
        si_factor(units, UnitFamily::Length)?;
        self.thickness_units = units.to_string();
        Ok(())
    }

    /// Rejects fixed values outside `(0, 1]` and keeps the previous efficiency
    pub fn set_efficiency(&mut self, efficiency: impl Into<Efficiency>) -> Result<()> {
        self.efficiency = efficiency.into().validate()?;
        Ok(())
    }

    /// Move the start of the burn. A burn runs until the slick is too thin,
    /// so any stop time is dropped.
    pub fn set_window(&mut self, window: ActiveWindow) {
        if window.stop.is_some() {
            log::warn!("Burn '{}' ignores its active stop time", self.process.name);
        }
        self.process.set_window(ActiveWindow {
            start: window.start,
            stop: None,
        });
    }

    pub fn area_units(&self) -> &str {
        &self.area_units
    }

    pub fn thickness_units(&self) -> &str {
        &self.thickness_units
    }

    pub fn efficiency(&self) -> Efficiency {
        self.efficiency
    }

    /// True once the burn has claimed oil and started consuming it
    pub fn is_ignited(&self) -> bool {
        self.ignited
    }

    /// Current oil/water layer thickness, m
    pub fn oilwater_thickness(&self) -> f64 {
        self.oilwater_thickness
    }

    /// Seconds spent burning so far this run
    pub fn burn_duration(&self) -> f64 {
        self.burn_duration
    }

    pub fn area_m2(&self) -> Result<f64> {
        Ok(self.area * si_factor(&self.area_units, UnitFamily::Area)?)
    }

    pub fn thickness_m(&self) -> Result<f64> {
        Ok(self.thickness * si_factor(&self.thickness_units, UnitFamily::Length)?)
    }

    fn extinguish(&mut self) {
        log::warn!(
            "Burn '{}' cannot be sustained: the slick is all water",
            self.process.name
        );
        self.extinguished = true;
        self.process.deactivate();
    }

    fn is_burnt_out(&self) -> bool {
        self.extinguished || self.oilwater_thickness <= MIN_THICKNESS
    }
}

impl Weatherer for Burn {
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
        Fate::BURN
    }

    fn prepare_for_model_run(
        &mut self,
        store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        self.process.reset();
        store.ledger_mut().register(Self::LEDGER_KEY);
        self.oilwater_thickness = self.thickness_m()?;
        self.burn_duration = 0.0;
        self.marked = false;
        self.ignited = false;
        self.extinguished = false;
        self.density = ctx.substance.density(ctx.substance.reference_temperature());
        Ok(())
    }

    fn prepare_for_model_step(
        &mut self,
        store: &mut ElementStore,
        ctx: &StepContext<'_>,
    ) -> Result<()> {
        if self.is_burnt_out() {
            self.process.deactivate();
            return Ok(());
        }
        self.process
            .prepare_for_model_step(ctx.model_time, ctx.time_step);
        if !self.process.is_active() || self.marked {
            return Ok(());
        }

        let frac_water = {
            let surface = store.weathering_view(ctx.selection(Fate::SURFACE_WEATHERING))?;
            if surface.is_empty() {
                return Ok(());
            }
            surface.mean_frac_water()
        };
        if frac_water >= 1.0 {
            self.extinguish();
            return Ok(());
        }
        let target = self.area_m2()? * self.oilwater_thickness * (1.0 - frac_water) * self.density;
        let covered = store.mark_for(ctx.status_filter(), Fate::BURN, Fate::CLEANUP, target)?;
        self.marked = covered >= target;
        if !self.ignited && covered > 0.0 {
            self.ignited = true;
            log::info!(
                "Burn '{}' ignited: {:.1} kg marked for a {:.1} kg target",
                self.process.name,
                covered,
                target
            );
        }
        Ok(())
    }

    fn weather_elements(&mut self, store: &mut ElementStore, ctx: &StepContext<'_>) -> Result<()> {
        if !self.process.is_active() {
            return Ok(());
        }
        let area = self.area_m2()?;
        let mut view = store.weathering_view(ctx.selection(Fate::BURN))?;
        let position = match view.mean_position() {
            Some(position) => position,
            None => return Ok(()),
        };

        let frac_water = view.mean_frac_water();
        let rate = BURN_CONSTANT * (1.0 - frac_water);
        if rate <= 0.0 {
            self.extinguish();
            return Ok(());
        }
        let efficiency = self.efficiency.resolve(ctx, position)?;

        let timestep = self.process.timestep();
        let time_to_min = (self.oilwater_thickness - MIN_THICKNESS) / rate;
        let (burn_time, new_thickness) = if time_to_min <= timestep {
            (time_to_min, MIN_THICKNESS)
        } else {
            (timestep, self.oilwater_thickness - rate * timestep)
        };

        let burned = (self.oilwater_thickness - new_thickness)
            * (1.0 - frac_water)
            * area
            * self.density
            * efficiency;
        view.remove_by_mass_share(Self::LEDGER_KEY, burned);

        self.oilwater_thickness = new_thickness;
        self.burn_duration += burn_time;
        if self.is_burnt_out() {
            log::info!(
                "Burn '{}' out after {:.0} s",
                self.process.name,
                self.burn_duration
            );
        }
        Ok(())
    }

    fn model_step_is_done(&mut self, _store: &mut ElementStore) -> Result<()> {
        if self.is_burnt_out() {
            self.process.deactivate();
        }
        Ok(())
    }
}
