//! Time-stepping model
//!
//! One step runs, in order:
//! 1. spill releases
//! 2. mover preparation, summed displacement of in-water rows, map classification
//! 3. weatherer preparation, then mass transformation in configured order
//! 4. age increment for released rows and end-of-step hooks
//! 5. diagnostics snapshot

use chrono::{DateTime, TimeZone, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use slick_elements::{
    ArrayId, ElementFilter, ElementStore, Fate, MassBalance, StatusCode, StatusFilter,
};

use crate::diagnostics::StepDiagnostics;
use crate::environment::{ConstantEnvironment, Environment, Quantity};
use crate::map::{Map, Ocean};
use crate::movers::Mover;
use crate::process::checked_add_seconds;
use crate::release::Spill;
use crate::substance::{Oil, Substance};
use crate::weatherers::Weatherer;
use crate::{Error, Result};

/// Which released elements weatherers may act on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatheringEligibility {
    /// Only elements still in the water
    #[default]
    InWaterOnly,
    /// Beached and off-map elements keep weathering
    AllReleased,
}

/// Timing of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub start_time: DateTime<Utc>,
    /// Seconds
    pub time_step: f64,
    /// Seconds
    pub duration: f64,
    pub eligibility: WeatheringEligibility,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            start_time: Utc
                .with_ymd_and_hms(2014, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            time_step: 900.0,
            duration: 86_400.0,
            eligibility: WeatheringEligibility::InWaterOnly,
        }
    }
}

impl ModelConfig {
    pub fn new(start_time: DateTime<Utc>, time_step: f64, duration: f64) -> Self {
        Self {
            start_time,
            time_step,
            duration,
            ..Self::default()
        }
    }

    pub fn num_time_steps(&self) -> usize {
        (self.duration / self.time_step).ceil() as usize
    }

    fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "time step",
                reason: format!("{} s is not a positive duration", self.time_step),
            });
        }
        if !(self.duration >= 0.0 && self.duration.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "duration",
                reason: format!("{} s is not a finite, non-negative duration", self.duration),
            });
        }
        let end = self.num_time_steps() as f64 * self.time_step;
        if checked_add_seconds(self.start_time, end).is_none() {
            return Err(Error::InvalidParameter {
                name: "duration",
                reason: format!(
                    "a run of {} s from {} leaves the supported time range",
                    end, self.start_time
                ),
            });
        }
        Ok(())
    }
}

/// What movers and weatherers see during one step
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Start of the step
    pub model_time: DateTime<Utc>,
    pub time_step: f64,
    pub environment: &'a dyn Environment,
    pub substance: &'a dyn Substance,
    pub eligibility: WeatheringEligibility,
}

impl<'a> StepContext<'a> {
    pub fn new(
        model_time: DateTime<Utc>,
        time_step: f64,
        environment: &'a dyn Environment,
        substance: &'a dyn Substance,
    ) -> Self {
        Self {
            model_time,
            time_step,
            environment,
            substance,
            eligibility: WeatheringEligibility::default(),
        }
    }

    pub fn with_eligibility(mut self, eligibility: WeatheringEligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Status part of every weathering selection
    pub fn status_filter(&self) -> StatusFilter {
        match self.eligibility {
            WeatheringEligibility::InWaterOnly => StatusFilter::Only(StatusCode::InWater),
            WeatheringEligibility::AllReleased => StatusFilter::Released,
        }
    }

    /// Eligible rows carrying `fate`
    pub fn selection(&self, fate: Fate) -> ElementFilter {
        ElementFilter {
            status: self.status_filter(),
            fate: Some(fate),
        }
    }

    /// Water temperature (K) at `position`, the substance reference
    /// temperature where the environment has none
    pub fn water_temperature(&self, position: DVec3) -> f64 {
        self.environment
            .value_at(Quantity::WaterTemperature, self.model_time, position)
            .unwrap_or_else(|| self.substance.reference_temperature())
    }
}

/// A configured simulation: element store, spills, movers and weatherers
pub struct Model {
    config: ModelConfig,
    store: ElementStore,
    spills: Vec<Spill>,
    movers: Vec<Box<dyn Mover>>,
    weatherers: Vec<Box<dyn Weatherer>>,
    environment: Box<dyn Environment>,
    substance: Box<dyn Substance>,
    map: Box<dyn Map>,
    diagnostics: Vec<StepDiagnostics>,
    current_step: usize,
    model_time: DateTime<Utc>,
    prepared: bool,
    /// Step that failed partway through, if any
    failed_step: Option<usize>,
}

impl Model {
    /// Empty model over open ocean with no environment data and the default oil
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let model_time = config.start_time;
        Ok(Self {
            config,
            store: ElementStore::new(),
            spills: Vec::new(),
            movers: Vec::new(),
            weatherers: Vec::new(),
            environment: Box::new(ConstantEnvironment::new()),
            substance: Box::new(Oil::default()),
            map: Box::new(Ocean),
            diagnostics: Vec::new(),
            current_step: 0,
            model_time,
            prepared: false,
            failed_step: None,
        })
    }

    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Box::new(environment);
        self.prepared = false;
        self
    }

    pub fn with_substance(mut self, substance: impl Substance + 'static) -> Self {
        self.substance = Box::new(substance);
        self.prepared = false;
        self
    }

    pub fn with_map(mut self, map: impl Map + 'static) -> Self {
        self.map = Box::new(map);
        self.prepared = false;
        self
    }

    pub fn add_spill(&mut self, spill: Spill) {
        self.spills.push(spill);
        self.prepared = false;
    }

    pub fn add_mover(&mut self, mover: impl Mover + 'static) {
        self.add_boxed_mover(Box::new(mover));
    }

    pub fn add_boxed_mover(&mut self, mover: Box<dyn Mover>) {
        self.movers.push(mover);
        self.prepared = false;
    }

    /// Weatherers run in the order they are added
    pub fn add_weatherer(&mut self, weatherer: impl Weatherer + 'static) {
        self.add_boxed_weatherer(Box::new(weatherer));
    }

    pub fn add_boxed_weatherer(&mut self, weatherer: Box<dyn Weatherer>) {
        self.weatherers.push(weatherer);
        self.prepared = false;
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn spills(&self) -> &[Spill] {
        &self.spills
    }

    pub fn movers(&self) -> &[Box<dyn Mover>] {
        &self.movers
    }

    pub fn weatherers(&self) -> &[Box<dyn Weatherer>] {
        &self.weatherers
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn substance(&self) -> &dyn Substance {
        self.substance.as_ref()
    }

    pub fn diagnostics(&self) -> &[StepDiagnostics] {
        &self.diagnostics
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Start of the next step
    pub fn model_time(&self) -> DateTime<Utc> {
        self.model_time
    }

    pub fn num_time_steps(&self) -> usize {
        self.config.num_time_steps()
    }

    pub fn is_complete(&self) -> bool {
        self.current_step >= self.num_time_steps()
    }

    /// Size the store for every component and reset all run state
    pub fn prepare_for_model_run(&mut self) -> Result<()> {
        let Self {
            config,
            store,
            spills,
            movers,
            weatherers,
            environment,
            substance,
            diagnostics,
            current_step,
            model_time,
            prepared,
            ..
        } = self;

        let mut arrays: BTreeSet<ArrayId> = ArrayId::DEFAULT.iter().copied().collect();
        for weatherer in weatherers.iter() {
            arrays.extend(weatherer.required_arrays().iter().copied());
        }
        store.prepare_for_model_run(&arrays);
        store.ensure_len(spills.iter().map(Spill::num_elements).sum());

        for spill in spills.iter_mut() {
            spill.prepare_for_model_run(substance.as_ref())?;
        }
        for mover in movers.iter_mut() {
            mover.prepare_for_model_run();
        }

        let ctx = StepContext::new(
            config.start_time,
            config.time_step,
            environment.as_ref(),
            substance.as_ref(),
        )
        .with_eligibility(config.eligibility);
        for weatherer in weatherers.iter_mut() {
            weatherer.prepare_for_model_run(store, &ctx)?;
        }

        *model_time = config.start_time;
        *current_step = 0;
        diagnostics.clear();
        *prepared = true;

        log::info!(
            "Prepared run: {} steps of {} s, {} elements, {} movers, {} weatherers",
            config.num_time_steps(),
            config.time_step,
            store.len(),
            movers.len(),
            weatherers.len()
        );
        Ok(())
    }

    /// Step that failed partway through; stepping is refused until `rewind`
    pub fn failed_step(&self) -> Option<usize> {
        self.failed_step
    }

    /// Advance one time step.
    ///
    /// An error from a spill, mover or weatherer leaves the step half applied,
    /// so every later call fails with `StepFailed` until the model is rewound.
    pub fn step(&mut self) -> Result<StepDiagnostics> {
        if let Some(step) = self.failed_step {
            return Err(Error::StepFailed(step));
        }
        if !self.prepared {
            self.prepare_for_model_run()?;
        }
        if self.is_complete() {
            return Err(Error::RunComplete(self.current_step));
        }

        let step = self.current_step;
        match self.advance() {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                log::error!("Step {} failed: {}", step, err);
                self.failed_step = Some(step);
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<StepDiagnostics> {
        let Self {
            config,
            store,
            spills,
            movers,
            weatherers,
            environment,
            substance,
            map,
            diagnostics,
            current_step,
            model_time,
            ..
        } = self;

        let time_step = config.time_step;
        let step_end = checked_add_seconds(*model_time, time_step).ok_or_else(|| {
            Error::InvalidParameter {
                name: "time step",
                reason: format!("step from {} leaves the supported time range", model_time),
            }
        })?;
        let ctx = StepContext::new(*model_time, time_step, environment.as_ref(), substance.as_ref())
            .with_eligibility(config.eligibility);

        for spill in spills.iter_mut() {
            let n = spill.num_elements_to_release(ctx.model_time, time_step);
            if n == 0 {
                continue;
            }
            let batch = spill.release_batch(n);
            let range = store.release(n, &batch)?;
            spill.mark_released(n);
            log::debug!("Spill '{}' released elements {:?}", spill.name, range);
        }

        for mover in movers.iter_mut() {
            mover.prepare_for_model_step(&ctx);
        }
        if !movers.is_empty() {
            let mut total = vec![DVec3::ZERO; store.len()];
            for mover in movers.iter_mut() {
                let deltas = mover.get_move(store, &ctx)?;
                for (sum, delta) in total.iter_mut().zip(deltas) {
                    *sum += delta;
                }
            }
            store.apply_displacement(&total)?;
        }
        let reclassified = store.reclassify_in_water(|position| map.status_at(position))?;
        if reclassified > 0 {
            log::debug!("{} elements left the water", reclassified);
        }
        for mover in movers.iter_mut() {
            mover.model_step_is_done();
        }

        for weatherer in weatherers.iter_mut() {
            weatherer.prepare_for_model_step(store, &ctx)?;
        }
        for weatherer in weatherers.iter_mut() {
            weatherer.weather_elements(store, &ctx)?;
        }
        for weatherer in weatherers.iter_mut() {
            weatherer.model_step_is_done(store)?;
        }

        store.age_released(time_step)?;

        let step = *current_step;
        *current_step += 1;
        *model_time = step_end;

        let snapshot = StepDiagnostics::capture(step, *model_time, store)?;
        log::debug!("{}", snapshot.summary());
        diagnostics.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Step until all configured steps are done
    pub fn run(&mut self) -> Result<&[StepDiagnostics]> {
        if !self.prepared {
            self.prepare_for_model_run()?;
        }
        while !self.is_complete() {
            self.step()?;
        }
        log::info!(
            "Run complete after {} steps at {}",
            self.current_step,
            self.model_time
        );
        Ok(&self.diagnostics)
    }

    /// Back to the start time with an empty store and fresh component state
    pub fn rewind(&mut self) -> Result<()> {
        self.failed_step = None;
        self.store.rewind();
        for spill in &mut self.spills {
            spill.rewind();
        }
        self.prepared = false;
        self.prepare_for_model_run()
    }

    pub fn mass_balance(&self) -> Result<MassBalance> {
        Ok(self.store.mass_balance()?)
    }

    /// `ConservationViolation` if ledger and remaining mass drift from the
    /// released mass by more than `rel_tol`
    pub fn check_conservation(&self, rel_tol: f64) -> Result<MassBalance> {
        Ok(self.store.check_conservation(rel_tol)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movers::SimpleMover;
    use crate::process::add_seconds;
    use crate::release::ReleaseProfile;
    use crate::weatherers::{Evaporation, NaturalDispersion};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn point_spill(n: usize) -> Spill {
        Spill::new(
            "spill",
            ReleaseProfile::point(n, start(), DVec3::ZERO),
            1000.0,
            "kg",
        )
        .unwrap()
    }

    #[test]
    fn test_num_time_steps_rounds_up() {
        assert_eq!(ModelConfig::new(start(), 900.0, 3600.0).num_time_steps(), 4);
        assert_eq!(ModelConfig::new(start(), 900.0, 3601.0).num_time_steps(), 5);
        assert_eq!(ModelConfig::new(start(), 900.0, 0.0).num_time_steps(), 0);
    }

    #[test]
    fn test_invalid_time_step() {
        assert!(Model::new(ModelConfig::new(start(), 0.0, 3600.0)).is_err());
        assert!(Model::new(ModelConfig::new(start(), 60.0, -1.0)).is_err());
    }

    #[test]
    fn test_out_of_range_run_is_rejected() {
        for config in [
            ModelConfig::new(start(), 900.0, 1e15),
            ModelConfig::new(start(), 1e15, 1.0),
        ] {
            assert!(matches!(
                Model::new(config),
                Err(Error::InvalidParameter {
                    name: "duration",
                    ..
                })
            ));
        }
        assert!(Model::new(ModelConfig::new(start(), 3600.0, 10.0 * 365.0 * 86_400.0)).is_ok());
    }

    #[test]
    fn test_failed_step_is_not_applied_twice() {
        let env = ConstantEnvironment::new().with(Quantity::WaterTemperature, 288.15);
        let mut model = Model::new(ModelConfig::new(start(), 900.0, 3600.0))
            .unwrap()
            .with_environment(env);
        model.add_spill(point_spill(4));
        model.add_mover(SimpleMover::new(DVec3::new(1.0, 0.0, 0.0)));
        model.add_weatherer(Evaporation::new());
        model.add_weatherer(NaturalDispersion::new());

        assert!(matches!(
            model.step(),
            Err(Error::EnvironmentDataMissing {
                quantity: Quantity::WaveHeight,
                ..
            })
        ));
        assert_eq!(model.failed_step(), Some(0));
        let positions = model.store().positions().unwrap().to_vec();
        let evaporated = model.store().ledger().get(Evaporation::LEDGER_KEY);
        assert!(evaporated > 0.0);

        assert!(matches!(model.step(), Err(Error::StepFailed(0))));
        assert!(matches!(model.run(), Err(Error::StepFailed(0))));
        assert_eq!(model.current_step(), 0);
        assert_eq!(model.store().positions().unwrap(), positions.as_slice());
        assert_eq!(model.store().ledger().get(Evaporation::LEDGER_KEY), evaporated);

        let env = ConstantEnvironment::new()
            .with(Quantity::WaterTemperature, 288.15)
            .with(Quantity::WaveHeight, 1.0)
            .with_wind(5.0, 270.0);
        let mut model = model.with_environment(env);
        model.rewind().unwrap();
        assert_eq!(model.failed_step(), None);
        assert_eq!(model.run().unwrap().len(), 4);
    }

    #[test]
    fn test_step_advances_time_and_ages() {
        let mut model = Model::new(ModelConfig::new(start(), 900.0, 1800.0)).unwrap();
        model.add_spill(point_spill(4));

        let diag = model.step().unwrap();
        assert_eq!(diag.step, 0);
        assert_eq!(diag.released, 4);
        assert_eq!(diag.model_time, add_seconds(start(), 900.0));
        assert_eq!(model.store().age().unwrap(), &[900.0; 4]);

        model.step().unwrap();
        assert!(model.is_complete());
        assert!(matches!(model.step(), Err(Error::RunComplete(2))));
    }

    #[test]
    fn test_rewind_restores_initial_state() {
        let mut model = Model::new(ModelConfig::new(start(), 900.0, 3600.0)).unwrap();
        model.add_spill(point_spill(3));
        model.add_mover(SimpleMover::new(DVec3::new(1.0, 0.0, 0.0)));
        model.run().unwrap();

        model.rewind().unwrap();
        assert_eq!(model.current_step(), 0);
        assert_eq!(model.model_time(), start());
        assert_eq!(model.store().num_released(), 0);
        assert!(model.diagnostics().is_empty());
        assert_eq!(model.spills()[0].num_released(), 0);

        let first = model.run().unwrap().to_vec();
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_status_filter_follows_eligibility() {
        let env = ConstantEnvironment::new();
        let oil = Oil::default();
        let ctx = StepContext::new(start(), 60.0, &env, &oil);
        assert_eq!(ctx.status_filter(), StatusFilter::Only(StatusCode::InWater));
        let ctx = ctx.with_eligibility(WeatheringEligibility::AllReleased);
        assert_eq!(ctx.status_filter(), StatusFilter::Released);
        assert_eq!(ctx.water_temperature(DVec3::ZERO), oil.reference_temperature());
    }
}
