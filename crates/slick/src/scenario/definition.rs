//! Scenario definition and RON file loading

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use slick_core::{
    ActiveWindow, BoundingBoxMap, Burn, ChemicalDispersion, ConstantEnvironment, Efficiency,
    Emulsification, Evaporation, Model, ModelConfig, Mover, NaturalDispersion, Oil, RandomMover,
    ReleaseProfile, SimpleMover, Skimmer, Spill, TimeseriesEnvironment, Weatherer, WindMover,
};

use super::verification::VerificationCondition;

/// Top-level scenario definition loaded from RON files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Scenario name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Start time, time step and duration
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub environment: EnvironmentDefinition,

    /// Oil shared by all spills
    #[serde(default)]
    pub substance: Oil,

    #[serde(default)]
    pub map: MapDefinition,

    pub spills: Vec<SpillDefinition>,

    /// Movers, summed each step
    #[serde(default)]
    pub movers: Vec<MoverDefinition>,

    /// Weatherers, applied in this order
    #[serde(default)]
    pub weatherers: Vec<WeathererDefinition>,

    /// Checks to run after the scenario
    #[serde(default)]
    pub verify: Vec<VerificationCondition>,
}

/// Source of wind, water and wave conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvironmentDefinition {
    Constant(ConstantEnvironment),
    Timeseries(TimeseriesEnvironment),
}

impl Default for EnvironmentDefinition {
    fn default() -> Self {
        Self::Constant(ConstantEnvironment::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum MapDefinition {
    #[default]
    Ocean,
    BoundingBox(BoundingBoxMap),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpillDefinition {
    pub name: String,

    #[serde(default = "default_on")]
    pub on: bool,

    pub release: ReleaseProfile,

    /// Total amount in `units`
    pub amount: f64,

    /// Mass or volume unit, e.g. "kg", "bbl", "m^3"
    pub units: String,
}

fn default_on() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoverDefinition {
    /// Constant drift, m/s
    Simple {
        velocity: DVec3,
        #[serde(default)]
        window: ActiveWindow,
    },

    /// Horizontal diffusion, cm^2/s
    Random {
        diffusion_coef: f64,
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default)]
        window: ActiveWindow,
    },

    /// Wind drift as a fraction of the 10 m wind
    Wind {
        windage: f64,
        #[serde(default)]
        window: ActiveWindow,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeathererDefinition {
    Evaporation {
        #[serde(default)]
        window: ActiveWindow,
    },

    NaturalDispersion {
        #[serde(default)]
        coefficient: Option<f64>,
        #[serde(default)]
        window: ActiveWindow,
    },

    Emulsification {
        #[serde(default)]
        window: ActiveWindow,
    },

    Skimmer {
        amount: f64,
        units: String,
        efficiency: Efficiency,
        window: ActiveWindow,
    },

    Burn {
        area: f64,
        thickness: f64,
        #[serde(default = "default_area_units")]
        area_units: String,
        #[serde(default = "default_thickness_units")]
        thickness_units: String,
        #[serde(default)]
        efficiency: Efficiency,
        start: DateTime<Utc>,
    },

    ChemicalDispersion {
        fraction_sprayed: f64,
        efficiency: Efficiency,
        window: ActiveWindow,
    },
}

fn default_area_units() -> String {
    "m^2".to_string()
}

fn default_thickness_units() -> String {
    "m".to_string()
}

impl ScenarioDefinition {
    /// Load scenario from RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        let scenario = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON scenario: {}", path.display()))?;

        Ok(scenario)
    }

    /// Save scenario to RON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let ron = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize scenario to RON")?;

        std::fs::write(path.as_ref(), ron).with_context(|| {
            format!("Failed to write scenario file: {}", path.as_ref().display())
        })?;

        Ok(())
    }

    /// Assemble a model with every spill, mover and weatherer of the scenario
    pub fn build_model(&self) -> Result<Model> {
        let model = Model::new(self.model.clone())
            .with_context(|| format!("Invalid model settings in scenario '{}'", self.name))?
            .with_substance(self.substance.clone());

        let model = match &self.environment {
            EnvironmentDefinition::Constant(env) => model.with_environment(env.clone()),
            EnvironmentDefinition::Timeseries(env) => model.with_environment(env.clone()),
        };
        let mut model = match &self.map {
            MapDefinition::Ocean => model,
            MapDefinition::BoundingBox(map) => model.with_map(map.clone()),
        };

        for spill in &self.spills {
            model.add_spill(spill.build()?);
        }
        for (idx, mover) in self.movers.iter().enumerate() {
            let mover = mover
                .build()
                .with_context(|| format!("Invalid mover {}", idx))?;
            model.add_boxed_mover(mover);
        }
        for (idx, weatherer) in self.weatherers.iter().enumerate() {
            let weatherer = weatherer
                .build()
                .with_context(|| format!("Invalid weatherer {}", idx))?;
            model.add_boxed_weatherer(weatherer);
        }

        log::debug!(
            "Built scenario '{}': {} spills, {} movers, {} weatherers",
            self.name,
            self.spills.len(),
            self.movers.len(),
            self.weatherers.len()
        );
        Ok(model)
    }
}

impl SpillDefinition {
    pub fn build(&self) -> Result<Spill> {
        let mut spill = Spill::new(
            self.name.clone(),
            self.release.clone(),
            self.amount,
            &self.units,
        )
        .with_context(|| format!("Invalid spill '{}'", self.name))?;
        spill.on = self.on;
        Ok(spill)
    }
}

impl MoverDefinition {
    pub fn build(&self) -> Result<Box<dyn Mover>> {
        let mover: Box<dyn Mover> = match self {
            MoverDefinition::Simple { velocity, window } => {
                Box::new(SimpleMover::new(*velocity).with_window(*window))
            }
            MoverDefinition::Random {
                diffusion_coef,
                seed,
                window,
            } => {
                let mover = RandomMover::new(*diffusion_coef)?.with_window(*window);
                match seed {
                    Some(seed) => Box::new(mover.with_seed(*seed)),
                    None => Box::new(mover),
                }
            }
            MoverDefinition::Wind { windage, window } => {
                Box::new(WindMover::new(*windage)?.with_window(*window))
            }
        };
        Ok(mover)
    }
}

impl WeathererDefinition {
    pub fn build(&self) -> Result<Box<dyn Weatherer>> {
        let weatherer: Box<dyn Weatherer> = match self {
            WeathererDefinition::Evaporation { window } => {
                Box::new(Evaporation::new().with_window(*window))
            }
            WeathererDefinition::NaturalDispersion {
                coefficient,
                window,
            } => {
                let dispersion = NaturalDispersion::new().with_window(*window);
                match coefficient {
                    Some(k) => Box::new(dispersion.with_coefficient(*k)?),
                    None => Box::new(dispersion),
                }
            }
            WeathererDefinition::Emulsification { window } => {
                Box::new(Emulsification::new().with_window(*window))
            }
            WeathererDefinition::Skimmer {
                amount,
                units,
                efficiency,
                window,
            } => Box::new(Skimmer::new(*amount, units, *efficiency, *window)?),
            WeathererDefinition::Burn {
                area,
                thickness,
                area_units,
                thickness_units,
                efficiency,
                start,
            } => Box::new(
                Burn::new(*area, *thickness, *start)?
                    .with_units(area_units, thickness_units)?
                    .with_efficiency(*efficiency)?,
            ),
            WeathererDefinition::ChemicalDispersion {
                fraction_sprayed,
                efficiency,
                window,
            } => Box::new(ChemicalDispersion::new(
                *fraction_sprayed,
                *efficiency,
                *window,
            )?),
        };
        Ok(weatherer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use slick_core::Quantity;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample() -> ScenarioDefinition {
        ScenarioDefinition {
            name: "Test Scenario".to_string(),
            description: "A test scenario".to_string(),
            model: ModelConfig::new(start(), 900.0, 3600.0),
            environment: EnvironmentDefinition::Constant(
                ConstantEnvironment::new()
                    .with_wind(5.0, 270.0)
                    .with(Quantity::WaterTemperature, 290.0),
            ),
            substance: Oil::default(),
            map: MapDefinition::Ocean,
            spills: vec![SpillDefinition {
                name: "platform".to_string(),
                on: true,
                release: ReleaseProfile::point(10, start(), DVec3::new(-88.0, 28.5, 0.0)),
                amount: 100.0,
                units: "bbl".to_string(),
            }],
            movers: vec![MoverDefinition::Wind {
                windage: 0.03,
                window: ActiveWindow::unbounded(),
            }],
            weatherers: vec![WeathererDefinition::Evaporation {
                window: ActiveWindow::unbounded(),
            }],
            verify: vec![],
        }
    }

    #[test]
    fn test_scenario_serialization() {
        let scenario = sample();

        let ron = ron::ser::to_string_pretty(&scenario, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron.contains("Test Scenario"));

        let parsed: ScenarioDefinition = ron::from_str(&ron).unwrap();
        assert_eq!(parsed, scenario);
    }

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let ron = r#"(
            name: "minimal",
            spills: [
                (
                    name: "spill",
                    release: (
                        num_elements: 4,
                        release_time: "2014-01-01T00:00:00Z",
                        start_position: (0.0, 0.0, 0.0),
                    ),
                    amount: 10.0,
                    units: "kg",
                ),
            ],
        )"#;
        let scenario: ScenarioDefinition = ron::from_str(ron).unwrap();
        assert_eq!(scenario.model, ModelConfig::default());
        assert_eq!(scenario.map, MapDefinition::Ocean);
        assert!(scenario.spills[0].on);
        assert!(scenario.movers.is_empty());

        let model = scenario.build_model().unwrap();
        assert_eq!(model.spills().len(), 1);
    }

    #[test]
    fn test_build_model_components() {
        let model = sample().build_model().unwrap();
        assert_eq!(model.spills().len(), 1);
        assert_eq!(model.movers().len(), 1);
        assert_eq!(model.weatherers().len(), 1);
        assert_eq!(model.num_time_steps(), 4);
    }

    #[test]
    fn test_efficiency_forms() {
        let ron = r#"[
            Burn(area: 100.0, thickness: 0.05, start: "2014-01-01T03:00:00Z"),
            Skimmer(
                amount: 50.0,
                units: "bbl",
                efficiency: FromWind,
                window: (start: Some("2014-01-01T00:00:00Z"), stop: Some("2014-01-01T06:00:00Z")),
            ),
            ChemicalDispersion(
                fraction_sprayed: 0.2,
                efficiency: Fixed(0.5),
                window: (start: Some("2014-01-01T00:00:00Z"), stop: Some("2014-01-01T06:00:00Z")),
            ),
        ]"#;
        let weatherers: Vec<WeathererDefinition> = ron::from_str(ron).unwrap();

        assert!(matches!(
            weatherers[0],
            WeathererDefinition::Burn {
                efficiency: Efficiency::Fixed(e),
                ..
            } if e == 1.0
        ));
        assert!(matches!(
            weatherers[1],
            WeathererDefinition::Skimmer {
                efficiency: Efficiency::FromWind,
                ..
            }
        ));
        for weatherer in &weatherers {
            weatherer.build().unwrap();
        }
    }

    #[test]
    fn test_invalid_component_is_reported() {
        let mut scenario = sample();
        scenario.weatherers.push(WeathererDefinition::Skimmer {
            amount: 10.0,
            units: "kg".to_string(),
            efficiency: Efficiency::Fixed(1.5),
            window: ActiveWindow::unbounded(),
        });
        let err = scenario.build_model().err().unwrap();
        assert!(format!("{:#}", err).contains("Invalid weatherer 1"));

        let mut scenario = sample();
        scenario.spills[0].units = "m^2".to_string();
        assert!(scenario.build_model().is_err());
    }
}
