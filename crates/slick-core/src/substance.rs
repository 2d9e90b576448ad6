//! Oil properties consumed by releases and weatherers

use serde::{Deserialize, Serialize};

/// 15 °C, the temperature reference properties are quoted at
pub const REFERENCE_TEMPERATURE: f64 = 288.15;

/// Bulk properties of the spilled substance. Temperatures are in K.
pub trait Substance {
    fn name(&self) -> &str;

    /// Density in kg/m^3
    fn density(&self, temperature: f64) -> f64;

    /// Kinematic viscosity in m^2/s
    fn viscosity(&self, temperature: f64) -> f64;

    /// Temperature used when the environment has none
    fn reference_temperature(&self) -> f64 {
        REFERENCE_TEMPERATURE
    }

    /// Fingas coefficients `(a, b)` for `F = (a + b * T_c) * ln(t_min) / 100`
    fn evaporation_coefficients(&self) -> (f64, f64);

    /// Upper bound on the evaporated fraction of initial mass
    fn max_evaporable_fraction(&self) -> f64;

    /// Water content of a fully formed emulsion
    fn max_water_fraction(&self) -> f64;
}

/// Oil with linear thermal expansion and Andrade-type viscosity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oil {
    pub name: String,
    /// kg/m^3 at `reference_temperature`
    pub reference_density: f64,
    pub reference_temperature: f64,
    /// Fractional density change per K
    pub expansion_coefficient: f64,
    /// m^2/s at `reference_temperature`
    pub reference_viscosity: f64,
    /// K, steepness of the viscosity/temperature curve
    pub viscosity_activation: f64,
    pub fingas_a: f64,
    pub fingas_b: f64,
    pub max_evaporable_fraction: f64,
    pub max_water_fraction: f64,
}

impl Default for Oil {
    fn default() -> Self {
        Self {
            name: "medium crude".to_string(),
            reference_density: 900.0,
            reference_temperature: REFERENCE_TEMPERATURE,
            expansion_coefficient: 0.0008,
            reference_viscosity: 1.0e-4,
            viscosity_activation: 5000.0,
            fingas_a: 2.3,
            fingas_b: 0.045,
            max_evaporable_fraction: 0.35,
            max_water_fraction: 0.7,
        }
    }
}

impl Oil {
    pub fn new(name: impl Into<String>, reference_density: f64) -> Self {
        Self {
            name: name.into(),
            reference_density,
            ..Self::default()
        }
    }
}

impl Substance for Oil {
    fn name(&self) -> &str {
        &self.name
    }

    fn density(&self, temperature: f64) -> f64 {
        let dt = temperature - self.reference_temperature;
        self.reference_density * (1.0 - self.expansion_coefficient * dt)
    }

    fn viscosity(&self, temperature: f64) -> f64 {
        let exponent =
            self.viscosity_activation * (1.0 / temperature - 1.0 / self.reference_temperature);
        self.reference_viscosity * exponent.exp()
    }

    fn reference_temperature(&self) -> f64 {
        self.reference_temperature
    }

    fn evaporation_coefficients(&self) -> (f64, f64) {
        (self.fingas_a, self.fingas_b)
    }

    fn max_evaporable_fraction(&self) -> f64 {
        self.max_evaporable_fraction
    }

    fn max_water_fraction(&self) -> f64 {
        self.max_water_fraction
    }
}
