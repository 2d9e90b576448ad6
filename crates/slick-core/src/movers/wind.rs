//! Windage drift

use glam::DVec3;

use slick_elements::ElementStore;

use super::{in_water_moves, Mover};
use crate::environment::Quantity;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::projection::meters_to_degrees;
use crate::{Error, Result};

/// Largest windage the mover accepts
pub const MAX_WINDAGE: f64 = 0.1;

/// Pushes surface oil with a fraction of the 10 m wind
#[derive(Clone, Debug)]
pub struct WindMover {
    process: ProcessState,
    windage: f64,
}

impl WindMover {
    pub fn new(windage: f64) -> Result<Self> {
        Ok(Self {
            process: ProcessState::new("wind_mover", ActiveWindow::unbounded()),
            windage: validate_windage(windage)?,
        })
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }

    pub fn windage(&self) -> f64 {
        self.windage
    }

    pub fn set_windage(&mut self, windage: f64) -> Result<()> {
        self.windage = validate_windage(windage)?;
        Ok(())
    }
}

fn validate_windage(windage: f64) -> Result<f64> {
    if !(0.0..=MAX_WINDAGE).contains(&windage) {
        return Err(Error::InvalidParameter {
            name: "windage",
            reason: format!("{windage} is outside [0, {MAX_WINDAGE}]"),
        });
    }
    Ok(windage)
}

impl Mover for WindMover {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn get_move(&mut self, store: &ElementStore, ctx: &StepContext<'_>) -> Result<Vec<DVec3>> {
        let dt = self.process.timestep();
        if dt == 0.0 {
            return in_water_moves(store, |_| Ok(DVec3::ZERO));
        }

        let scale = self.windage * dt;
        let env = ctx.environment;
        in_water_moves(store, |position| {
            let u = env.require(Quantity::WindU, ctx.model_time, position)?;
            let v = env.require(Quantity::WindV, ctx.model_time, position)?;
            Ok(meters_to_degrees(DVec3::new(u, v, 0.0) * scale, position.y))
        })
    }
}
