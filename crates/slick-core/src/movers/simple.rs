//! Uniform constant-velocity drift

use glam::DVec3;

use slick_elements::ElementStore;

use super::{in_water_moves, Mover};
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::projection::meters_to_degrees;
use crate::Result;

/// Moves every in-water element by `velocity * dt`
#[derive(Clone, Debug)]
pub struct SimpleMover {
    process: ProcessState,
    /// (east, north, down) in m/s
    pub velocity: DVec3,
}

impl SimpleMover {
    pub fn new(velocity: DVec3) -> Self {
        Self {
            process: ProcessState::new("simple_mover", ActiveWindow::unbounded()),
            velocity,
        }
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }
}

impl Mover for SimpleMover {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn get_move(&mut self, store: &ElementStore, _ctx: &StepContext<'_>) -> Result<Vec<DVec3>> {
        let meters = self.velocity * self.process.timestep();
        in_water_moves(store, |position| Ok(meters_to_degrees(meters, position.y)))
    }
}
