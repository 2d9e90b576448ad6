//! Movers: per-step displacement of in-water elements
//!
//! The model sums the moves of every mover and applies them once, so movers
//! only read the store. Displacements are `(d_lon, d_lat, d_depth)` in degrees
//! and meters.

mod random;
mod simple;
mod wind;

pub use random::RandomMover;
pub use simple::SimpleMover;
pub use wind::WindMover;

use glam::DVec3;

use slick_elements::ElementStore;

use crate::model::StepContext;
use crate::process::ProcessState;
use crate::Result;

/// Lifecycle of a transport process
pub trait Mover {
    fn process(&self) -> &ProcessState;

    fn process_mut(&mut self) -> &mut ProcessState;

    fn name(&self) -> &str {
        &self.process().name
    }

    /// Reset run-level state (RNG streams, caches)
    fn prepare_for_model_run(&mut self) {}

    /// Decide whether and for how long the mover runs this step
    fn prepare_for_model_step(&mut self, ctx: &StepContext<'_>) {
        self.process_mut()
            .prepare_for_model_step(ctx.model_time, ctx.time_step);
    }

    /// One displacement per store row, zero for rows not in water
    fn get_move(&mut self, store: &ElementStore, ctx: &StepContext<'_>) -> Result<Vec<DVec3>>;

    fn model_step_is_done(&mut self) {}
}

/// Moves for every row, computed from position for in-water rows only
pub(crate) fn in_water_moves(
    store: &ElementStore,
    mut delta: impl FnMut(DVec3) -> Result<DVec3>,
) -> Result<Vec<DVec3>> {
    let positions = store.positions()?;
    let status = store.status_codes()?;

    let mut moves = vec![DVec3::ZERO; store.len()];
    for (i, mv) in moves.iter_mut().enumerate() {
        if status[i].is_in_water() {
            *mv = delta(positions[i])?;
        }
    }
    Ok(moves)
}
