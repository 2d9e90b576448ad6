//! Horizontal random-walk diffusion

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use slick_elements::ElementStore;

use super::{in_water_moves, Mover};
use crate::error::non_negative;
use crate::model::StepContext;
use crate::process::{ActiveWindow, ProcessState};
use crate::projection::meters_to_degrees;
use crate::Result;

const DEFAULT_SEED: u64 = 0x5EED_0F_0011;

/// cm^2/s to m^2/s
const CM2_TO_M2: f64 = 1e-4;

/// Uniform random walk with variance `2 D dt` per horizontal axis.
///
/// Each axis draws `u` in `[-1, 1)` and moves `u * sqrt(6 D dt)` meters. The
/// generator belongs to the mover and restarts from `seed` every run, so runs
/// with the same seed reproduce exactly.
#[derive(Clone, Debug)]
pub struct RandomMover {
    process: ProcessState,
    diffusion_coef: f64,
    seed: u64,
    rng: Xoshiro256StarStar,
}

impl RandomMover {
    /// `diffusion_coef` in cm^2/s
    pub fn new(diffusion_coef: f64) -> Result<Self> {
        non_negative("diffusion coefficient", diffusion_coef)?;
        Ok(Self {
            process: ProcessState::new("random_mover", ActiveWindow::unbounded()),
            diffusion_coef,
            seed: DEFAULT_SEED,
            rng: Xoshiro256StarStar::seed_from_u64(DEFAULT_SEED),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = Xoshiro256StarStar::seed_from_u64(seed);
        self
    }

    pub fn with_window(mut self, window: ActiveWindow) -> Self {
        self.process.set_window(window);
        self
    }

    pub fn diffusion_coef(&self) -> f64 {
        self.diffusion_coef
    }

    /// Rejects negative values and keeps the previous coefficient
    pub fn set_diffusion_coef(&mut self, diffusion_coef: f64) -> Result<()> {
        self.diffusion_coef = non_negative("diffusion coefficient", diffusion_coef)?;
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Mover for RandomMover {
    fn process(&self) -> &ProcessState {
        &self.process
    }

    fn process_mut(&mut self) -> &mut ProcessState {
        &mut self.process
    }

    fn prepare_for_model_run(&mut self) {
        self.rng = Xoshiro256StarStar::seed_from_u64(self.seed);
    }

    fn get_move(&mut self, store: &ElementStore, _ctx: &StepContext<'_>) -> Result<Vec<DVec3>> {
        let dt = self.process.timestep();
        if self.diffusion_coef == 0.0 || dt == 0.0 {
            return in_water_moves(store, |_| Ok(DVec3::ZERO));
        }

        let scale = (6.0 * self.diffusion_coef * CM2_TO_M2 * dt).sqrt();
        let rng = &mut self.rng;
        in_water_moves(store, |position| {
            let meters = DVec3::new(
                rng.gen_range(-1.0_f64..1.0) * scale,
                rng.gen_range(-1.0_f64..1.0) * scale,
                0.0,
            );
            Ok(meters_to_degrees(meters, position.y))
        })
    }
}
