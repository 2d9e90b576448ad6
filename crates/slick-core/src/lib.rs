//! Oil particle transport and weathering
//!
//! Builds on the element store from `slick-elements` with:
//! - Release scheduling (Spill, ReleaseProfile)
//! - Movers that displace in-water elements (SimpleMover, RandomMover, WindMover)
//! - Weatherers that remove or transform mass (Evaporation, NaturalDispersion,
//!   Emulsification, Skimmer, Burn, ChemicalDispersion)
//! - The time-stepping Model that drives them in a fixed order

pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod map;
pub mod model;
pub mod movers;
pub mod process;
pub mod projection;
pub mod release;
pub mod substance;
pub mod units;
pub mod weatherers;

// Re-export element types so downstream crates need a single dependency
pub use slick_elements::{
    ArrayId, ElementError, ElementFilter, ElementRow, ElementStore, Fate, Ledger, MassBalance,
    ReleaseBatch, StatusCode, StatusCounts, StatusFilter, WeatheringView,
};

pub use diagnostics::StepDiagnostics;
pub use environment::{ConstantEnvironment, Environment, Quantity, TimeseriesEnvironment};
pub use error::{Error, Result};
pub use map::{BoundingBoxMap, LonLatBox, Map, Ocean};
pub use model::{Model, ModelConfig, StepContext, WeatheringEligibility};
pub use movers::{Mover, RandomMover, SimpleMover, WindMover};
pub use process::{ActiveWindow, ProcessState};
pub use release::{ReleaseProfile, Spill};
pub use substance::{Oil, Substance};
pub use units::UnitFamily;
pub use weatherers::{
    Burn, ChemicalDispersion, Efficiency, Emulsification, Evaporation, NaturalDispersion, Skimmer,
    Weatherer,
};
