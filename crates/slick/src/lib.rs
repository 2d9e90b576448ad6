//! # Slick - oil spill scenarios
//!
//! Loads RON scenario files, builds a [`slick_core::Model`] from them, runs it
//! and reports the mass budget.

pub mod config;
pub mod scenario;

pub use config::RunConfig;
pub use scenario::{ExecutionReport, ScenarioDefinition, ScenarioExecutor};

// Re-export the engine for convenience
pub use slick_core;
