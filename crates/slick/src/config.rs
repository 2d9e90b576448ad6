//! Run configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `slick.ron` file (if exists)
//! 3. Environment variables prefixed with `SLICK_`
//!
//! Example environment variable: `SLICK_RUN__CONSERVATION_TOLERANCE=1e-6`

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Settings that apply to every scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSettings,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Checks performed while stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Verify the mass budget after every step
    pub check_conservation: bool,
    /// Relative tolerance for the mass budget check
    pub conservation_tolerance: f64,
    /// Log a step summary every N steps (0 disables)
    pub progress_interval: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            check_conservation: true,
            conservation_tolerance: 1e-9,
            progress_interval: 4,
        }
    }
}

/// Where reports go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for run reports
    pub directory: String,
    /// Write a RON report after each run
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "slick_output".to_string(),
            write_report: true,
        }
    }
}

impl RunConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `slick.ron` file (if exists)
    /// 3. Environment variables prefixed with `SLICK_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from("slick")
    }

    /// Same layering with an explicit config file name or path
    pub fn load_from(file: &str) -> Result<Self> {
        let defaults = Self::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("run.check_conservation", defaults.run.check_conservation)?
            .set_default(
                "run.conservation_tolerance",
                defaults.run.conservation_tolerance,
            )?
            .set_default(
                "run.progress_interval",
                defaults.run.progress_interval as i64,
            )?
            .set_default("output.directory", defaults.output.directory)?
            .set_default("output.write_report", defaults.output.write_report)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::with_name(file)
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (SLICK_OUTPUT__DIRECTORY, etc.)
            .add_source(Environment::with_prefix("SLICK").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.run.check_conservation);
        assert_eq!(config.run.conservation_tolerance, 1e-9);
        assert_eq!(config.run.progress_interval, 4);
        assert_eq!(config.output.directory, "slick_output");
        assert!(config.output.write_report);
    }

    #[test]
    fn test_load_config_with_defaults() {
        // Should load defaults when no config file exists
        let config = RunConfig::load_from("definitely_missing_slick_config")
            .expect("Failed to load config");
        assert_eq!(config.run.progress_interval, 4);
        assert_eq!(config.output.directory, "slick_output");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slick.ron");
        std::fs::write(
            &path,
            "(run: (check_conservation: false, conservation_tolerance: 0.001, progress_interval: 1))",
        )
        .unwrap();

        let config = RunConfig::load_from(path.to_str().unwrap()).unwrap();
        assert!(!config.run.check_conservation);
        assert_eq!(config.run.conservation_tolerance, 0.001);
        assert_eq!(config.run.progress_interval, 1);
        // Untouched sections keep their defaults
        assert_eq!(config.output, OutputConfig::default());
    }
}
