//! Execution results and reporting

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use slick_core::{MassBalance, StepDiagnostics};

use super::verification::VerificationResult;

/// Final mass budget of a run, kg
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBudget {
    /// Mass released by all spills
    pub released: f64,

    /// Mass still on the elements
    pub remaining: f64,

    /// Mass removed per process
    pub removed: BTreeMap<String, f64>,

    /// |released - remaining - removed|
    pub discrepancy: f64,
}

impl MassBudget {
    pub fn new(balance: &MassBalance, removed: BTreeMap<String, f64>) -> Self {
        Self {
            released: balance.initial,
            remaining: balance.remaining,
            removed,
            discrepancy: balance.discrepancy(),
        }
    }

    pub fn total_removed(&self) -> f64 {
        self.removed.values().sum()
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Released: {:.1} kg | Remaining: {:.1} kg",
            self.released, self.remaining
        );
        for (process, amount) in &self.removed {
            summary.push_str(&format!(" | {}: {:.1} kg", process, amount));
        }
        summary
    }
}

/// Report from scenario execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Scenario name
    pub scenario_name: String,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Overall pass/fail status
    pub passed: bool,

    /// Model steps executed
    pub steps_executed: usize,

    /// Wall-clock time of the run (milliseconds)
    pub duration_ms: f64,

    pub mass_budget: MassBudget,

    /// One entry per executed step
    pub diagnostics: Vec<StepDiagnostics>,

    /// Verification failures (empty if all passed)
    pub verification_failures: Vec<VerificationResult>,

    /// Execution log messages
    pub log: Vec<String>,
}

impl ExecutionReport {
    /// Create new execution report
    pub fn new(scenario_name: String) -> Self {
        Self {
            scenario_name,
            timestamp: chrono::Utc::now().to_rfc3339(),
            passed: false,
            steps_executed: 0,
            duration_ms: 0.0,
            mass_budget: MassBudget::default(),
            diagnostics: Vec::new(),
            verification_failures: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Check if all verifications passed
    pub fn success(&self) -> bool {
        self.verification_failures.is_empty()
    }

    /// Save report to RON file
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<()> {
        let ron = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize execution report to RON")?;

        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path.as_ref(), ron).with_context(|| {
            format!(
                "Failed to write execution report: {}",
                path.as_ref().display()
            )
        })?;

        Ok(())
    }

    /// Load report from RON file
    pub fn from_ron(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read report file: {}", path.as_ref().display()))?;

        let report = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON report: {}", path.as_ref().display()))?;

        Ok(report)
    }
}
