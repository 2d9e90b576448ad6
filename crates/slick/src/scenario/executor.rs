//! Scenario execution engine

use anyhow::{Context, Result};
use std::time::Instant;

use slick_core::Model;

use super::definition::ScenarioDefinition;
use super::results::{ExecutionReport, MassBudget};
use crate::config::RunConfig;

/// Configuration for scenario executor
#[derive(Debug, Clone)]
pub struct ScenarioExecutorConfig {
    /// Verify the mass budget after every step
    pub check_conservation: bool,

    /// Relative tolerance for the mass budget check
    pub conservation_tolerance: f64,

    /// Log a step summary every N steps (0 disables)
    pub progress_interval: usize,

    /// Stop after this many steps even if the model has more
    pub max_steps: Option<usize>,
}

impl Default for ScenarioExecutorConfig {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for ScenarioExecutorConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            check_conservation: config.run.check_conservation,
            conservation_tolerance: config.run.conservation_tolerance,
            progress_interval: config.run.progress_interval,
            max_steps: None,
        }
    }
}

/// Runs scenarios step by step and collects reports
pub struct ScenarioExecutor {
    config: ScenarioExecutorConfig,

    /// Execution log
    log: Vec<String>,
}

impl ScenarioExecutor {
    /// Create new executor with default config
    pub fn new() -> Self {
        Self::with_config(ScenarioExecutorConfig::default())
    }

    /// Create new executor with custom config
    pub fn with_config(config: ScenarioExecutorConfig) -> Self {
        Self {
            config,
            log: Vec::new(),
        }
    }

    pub fn config(&self) -> &ScenarioExecutorConfig {
        &self.config
    }

    /// Build the scenario's model and run it
    pub fn execute_scenario(&mut self, scenario: &ScenarioDefinition) -> Result<ExecutionReport> {
        let mut model = scenario.build_model()?;
        self.execute_with_model(scenario, &mut model)
    }

    /// Run an already built model from its first step, then verify it
    pub fn execute_with_model(
        &mut self,
        scenario: &ScenarioDefinition,
        model: &mut Model,
    ) -> Result<ExecutionReport> {
        let start_time = Instant::now();
        let mut report = ExecutionReport::new(scenario.name.clone());
        self.log.clear();

        self.log(&format!("Starting scenario: {}", scenario.name));
        if !scenario.description.is_empty() {
            self.log(&format!("Description: {}", scenario.description));
        }

        model
            .prepare_for_model_run()
            .context("Failed to prepare model run")?;

        let num_steps = match self.config.max_steps {
            Some(max) => max.min(model.num_time_steps()),
            None => model.num_time_steps(),
        };
        self.log(&format!(
            "Running {} of {} steps ({} s each)",
            num_steps,
            model.num_time_steps(),
            model.config().time_step
        ));

        for _ in 0..num_steps {
            let diagnostics = model
                .step()
                .with_context(|| format!("Step {} failed", model.current_step()))?;

            if self.config.check_conservation {
                model
                    .check_conservation(self.config.conservation_tolerance)
                    .with_context(|| format!("Mass not conserved at step {}", diagnostics.step))?;
            }

            let interval = self.config.progress_interval;
            if interval > 0 && (diagnostics.step + 1) % interval == 0 {
                self.log(&diagnostics.summary());
            }
        }

        report.steps_executed = num_steps;
        report.diagnostics = model.diagnostics().to_vec();
        let balance = model.mass_balance().context("Failed to compute mass balance")?;
        report.mass_budget = MassBudget::new(&balance, model.store().ledger().snapshot());

        if !scenario.verify.is_empty() {
            self.log(&format!("Running {} verifications", scenario.verify.len()));
            for condition in &scenario.verify {
                let result = condition.evaluate(model);
                self.log(&format!(
                    "  {} {}",
                    if result.passed { "✓" } else { "✗" },
                    result.message
                ));

                if !result.passed {
                    report.verification_failures.push(result);
                }
            }
        }

        report.passed = report.verification_failures.is_empty();
        report.duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        self.log(&format!(
            "Scenario complete: {} ({} steps, {:.1}ms)",
            if report.passed { "PASSED" } else { "FAILED" },
            report.steps_executed,
            report.duration_ms
        ));
        self.log(&format!("  Mass budget: {}", report.mass_budget.summary()));
        report.log = self.log.clone();

        Ok(report)
    }

    fn log(&mut self, message: &str) {
        log::info!("{}", message);
        self.log.push(message.to_string());
    }
}

impl Default for ScenarioExecutor {
    fn default() -> Self {
        Self::new()
    }
}
