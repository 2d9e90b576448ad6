//! Verification conditions checked against the model after a run

use serde::{Deserialize, Serialize};
use slick_core::Model;

/// Conditions that can be verified against model state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VerificationCondition {
    // === MASS CHECKS ===
    /// Released mass equals remaining plus removed mass within a relative tolerance
    MassConserved { tolerance: f64 },

    /// Mass still on the elements, kg
    RemainingMassRange { min: f64, max: f64 },

    /// Mass booked to one process, kg
    LedgerRange { process: String, min: f64, max: f64 },

    // === ELEMENT CHECKS ===
    /// Number of released elements
    ReleasedCount { expected: usize },

    /// At least this many elements still in the water
    InWaterAtLeast { count: usize },

    /// At most this many elements beached
    OnLandAtMost { count: usize },

    // === LOGICAL OPERATORS ===
    /// All conditions must pass
    All {
        conditions: Vec<VerificationCondition>,
    },

    /// Condition must NOT pass
    Not {
        condition: Box<VerificationCondition>,
    },
}

/// Result of a verification check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub message: String,
    pub actual_value: Option<String>, // For debugging
}

impl VerificationResult {
    fn failed(message: String) -> Self {
        Self {
            passed: false,
            message,
            actual_value: None,
        }
    }
}

impl VerificationCondition {
    /// Evaluate condition against model state
    pub fn evaluate(&self, model: &Model) -> VerificationResult {
        match self {
            VerificationCondition::MassConserved { tolerance } => {
                match model.mass_balance() {
                    Ok(balance) => {
                        let discrepancy = balance.discrepancy();
                        let passed = discrepancy <= tolerance * balance.initial.max(1.0);
                        VerificationResult {
                            passed,
                            message: format!(
                                "Mass budget: released {:.3} kg, remaining {:.3} kg, removed {:.3} kg",
                                balance.initial, balance.remaining, balance.removed
                            ),
                            actual_value: Some(format!("{:e}", discrepancy)),
                        }
                    }
                    Err(e) => VerificationResult::failed(format!("Mass budget unavailable: {}", e)),
                }
            }

            VerificationCondition::RemainingMassRange { min, max } => {
                match model.mass_balance() {
                    Ok(balance) => {
                        let actual = balance.remaining;
                        VerificationResult {
                            passed: actual >= *min && actual <= *max,
                            message: format!(
                                "Remaining mass: expected {}-{} kg, got {:.3} kg",
                                min, max, actual
                            ),
                            actual_value: Some(actual.to_string()),
                        }
                    }
                    Err(e) => VerificationResult::failed(format!("Mass budget unavailable: {}", e)),
                }
            }

            VerificationCondition::LedgerRange { process, min, max } => {
                let ledger = model.store().ledger();
                if !ledger.contains(process) {
                    return VerificationResult::failed(format!(
                        "No ledger entry for '{}'",
                        process
                    ));
                }
                let actual = ledger.get(process);
                VerificationResult {
                    passed: actual >= *min && actual <= *max,
                    message: format!(
                        "Ledger '{}': expected {}-{} kg, got {:.3} kg",
                        process, min, max, actual
                    ),
                    actual_value: Some(actual.to_string()),
                }
            }

            VerificationCondition::ReleasedCount { expected } => match model.store().status_counts() {
                Ok(counts) => {
                    let actual = counts.released();
                    VerificationResult {
                        passed: actual == *expected,
                        message: format!("Released elements: expected {}, got {}", expected, actual),
                        actual_value: Some(actual.to_string()),
                    }
                }
                Err(e) => VerificationResult::failed(format!("Status unavailable: {}", e)),
            },

            VerificationCondition::InWaterAtLeast { count } => {
                match model.store().status_counts() {
                    Ok(counts) => VerificationResult {
                        passed: counts.in_water >= *count,
                        message: format!(
                            "Elements in water: expected at least {}, got {}",
                            count, counts.in_water
                        ),
                        actual_value: Some(counts.in_water.to_string()),
                    },
                    Err(e) => VerificationResult::failed(format!("Status unavailable: {}", e)),
                }
            }

            VerificationCondition::OnLandAtMost { count } => match model.store().status_counts() {
                Ok(counts) => VerificationResult {
                    passed: counts.on_land <= *count,
                    message: format!(
                        "Elements on land: expected at most {}, got {}",
                        count, counts.on_land
                    ),
                    actual_value: Some(counts.on_land.to_string()),
                },
                Err(e) => VerificationResult::failed(format!("Status unavailable: {}", e)),
            },

            VerificationCondition::All { conditions } => {
                let results: Vec<_> = conditions.iter().map(|c| c.evaluate(model)).collect();
                let failed: Vec<_> = results.iter().filter(|r| !r.passed).collect();
                VerificationResult {
                    passed: failed.is_empty(),
                    message: if failed.is_empty() {
                        format!("All {} conditions passed", conditions.len())
                    } else {
                        format!(
                            "{} of {} conditions failed: {}",
                            failed.len(),
                            conditions.len(),
                            failed
                                .iter()
                                .map(|r| r.message.as_str())
                                .collect::<Vec<_>>()
                                .join("; ")
                        )
                    },
                    actual_value: None,
                }
            }

            VerificationCondition::Not { condition } => {
                let inner = condition.evaluate(model);
                VerificationResult {
                    passed: !inner.passed,
                    message: format!("NOT ({})", inner.message),
                    actual_value: inner.actual_value,
                }
            }
        }
    }
}
