//! Per-step snapshot of the run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use slick_elements::ElementStore;

use crate::Result;

/// Mass and status figures at the end of a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDiagnostics {
    /// Zero-based index of the completed step
    pub step: usize,
    /// Model time at the end of the step
    pub model_time: DateTime<Utc>,
    /// Cumulative mass removed per process, kg
    pub ledger: BTreeMap<String, f64>,
    /// Released initial mass, kg
    pub initial_mass: f64,
    pub mass_remaining: f64,
    pub released: usize,
    pub in_water: usize,
    pub on_land: usize,
    pub off_map: usize,
}

impl StepDiagnostics {
    pub fn capture(step: usize, model_time: DateTime<Utc>, store: &ElementStore) -> Result<Self> {
        let balance = store.mass_balance()?;
        let counts = store.status_counts()?;
        Ok(Self {
            step,
            model_time,
            ledger: store.ledger().snapshot(),
            initial_mass: balance.initial,
            mass_remaining: balance.remaining,
            released: counts.released(),
            in_water: counts.in_water,
            on_land: counts.on_land,
            off_map: counts.off_map,
        })
    }

    /// Mass booked to all processes
    pub fn mass_removed(&self) -> f64 {
        self.ledger.values().sum()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "step {} @ {}: {} released ({} in water, {} on land, {} off map), {:.1} of {:.1} kg remaining",
            self.step,
            self.model_time.format("%Y-%m-%d %H:%M"),
            self.released,
            self.in_water,
            self.on_land,
            self.off_map,
            self.mass_remaining,
            self.initial_mass
        );
        for (process, amount) in &self.ledger {
            summary.push_str(&format!(", {process} {amount:.1} kg"));
        }
        summary
    }
}
