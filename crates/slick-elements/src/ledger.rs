//! Cumulative mass removed per weathering process

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ElementError, Result};

/// Mass (kg) removed so far, keyed by process name (`skimmed`, `burned`, ...)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an entry exists, starting at zero
    pub fn register(&mut self, process: &str) {
        self.entries.entry(process.to_string()).or_insert(0.0);
    }

    /// Add removed mass to a process entry. Negative amounts are ignored.
    pub fn add(&mut self, process: &str, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        *self.entries.entry(process.to_string()).or_insert(0.0) += amount;
    }

    /// Mass removed by a process, zero if it never ran
    pub fn get(&self, process: &str) -> f64 {
        self.entries.get(process).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, process: &str) -> bool {
        self.entries.contains_key(process)
    }

    /// Mass removed by all processes
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Copy of the current entries for diagnostics
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Mass accounting for all released elements
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBalance {
    /// Sum of `init_mass` over released elements
    pub initial: f64,
    /// Sum of `mass` over released elements
    pub remaining: f64,
    /// Sum of all ledger entries
    pub removed: f64,
}

impl MassBalance {
    /// Absolute discrepancy between released mass and remaining + removed
    pub fn discrepancy(&self) -> f64 {
        (self.removed + self.remaining - self.initial).abs()
    }

    /// Fails when the discrepancy exceeds `rel_tol` of the released mass
    pub fn check(&self, rel_tol: f64) -> Result<()> {
        if self.discrepancy() > rel_tol * self.initial.abs() {
            return Err(ElementError::ConservationViolation {
                initial: self.initial,
                remaining: self.remaining,
                removed: self.removed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_starts_at_zero() {
        let mut ledger = Ledger::new();
        ledger.register("skimmed");

        assert!(ledger.contains("skimmed"));
        assert_eq!(ledger.get("skimmed"), 0.0);
        assert_eq!(ledger.get("burned"), 0.0);
        assert!(!ledger.contains("burned"));
    }

    #[test]
    fn test_add_accumulates_and_ignores_negative() {
        let mut ledger = Ledger::new();
        ledger.add("burned", 10.0);
        ledger.add("burned", 5.0);
        ledger.add("burned", -3.0);
        ledger.add("skimmed", 2.5);

        assert_eq!(ledger.get("burned"), 15.0);
        assert_eq!(ledger.total(), 17.5);

        ledger.clear();
        assert_eq!(ledger.total(), 0.0);
    }

    #[test]
    fn test_mass_balance_check() {
        let balanced = MassBalance {
            initial: 1000.0,
            remaining: 700.0,
            removed: 300.0,
        };
        assert!(balanced.check(1e-6).is_ok());

        let leaking = MassBalance {
            initial: 1000.0,
            remaining: 700.0,
            removed: 299.0,
        };
        assert!(matches!(
            leaking.check(1e-6),
            Err(ElementError::ConservationViolation { .. })
        ));
    }

    #[test]
    fn test_empty_balance_is_conserved() {
        assert!(MassBalance::default().check(1e-6).is_ok());
    }
}
