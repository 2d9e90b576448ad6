//! Masked weathering view
//!
//! A view is the only way weatherers change mass. Every removal is clamped to
//! the element's current mass and booked to the ledger in the same call, so
//! `ledger + remaining == released` holds by construction.

use glam::DVec3;

use crate::Ledger;

/// Snapshot of one selected element
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementRow {
    /// Row index in the store
    pub index: usize,
    pub position: DVec3,
    pub mass: f64,
    pub init_mass: f64,
    pub age: f64,
    pub frac_water: f64,
}

/// Rows selected by an element filter, with in-place mass access
pub struct WeatheringView<'a> {
    indices: Vec<usize>,
    positions: &'a [DVec3],
    mass: &'a mut [f64],
    init_mass: &'a [f64],
    age: &'a [f64],
    frac_water: &'a mut [f64],
    ledger: &'a mut Ledger,
}

impl<'a> WeatheringView<'a> {
    pub(crate) fn new(
        indices: Vec<usize>,
        positions: &'a [DVec3],
        mass: &'a mut [f64],
        init_mass: &'a [f64],
        age: &'a [f64],
        frac_water: &'a mut [f64],
        ledger: &'a mut Ledger,
    ) -> Self {
        Self {
            indices,
            positions,
            mass,
            init_mass,
            age,
            frac_water,
            ledger,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Store indices of the selected rows, oldest first
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The `k`-th selected row
    pub fn row(&self, k: usize) -> ElementRow {
        let i = self.indices[k];
        ElementRow {
            index: i,
            position: self.positions[i],
            mass: self.mass[i],
            init_mass: self.init_mass[i],
            age: self.age[i],
            frac_water: self.frac_water[i],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = ElementRow> + '_ {
        (0..self.indices.len()).map(|k| self.row(k))
    }

    pub fn total_mass(&self) -> f64 {
        self.indices.iter().map(|&i| self.mass[i]).sum()
    }

    pub fn total_init_mass(&self) -> f64 {
        self.indices.iter().map(|&i| self.init_mass[i]).sum()
    }

    /// Unweighted mean water fraction, zero for an empty view
    pub fn mean_frac_water(&self) -> f64 {
        if self.indices.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.indices.iter().map(|&i| self.frac_water[i]).sum();
        sum / self.indices.len() as f64
    }

    /// Centroid of the selected rows, `None` for an empty view
    pub fn mean_position(&self) -> Option<DVec3> {
        if self.indices.is_empty() {
            return None;
        }
        let sum: DVec3 = self.indices.iter().map(|&i| self.positions[i]).sum();
        Some(sum / self.indices.len() as f64)
    }

    /// Remove mass from every selected row and book the total to `process`.
    ///
    /// `amount` receives the selection position and a row snapshot and returns
    /// the mass to remove. Requests are clamped to `[0, mass]`; non-finite
    /// requests remove nothing. Returns the mass actually removed.
    pub fn remove_each(
        &mut self,
        process: &str,
        mut amount: impl FnMut(usize, &ElementRow) -> f64,
    ) -> f64 {
        let mut removed_total = 0.0;
        for k in 0..self.indices.len() {
            let row = self.row(k);
            let requested = amount(k, &row);
            if !requested.is_finite() {
                continue;
            }
            let removed = requested.max(0.0).min(row.mass);
            self.mass[row.index] -= removed;
            removed_total += removed;
        }
        self.ledger.add(process, removed_total);
        removed_total
    }

    /// Remove `amount` in total, split across rows by their share of current mass
    pub fn remove_by_mass_share(&mut self, process: &str, amount: f64) -> f64 {
        let total = self.total_mass();
        if total <= 0.0 || amount <= 0.0 {
            return 0.0;
        }
        let fraction = (amount / total).min(1.0);
        self.remove_each(process, |_, row| row.mass * fraction)
    }

    /// Set the water fraction of the `k`-th selected row, clamped to `[0, 1]`
    pub fn set_frac_water(&mut self, k: usize, value: f64) {
        let i = self.indices[k];
        self.frac_water[i] = value.clamp(0.0, 1.0);
    }

    pub fn ledger(&self) -> &Ledger {
        &*self.ledger
    }
}
