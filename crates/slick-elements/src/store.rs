//! Columnar element store
//!
//! Every element is a row across parallel arrays. Rows are never reordered or
//! deleted: release flips the oldest unreleased rows to in-water, terminal
//! statuses only mark them. Indices therefore stay valid for a whole run.

use glam::DVec3;
use std::collections::BTreeSet;
use std::ops::Range;

use crate::view::WeatheringView;
use crate::{ArrayId, ElementError, Fate, Ledger, MassBalance, Result, StatusCode, StatusCounts};

/// Values stamped onto a batch of newly released elements
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReleaseBatch {
    pub mass_per_element: f64,
    /// Position of the first element in the batch
    pub start_position: DVec3,
    /// Position of the last element; the rest are spaced evenly in between
    pub end_position: DVec3,
    pub fate: Fate,
}

impl ReleaseBatch {
    /// All elements at one point, eligible for surface weathering
    pub fn at_point(mass_per_element: f64, position: DVec3) -> Self {
        Self {
            mass_per_element,
            start_position: position,
            end_position: position,
            fate: Fate::SURFACE_WEATHERING,
        }
    }

    fn position(&self, k: usize, n: usize) -> DVec3 {
        if n <= 1 {
            return self.start_position;
        }
        self.start_position
            .lerp(self.end_position, k as f64 / (n - 1) as f64)
    }
}

/// Status part of an element filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    /// Any status except not-released
    Released,
    Only(StatusCode),
}

impl StatusFilter {
    pub fn matches(self, status: StatusCode) -> bool {
        match self {
            StatusFilter::Released => status.is_released(),
            StatusFilter::Only(wanted) => status == wanted,
        }
    }
}

/// Selects rows by status and, optionally, by required fate bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementFilter {
    pub status: StatusFilter,
    pub fate: Option<Fate>,
}

impl ElementFilter {
    pub fn in_water() -> Self {
        Self {
            status: StatusFilter::Only(StatusCode::InWater),
            fate: None,
        }
    }

    pub fn released() -> Self {
        Self {
            status: StatusFilter::Released,
            fate: None,
        }
    }

    pub fn with_fate(mut self, fate: Fate) -> Self {
        self.fate = Some(fate);
        self
    }
}

/// Owns all per-element arrays and the spill ledger
#[derive(Clone, Debug, Default)]
pub struct ElementStore {
    len: usize,
    num_released: usize,
    positions: Option<Vec<DVec3>>,
    status_codes: Option<Vec<StatusCode>>,
    mass: Option<Vec<f64>>,
    init_mass: Option<Vec<f64>>,
    age: Option<Vec<f64>>,
    fate_status: Option<Vec<Fate>>,
    frac_water: Option<Vec<f64>>,
    ledger: Ledger,
}

fn column<T>(col: &Option<Vec<T>>, id: ArrayId) -> Result<&[T]> {
    col.as_deref().ok_or(ElementError::DataMissing(id))
}

fn column_mut<T>(col: &mut Option<Vec<T>>, id: ArrayId) -> Result<&mut [T]> {
    col.as_deref_mut().ok_or(ElementError::DataMissing(id))
}

impl ElementStore {
    /// Store carrying the default columns
    pub fn new() -> Self {
        Self::with_arrays(ArrayId::DEFAULT.iter().copied())
    }

    /// Store carrying exactly the given columns
    pub fn with_arrays(arrays: impl IntoIterator<Item = ArrayId>) -> Self {
        let mut store = Self::default();
        for id in arrays {
            store.enable(id);
        }
        store
    }

    /// Switch to exactly the given columns and reset every row
    pub fn prepare_for_model_run(&mut self, arrays: &BTreeSet<ArrayId>) {
        for id in [
            ArrayId::Positions,
            ArrayId::StatusCodes,
            ArrayId::Mass,
            ArrayId::InitMass,
            ArrayId::Age,
            ArrayId::FateStatus,
            ArrayId::FracWater,
        ] {
            if arrays.contains(&id) {
                self.enable(id);
            } else {
                self.disable(id);
            }
        }
        self.rewind();
    }

    fn enable(&mut self, id: ArrayId) {
        let len = self.len;
        match id {
            ArrayId::Positions => {
                self.positions
                    .get_or_insert_with(|| vec![DVec3::ZERO; len]);
            }
            ArrayId::StatusCodes => {
                self.status_codes
                    .get_or_insert_with(|| vec![StatusCode::NotReleased; len]);
            }
            ArrayId::Mass => {
                self.mass.get_or_insert_with(|| vec![0.0; len]);
            }
            ArrayId::InitMass => {
                self.init_mass.get_or_insert_with(|| vec![0.0; len]);
            }
            ArrayId::Age => {
                self.age.get_or_insert_with(|| vec![0.0; len]);
            }
            ArrayId::FateStatus => {
                self.fate_status
                    .get_or_insert_with(|| vec![Fate::empty(); len]);
            }
            ArrayId::FracWater => {
                self.frac_water.get_or_insert_with(|| vec![0.0; len]);
            }
        }
    }

    fn disable(&mut self, id: ArrayId) {
        match id {
            ArrayId::Positions => self.positions = None,
            ArrayId::StatusCodes => self.status_codes = None,
            ArrayId::Mass => self.mass = None,
            ArrayId::InitMass => self.init_mass = None,
            ArrayId::Age => self.age = None,
            ArrayId::FateStatus => self.fate_status = None,
            ArrayId::FracWater => self.frac_water = None,
        }
    }

    pub fn has_array(&self, id: ArrayId) -> bool {
        match id {
            ArrayId::Positions => self.positions.is_some(),
            ArrayId::StatusCodes => self.status_codes.is_some(),
            ArrayId::Mass => self.mass.is_some(),
            ArrayId::InitMass => self.init_mass.is_some(),
            ArrayId::Age => self.age.is_some(),
            ArrayId::FateStatus => self.fate_status.is_some(),
            ArrayId::FracWater => self.frac_water.is_some(),
        }
    }

    /// Number of allocated rows, released or not
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_released(&self) -> usize {
        self.num_released
    }

    /// Append `additional` not-released rows. Existing rows keep their index.
    pub fn allocate(&mut self, additional: usize) {
        if additional == 0 {
            return;
        }
        let new_len = self.len + additional;
        if let Some(col) = self.positions.as_mut() {
            col.resize(new_len, DVec3::ZERO);
        }
        if let Some(col) = self.status_codes.as_mut() {
            col.resize(new_len, StatusCode::NotReleased);
        }
        if let Some(col) = self.mass.as_mut() {
            col.resize(new_len, 0.0);
        }
        if let Some(col) = self.init_mass.as_mut() {
            col.resize(new_len, 0.0);
        }
        if let Some(col) = self.age.as_mut() {
            col.resize(new_len, 0.0);
        }
        if let Some(col) = self.fate_status.as_mut() {
            col.resize(new_len, Fate::empty());
        }
        if let Some(col) = self.frac_water.as_mut() {
            col.resize(new_len, 0.0);
        }
        log::debug!("Allocated {} element rows ({} total)", additional, new_len);
        self.len = new_len;
    }

    /// Grow to at least `total` rows
    pub fn ensure_len(&mut self, total: usize) {
        if total > self.len {
            self.allocate(total - self.len);
        }
    }

    /// Flip the `n` oldest not-released rows to in-water and stamp them from
    /// `batch`. Grows the store if there are not enough rows.
    pub fn release(&mut self, n: usize, batch: &ReleaseBatch) -> Result<Range<usize>> {
        let start = self.num_released;
        let end = start + n;
        if n == 0 {
            return Ok(start..end);
        }

        // Validate before growing so a failed release leaves the store untouched
        for id in [ArrayId::StatusCodes, ArrayId::Mass, ArrayId::InitMass] {
            if !self.has_array(id) {
                return Err(ElementError::DataMissing(id));
            }
        }
        self.ensure_len(end);

        for (k, i) in (start..end).enumerate() {
            if let Some(positions) = self.positions.as_mut() {
                positions[i] = batch.position(k, n);
            }
            if let Some(fates) = self.fate_status.as_mut() {
                fates[i] = batch.fate;
            }
            if let Some(age) = self.age.as_mut() {
                age[i] = 0.0;
            }
            if let Some(frac_water) = self.frac_water.as_mut() {
                frac_water[i] = 0.0;
            }
        }
        column_mut(&mut self.status_codes, ArrayId::StatusCodes)?[start..end]
            .fill(StatusCode::InWater);
        column_mut(&mut self.mass, ArrayId::Mass)?[start..end].fill(batch.mass_per_element);
        column_mut(&mut self.init_mass, ArrayId::InitMass)?[start..end]
            .fill(batch.mass_per_element);

        self.num_released = end;
        Ok(start..end)
    }

    /// Reset every row to not-released and clear the ledger. Rows stay allocated.
    pub fn rewind(&mut self) {
        if let Some(col) = self.positions.as_mut() {
            col.fill(DVec3::ZERO);
        }
        if let Some(col) = self.status_codes.as_mut() {
            col.fill(StatusCode::NotReleased);
        }
        if let Some(col) = self.mass.as_mut() {
            col.fill(0.0);
        }
        if let Some(col) = self.init_mass.as_mut() {
            col.fill(0.0);
        }
        if let Some(col) = self.age.as_mut() {
            col.fill(0.0);
        }
        if let Some(col) = self.fate_status.as_mut() {
            col.fill(Fate::empty());
        }
        if let Some(col) = self.frac_water.as_mut() {
            col.fill(0.0);
        }
        self.num_released = 0;
        self.ledger.clear();
    }

    pub fn positions(&self) -> Result<&[DVec3]> {
        column(&self.positions, ArrayId::Positions)
    }

    pub fn positions_mut(&mut self) -> Result<&mut [DVec3]> {
        column_mut(&mut self.positions, ArrayId::Positions)
    }

    pub fn status_codes(&self) -> Result<&[StatusCode]> {
        column(&self.status_codes, ArrayId::StatusCodes)
    }

    pub fn status_codes_mut(&mut self) -> Result<&mut [StatusCode]> {
        column_mut(&mut self.status_codes, ArrayId::StatusCodes)
    }

    pub fn mass(&self) -> Result<&[f64]> {
        column(&self.mass, ArrayId::Mass)
    }

    pub fn init_mass(&self) -> Result<&[f64]> {
        column(&self.init_mass, ArrayId::InitMass)
    }

    pub fn age(&self) -> Result<&[f64]> {
        column(&self.age, ArrayId::Age)
    }

    pub fn fate_status(&self) -> Result<&[Fate]> {
        column(&self.fate_status, ArrayId::FateStatus)
    }

    pub fn fate_status_mut(&mut self) -> Result<&mut [Fate]> {
        column_mut(&mut self.fate_status, ArrayId::FateStatus)
    }

    pub fn frac_water(&self) -> Result<&[f64]> {
        column(&self.frac_water, ArrayId::FracWater)
    }

    pub fn frac_water_mut(&mut self) -> Result<&mut [f64]> {
        column_mut(&mut self.frac_water, ArrayId::FracWater)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Indices of released rows matching `filter`, oldest first
    pub fn select(&self, filter: ElementFilter) -> Result<Vec<usize>> {
        let status = self.status_codes()?;
        let fates = match filter.fate {
            Some(_) => Some(self.fate_status()?),
            None => None,
        };

        Ok((0..self.num_released)
            .filter(|&i| filter.status.matches(status[i]))
            .filter(|&i| match (filter.fate, fates) {
                (Some(wanted), Some(fates)) => fates[i].contains(wanted),
                _ => true,
            })
            .collect())
    }

    /// Add per-row displacements to in-water rows. Other rows are left in place.
    ///
    /// Returns the number of rows moved.
    pub fn apply_displacement(&mut self, deltas: &[DVec3]) -> Result<usize> {
        if deltas.len() != self.len {
            return Err(ElementError::LengthMismatch {
                array: ArrayId::Positions,
                expected: self.len,
                got: deltas.len(),
            });
        }
        let status = column(&self.status_codes, ArrayId::StatusCodes)?;
        let positions = column_mut(&mut self.positions, ArrayId::Positions)?;

        let mut moved = 0;
        for (i, delta) in deltas.iter().enumerate() {
            if status[i].is_in_water() {
                positions[i] += *delta;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Reclassify in-water rows by position (beaching, leaving the map).
    ///
    /// Returns the number of rows whose status changed.
    pub fn reclassify_in_water(
        &mut self,
        mut classify: impl FnMut(DVec3) -> StatusCode,
    ) -> Result<usize> {
        let positions = column(&self.positions, ArrayId::Positions)?;
        let status = column_mut(&mut self.status_codes, ArrayId::StatusCodes)?;

        let mut changed = 0;
        for i in 0..self.num_released {
            if !status[i].is_in_water() {
                continue;
            }
            let new_status = classify(positions[i]);
            if new_status.is_released() && new_status != status[i] {
                status[i] = new_status;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Set the status of one released row
    pub fn set_status(&mut self, index: usize, new_status: StatusCode) -> Result<()> {
        let len = self.num_released;
        let status = self.status_codes_mut()?;
        if index >= len {
            return Err(ElementError::LengthMismatch {
                array: ArrayId::StatusCodes,
                expected: len,
                got: index + 1,
            });
        }
        status[index] = new_status;
        Ok(())
    }

    /// Age every released row by `seconds`
    pub fn age_released(&mut self, seconds: f64) -> Result<()> {
        let released = self.num_released;
        let age = column_mut(&mut self.age, ArrayId::Age)?;
        for a in &mut age[..released] {
            *a += seconds;
        }
        Ok(())
    }

    /// Tag whole elements with `bit`, oldest first, until their initial mass
    /// covers `target_mass`.
    ///
    /// Only rows matching `status`, carrying surface weathering and not already
    /// claimed by another bit in `exclude` are eligible. Rows already carrying
    /// `bit` count toward the target first. Returns the initial mass tagged.
    pub fn mark_for(
        &mut self,
        status: StatusFilter,
        bit: Fate,
        exclude: Fate,
        target_mass: f64,
    ) -> Result<f64> {
        let released = self.num_released;
        let status_codes = column(&self.status_codes, ArrayId::StatusCodes)?;
        let init_mass = column(&self.init_mass, ArrayId::InitMass)?;
        let fates = column_mut(&mut self.fate_status, ArrayId::FateStatus)?;

        let mut covered: f64 = (0..released)
            .filter(|&i| status.matches(status_codes[i]) && fates[i].contains(bit))
            .map(|i| init_mass[i])
            .sum();

        let mut newly_marked = 0;
        for i in 0..released {
            if covered >= target_mass {
                break;
            }
            let fate = fates[i];
            if !status.matches(status_codes[i])
                || fate.contains(bit)
                || !fate.contains(Fate::SURFACE_WEATHERING)
                || fate.intersects(exclude - bit)
            {
                continue;
            }
            fates[i] = fate | bit;
            covered += init_mass[i];
            newly_marked += 1;
        }

        if newly_marked > 0 {
            log::debug!(
                "Marked {} elements for {:?} ({:.1} kg covering {:.1} kg)",
                newly_marked,
                bit,
                covered,
                target_mass
            );
        }
        Ok(covered)
    }

    /// Mutable mass view over the rows matching `filter`
    pub fn weathering_view(&mut self, filter: ElementFilter) -> Result<WeatheringView<'_>> {
        let indices = self.select(filter)?;
        let Self {
            positions,
            mass,
            init_mass,
            age,
            frac_water,
            ledger,
            ..
        } = self;

        Ok(WeatheringView::new(
            indices,
            column(positions, ArrayId::Positions)?,
            column_mut(mass, ArrayId::Mass)?,
            column(init_mass, ArrayId::InitMass)?,
            column(age, ArrayId::Age)?,
            column_mut(frac_water, ArrayId::FracWater)?,
            ledger,
        ))
    }

    /// Released, remaining and removed mass
    pub fn mass_balance(&self) -> Result<MassBalance> {
        let released = self.num_released;
        Ok(MassBalance {
            initial: self.init_mass()?[..released].iter().sum(),
            remaining: self.mass()?[..released].iter().sum(),
            removed: self.ledger.total(),
        })
    }

    /// Fails with `ConservationViolation` if ledger + remaining mass drifts
    /// from the released mass by more than `rel_tol`
    pub fn check_conservation(&self, rel_tol: f64) -> Result<MassBalance> {
        let balance = self.mass_balance()?;
        balance.check(rel_tol)?;
        Ok(balance)
    }

    pub fn status_counts(&self) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for &status in self.status_codes()? {
            counts.record(status);
        }
        Ok(counts)
    }
}
