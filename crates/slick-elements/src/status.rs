//! Element status codes

use serde::{Deserialize, Serialize};

/// Where an element currently is. Drives eligibility for movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusCode {
    /// Allocated but not yet released
    #[default]
    NotReleased = 0,
    /// Floating or submerged in water, moved by movers
    InWater = 2,
    /// Beached, terminal for movement
    OnLand = 3,
    /// Left the map, terminal for movement
    OffMap = 7,
}

impl StatusCode {
    /// True for every status an element can have after release
    pub fn is_released(self) -> bool {
        self != StatusCode::NotReleased
    }

    pub fn is_in_water(self) -> bool {
        self == StatusCode::InWater
    }
}

/// Number of elements per status code
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_released: usize,
    pub in_water: usize,
    pub on_land: usize,
    pub off_map: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: StatusCode) {
        match status {
            StatusCode::NotReleased => self.not_released += 1,
            StatusCode::InWater => self.in_water += 1,
            StatusCode::OnLand => self.on_land += 1,
            StatusCode::OffMap => self.off_map += 1,
        }
    }

    pub fn released(&self) -> usize {
        self.in_water + self.on_land + self.off_map
    }
}
