//! Land/water classification of element positions

use glam::DVec3;
use serde::{Deserialize, Serialize};

use slick_elements::StatusCode;

/// Decides what an element at `position` (lon, lat, depth) has become
pub trait Map {
    fn status_at(&self, position: DVec3) -> StatusCode;
}

/// Open water everywhere
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ocean;

impl Map for Ocean {
    fn status_at(&self, _position: DVec3) -> StatusCode {
        StatusCode::InWater
    }
}

/// Axis-aligned lon/lat rectangle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLatBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl LonLatBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon: min_lon.min(max_lon),
            min_lat: min_lat.min(max_lat),
            max_lon: min_lon.max(max_lon),
            max_lat: min_lat.max(max_lat),
        }
    }

    pub fn contains(&self, position: DVec3) -> bool {
        (self.min_lon..=self.max_lon).contains(&position.x)
            && (self.min_lat..=self.max_lat).contains(&position.y)
    }
}

/// Water inside `bounds`, off map outside it, land inside any `land` box
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxMap {
    pub bounds: LonLatBox,
    #[serde(default)]
    pub land: Vec<LonLatBox>,
}

impl BoundingBoxMap {
    pub fn new(bounds: LonLatBox) -> Self {
        Self {
            bounds,
            land: Vec::new(),
        }
    }

    pub fn with_land(mut self, land: LonLatBox) -> Self {
        self.land.push(land);
        self
    }
}

impl Map for BoundingBoxMap {
    fn status_at(&self, position: DVec3) -> StatusCode {
        if !self.bounds.contains(position) {
            StatusCode::OffMap
        } else if self.land.iter().any(|l| l.contains(position)) {
            StatusCode::OnLand
        } else {
            StatusCode::InWater
        }
    }
}
