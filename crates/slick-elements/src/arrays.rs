//! Identifiers for the parallel arrays held by the element store

use std::fmt;

/// One column of the element store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArrayId {
    Positions,
    StatusCodes,
    Mass,
    InitMass,
    Age,
    FateStatus,
    FracWater,
}

impl ArrayId {
    /// Columns every model run carries
    pub const DEFAULT: &'static [ArrayId] = &[
        ArrayId::Positions,
        ArrayId::StatusCodes,
        ArrayId::Mass,
        ArrayId::InitMass,
        ArrayId::Age,
    ];

    /// Columns read or written through a weathering view
    pub const WEATHERING: &'static [ArrayId] = &[
        ArrayId::Positions,
        ArrayId::StatusCodes,
        ArrayId::Mass,
        ArrayId::InitMass,
        ArrayId::Age,
        ArrayId::FateStatus,
        ArrayId::FracWater,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArrayId::Positions => "positions",
            ArrayId::StatusCodes => "status_codes",
            ArrayId::Mass => "mass",
            ArrayId::InitMass => "init_mass",
            ArrayId::Age => "age",
            ArrayId::FateStatus => "fate_status",
            ArrayId::FracWater => "frac_water",
        }
    }
}

impl fmt::Display for ArrayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
