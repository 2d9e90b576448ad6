//! Simulation errors
//!
//! - **Configuration**: [`Error::InvalidUnit`], [`Error::InvalidActiveWindow`],
//!   [`Error::NegativeQuantity`], [`Error::InvalidEfficiency`],
//!   [`Error::InvalidParameter`]. Raised at construction or on a setter; the
//!   previous value is always left in place.
//! - **Runtime data**: [`Error::EnvironmentDataMissing`] and
//!   [`ElementError::DataMissing`]. Abort the current step.
//! - **Consistency**: [`ElementError::ConservationViolation`], produced only by
//!   explicit conservation checks.

use chrono::{DateTime, Utc};
use slick_elements::ElementError;
use thiserror::Error;

use crate::environment::Quantity;
use crate::units::UnitFamily;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Unit string unknown or from the wrong family (e.g. `in` for an area)
    #[error("invalid unit `{unit}`, expected a {expected} unit")]
    InvalidUnit { unit: String, expected: UnitFamily },

    /// Window is inverted, empty, or unbounded where a finite duration is needed
    #[error("invalid active window: start {start:?}, stop {stop:?}")]
    InvalidActiveWindow {
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
    },

    #[error("{quantity} must not be negative, got {value}")]
    NegativeQuantity { quantity: &'static str, value: f64 },

    #[error("efficiency must be in (0, 1], got {0}")]
    InvalidEfficiency(f64),

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The environment has no value for a quantity a process depends on
    #[error("no {quantity} data available at {time}")]
    EnvironmentDataMissing {
        quantity: Quantity,
        time: DateTime<Utc>,
    },

    /// The model already ran all of its configured steps
    #[error("model run is complete after {0} steps")]
    RunComplete(usize),

    /// A step failed partway through; only `rewind` clears this
    #[error("step {0} failed, rewind the model before stepping again")]
    StepFailed(usize),

    #[error(transparent)]
    Elements(#[from] ElementError),
}

/// Reject negative physical quantities
pub(crate) fn non_negative(quantity: &'static str, value: f64) -> Result<f64> {
    if value < 0.0 || value.is_nan() {
        return Err(Error::NegativeQuantity { quantity, value });
    }
    Ok(value)
}
