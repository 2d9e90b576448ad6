//! Element store errors

use thiserror::Error;

use crate::ArrayId;

pub type Result<T> = std::result::Result<T, ElementError>;

/// Errors raised by the element store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    /// A component needed a column the store was not prepared with.
    /// Fatal for the current step.
    #[error("required array `{0}` is not present in the element store")]
    DataMissing(ArrayId),

    /// A per-element input did not match the number of rows
    #[error("expected {expected} values for `{array}`, got {got}")]
    LengthMismatch {
        array: ArrayId,
        expected: usize,
        got: usize,
    },

    /// Ledger plus remaining mass no longer adds up to the released mass
    #[error(
        "mass balance violated: released {initial} kg, remaining {remaining} kg, removed {removed} kg"
    )]
    ConservationViolation {
        initial: f64,
        remaining: f64,
        removed: f64,
    },
}
