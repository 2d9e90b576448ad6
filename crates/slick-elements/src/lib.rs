//! Element data for Slick
//!
//! This crate provides the foundational data types for the particle simulation:
//! - Element status codes and fate flags (StatusCode, Fate)
//! - The columnar element store (ElementStore, ArrayId, ReleaseBatch)
//! - Masked weathering views over the store (WeatheringView, ElementRow)
//! - The per-process mass ledger (Ledger, MassBalance)

mod arrays;
mod error;
mod fate;
mod ledger;
mod status;
mod store;
mod view;

pub use arrays::ArrayId;
pub use error::{ElementError, Result};
pub use fate::Fate;
pub use ledger::{Ledger, MassBalance};
pub use status::{StatusCode, StatusCounts};
pub use store::{ElementFilter, ElementStore, ReleaseBatch, StatusFilter};
pub use view::{ElementRow, WeatheringView};
