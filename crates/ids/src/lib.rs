//! Visit and note identifier allocation.
//!
//! Clinic records identify visits and notes with short numeric identifiers stored as text
//! in the CSV tables. New identifiers are drawn at random from a fixed range and checked
//! against the identifiers already in use.
//!
//! ## Identifier form
//! - Range: `100000..=999999` (six digits, no leading zeros)
//! - Stored as the decimal string, e.g. `"483920"`
//!
//! ## Allocation
//! Random draws are attempted a bounded number of times. If every draw collides, the range
//! is scanned from a random offset so that a free identifier is still found when the range
//! is almost full. Only a completely full range produces [`IdError::IdSpaceExhausted`].

mod service;

pub use service::{IdGenerator, ID_RANGE_END, ID_RANGE_START, MAX_RANDOM_ATTEMPTS};

/// Error type for identifier allocation.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The configured range is empty
    #[error("Invalid identifier range: {low}..={high}")]
    InvalidRange { low: u32, high: u32 },

    /// Every identifier in the range is already in use
    #[error("No free identifier left in range {low}..={high}")]
    IdSpaceExhausted { low: u32, high: u32 },
}

/// Result type for identifier allocation.
pub type IdResult<T> = Result<T, IdError>;
