//! Error taxonomy shared by all miqat crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a caller of the engine can observe.
///
/// Provider failures are deliberately absent: they are absorbed by the
/// fallback chain and never reach the caller.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum MiqatError {
    /// Bad coordinates, date, or method identifier. Rejected before any computation.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The astronomical calculation could not produce a defined schedule.
    #[error("Calculation failed: {0}")]
    Calculation(String),

    /// An administrator-supplied override, Iqamah, or Tarawih value was malformed.
    #[error("Invalid override: {reason}")]
    OverrideValidation { reason: String },

    /// Date outside the range a conversion supports.
    #[error("Date {date} is out of supported range ({min} to {max})")]
    DateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    /// Hijri date arithmetic rejected its input.
    #[error("Hijri conversion failed: {0}")]
    HijriConversion(String),
}

impl MiqatError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    /// Creates an `OverrideValidation` error.
    pub fn invalid_override(reason: impl Into<String>) -> Self {
        Self::OverrideValidation { reason: reason.into() }
    }

    /// Creates a `DateOutOfRange` error with explicit bounds.
    pub fn date_out_of_range(date: NaiveDate, min: NaiveDate, max: NaiveDate) -> Self {
        Self::DateOutOfRange { date, min, max }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    pub fn is_override_validation(&self) -> bool {
        matches!(self, Self::OverrideValidation { .. })
    }
}
