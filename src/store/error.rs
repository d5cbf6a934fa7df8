//! Report store error type.

use thiserror::Error;

/// Reasons a report could not be stored.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No line of the report starts with `date:`.
    #[error("missing date field")]
    MissingDateField,

    /// The first `date:` line does not match the configured date pattern.
    #[error("invalid date")]
    InvalidDate,

    /// Every candidate filename within the probe bound was already taken.
    #[error("no free filename after {attempts} attempts")]
    ProbesExhausted { attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for failures caused by the report content rather than the disk.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::MissingDateField | StoreError::InvalidDate)
    }
}
