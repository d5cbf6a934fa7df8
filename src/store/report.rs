//! Report content validation.
//!
//! Reports are opaque bytes split on `\n`. The first line starting with
//! `date:` decides acceptance; any later `date:` lines are ignored.

use regex::bytes::Regex;

use crate::store::error::StoreError;

const DATE_PREFIX: &[u8] = b"date:";

/// Pattern the `date:` value must match when none is configured.
pub const DEFAULT_DATE_PATTERN: &str = r"^[0-9]{2,12}\.[0-9]{1,3}$";

/// Returns the value of the first `date:` line, if any.
pub fn find_date_field(report: &[u8]) -> Option<&[u8]> {
    report
        .split(|&b| b == b'\n')
        .find_map(|line| line.strip_prefix(DATE_PREFIX))
}

/// Checks reports against the configured date pattern.
#[derive(Debug, Clone)]
pub struct DateValidator {
    pattern: Regex,
}

impl DateValidator {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Accepts the report if its first `date:` value matches the pattern.
    pub fn validate(&self, report: &[u8]) -> Result<(), StoreError> {
        let value = find_date_field(report).ok_or(StoreError::MissingDateField)?;
        if self.pattern.is_match(value) {
            Ok(())
        } else {
            Err(StoreError::InvalidDate)
        }
    }
}
