//! Server-assigned submission timestamps.
//!
//! A timestamp renders as `<seconds>.<millis>` with the millisecond part
//! zero-padded to at least three digits. Probing past a collision bumps the
//! millisecond counter without carrying into seconds, so `1000` and above are
//! valid and render with as many digits as they need.

use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp assigned to a stored report; doubles as its filename stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmittedAt {
    secs: i64,
    millis: u32,
}

impl SubmittedAt {
    pub fn new(secs: i64, millis: u32) -> Self {
        Self { secs, millis }
    }

    /// Capture the current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Truncate a wall-clock instant to whole milliseconds.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        // Leap seconds report up to 1999 ms; keep the first probe in range.
        let millis = at.timestamp_subsec_millis().min(999);
        Self::new(at.timestamp(), millis)
    }

    /// Next probe candidate after a filename collision.
    pub fn next(self) -> Self {
        Self::new(self.secs, self.millis.saturating_add(1))
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn millis(&self) -> u32 {
        self.millis
    }

    /// Name of the record file for this timestamp.
    pub fn file_name(&self) -> String {
        format!("report_{self}.txt")
    }
}

impl fmt::Display for SubmittedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.secs, self.millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn millis_are_zero_padded() {
        assert_eq!(SubmittedAt::new(1_700_000_000, 5).to_string(), "1700000000.005");
        assert_eq!(SubmittedAt::new(1_700_000_000, 0).file_name(), "report_1700000000.000.txt");
    }

    #[test]
    fn fraction_is_truncated_not_rounded() {
        let at = Utc.timestamp_opt(1_700_000_000, 999_999_999).unwrap();
        let ts = SubmittedAt::from_datetime(at);
        assert_eq!(ts.secs(), 1_700_000_000);
        assert_eq!(ts.millis(), 999);
    }

    #[test]
    fn overflow_widens_instead_of_carrying() {
        let ts = SubmittedAt::new(42, 999).next();
        assert_eq!(ts.secs(), 42);
        assert_eq!(ts.to_string(), "42.1000");
        assert_eq!(ts.file_name(), "report_42.1000.txt");
    }
}
