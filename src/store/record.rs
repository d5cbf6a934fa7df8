//! On-disk submission record layout.

use std::io::{self, Write};

use crate::store::timestamp::SubmittedAt;

/// A report annotated with where and when it was received.
///
/// Serialized as two header lines followed by the report bytes, untouched:
///
/// ```text
/// submitted_from:<address>
/// submitted_date:<seconds>.<millis>
/// <report>
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRecord<'a> {
    pub address: &'a str,
    pub submitted_at: SubmittedAt,
    pub report: &'a [u8],
}

impl SubmissionRecord<'_> {
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(
            out,
            "submitted_from:{}\nsubmitted_date:{}\n",
            self.address, self.submitted_at
        )?;
        out.write_all(self.report)?;
        out.flush()
    }
}
