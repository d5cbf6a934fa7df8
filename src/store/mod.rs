//! Report store subsystem.
//!
//! # Data Flow
//! ```text
//! report bytes + client address
//!     → report.rs (first `date:` line must match the date pattern)
//!     → timestamp.rs (wall clock → `<secs>.<millis>`)
//!     → record.rs (headers + verbatim body)
//!     → disk.rs (stage, publish without clobbering, probe on collision)
//!     → report_<secs>.<millis>.txt
//! ```
//!
//! # Design Decisions
//! - Validation happens before any file is created
//! - Filename uniqueness comes from the filesystem, not a lock
//! - Records are create-once; nothing here updates or deletes them

pub mod disk;
pub mod error;
pub mod record;
pub mod report;
pub mod timestamp;

pub use disk::{ReportStore, StoredReport};
pub use error::StoreError;
pub use report::{DateValidator, DEFAULT_DATE_PATTERN};
pub use timestamp::SubmittedAt;
