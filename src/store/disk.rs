//! Collision-free persistence of submission records.
//!
//! # Allocation
//! Each record is staged in a hidden temporary file inside the destination
//! directory and then published under `report_<timestamp>.txt` with a
//! rename that fails if the target already exists. On that failure only,
//! the millisecond counter is bumped, the staged file rewritten with the new
//! `submitted_date`, and publication retried. A reader therefore never sees
//! a partially written record under its final name, and two writers can
//! never claim the same name.

use std::fs::File;
use std::io::{self, Seek};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::config::schema::StoreConfig;
use crate::config::ConfigError;
use crate::store::error::StoreError;
use crate::store::record::SubmissionRecord;
use crate::store::report::DateValidator;
use crate::store::timestamp::SubmittedAt;

const STAGING_PREFIX: &str = ".incoming-";
const STAGING_SUFFIX: &str = ".tmp";

/// Outcome of a successful store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    /// Final path of the record.
    pub path: PathBuf,
    /// Timestamp written to the `submitted_date` header.
    pub submitted_at: SubmittedAt,
    /// Names that were already taken before this one succeeded.
    pub collisions: u32,
}

/// Validates reports and writes them to the destination directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    destination: PathBuf,
    validator: DateValidator,
    max_probes: u32,
}

impl ReportStore {
    pub fn new(destination: impl Into<PathBuf>, validator: DateValidator, max_probes: u32) -> Self {
        let destination = destination.into();
        // An empty destination means the working directory.
        let destination = if destination.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            destination
        };
        Self {
            destination,
            validator,
            max_probes: max_probes.max(1),
        }
    }

    /// Build a store from configuration, checking that the destination exists.
    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        let validator = DateValidator::new(&config.date_pattern)?;
        let store = Self::new(&config.destination, validator, config.max_probes);

        let metadata = std::fs::metadata(&store.destination).map_err(|source| {
            ConfigError::Destination {
                path: store.destination.clone(),
                source,
            }
        })?;
        if !metadata.is_dir() {
            return Err(ConfigError::Destination {
                path: store.destination.clone(),
                source: io::Error::other("not a directory"),
            });
        }

        Ok(store)
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Store a report received from `address`, stamped with the current time.
    pub fn store(&self, report: &[u8], address: &str) -> Result<StoredReport, StoreError> {
        self.store_at(report, address, SubmittedAt::now())
    }

    /// Store a report, probing for a free name starting from `start`.
    ///
    /// Validation runs first, so a rejected report never touches the disk.
    pub fn store_at(
        &self,
        report: &[u8],
        address: &str,
        start: SubmittedAt,
    ) -> Result<StoredReport, StoreError> {
        self.validator.validate(report)?;

        let mut staged = Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.destination)?;
        let mut submitted_at = start;

        for collisions in 0..self.max_probes {
            let record = SubmissionRecord {
                address,
                submitted_at,
                report,
            };
            rewrite(staged.as_file_mut(), &record)?;

            let path = self.destination.join(submitted_at.file_name());
            match staged.persist_noclobber(&path) {
                Ok(_) => {
                    return Ok(StoredReport {
                        path,
                        submitted_at,
                        collisions,
                    });
                }
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "Filename taken, probing next");
                    staged = err.file;
                    submitted_at = submitted_at.next();
                }
                // Dropping `err.file` removes the staged copy.
                Err(err) => return Err(err.error.into()),
            }
        }

        Err(StoreError::ProbesExhausted {
            attempts: self.max_probes,
        })
    }
}

/// Replace the staged file's contents with `record`.
fn rewrite(file: &mut File, record: &SubmissionRecord<'_>) -> io::Result<()> {
    file.set_len(0)?;
    file.rewind()?;
    record.write_to(io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::report::DEFAULT_DATE_PATTERN;
    use std::sync::{Arc, Barrier};

    const REPORT: &[u8] = b"date:1700000000.500\nhello world";

    fn store_in(dir: &Path) -> ReportStore {
        ReportStore::new(dir, DateValidator::new(DEFAULT_DATE_PATTERN).unwrap(), 1000)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn stores_record_under_timestamp_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let stored = store
            .store_at(REPORT, "192.0.2.1", SubmittedAt::new(1_700_000_001, 7))
            .unwrap();

        assert_eq!(stored.collisions, 0);
        assert_eq!(stored.path, dir.path().join("report_1700000001.007.txt"));
        assert_eq!(entries(dir.path()), vec!["report_1700000001.007.txt"]);
        assert_eq!(
            std::fs::read(&stored.path).unwrap(),
            b"submitted_from:192.0.2.1\nsubmitted_date:1700000001.007\ndate:1700000000.500\nhello world"
        );
    }

    #[test]
    fn validation_failures_leave_directory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let err = store.store(b"hello\nworld", "192.0.2.1").unwrap_err();
        assert!(matches!(err, StoreError::MissingDateField));
        let err = store.store(b"date:soon\n", "192.0.2.1").unwrap_err();
        assert!(matches!(err, StoreError::InvalidDate));

        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn collision_bumps_millis_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let at = SubmittedAt::new(1_700_000_002, 10);

        let first = store.store_at(REPORT, "a", at).unwrap();
        let second = store.store_at(REPORT, "b", at).unwrap();

        assert_eq!(first.submitted_at.to_string(), "1700000002.010");
        assert_eq!(second.submitted_at.to_string(), "1700000002.011");
        assert_eq!(second.collisions, 1);
        let body = std::fs::read_to_string(&second.path).unwrap();
        assert!(body.starts_with("submitted_from:b\nsubmitted_date:1700000002.011\n"));
        // The first record is never overwritten.
        let body = std::fs::read_to_string(&first.path).unwrap();
        assert!(body.starts_with("submitted_from:a\n"));
    }

    #[test]
    fn probing_past_999_widens_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let at = SubmittedAt::new(5, 999);

        store.store_at(REPORT, "a", at).unwrap();
        let second = store.store_at(REPORT, "a", at).unwrap();

        assert_eq!(second.path, dir.path().join("report_5.1000.txt"));
    }

    #[test]
    fn resubmission_is_not_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let a = store.store(REPORT, "a").unwrap();
        let b = store.store(REPORT, "a").unwrap();

        assert_ne!(a.path, b.path);
        assert_eq!(entries(dir.path()).len(), 2);
    }

    #[test]
    fn exhausted_probes_fail_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(
            dir.path(),
            DateValidator::new(DEFAULT_DATE_PATTERN).unwrap(),
            2,
        );
        std::fs::write(dir.path().join("report_9.000.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("report_9.001.txt"), b"y").unwrap();

        let err = store
            .store_at(REPORT, "a", SubmittedAt::new(9, 0))
            .unwrap_err();

        assert!(matches!(err, StoreError::ProbesExhausted { attempts: 2 }));
        assert_eq!(entries(dir.path()), vec!["report_9.000.txt", "report_9.001.txt"]);
        assert_eq!(std::fs::read(dir.path().join("report_9.000.txt")).unwrap(), b"x");
    }

    #[test]
    fn concurrent_submissions_in_same_millisecond_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(dir.path()));
        let at = SubmittedAt::new(1_700_000_003, 0);
        let writers = 16;
        let barrier = Arc::new(Barrier::new(writers));

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let store = store.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.store_at(REPORT, &format!("10.0.0.{i}"), at).unwrap()
                })
            })
            .collect();

        let mut names: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().unwrap().submitted_at.to_string())
            .collect();
        names.sort();
        names.dedup();

        assert_eq!(names.len(), writers);
        assert_eq!(entries(dir.path()).len(), writers);
    }

    #[test]
    fn removed_destination_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("reports");
        std::fs::create_dir(&destination).unwrap();
        let store = store_in(&destination);
        std::fs::remove_dir(&destination).unwrap();

        let err = store.store(REPORT, "10.0.0.1").unwrap_err();

        assert!(matches!(&err, StoreError::Io(e) if e.kind() == io::ErrorKind::NotFound));
        assert!(!err.is_validation());
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn destination_replaced_by_file_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("reports");
        std::fs::create_dir(&destination).unwrap();
        let store = store_in(&destination);
        std::fs::remove_dir(&destination).unwrap();
        std::fs::write(&destination, b"not a directory").unwrap();

        let err = store.store(REPORT, "10.0.0.1").unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(entries(dir.path()), vec!["reports".to_string()]);
    }

    #[test]
    fn from_config_rejects_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            destination: dir.path().join("absent").to_string_lossy().into_owned(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            ReportStore::from_config(&config),
            Err(ConfigError::Destination { .. })
        ));
    }

    #[test]
    fn empty_destination_is_working_directory() {
        let store = ReportStore::new("", DateValidator::new(DEFAULT_DATE_PATTERN).unwrap(), 1);
        assert_eq!(store.destination(), Path::new("."));
    }
}
