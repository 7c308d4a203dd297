//! Last-Dump Sentinel
//!
//! The time of the last complete backup is the modification time of a marker
//! file. Nothing is stored inside the file.

use crate::error::{CsaveError, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Calendar format used for the differential cutoff prompt and filter.
pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct LastDumpSentinel {
    path: PathBuf,
}

impl LastDumpSentinel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_time(&self) -> Result<SystemTime> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.modified()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CsaveError::SentinelNotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Local calendar date of the last dump, or `None` when the marker has
    /// never been created.
    pub fn last_date(&self) -> Result<Option<NaiveDate>> {
        match self.last_time() {
            Ok(time) => Ok(Some(DateTime::<Local>::from(time).date_naive())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create the marker, or bump its modification time to now.
    pub fn advance(&self) -> Result<()> {
        self.touch(SystemTime::now())
    }

    pub(crate) fn touch(&self, time: SystemTime) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.set_modified(time)?;

        debug!("Sentinel {} set to {:?}", self.path.display(), time);
        info!("Last dump sentinel advanced: {}", self.path.display());
        Ok(())
    }
}

pub fn format_cutoff(date: NaiveDate) -> String {
    date.format(CUTOFF_DATE_FORMAT).to_string()
}

pub fn parse_cutoff(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), CUTOFF_DATE_FORMAT).map_err(|e| {
        CsaveError::parse(format!(
            "Expected a date in YYYY-mm-dd format, got {:?}: {}",
            input.trim(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_missing_marker() {
        let dir = tempdir().unwrap();
        let sentinel = LastDumpSentinel::new(dir.path().join("lastdump"));

        assert!(matches!(
            sentinel.last_time().unwrap_err(),
            CsaveError::SentinelNotFound(_)
        ));
        assert_eq!(sentinel.last_date().unwrap(), None);
    }

    #[test]
    fn test_advance_creates_then_updates() {
        let dir = tempdir().unwrap();
        let sentinel = LastDumpSentinel::new(dir.path().join("preserve").join("lastdump"));

        sentinel.advance().unwrap();
        let first = sentinel.last_time().unwrap();

        let old = SystemTime::now() - Duration::from_secs(90 * 24 * 3600);
        sentinel.touch(old).unwrap();
        assert!(sentinel.last_time().unwrap() < first);

        sentinel.advance().unwrap();
        let again = sentinel.last_time().unwrap();
        assert!(again >= first);
        assert_eq!(fs::read(sentinel.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_last_date_is_local_calendar_date() {
        let dir = tempdir().unwrap();
        let sentinel = LastDumpSentinel::new(dir.path().join("lastdump"));
        let noon = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        sentinel.touch(noon.into()).unwrap();

        let date = sentinel.last_date().unwrap().unwrap();
        assert_eq!(format_cutoff(date), "2024-01-01");
    }

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(
            parse_cutoff(" 2024-03-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_cutoff("15/03/2024").is_err());
        assert!(parse_cutoff("2024-02-30").is_err());
        assert!(parse_cutoff("yesterday").is_err());
    }
}
