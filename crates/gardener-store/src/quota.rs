//! Daily commit quota, persisted as `{date, count}`

use crate::atomic_write;
use chrono::{Local, NaiveDate};
use gardener_core::{DailyQuota, Result};
use std::path::PathBuf;
use tracing::debug;

/// Tracks how many commits were made on the current calendar day.
///
/// Single-writer: only the loop engine increments. A record stamped with a
/// different date is treated as zero without being rewritten in place; the
/// next increment overwrites it with today's date.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    path: PathBuf,
}

impl QuotaTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Today's commit count; 0 for a missing, unreadable, or stale record
    pub fn get_count(&self) -> u32 {
        self.count_on(Local::now().date_naive())
    }

    /// Add one commit for today and durably persist the new record
    pub fn increment(&self) -> Result<u32> {
        self.increment_on(Local::now().date_naive())
    }

    fn read_record(&self) -> Option<DailyQuota> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Unreadable quota record, treating as zero: {}", e);
                None
            }
        }
    }

    pub fn count_on(&self, date: NaiveDate) -> u32 {
        match self.read_record() {
            Some(record) if record.date == date => record.count,
            _ => 0,
        }
    }

    pub fn increment_on(&self, date: NaiveDate) -> Result<u32> {
        let count = self.count_on(date) + 1;
        let record = DailyQuota { date, count };
        atomic_write(&self.path, &serde_json::to_string(&record)?)?;
        Ok(count)
    }
}
