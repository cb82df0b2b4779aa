//! Inclusive crawl window.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Fixed inclusive window that decides whether a record counts toward
/// timeframe-scoped metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Timeframe {
    /// Window from midnight UTC of `start` to midnight UTC of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// `{start}_to_{end}`, used in every output filename.
    pub fn label(&self) -> String {
        format!(
            "{}_to_{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    /// Human-readable range for the summary file.
    pub fn display_range(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
