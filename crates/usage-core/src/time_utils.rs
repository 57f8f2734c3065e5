use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UsageError};

/// Format used by `sacct` for the `Submit`, `Start` and `End` columns, and
/// the format written by `export`.
pub const SACCT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Timestamps ────────────────────────────────────────────────────────────────

/// Parse an accounting timestamp into a [`NaiveDateTime`].
///
/// Accepts `T`- or space-separated ISO date-times with optional fractional
/// seconds.  RFC 3339 strings carrying an offset are converted to UTC first.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive);
        }
    }

    let normalised = match s.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => s.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalised)
        .map(|dt| dt.naive_utc())
        .map_err(|_| UsageError::TimestampParse(s.to_string()))
}

/// Render a timestamp the way `sacct` prints it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(SACCT_TIMESTAMP_FORMAT).to_string()
}

/// Midnight at the start of `date`.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

// ── ReportPeriod ──────────────────────────────────────────────────────────────

/// A reporting window: `start` inclusive, `end` exclusive, at least one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// Build a period, rejecting windows that do not cover a whole day.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(UsageError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Number of whole days covered by the period.
    pub fn elapsed_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// The file name an export of this period is written to.
    pub fn export_file_name(&self) -> String {
        format!("{}-{}_usage.csv", self.start, self.end)
    }
}

/// Hours represented by `d`, including the fractional part.
pub fn total_hours(d: &TimeDelta) -> f64 {
    d.num_seconds() as f64 / 3600.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────
