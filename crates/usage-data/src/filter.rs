//! Date-window filtering of usage tables.
//!
//! The check is a plain boundary test, not an interval overlap: a job is kept
//! only if it started at or after the first midnight and ended at or before
//! the last.  `sacct --truncate` clips the recorded start and end of every
//! fetched job to the requested window, so truncated data passes through
//! whole.  Untruncated jobs that straddle either boundary are dropped rather
//! than partially counted.

use chrono::NaiveDate;
use tracing::debug;
use usage_core::models::UsageTable;
use usage_core::time_utils::{midnight, ReportPeriod};

/// Keep records with `start >= start-date 00:00` and `end <= end-date 00:00`.
pub fn filter_dates(table: &UsageTable, start: NaiveDate, end: NaiveDate) -> UsageTable {
    let start = midnight(start);
    let end = midnight(end);

    let filtered = table.filter(|r| r.start >= start && r.end <= end);

    debug!(
        "Date filter {} to {}: kept {} of {} records",
        start,
        end,
        filtered.len(),
        table.len()
    );
    filtered
}

/// [`filter_dates`] over the bounds of a [`ReportPeriod`].
pub fn filter_period(table: &UsageTable, period: &ReportPeriod) -> UsageTable {
    filter_dates(table, period.start, period.end)
}
