use chrono::{NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, UsageError};
use crate::time_utils::{format_timestamp, total_hours};

/// Column delimiter of the canonical row format.
pub const DELIMITER: char = '|';

/// Canonical column names, in the order `sacct --format` emits them.
pub const COLUMNS: [&str; 14] = [
    "JobID",
    "JobName",
    "Account",
    "User",
    "Partition",
    "NodeList",
    "ReqGRES",
    "AllocGRES",
    "State",
    "ExitCode",
    "Elapsed",
    "Submit",
    "Start",
    "End",
];

// ── Field grammars ────────────────────────────────────────────────────────────

static ELAPSED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)-)?(\d+):(\d+):(\d+)$").expect("regex is valid"));

static GRES_GPU_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"gpu:([1-9])$").expect("regex is valid"));

/// Parse a `sacct` elapsed time, `[days-]HH:MM:SS`, into a [`TimeDelta`].
///
/// The text must match exactly; surrounding whitespace is rejected.
pub fn parse_elapsed(text: &str) -> Result<TimeDelta> {
    let caps = ELAPSED_RE
        .captures(text)
        .ok_or_else(|| UsageError::ElapsedParse(text.to_string()))?;

    let component = |i: usize| -> Result<i64> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<i64>())
            .map_err(|_| UsageError::ElapsedParse(text.to_string()))
    };

    let (days, hours, minutes, seconds) = (component(1)?, component(2)?, component(3)?, component(4)?);
    days.checked_mul(86_400)
        .and_then(|s| s.checked_add(hours.checked_mul(3_600)?))
        .and_then(|s| s.checked_add(minutes.checked_mul(60)?))
        .and_then(|s| s.checked_add(seconds))
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| UsageError::ElapsedParse(text.to_string()))
}

/// Render a [`TimeDelta`] in the `sacct` elapsed grammar.
///
/// The day prefix is only written when the duration spans at least one day.
pub fn format_elapsed(d: &TimeDelta) -> String {
    let total = d.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Number of GPUs encoded in an `AllocGRES` string.
///
/// Only the trailing `gpu:<1-9>` convention is understood; anything else
/// (including an empty string) means no GPU was allocated.
pub fn gpu_count_from_gres(alloc_gres: &str) -> Option<u32> {
    GRES_GPU_RE
        .captures(alloc_gres.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Group encoded in a username of the form `<initials>-<group>`.
///
/// A username without a hyphen is its own group.
pub fn group_of(user: &str) -> &str {
    user.rsplit('-').next().unwrap_or(user)
}

// ── JobRecord ─────────────────────────────────────────────────────────────────

/// Accounted usage of one scheduled job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub job_name: String,
    pub account: String,
    pub user: String,
    pub partition: String,
    pub node_list: String,
    pub req_gres: String,
    pub alloc_gres: String,
    pub state: String,
    pub exit_code: String,
    /// Wall-clock run time, already truncated to the fetch window.
    pub elapsed: TimeDelta,
    pub submit: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl JobRecord {
    /// GPUs allocated to the job; `0` if `alloc_gres` carries no GPU count.
    pub fn gpu_count(&self) -> u32 {
        gpu_count_from_gres(&self.alloc_gres).unwrap_or(0)
    }

    /// GPU-hours consumed: GPUs allocated times elapsed hours.
    pub fn gpu_hours(&self) -> f64 {
        f64::from(self.gpu_count()) * total_hours(&self.elapsed)
    }

    /// The group derived from [`JobRecord::user`].
    pub fn group(&self) -> &str {
        group_of(&self.user)
    }

    /// The record as one canonical delimited line (without newline).
    pub fn to_delimited(&self) -> String {
        let fields = [
            self.job_id.clone(),
            self.job_name.clone(),
            self.account.clone(),
            self.user.clone(),
            self.partition.clone(),
            self.node_list.clone(),
            self.req_gres.clone(),
            self.alloc_gres.clone(),
            self.state.clone(),
            self.exit_code.clone(),
            format_elapsed(&self.elapsed),
            format_timestamp(&self.submit),
            format_timestamp(&self.start),
            format_timestamp(&self.end),
        ];
        fields.join(&DELIMITER.to_string())
    }
}

// ── UsageTable ────────────────────────────────────────────────────────────────

/// An ordered, read-only collection of GPU job records.
///
/// Tables built by the reader only hold records with a GPU count of at least
/// one.  Transformations return a new table and leave the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageTable {
    records: Vec<JobRecord>,
}

impl UsageTable {
    pub fn new(records: impl IntoIterator<Item = JobRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A new table holding the records for which `keep` returns `true`.
    pub fn filter(&self, keep: impl Fn(&JobRecord) -> bool) -> Self {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// A new table holding the records of `self` followed by those of `other`.
    pub fn concat(&self, other: &UsageTable) -> Self {
        Self {
            records: self.records.iter().chain(other.records.iter()).cloned().collect(),
        }
    }

    /// The table in canonical row format, header first, newline terminated.
    pub fn to_delimited(&self) -> String {
        let mut out = COLUMNS.join(&DELIMITER.to_string());
        out.push('\n');
        for record in &self.records {
            out.push_str(&record.to_delimited());
            out.push('\n');
        }
        out
    }
}

impl<'a> IntoIterator for &'a UsageTable {
    type Item = &'a JobRecord;
    type IntoIter = std::slice::Iter<'a, JobRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
