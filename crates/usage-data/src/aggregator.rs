//! GPU-hour aggregation along a single dimension.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use usage_core::formatting::percentage;
use usage_core::models::{JobRecord, UsageTable};

// ── Dimension ─────────────────────────────────────────────────────────────────

/// A column usage can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    User,
    /// Derived from the user name, never stored.
    Group,
    Account,
    GpuCount,
}

impl Dimension {
    /// The dimensions a report is broken down by, in display order.
    pub const STANDARD: [Dimension; 4] = [
        Dimension::User,
        Dimension::Group,
        Dimension::Account,
        Dimension::GpuCount,
    ];

    /// Column heading for the key column.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::User => "User",
            Dimension::Group => "Group",
            Dimension::Account => "Account",
            Dimension::GpuCount => "GPUs",
        }
    }

    /// The grouping key of `record` along this dimension.
    pub fn key(&self, record: &JobRecord) -> String {
        match self {
            Dimension::User => record.user.clone(),
            Dimension::Group => record.group().to_string(),
            Dimension::Account => record.account.clone(),
            Dimension::GpuCount => record.gpu_count().to_string(),
        }
    }
}

// ── UsageRow ──────────────────────────────────────────────────────────────────

/// GPU-hours attributed to one key, with its share of the table total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRow {
    pub key: String,
    pub gpu_hours: f64,
    pub percent: f64,
}

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Total GPU-hours of every record in `table`.
pub fn gpu_hours(table: &UsageTable) -> f64 {
    table.iter().map(JobRecord::gpu_hours).sum()
}

/// Stateless helper that groups GPU-hours by a [`Dimension`].
pub struct UsageAggregator;

impl UsageAggregator {
    /// Sum GPU-hours per distinct key of `dimension`.
    ///
    /// Rows are sorted by GPU-hours, largest first; equal rows keep the order
    /// in which their key first appeared.  Percentages are relative to the
    /// total of `table` itself.
    pub fn aggregate_by(table: &UsageTable, dimension: Dimension) -> Vec<UsageRow> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<UsageRow> = Vec::new();

        for record in table {
            let key = dimension.key(record);
            let hours = record.gpu_hours();
            match positions.get(&key) {
                Some(&i) => rows[i].gpu_hours += hours,
                None => {
                    positions.insert(key.clone(), rows.len());
                    rows.push(UsageRow {
                        key,
                        gpu_hours: hours,
                        percent: 0.0,
                    });
                }
            }
        }

        // `sort_by` is stable, which keeps first-seen order for ties.
        rows.sort_by(|a, b| b.gpu_hours.total_cmp(&a.gpu_hours));

        let total: f64 = rows.iter().map(|r| r.gpu_hours).sum();
        for row in &mut rows {
            row.percent = percentage(row.gpu_hours, total);
        }

        rows
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
