//! GPU-hour usage report: account/user selection, per-dimension breakdowns
//! and utilisation against cluster capacity and an optional quota.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::debug;
use usage_core::formatting::{format_number, format_percent, utilisation};
use usage_core::models::UsageTable;
use usage_data::aggregator::{gpu_hours, Dimension, UsageAggregator, UsageRow};

use crate::table_view::{render_table, Column};

/// Printed instead of a report when the selection leaves no jobs.
pub const NO_USAGE_MESSAGE: &str = "No usage for the specified dates, accounts, users";

// ── ReportOptions ─────────────────────────────────────────────────────────────

/// Everything besides the data that shapes a report.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Days covered by the date-filtered table.
    pub elapsed_days: i64,
    /// Keep only accounts starting with this prefix.
    pub account_prefix: Option<String>,
    /// Keep only these accounts; empty keeps all.
    pub accounts: Vec<String>,
    /// Keep only these users; empty keeps all.
    pub users: Vec<String>,
    /// Daily GPU-hour quota.  Zero is treated as no quota.
    pub quota: Option<f64>,
    /// Daily GPU-hour capacity of the cluster the data came from.
    pub daily_capacity: f64,
}

/// Apply the account prefix, account list and user list filters, in that
/// order, each to the result of the previous one.
pub fn select(table: &UsageTable, options: &ReportOptions) -> UsageTable {
    let mut selected = table.clone();

    if let Some(prefix) = options.account_prefix.as_deref().filter(|p| !p.is_empty()) {
        selected = selected.filter(|r| r.account.starts_with(prefix));
    }
    if !options.accounts.is_empty() {
        selected = selected.filter(|r| options.accounts.contains(&r.account));
    }
    if !options.users.is_empty() {
        selected = selected.filter(|r| options.users.contains(&r.user));
    }

    debug!("Selected {} of {} records", selected.len(), table.len());
    selected
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Usage along one dimension.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub dimension: Dimension,
    pub rows: Vec<UsageRow>,
}

/// Figures of a non-empty report.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub sections: Vec<Section>,
    pub selected_gpu_hours: f64,
    pub selected_utilisation: f64,
    pub total_gpu_hours: f64,
    pub total_utilisation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_utilisation: Option<f64>,
}

/// The outcome of reporting on a table.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    /// The selection matched no jobs.
    Empty,
    Usage(UsageReport),
}

impl Report {
    /// Build the report for `table`, the date-filtered but otherwise
    /// unrestricted data.
    pub fn build(table: &UsageTable, options: &ReportOptions) -> Self {
        let selected = select(table, options);
        if selected.is_empty() {
            return Report::Empty;
        }

        let selected_gpu_hours = gpu_hours(&selected);
        let total_gpu_hours = gpu_hours(table);

        let sections = Dimension::STANDARD
            .iter()
            .map(|&dimension| Section {
                dimension,
                rows: UsageAggregator::aggregate_by(&selected, dimension),
            })
            .collect();

        let days = options.elapsed_days;
        Report::Usage(UsageReport {
            sections,
            selected_gpu_hours,
            selected_utilisation: utilisation(selected_gpu_hours, days, options.daily_capacity),
            total_gpu_hours,
            total_utilisation: utilisation(total_gpu_hours, days, options.daily_capacity),
            quota_utilisation: options
                .quota
                .filter(|q| *q > 0.0)
                .map(|q| utilisation(selected_gpu_hours, days, q)),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usage = match self {
            Report::Empty => return writeln!(f, "{}", NO_USAGE_MESSAGE),
            Report::Usage(usage) => usage,
        };

        for section in &usage.sections {
            writeln!(f, "{}\n", render_section(section))?;
        }

        writeln!(f, "Selected GPU hours used: {}", format_number(usage.selected_gpu_hours, 2))?;
        writeln!(f, "Selected utilisation: {}", format_percent(usage.selected_utilisation))?;
        writeln!(f, "Total GPU hours used: {}", format_number(usage.total_gpu_hours, 2))?;
        writeln!(f, "Total utilisation: {}", format_percent(usage.total_utilisation))?;
        if let Some(quota) = usage.quota_utilisation {
            writeln!(f, "Quota utilisation: {}", format_percent(quota))?;
        }
        Ok(())
    }
}

fn render_section(section: &Section) -> String {
    let columns = [
        Column::left(section.dimension.label()),
        Column::right("Usage / GPUh"),
        Column::right("Usage / %"),
    ];
    let rows: Vec<Vec<String>> = section
        .rows
        .iter()
        .map(|row| {
            vec![
                row.key.clone(),
                format_number(row.gpu_hours, 2),
                format_number(row.percent, 2),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// Build the report for `table` and write it to `out` as text.
pub fn report(out: &mut dyn Write, table: &UsageTable, options: &ReportOptions) -> std::io::Result<()> {
    write!(out, "{}", Report::build(table, options))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use usage_core::models::{parse_elapsed, JobRecord};
    use usage_core::time_utils::parse_timestamp;

    fn make_record(user: &str, account: &str, alloc_gres: &str, elapsed: &str) -> JobRecord {
        JobRecord {
            job_id: "1".to_string(),
            job_name: "train".to_string(),
            account: account.to_string(),
            user: user.to_string(),
            partition: "big".to_string(),
            node_list: "n1".to_string(),
            req_gres: alloc_gres.to_string(),
            alloc_gres: alloc_gres.to_string(),
            state: "COMPLETED".to_string(),
            exit_code: "0:0".to_string(),
            elapsed: parse_elapsed(elapsed).unwrap(),
            submit: parse_timestamp("2020-01-01T09:00:00").unwrap(),
            start: parse_timestamp("2020-01-01T10:00:00").unwrap(),
            end: parse_timestamp("2020-01-01T11:00:00").unwrap(),
        }
    }

    fn sample() -> UsageTable {
        UsageTable::new(vec![
            make_record("ab12-teamx", "J2AD001", "gpu:2", "10:00:00"),
            make_record("cd34-teamy", "J2AD002", "gpu:1", "10:00:00"),
            make_record("ef56-teamx", "OTHER01", "gpu:4", "10:00:00"),
        ])
    }

    fn options() -> ReportOptions {
        ReportOptions {
            elapsed_days: 1,
            daily_capacity: 100.0,
            ..Default::default()
        }
    }

    fn users(table: &UsageTable) -> Vec<&str> {
        table.iter().map(|r| r.user.as_str()).collect()
    }

    // ── select ────────────────────────────────────────────────────────────────

    #[test]
    fn test_select_without_filters_keeps_everything() {
        assert_eq!(select(&sample(), &options()).len(), 3);
    }

    #[test]
    fn test_select_account_prefix() {
        let opts = ReportOptions {
            account_prefix: Some("J2AD".to_string()),
            ..options()
        };
        assert_eq!(users(&select(&sample(), &opts)), vec!["ab12-teamx", "cd34-teamy"]);
    }

    #[test]
    fn test_select_stages_are_and_combined() {
        let opts = ReportOptions {
            account_prefix: Some("J2AD".to_string()),
            accounts: vec!["J2AD002".to_string(), "OTHER01".to_string()],
            ..options()
        };
        assert_eq!(users(&select(&sample(), &opts)), vec!["cd34-teamy"]);

        let opts = ReportOptions {
            users: vec!["ef56-teamx".to_string()],
            ..opts
        };
        assert!(select(&sample(), &opts).is_empty());
    }

    // ── Report::build ─────────────────────────────────────────────────────────

    #[test]
    fn test_empty_selection() {
        let opts = ReportOptions {
            users: vec!["nobody".to_string()],
            ..options()
        };
        let report = Report::build(&sample(), &opts);
        assert!(matches!(report, Report::Empty));
        assert_eq!(report.to_string(), format!("{}\n", NO_USAGE_MESSAGE));
    }

    #[test]
    fn test_selected_against_total() {
        let opts = ReportOptions {
            account_prefix: Some("J2AD".to_string()),
            quota: Some(60.0),
            ..options()
        };
        let Report::Usage(usage) = Report::build(&sample(), &opts) else {
            panic!("expected usage");
        };
        assert!((usage.selected_gpu_hours - 30.0).abs() < 1e-9);
        assert!((usage.total_gpu_hours - 70.0).abs() < 1e-9);
        assert!((usage.selected_utilisation - 30.0).abs() < 1e-9);
        assert!((usage.total_utilisation - 70.0).abs() < 1e-9);
        assert!((usage.quota_utilisation.unwrap() - 50.0).abs() < 1e-9);

        // Percentages are relative to the selection, not the whole table.
        let accounts = &usage.sections[2];
        assert_eq!(accounts.dimension, Dimension::Account);
        let percent: f64 = accounts.rows.iter().map(|r| r.percent).sum();
        assert!((percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_quota_is_ignored() {
        let opts = ReportOptions {
            quota: Some(0.0),
            ..options()
        };
        let Report::Usage(usage) = Report::build(&sample(), &opts) else {
            panic!("expected usage");
        };
        assert!(usage.quota_utilisation.is_none());
        assert!(!Report::Usage(usage).to_string().contains("Quota"));
    }

    #[test]
    fn test_sections_in_standard_order() {
        let Report::Usage(usage) = Report::build(&sample(), &options()) else {
            panic!("expected usage");
        };
        let dims: Vec<Dimension> = usage.sections.iter().map(|s| s.dimension).collect();
        assert_eq!(dims, Dimension::STANDARD.to_vec());
    }

    // ── Display ───────────────────────────────────────────────────────────────

    #[test]
    fn test_text_output() {
        let table = UsageTable::new(vec![
            make_record("ab12-teamx", "acc1", "gpu:2", "1:00:00"),
            make_record("ab12-teamx", "acc1", "gpu:2", "1:00:00"),
        ]);
        let opts = ReportOptions {
            elapsed_days: 2,
            daily_capacity: 4.0,
            quota: Some(1.0),
            ..Default::default()
        };
        let expected = "\
| User       | Usage / GPUh | Usage / % |
|------------|--------------|-----------|
| ab12-teamx |         4.00 |    100.00 |

| Group | Usage / GPUh | Usage / % |
|-------|--------------|-----------|
| teamx |         4.00 |    100.00 |

| Account | Usage / GPUh | Usage / % |
|---------|--------------|-----------|
| acc1    |         4.00 |    100.00 |

| GPUs | Usage / GPUh | Usage / % |
|------|--------------|-----------|
| 2    |         4.00 |    100.00 |

Selected GPU hours used: 4.00
Selected utilisation: 50.00%
Total GPU hours used: 4.00
Total utilisation: 50.00%
Quota utilisation: 200.00%
";
        let mut out = Vec::new();
        report(&mut out, &table, &opts).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_json_output() {
        let json = serde_json::to_value(Report::build(&sample(), &options())).unwrap();
        assert_eq!(json["status"], "usage");
        assert_eq!(json["sections"][0]["dimension"], "user");
        assert_eq!(json["sections"][3]["dimension"], "gpu_count");
        assert!(json.get("quota_utilisation").is_none());

        let empty = serde_json::to_value(Report::Empty).unwrap();
        assert_eq!(empty, serde_json::json!({"status": "empty"}));
    }
}
