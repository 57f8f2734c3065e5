//! Live retrieval of accounting data with `sacct` over `ssh`, and export of
//! the result to disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};
use usage_core::clusters::ClusterConfig;
use usage_core::error::{Result, UsageError};
use usage_core::models::{COLUMNS, DELIMITER};
use usage_core::time_utils::ReportPeriod;

use crate::reader::parse_text;

/// Who to log in as and which window to ask `sacct` for.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub user: String,
    pub period: ReportPeriod,
}

/// Source of raw canonical-format accounting text.
pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<String>;
}

// ── SacctFetcher ──────────────────────────────────────────────────────────────

/// Runs `sacct` on a cluster login node through the system `ssh` client.
///
/// This call blocks until the remote command exits.
#[derive(Debug, Clone)]
pub struct SacctFetcher {
    address: String,
}

impl SacctFetcher {
    pub fn new(cluster: &ClusterConfig) -> Self {
        Self {
            address: cluster.address.clone(),
        }
    }

    /// Arguments passed to `ssh`.
    pub fn ssh_args(&self, request: &FetchRequest) -> Vec<String> {
        let format = COLUMNS.join(",").to_lowercase();
        vec![
            format!("{}@{}", request.user, self.address),
            "sacct".to_string(),
            // every user, not just the one logged in
            "--allusers".to_string(),
            "--parsable2".to_string(),
            // one line per allocation so steps are not counted twice
            "--allocations".to_string(),
            format!("--delimiter='{}'", DELIMITER),
            // with start/end times: only jobs that ran inside the window
            "--state=RUNNING".to_string(),
            format!("--starttime={}", request.period.start),
            format!("--endtime={}", request.period.end),
            // clip Start, End and Elapsed to the window
            "--truncate".to_string(),
            format!("--format={}", format),
        ]
    }
}

impl Fetcher for SacctFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let args = self.ssh_args(request);
        let command_line = format!("ssh {}", args.join(" "));
        info!("Fetching usage: {}", command_line);

        let output = Command::new("ssh").args(&args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!("sacct failed with {}: {}", output.status, stderr.trim());
            return Err(UsageError::Fetch {
                command: command_line,
                exit_code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Fetch a period's usage and write it to `output_dir` in canonical format.
///
/// The fetched text is normalised first, so jobs without GPUs are left out
/// and a malformed response fails before anything is written.  Returns the
/// path of the written file.
pub fn export(fetcher: &dyn Fetcher, request: &FetchRequest, output_dir: &Path) -> Result<PathBuf> {
    let text = fetcher.fetch(request)?;
    let table = parse_text("sacct", &text)?;

    let path = output_dir.join(request.period.export_file_name());
    std::fs::write(&path, table.to_delimited())?;

    info!("Exported {} GPU jobs to {}", table.len(), path.display());
    Ok(path)
}
