use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while building a usage report.
#[derive(Error, Debug)]
pub enum UsageError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An elapsed-time string did not match `[D-]HH:MM:SS`.
    #[error("Invalid elapsed time: {0}")]
    ElapsedParse(String),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A data line has a different number of fields than the header.
    #[error("{source_name}:{line}: expected {expected} fields, found {found}")]
    RowShape {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A required column is absent from a source header.
    #[error("{source_name}: missing column {column}")]
    MissingColumn { source_name: String, column: String },

    /// Two import sources do not share the same header.
    #[error("Header of {source_name} ({found}) does not match the first source ({expected})")]
    SchemaMismatch {
        source_name: String,
        expected: String,
        found: String,
    },

    /// An import was requested with no sources at all.
    #[error("No usage sources given")]
    NoSources,

    /// The remote accounting command exited unsuccessfully.
    #[error(
        "Non zero return code when attempting to execute sacct over ssh\n\
         command: {command}\n\
         return code: {}\n\
         stderr: {stderr}",
        .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
    )]
    Fetch {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A cluster name is not one of the recognised clusters.
    #[error("Invalid cluster: {0}")]
    InvalidCluster(String),

    /// The reporting period does not cover at least one day.
    #[error("Invalid period: end date {end} must be after start date {start}")]
    InvalidPeriod { start: String, end: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the usage crates.
pub type Result<T> = std::result::Result<T, UsageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = UsageError::FileRead {
            path: PathBuf::from("/some/2024-01-01-2024-02-01_usage.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("_usage.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_elapsed_parse() {
        let err = UsageError::ElapsedParse("1:2".to_string());
        assert_eq!(err.to_string(), "Invalid elapsed time: 1:2");
    }

    #[test]
    fn test_error_display_row_shape() {
        let err = UsageError::RowShape {
            source_name: "usage.csv".to_string(),
            line: 7,
            expected: 14,
            found: 3,
        };
        assert_eq!(err.to_string(), "usage.csv:7: expected 14 fields, found 3");
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = UsageError::SchemaMismatch {
            source_name: "b.csv".to_string(),
            expected: "JobID|User".to_string(),
            found: "JobID|Account".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("b.csv"));
        assert!(msg.contains("JobID|User"));
        assert!(msg.contains("JobID|Account"));
    }

    #[test]
    fn test_error_display_fetch() {
        let err = UsageError::Fetch {
            command: "ssh ab12@jade2.hartree.stfc.ac.uk sacct".to_string(),
            exit_code: Some(255),
            stderr: "Permission denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("command: ssh ab12@jade2.hartree.stfc.ac.uk sacct"));
        assert!(msg.contains("return code: 255"));
        assert!(msg.contains("stderr: Permission denied"));
    }

    #[test]
    fn test_error_display_fetch_without_exit_code() {
        let err = UsageError::Fetch {
            command: "ssh".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("return code: none"));
    }

    #[test]
    fn test_error_display_invalid_period() {
        let err = UsageError::InvalidPeriod {
            start: "2024-02-01".to_string(),
            end: "2024-01-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid period: end date 2024-01-01 must be after start date 2024-02-01"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: UsageError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: UsageError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
