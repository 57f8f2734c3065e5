//! Loading of pipe-delimited accounting exports.
//!
//! Parses the canonical `sacct --parsable2` row format, whether it comes from
//! a live fetch or from a previously exported file, into a [`UsageTable`].

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use usage_core::error::{Result, UsageError};
use usage_core::models::{
    gpu_count_from_gres, parse_elapsed, JobRecord, UsageTable, COLUMNS, DELIMITER,
};
use usage_core::time_utils::parse_timestamp;

// ── ImportSource ──────────────────────────────────────────────────────────────

/// One body of delimited text plus a name used in error messages.
#[derive(Debug, Clone)]
pub struct ImportSource {
    pub name: String,
    pub text: String,
}

impl ImportSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a whole export file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| UsageError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
///
/// An entry that cannot be read (a dangling link, an unreadable directory)
/// is an error rather than being skipped.
pub fn find_export_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| UsageError::FileRead {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;
        let is_export = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map(|ext| ext == "csv")
                .unwrap_or(false);
        if is_export {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Read every path as an [`ImportSource`], expanding directories into the
/// export files they contain.  Order of `paths` is preserved.
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<ImportSource>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let files = find_export_files(path)?;
            if files.is_empty() {
                warn!("No export files found in {}", path.display());
            }
            for file in files {
                sources.push(ImportSource::from_path(&file)?);
            }
        } else {
            sources.push(ImportSource::from_path(path)?);
        }
    }
    Ok(sources)
}

/// Concatenate one or more sources sharing the same header into one table.
///
/// Rows whose `AllocGRES` carries no GPU count are dropped before any other
/// field is parsed.  Every other malformed field is an error.
pub fn import_table(sources: &[ImportSource]) -> Result<UsageTable> {
    let (first, rest) = sources.split_first().ok_or(UsageError::NoSources)?;

    let expected = header_of(first);
    for source in rest {
        let header = header_of(source);
        if header != expected {
            return Err(UsageError::SchemaMismatch {
                source_name: source.name.clone(),
                expected: expected.join(&DELIMITER.to_string()),
                found: header.join(&DELIMITER.to_string()),
            });
        }
    }

    let mut records = Vec::new();
    for source in sources {
        records.extend(parse_source(source, &expected)?);
    }

    debug!(
        "Imported {} GPU job records from {} sources",
        records.len(),
        sources.len()
    );

    Ok(UsageTable::new(records))
}

/// Parse text already known to be in the canonical format.
pub fn parse_text(name: &str, text: &str) -> Result<UsageTable> {
    import_table(&[ImportSource::new(name, text)])
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Position of each canonical column within a source's header.
struct ColumnIndex([usize; COLUMNS.len()]);

impl ColumnIndex {
    fn new(source_name: &str, header: &[String]) -> Result<Self> {
        let mut index = [0usize; COLUMNS.len()];
        for (slot, column) in index.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| UsageError::MissingColumn {
                    source_name: source_name.to_string(),
                    column: column.to_string(),
                })?;
        }
        Ok(Self(index))
    }

    /// The field of canonical column `column` (an index into [`COLUMNS`]).
    fn get<'a>(&self, fields: &[&'a str], column: usize) -> &'a str {
        fields[self.0[column]]
    }
}

const JOB_ID: usize = 0;
const JOB_NAME: usize = 1;
const ACCOUNT: usize = 2;
const USER: usize = 3;
const PARTITION: usize = 4;
const NODE_LIST: usize = 5;
const REQ_GRES: usize = 6;
const ALLOC_GRES: usize = 7;
const STATE: usize = 8;
const EXIT_CODE: usize = 9;
const ELAPSED: usize = 10;
const SUBMIT: usize = 11;
const START: usize = 12;
const END: usize = 13;

/// Non-blank lines of a source with their zero-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Column names from the first non-blank line; empty if there is none.
fn header_of(source: &ImportSource) -> Vec<String> {
    content_lines(&source.text)
        .next()
        .map(|(_, line)| line.split(DELIMITER).map(|h| h.trim().to_string()).collect())
        .unwrap_or_default()
}

/// Parse the GPU job records of one source whose header is `header`.
fn parse_source(source: &ImportSource, header: &[String]) -> Result<Vec<JobRecord>> {
    let index = ColumnIndex::new(&source.name, header)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (i, line) in content_lines(&source.text).skip(1) {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != header.len() {
            return Err(UsageError::RowShape {
                source_name: source.name.clone(),
                line: i + 1,
                expected: header.len(),
                found: fields.len(),
            });
        }

        let alloc_gres = index.get(&fields, ALLOC_GRES);
        if gpu_count_from_gres(alloc_gres).is_none() {
            dropped += 1;
            continue;
        }

        records.push(JobRecord {
            job_id: index.get(&fields, JOB_ID).to_string(),
            job_name: index.get(&fields, JOB_NAME).to_string(),
            account: index.get(&fields, ACCOUNT).to_string(),
            user: index.get(&fields, USER).to_string(),
            partition: index.get(&fields, PARTITION).to_string(),
            node_list: index.get(&fields, NODE_LIST).to_string(),
            req_gres: index.get(&fields, REQ_GRES).to_string(),
            alloc_gres: alloc_gres.to_string(),
            state: index.get(&fields, STATE).to_string(),
            exit_code: index.get(&fields, EXIT_CODE).to_string(),
            elapsed: parse_elapsed(index.get(&fields, ELAPSED))?,
            submit: parse_timestamp(index.get(&fields, SUBMIT))?,
            start: parse_timestamp(index.get(&fields, START))?,
            end: parse_timestamp(index.get(&fields, END))?,
        });
    }

    debug!(
        "Source {}: {} GPU jobs, {} without GPUs dropped",
        source.name,
        records.len(),
        dropped
    );

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
