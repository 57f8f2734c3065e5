//! Report rendering for JADE usage.
//!
//! Narrows a date-filtered usage table by account and user, breaks GPU-hours
//! down per user, group, account and GPU count, and lays the result out as
//! plain-text tables.

pub mod report;
pub mod table_view;

pub use report::{report, Report, ReportOptions};
