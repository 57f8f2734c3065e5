//! Core types for JADE usage reporting.
//!
//! Holds the job-record data model, field grammars, cluster configuration,
//! command-line settings and shared formatting helpers.

pub mod clusters;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
