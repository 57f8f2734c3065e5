//! Data layer for JADE usage reporting.
//!
//! Responsible for fetching and loading accounting exports, restricting them
//! to a reporting window and aggregating GPU-hours.

pub mod aggregator;
pub mod fetch;
pub mod filter;
pub mod reader;

pub use usage_core as core;
