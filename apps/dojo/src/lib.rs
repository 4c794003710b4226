//! # Dojo
//!
//! Library half of the `dojo` binary: the CLI, the HTTP API and the
//! configuration loader. The integration tests drive the API through
//! this crate.

pub mod api;
pub mod cli;
pub mod config;

use chrono::NaiveDate;

/// The local calendar day.
///
/// Every command that defaults a date uses this, so the core never reads
/// the clock itself.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
