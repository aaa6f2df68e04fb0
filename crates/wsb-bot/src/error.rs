//! Errors that end a collection run.
//!
//! A per-fragment extraction failure is logged and skipped. Only a day on
//! which every fragment failed surfaces here.

use chrono::NaiveDate;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("cannot open store: {0}")]
  Connection(#[source] BoxError),

  #[error("no source data for {0}")]
  SourceUnavailable(NaiveDate),

  #[error("cannot read fragments for {date}: {source}")]
  Source {
    date:   NaiveDate,
    #[source]
    source: BoxError,
  },

  /// Every fragment failed extraction or scoring; nothing was written.
  #[error("all {skipped} fragments for {date} failed extraction")]
  Extraction { date: NaiveDate, skipped: usize },

  /// The day's transaction failed (including a duplicate day) and was
  /// rolled back.
  #[error("failed to store mentions for {date}: {source}")]
  Write {
    date:   NaiveDate,
    #[source]
    source: BoxError,
  },

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}
