//! Error type for `wsb-store-sqlite`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected input, e.g. a negative query window. Storage is not touched.
  #[error("core error: {0}")]
  Core(#[from] wsb_core::Error),

  /// The database file could not be opened, created or initialised.
  #[error("cannot open database: {0}")]
  Connection(#[source] tokio_rusqlite::Error),

  /// The write transaction for `date` failed and was rolled back.
  #[error("failed to write mentions for {date}: {source}")]
  Write {
    date:   NaiveDate,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// Rows for `date` already exist; the batch was rolled back.
  #[error("mentions for {date} are already stored")]
  DuplicateDay { date: NaiveDate },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("cannot decode stored value: {0}")]
  Decode(String),
}

impl Error {
  /// Whether this is the uniqueness violation raised by re-inserting a day.
  pub fn is_duplicate(&self) -> bool { matches!(self, Self::DuplicateDay { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
