//! Error types for `wsb-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid ticker symbol: {0:?}")]
  InvalidTicker(String),

  /// An alias that the extractor could never see as a single candidate.
  #[error("invalid alias {0:?}: must be a single word")]
  InvalidAlias(String),

  #[error("invalid {name} = {value}: {reason}")]
  InvalidQueryParameter {
    name:   &'static str,
    value:  i64,
    reason: &'static str,
  },

  /// Ticker extraction failed for a single fragment.
  #[error("extraction failed: {0}")]
  Extraction(String),

  /// A sentiment scorer returned a value outside `[-1.0, 1.0]` (or NaN).
  #[error("sentiment score out of range: {0}")]
  ScoreOutOfRange(f64),

  #[error("cannot merge aggregate for {theirs} into aggregate for {ours}")]
  DateMismatch { ours: NaiveDate, theirs: NaiveDate },

  #[error("no source data for {0}")]
  SourceUnavailable(NaiveDate),

  #[error("source error: {0}")]
  Source(String),
}

impl Error {
  /// Whether the error only concerns a single fragment and the run may
  /// continue past it.
  pub fn is_fragment_local(&self) -> bool {
    matches!(self, Self::Extraction(_) | Self::ScoreOutOfRange(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
