//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, which sorts lexicographically in date
//! order, so range predicates can compare the text directly.

use chrono::NaiveDate;
use wsb_core::ticker::{MentionCounts, MentionRecord, PopularTicker, Ticker};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Flatten a day's counts into `(ticker, mentions)` bind parameters.
pub fn encode_counts(counts: &MentionCounts) -> Vec<(String, i64)> {
  counts
    .iter()
    .map(|(t, n)| (t.as_str().to_owned(), i64::from(*n)))
    .collect()
}

fn decode_ticker(s: &str) -> Result<Ticker> { Ok(Ticker::new(s)?) }

fn decode_count<T: TryFrom<i64>>(n: i64) -> Result<T> {
  T::try_from(n).map_err(|_| Error::Decode(format!("count out of range: {n}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `stock_mentions` row as read from SQLite.
pub struct RawMention {
  pub date:     String,
  pub ticker:   String,
  pub mentions: i64,
}

impl RawMention {
  pub fn into_record(self) -> Result<MentionRecord> {
    Ok(MentionRecord {
      date:     decode_date(&self.date)?,
      ticker:   decode_ticker(&self.ticker)?,
      mentions: decode_count(self.mentions)?,
    })
  }
}

/// A grouped row from the popularity query.
pub struct RawPopular {
  pub ticker: String,
  pub total:  i64,
}

impl RawPopular {
  pub fn into_popular(self) -> Result<PopularTicker> {
    Ok(PopularTicker {
      ticker:         decode_ticker(&self.ticker)?,
      total_mentions: decode_count(self.total)?,
    })
  }
}
