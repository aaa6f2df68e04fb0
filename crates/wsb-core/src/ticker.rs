//! Ticker symbols and the records keyed by them.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest symbol accepted, e.g. `BRK.B` fits with room to spare.
pub const MAX_TICKER_LEN: usize = 10;

// ─── Ticker ──────────────────────────────────────────────────────────────────

/// A canonical stock/ETF symbol such as `GME`.
///
/// Always upper-case ASCII: it starts with a letter and otherwise holds
/// letters, digits or `.`.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
  /// Normalise `raw` to upper case and validate it.
  pub fn new(raw: &str) -> Result<Self> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = symbol.len() <= MAX_TICKER_LEN
      && symbol.starts_with(|c: char| c.is_ascii_alphabetic())
      && !symbol.ends_with('.')
      && symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.');
    if valid {
      Ok(Self(symbol))
    } else {
      Err(Error::InvalidTicker(raw.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Ticker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for Ticker {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::new(s) }
}

impl TryFrom<String> for Ticker {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::new(&s) }
}

impl From<Ticker> for String {
  fn from(t: Ticker) -> Self { t.0 }
}

impl AsRef<str> for Ticker {
  fn as_ref(&self) -> &str { &self.0 }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Per-day mention counts, the unit written to the store by one run.
pub type MentionCounts = BTreeMap<Ticker, u32>;

/// One persisted row: mentions of a ticker on a calendar day.
/// `(date, ticker)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRecord {
  pub date:     NaiveDate,
  pub ticker:   Ticker,
  pub mentions: u32,
}

/// A row of a popularity query: total mentions over the queried window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularTicker {
  pub ticker:         Ticker,
  pub total_mentions: u64,
}
