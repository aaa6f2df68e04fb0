//! Retention window and the date arithmetic shared by queries and pruning.
//!
//! All windows are whole calendar days counted back from "today" as supplied
//! by a [`Clock`](crate::clock::Clock).

use chrono::{Days, NaiveDate};

use crate::{Error, Result};

/// Maximum age, in days, of rows the store is expected to keep.
pub const RETENTION_DAYS: u32 = 60;

/// The date `days` before `today`. Saturates at the earliest representable
/// date rather than overflowing.
pub fn days_ago(today: NaiveDate, days: u32) -> NaiveDate {
  today
    .checked_sub_days(Days::new(u64::from(days)))
    .unwrap_or(NaiveDate::MIN)
}

// ─── Popularity query ────────────────────────────────────────────────────────

/// Validated parameters for a popularity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularityQuery {
  /// Maximum number of rows returned; at least 1.
  pub count: u32,
  /// Trailing window in days, already clamped to [`RETENTION_DAYS`].
  pub days:  u32,
}

impl PopularityQuery {
  /// Validate raw caller input.
  ///
  /// `count` must be positive and `days` non-negative. A `days` wider than
  /// the retention window is clamped, not rejected.
  pub fn new(count: i64, days: i64) -> Result<Self> {
    if count <= 0 {
      return Err(Error::InvalidQueryParameter {
        name:   "count",
        value:  count,
        reason: "must be positive",
      });
    }
    if days < 0 {
      return Err(Error::InvalidQueryParameter {
        name:   "days",
        value:  days,
        reason: "must not be negative",
      });
    }

    let clamped = days.min(i64::from(RETENTION_DAYS));
    if clamped != days {
      tracing::debug!(requested = days, clamped, "clamping popularity window");
    }

    Ok(Self {
      count: u32::try_from(count).unwrap_or(u32::MAX),
      days:  clamped as u32,
    })
  }

  /// First date included in the window (inclusive).
  pub fn since(&self, today: NaiveDate) -> NaiveDate { days_ago(today, self.days) }
}

// ─── Retention ───────────────────────────────────────────────────────────────

/// Validate `retention_days` and return the cutoff: rows dated strictly
/// before it are expired.
pub fn retention_cutoff(today: NaiveDate, retention_days: i64) -> Result<NaiveDate> {
  if retention_days <= 0 {
    return Err(Error::InvalidQueryParameter {
      name:   "retention_days",
      value:  retention_days,
      reason: "must be positive",
    });
  }
  let days = u32::try_from(retention_days).unwrap_or(u32::MAX);
  Ok(days_ago(today, days))
}
