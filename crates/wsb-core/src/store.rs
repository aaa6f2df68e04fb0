//! The `MentionStore` trait.
//!
//! Implemented by storage backends (e.g. `wsb-store-sqlite`). The collector
//! depends on this abstraction, not on any concrete backend.
//!
//! Rows are keyed by `(date, ticker)`. A day is written by one batch and is
//! never mutated row-by-row afterwards; rows disappear only through
//! [`MentionStore::delete_older_than`] or an explicit
//! [`MentionStore::replace_day`].

use std::future::Future;

use chrono::NaiveDate;

use crate::ticker::{MentionCounts, MentionRecord, PopularTicker};

/// Abstraction over a mention-count store backend.
///
/// All windowed operations are relative to the backend's notion of "today".
pub trait MentionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert one row per ticker in `counts` for `date`, atomically.
  ///
  /// If any `(date, ticker)` pair already exists the whole batch fails with
  /// a uniqueness error and nothing is written.
  fn insert_day<'a>(
    &'a self,
    date: NaiveDate,
    counts: &'a MentionCounts,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Delete every row for `date` and insert `counts` in its place, in one
  /// transaction.
  fn replace_day<'a>(
    &'a self,
    date: NaiveDate,
    counts: &'a MentionCounts,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Delete rows dated strictly before `today - retention_days`. Returns
  /// the number of rows removed. `retention_days` must be positive.
  fn delete_older_than(
    &self,
    retention_days: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Top `count` tickers by total mentions over rows dated on or after
  /// `today - days`, highest first, ties broken by ticker ascending.
  ///
  /// `count` must be positive and `days` non-negative; `days` is clamped to
  /// the retention window.
  fn query_popular(
    &self,
    count: i64,
    days: i64,
  ) -> impl Future<Output = Result<Vec<PopularTicker>, Self::Error>> + Send + '_;

  /// The earliest date with any row, or `None` for an empty store.
  fn oldest_date(
    &self,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + '_;

  /// Whether any row exists for `date`.
  fn has_day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All rows for `date`, most-mentioned first.
  fn day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<MentionRecord>, Self::Error>> + Send + '_;
}
