//! The `TextFragmentSource` trait: where a day's text comes from.
//!
//! Implemented by forum clients and by file-backed sources. Timeouts and
//! retries belong to the implementation, not to the core.

use std::future::Future;

use chrono::NaiveDate;

use crate::fragment::Fragment;

/// Supplies the fragments (titles, bodies, comments) for a day's top
/// submissions.
pub trait TextFragmentSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All fragments for `date`, in no particular order.
  ///
  /// Implementations should fail with a distinguishable error when there is
  /// simply no data for the day, so callers such as a backfill can skip it.
  fn for_day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Fragment>, Self::Error>> + Send + '_;

  /// Whether `err` means "no data for this day" rather than a failure.
  fn is_unavailable(err: &Self::Error) -> bool;
}
