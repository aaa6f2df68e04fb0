//! [`CollectionRun`]: pull a day's fragments, aggregate them, flush the counts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use wsb_core::{
  aggregate::{DailyAggregate, MentionAggregator},
  extract::{SentimentScorer, TickerExtractor},
  source::TextFragmentSource,
  store::MentionStore,
  window::{RETENTION_DAYS, days_ago},
};

use crate::{ExistingDayPolicy, RunError};

// ─── Report ───────────────────────────────────────────────────────────────────

/// How a day ended up in (or out of) the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  Inserted,
  Replaced,
  /// The day was already stored and left untouched.
  SkippedExisting,
  /// The source had nothing for the day.
  NoSourceData,
}

/// Summary of one day's collection.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub date:         NaiveDate,
  pub outcome:      RunOutcome,
  /// Fragments pulled from the source.
  pub fragments:    usize,
  /// Fragments dropped because extraction or scoring failed.
  pub skipped:      usize,
  pub rows_written: usize,
  /// Finalised counts and sentiment. Sentiment is not persisted.
  pub aggregate:    DailyAggregate,
}

impl RunReport {
  fn untouched(date: NaiveDate, outcome: RunOutcome) -> Self {
    Self {
      date,
      outcome,
      fragments: 0,
      skipped: 0,
      rows_written: 0,
      aggregate: DailyAggregate { date, tickers: BTreeMap::new() },
    }
  }
}

// ─── Run ──────────────────────────────────────────────────────────────────────

/// Drives collection against an open store session.
///
/// A fragment whose extraction or scoring fails is skipped and the run goes
/// on, unless every fragment fails. Failing to read the source or to commit
/// the day's write ends the run with an error; the write is all-or-nothing.
pub struct CollectionRun<'a, St, Src> {
  store:       &'a St,
  source:      &'a Src,
  extractor:   &'a dyn TickerExtractor,
  scorer:      &'a dyn SentimentScorer,
  on_existing: ExistingDayPolicy,
}

impl<'a, St, Src> CollectionRun<'a, St, Src>
where
  St: MentionStore,
  Src: TextFragmentSource,
{
  pub fn new(
    store: &'a St,
    source: &'a Src,
    extractor: &'a dyn TickerExtractor,
    scorer: &'a dyn SentimentScorer,
  ) -> Self {
    Self {
      store,
      source,
      extractor,
      scorer,
      on_existing: ExistingDayPolicy::default(),
    }
  }

  pub fn on_existing(mut self, policy: ExistingDayPolicy) -> Self {
    self.on_existing = policy;
    self
  }

  /// Collect `date` according to the configured [`ExistingDayPolicy`].
  pub async fn collect(&self, date: NaiveDate) -> Result<RunReport, RunError> {
    self.collect_with(date, self.on_existing).await
  }

  /// Collect each of the `days` days before `today`, oldest first.
  ///
  /// Days already stored and days the source has nothing for are skipped.
  /// `days` is clamped to the retention window, since older rows would be
  /// pruned anyway.
  pub async fn backfill(
    &self,
    today: NaiveDate,
    days: u32,
  ) -> Result<Vec<RunReport>, RunError> {
    let days = days.min(RETENTION_DAYS);
    let mut reports = Vec::with_capacity(days as usize);

    for offset in (1..=days).rev() {
      let date = days_ago(today, offset);
      match self.collect_with(date, ExistingDayPolicy::Skip).await {
        Ok(report) => reports.push(report),
        Err(RunError::SourceUnavailable(date)) => {
          tracing::warn!(%date, "no source data, skipping day");
          reports.push(RunReport::untouched(date, RunOutcome::NoSourceData));
        }
        Err(e) => return Err(e),
      }
    }

    let filled = reports
      .iter()
      .filter(|r| matches!(r.outcome, RunOutcome::Inserted))
      .count();
    tracing::info!(days, filled, "backfill complete");
    Ok(reports)
  }

  #[tracing::instrument(skip(self))]
  async fn collect_with(
    &self,
    date: NaiveDate,
    policy: ExistingDayPolicy,
  ) -> Result<RunReport, RunError> {
    if policy == ExistingDayPolicy::Skip
      && self
        .store
        .has_day(date)
        .await
        .map_err(|e| RunError::Store(Box::new(e)))?
    {
      tracing::debug!("day already stored, skipping");
      return Ok(RunReport::untouched(date, RunOutcome::SkippedExisting));
    }

    let fragments = self.source.for_day(date).await.map_err(|e| {
      if Src::is_unavailable(&e) {
        RunError::SourceUnavailable(date)
      } else {
        RunError::Source { date, source: Box::new(e) }
      }
    })?;

    let mut aggregator = MentionAggregator::new(date, self.extractor, self.scorer);
    let mut skipped = 0;
    for fragment in &fragments {
      if let Err(e) = aggregator.record_fragment(&fragment.text) {
        skipped += 1;
        tracing::warn!(
          fragment = fragment.id.as_deref().unwrap_or("-"),
          error = %e,
          "skipping fragment"
        );
      }
    }

    // A day on which every fragment failed is never written.
    if !fragments.is_empty() && skipped == fragments.len() {
      tracing::error!(skipped, "every fragment failed, not writing");
      return Err(RunError::Extraction { date, skipped });
    }

    let aggregate = aggregator.finalize();
    let counts = aggregate.counts();

    let (rows_written, outcome) = match policy {
      ExistingDayPolicy::Replace => {
        (self.store.replace_day(date, &counts).await, RunOutcome::Replaced)
      }
      ExistingDayPolicy::Fail | ExistingDayPolicy::Skip => {
        (self.store.insert_day(date, &counts).await, RunOutcome::Inserted)
      }
    };
    let rows_written =
      rows_written.map_err(|e| RunError::Write { date, source: Box::new(e) })?;

    tracing::info!(
      fragments = fragments.len(),
      skipped,
      tickers = counts.len(),
      rows_written,
      "collected day"
    );

    Ok(RunReport {
      date,
      outcome,
      fragments: fragments.len(),
      skipped,
      rows_written,
      aggregate,
    })
  }
}
