//! Folding one day's fragments into per-ticker mention counts and sentiment.
//!
//! A fragment contributes at most one mention per ticker no matter how often
//! the ticker appears in it, so a single comment repeating a symbol cannot
//! dominate the day. Sentiment is scored once per fragment and shared by
//! every ticker found in that fragment.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  extract::{SentimentScorer, TickerExtractor},
  ticker::{MentionCounts, Ticker},
};

// ─── Accumulation state ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
struct Accumulator {
  mentions:         u32,
  sentiment_scores: Vec<f64>,
}

impl Accumulator {
  fn average(&self) -> f64 {
    if self.sentiment_scores.is_empty() {
      return 0.0;
    }
    self.sentiment_scores.iter().sum::<f64>() / self.sentiment_scores.len() as f64
  }
}

// ─── Finalised output ────────────────────────────────────────────────────────

/// Finalised figures for one ticker on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
  pub mentions:          u32,
  /// Mean of the recorded scores; `0.0` when none were recorded.
  pub average_sentiment: f64,
  /// Fragments mentioning the ticker that scored above zero.
  pub bullish:           u32,
  /// Fragments mentioning the ticker that scored below zero.
  pub bearish:           u32,
}

/// Snapshot produced by [`MentionAggregator::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
  pub date:    NaiveDate,
  pub tickers: BTreeMap<Ticker, TickerSummary>,
}

impl DailyAggregate {
  /// The mention-count mapping written to the store.
  pub fn counts(&self) -> MentionCounts {
    self
      .tickers
      .iter()
      .map(|(t, s)| (t.clone(), s.mentions))
      .collect()
  }

  /// Average sentiment per ticker. Not persisted.
  pub fn sentiment(&self) -> BTreeMap<Ticker, f64> {
    self
      .tickers
      .iter()
      .map(|(t, s)| (t.clone(), s.average_sentiment))
      .collect()
  }

  pub fn is_empty(&self) -> bool { self.tickers.is_empty() }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Accumulates one collection run (one day) in memory.
///
/// Touches no storage. Build one per run; discard after the finalised counts
/// are flushed.
pub struct MentionAggregator<'c> {
  date:      NaiveDate,
  extractor: &'c dyn TickerExtractor,
  scorer:    &'c dyn SentimentScorer,
  tickers:   BTreeMap<Ticker, Accumulator>,
  fragments: u64,
}

impl<'c> MentionAggregator<'c> {
  pub fn new(
    date: NaiveDate,
    extractor: &'c dyn TickerExtractor,
    scorer: &'c dyn SentimentScorer,
  ) -> Self {
    Self { date, extractor, scorer, tickers: BTreeMap::new(), fragments: 0 }
  }

  pub fn date(&self) -> NaiveDate { self.date }

  /// Fragments successfully recorded so far, including those that mentioned
  /// no ticker.
  pub fn fragments(&self) -> u64 { self.fragments }

  /// Extract tickers from `text` and fold them in.
  ///
  /// Returns the number of distinct tickers found. On error nothing is
  /// recorded, so the caller may skip the fragment and continue.
  pub fn record_fragment(&mut self, text: &str) -> Result<usize> {
    let found = self.extractor.extract(text)?;
    if found.is_empty() {
      self.fragments += 1;
      return Ok(0);
    }

    let score = self.scorer.score(text)?;
    if !(-1.0..=1.0).contains(&score) {
      return Err(Error::ScoreOutOfRange(score));
    }

    self.fragments += 1;
    let n = found.len();
    for ticker in found {
      let acc = self.tickers.entry(ticker).or_default();
      acc.mentions += 1;
      acc.sentiment_scores.push(score);
    }
    tracing::trace!(tickers = n, score, "recorded fragment");
    Ok(n)
  }

  /// Fold another aggregator for the same day into this one.
  ///
  /// Mention counts add and score lists concatenate, so the finalised result
  /// does not depend on how fragments were partitioned.
  pub fn merge(&mut self, other: MentionAggregator<'_>) -> Result<()> {
    if other.date != self.date {
      return Err(Error::DateMismatch { ours: self.date, theirs: other.date });
    }
    self.fragments += other.fragments;
    for (ticker, theirs) in other.tickers {
      let ours = self.tickers.entry(ticker).or_default();
      ours.mentions += theirs.mentions;
      ours.sentiment_scores.extend(theirs.sentiment_scores);
    }
    Ok(())
  }

  /// Snapshot the counts and averaged sentiment.
  pub fn finalize(&self) -> DailyAggregate {
    let tickers = self
      .tickers
      .iter()
      .map(|(ticker, acc)| {
        let summary = TickerSummary {
          mentions:          acc.mentions,
          average_sentiment: acc.average(),
          bullish:           count_where(&acc.sentiment_scores, |s| s > 0.0),
          bearish:           count_where(&acc.sentiment_scores, |s| s < 0.0),
        };
        (ticker.clone(), summary)
      })
      .collect();

    DailyAggregate { date: self.date, tickers }
  }
}

fn count_where(scores: &[f64], pred: impl Fn(f64) -> bool) -> u32 {
  scores.iter().filter(|s| pred(**s)).count() as u32
}
