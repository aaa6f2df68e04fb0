//! Orchestration tests: collection runs against an in-memory store.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use wsb_core::{
  Error,
  clock::FixedClock,
  extract::{LexiconScorer, SymbolExtractor, SymbolTable, TickerExtractor},
  fragment::{Fragment, FragmentKind},
  source::TextFragmentSource,
  store::MentionStore,
  ticker::{MentionCounts, Ticker},
  window::days_ago,
};
use wsb_store_sqlite::SqliteStore;

use crate::{
  BotConfig, CollectionRun, ExistingDayPolicy, JsonlSource, RunError, RunOutcome,
};

fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2021, 1, 29).unwrap() }

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
    .with_clock(FixedClock(today()))
}

fn extractor() -> SymbolExtractor<SymbolTable> {
  SymbolExtractor::new(
    SymbolTable::new()
      .with_symbols(["GME", "AMC", "BB", "NOK"])
      .unwrap(),
  )
}

fn t(s: &str) -> Ticker { Ticker::new(s).unwrap() }

// ─── Test collaborators ───────────────────────────────────────────────────────

/// Fragments held in memory, keyed by day.
#[derive(Default)]
struct StaticSource {
  days: HashMap<NaiveDate, Vec<Fragment>>,
}

impl StaticSource {
  fn with_day(mut self, date: NaiveDate, texts: &[&str]) -> Self {
    let fragments = texts.iter().map(|t| Fragment::text(*t)).collect();
    self.days.insert(date, fragments);
    self
  }
}

impl TextFragmentSource for StaticSource {
  type Error = Error;

  async fn for_day(&self, date: NaiveDate) -> Result<Vec<Fragment>, Error> {
    self
      .days
      .get(&date)
      .cloned()
      .ok_or(Error::SourceUnavailable(date))
  }

  fn is_unavailable(err: &Error) -> bool { matches!(err, Error::SourceUnavailable(_)) }
}

/// A source whose backend is down.
struct BrokenSource;

impl TextFragmentSource for BrokenSource {
  type Error = Error;

  async fn for_day(&self, _: NaiveDate) -> Result<Vec<Fragment>, Error> {
    Err(Error::Source("connection reset".into()))
  }

  fn is_unavailable(_: &Error) -> bool { false }
}

/// Delegates to the default extractor but fails on any fragment containing
/// "boom".
struct Flaky(SymbolExtractor<SymbolTable>);

impl TickerExtractor for Flaky {
  fn extract(&self, text: &str) -> wsb_core::Result<BTreeSet<Ticker>> {
    if text.contains("boom") {
      return Err(Error::Extraction("recogniser crashed".into()));
    }
    self.0.extract(text)
  }
}

// ─── Collect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn collect_writes_counts_for_the_day() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let source = StaticSource::default().with_day(day, &[
    "GME to the moon, GME GME",
    "$AMC calls",
    "GME and AMC both squeezing",
    "nothing to see here",
  ]);
  let (x, sc) = (extractor(), LexiconScorer::new());

  let report = CollectionRun::new(&s, &source, &x, &sc)
    .collect(day)
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Inserted);
  assert_eq!(report.fragments, 4);
  assert_eq!(report.skipped, 0);
  assert_eq!(report.rows_written, 2);
  assert_eq!(report.aggregate.counts()[&t("GME")], 2);
  assert_eq!(report.aggregate.counts()[&t("AMC")], 2);

  let rows = s.day(day).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|r| r.mentions == 2));
}

#[tokio::test]
async fn failing_fragments_are_skipped_not_fatal() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let source = StaticSource::default().with_day(day, &["GME", "boom GME", "BB"]);
  let (x, sc) = (Flaky(extractor()), LexiconScorer::new());

  let report = CollectionRun::new(&s, &source, &x, &sc)
    .collect(day)
    .await
    .unwrap();

  assert_eq!(report.skipped, 1);
  assert_eq!(report.aggregate.counts()[&t("GME")], 1);
  assert_eq!(s.query_popular(10, 1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_day_fails_under_default_policy() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let source = StaticSource::default().with_day(day, &["GME", "AMC"]);
  let (x, sc) = (extractor(), LexiconScorer::new());
  let run = CollectionRun::new(&s, &source, &x, &sc);

  run.collect(day).await.unwrap();
  let err = run.collect(day).await.unwrap_err();

  let RunError::Write { date, source } = &err else {
    panic!("expected a write error, got {err:?}");
  };
  assert_eq!(*date, day);
  let store_err = source
    .downcast_ref::<wsb_store_sqlite::Error>()
    .expect("store error");
  assert!(store_err.is_duplicate());

  // The first collection is intact.
  assert_eq!(s.day(day).await.unwrap().len(), 2);
}

#[tokio::test]
async fn skip_policy_leaves_stored_day_alone() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let (x, sc) = (extractor(), LexiconScorer::new());

  let first = StaticSource::default().with_day(day, &["GME"]);
  CollectionRun::new(&s, &first, &x, &sc).collect(day).await.unwrap();

  let second = StaticSource::default().with_day(day, &["AMC", "AMC too"]);
  let report = CollectionRun::new(&s, &second, &x, &sc)
    .on_existing(ExistingDayPolicy::Skip)
    .collect(day)
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::SkippedExisting);
  let rows = s.day(day).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].ticker, t("GME"));
}

#[tokio::test]
async fn replace_policy_overwrites_stored_day() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let (x, sc) = (extractor(), LexiconScorer::new());

  let first = StaticSource::default().with_day(day, &["GME"]);
  CollectionRun::new(&s, &first, &x, &sc).collect(day).await.unwrap();

  let second = StaticSource::default().with_day(day, &["AMC", "AMC too"]);
  let report = CollectionRun::new(&s, &second, &x, &sc)
    .on_existing(ExistingDayPolicy::Replace)
    .collect(day)
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Replaced);
  let rows = s.day(day).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].ticker, t("AMC"));
  assert_eq!(rows[0].mentions, 2);
}

#[tokio::test]
async fn all_fragments_failing_leaves_stored_day_intact() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let sc = LexiconScorer::new();

  let first = StaticSource::default().with_day(day, &["GME", "AMC"]);
  CollectionRun::new(&s, &first, &extractor(), &sc)
    .collect(day)
    .await
    .unwrap();

  let broken = StaticSource::default().with_day(day, &["boom GME", "boom AMC"]);
  let flaky = Flaky(extractor());
  for policy in [ExistingDayPolicy::Replace, ExistingDayPolicy::Fail] {
    let err = CollectionRun::new(&s, &broken, &flaky, &sc)
      .on_existing(policy)
      .collect(day)
      .await
      .unwrap_err();
    assert!(
      matches!(err, RunError::Extraction { date, skipped: 2 } if date == day),
      "{policy:?}: {err}"
    );
  }

  let stored: MentionCounts =
    s.day(day).await.unwrap().into_iter().map(|r| (r.ticker, r.mentions)).collect();
  assert_eq!(stored, MentionCounts::from([(t("AMC"), 1), (t("GME"), 1)]));
}

#[tokio::test]
async fn empty_source_day_is_not_an_extraction_failure() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let (x, sc) = (Flaky(extractor()), LexiconScorer::new());

  let source = StaticSource::default().with_day(day, &[]);
  let report = CollectionRun::new(&s, &source, &x, &sc)
    .collect(day)
    .await
    .unwrap();
  assert_eq!(report.outcome, RunOutcome::Inserted);
  assert_eq!(report.rows_written, 0);
}

#[tokio::test]
async fn source_failures_abort_before_writing() {
  let s = store().await;
  let day = days_ago(today(), 1);
  let (x, sc) = (extractor(), LexiconScorer::new());

  let err = CollectionRun::new(&s, &BrokenSource, &x, &sc)
    .collect(day)
    .await
    .unwrap_err();
  assert!(matches!(err, RunError::Source { date, .. } if date == day));

  let err = CollectionRun::new(&s, &StaticSource::default(), &x, &sc)
    .collect(day)
    .await
    .unwrap_err();
  assert!(matches!(err, RunError::SourceUnavailable(date) if date == day));

  assert_eq!(s.oldest_date().await.unwrap(), None);
}

// ─── Backfill ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn backfill_fills_missing_days_oldest_first() {
  let s = store().await;
  let (x, sc) = (extractor(), LexiconScorer::new());
  let d1 = days_ago(today(), 1);
  let d2 = days_ago(today(), 2);
  let d3 = days_ago(today(), 3);

  // d3 has no dump at all; d2 is already stored.
  let source = StaticSource::default()
    .with_day(d1, &["GME"])
    .with_day(d2, &["AMC"]);
  let stored: MentionCounts = [(t("BB"), 9)].into_iter().collect();
  s.insert_day(d2, &stored).await.unwrap();

  let reports = CollectionRun::new(&s, &source, &x, &sc)
    .backfill(today(), 3)
    .await
    .unwrap();

  let outcomes: Vec<_> = reports.iter().map(|r| (r.date, r.outcome)).collect();
  assert_eq!(outcomes, [
    (d3, RunOutcome::NoSourceData),
    (d2, RunOutcome::SkippedExisting),
    (d1, RunOutcome::Inserted),
  ]);
  assert_eq!(s.day(d2).await.unwrap()[0].ticker, t("BB"));
  assert_eq!(s.day(d1).await.unwrap()[0].ticker, t("GME"));
}

#[tokio::test]
async fn backfill_is_clamped_to_retention() {
  let s = store().await;
  let (x, sc) = (extractor(), LexiconScorer::new());

  let reports = CollectionRun::new(&s, &StaticSource::default(), &x, &sc)
    .backfill(today(), 365)
    .await
    .unwrap();

  assert_eq!(reports.len(), 60);
  assert_eq!(reports[0].date, days_ago(today(), 60));
}

// ─── JSONL source ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn jsonl_source_reads_fragments_and_skips_bad_lines() {
  let dir = tempfile::tempdir().unwrap();
  let day = NaiveDate::from_ymd_opt(2021, 1, 27).unwrap();
  let source = JsonlSource::new(dir.path(), "wallstreetbets");

  std::fs::create_dir_all(dir.path().join("wallstreetbets")).unwrap();
  std::fs::write(
    source.path_for(day),
    concat!(
      r#"{"id":"t3_a","kind":"title","text":"GME YOLO"}"#, "\n",
      "\n",
      "not json\n",
      r#"{"id":"t1_b","kind":"comment","parent":"t3_a","text":"$AMC"}"#, "\n",
      r#"{"text":"bare"}"#, "\n",
    ),
  )
  .unwrap();

  let fragments = source.for_day(day).await.unwrap();
  assert_eq!(fragments.len(), 3);
  assert_eq!(fragments[0].kind, FragmentKind::Title);
  assert_eq!(fragments[1].parent.as_deref(), Some("t3_a"));
  assert_eq!(fragments[2].kind, FragmentKind::Comment);
}

#[tokio::test]
async fn jsonl_source_reports_missing_days() {
  let dir = tempfile::tempdir().unwrap();
  let day = NaiveDate::from_ymd_opt(2021, 1, 27).unwrap();
  let source = JsonlSource::new(dir.path(), "wallstreetbets");

  let err = source.for_day(day).await.unwrap_err();
  assert!(JsonlSource::is_unavailable(&err));
}

// ─── Config & session ─────────────────────────────────────────────────────────

#[test]
fn config_loads_file_and_builds_symbol_table() {
  let dir = tempfile::tempdir().unwrap();
  let symbols = dir.path().join("symbols.txt");
  std::fs::write(&symbols, "# meme stocks\nGME\nAMC\n").unwrap();

  let path = dir.path().join("wsb-bot.toml");
  std::fs::write(
    &path,
    format!(
      "store_path = \"/tmp/mentions.db\"\n\
       subreddit = \"stocks\"\n\
       on_existing = \"replace\"\n\
       symbols = [\"TSLA\"]\n\
       symbols_file = {symbols:?}\n\
       [aliases]\n\
       gamestop = \"GME\"\n"
    ),
  )
  .unwrap();

  let cfg = BotConfig::load(&path).unwrap();
  assert_eq!(cfg.subreddit, "stocks");
  assert_eq!(cfg.on_existing, ExistingDayPolicy::Replace);
  assert_eq!(cfg.retention_days, 60);

  let table = cfg.symbol_table().unwrap();
  assert_eq!(table.len(), 3);

  let found = SymbolExtractor::new(table).extract("GameStop and TSLA").unwrap();
  assert_eq!(found.into_iter().collect::<Vec<_>>(), [t("GME"), t("TSLA")]);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
  let dir = tempfile::tempdir().unwrap();
  let cfg = BotConfig::load(&dir.path().join("absent.toml")).unwrap();
  assert_eq!(cfg.on_existing, ExistingDayPolicy::Fail);
  assert_eq!(cfg.subreddit, "wallstreetbets");
}

#[test]
fn environment_overrides_config_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("wsb-bot.toml");
  std::fs::write(&path, "subreddit = \"stocks\"\non_existing = \"skip\"\n").unwrap();

  let cfg = BotConfig::load_with_env(&path, &[
    ("WSB_SUBREDDIT", "pennystocks"),
    ("WSB_STORE_PATH", "/var/lib/wsb/mentions.db"),
  ])
  .unwrap();

  assert_eq!(cfg.subreddit, "pennystocks");
  assert_eq!(cfg.store_path(), std::path::PathBuf::from("/var/lib/wsb/mentions.db"));
  assert_eq!(cfg.on_existing, ExistingDayPolicy::Skip);
}

#[test]
fn multi_word_alias_in_config_is_rejected() {
  let cfg = BotConfig {
    aliases: [("Tesla Motors".to_owned(), "TSLA".to_owned())].into(),
    ..BotConfig::default()
  };
  assert!(matches!(
    cfg.symbol_table().unwrap_err(),
    crate::config::ConfigError::Symbols(Error::InvalidAlias(_))
  ));
}

#[tokio::test]
async fn open_store_reports_connection_failure() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("no-such-dir").join("stocks.db");

  let err = crate::open_store(&path).await.err().unwrap();
  assert!(matches!(err, RunError::Connection(_)));
}
