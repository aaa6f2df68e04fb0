//! `wsb-bot`: collects daily ticker mentions and answers popularity queries.
//!
//! Reads `wsb-bot.toml` (or the path given with `--config`) layered under
//! `WSB_*` environment variables, opens the SQLite store for the duration of
//! one command, and closes it on every exit path.
//!
//! ```text
//! wsb-bot collect --date 2021-01-27
//! wsb-bot backfill --days 30
//! wsb-bot popular --count 10 --days 7
//! wsb-bot prune
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wsb_bot::{BotConfig, CollectionRun, ExistingDayPolicy, JsonlSource, RunReport, open_store};
use wsb_core::{
  extract::{LexiconScorer, SymbolExtractor},
  store::MentionStore,
  window::days_ago,
};
use wsb_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Daily stock-ticker mentions from r/wallstreetbets")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "wsb-bot.toml")]
  config: PathBuf,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Collect one day's mentions (yesterday by default).
  Collect {
    #[arg(long)]
    date:        Option<NaiveDate>,
    /// Override the configured policy for an already-stored day.
    #[arg(long, value_enum)]
    on_existing: Option<ExistingDayPolicy>,
  },
  /// Collect every missing day in the last N days.
  Backfill {
    #[arg(long)]
    days: u32,
  },
  /// Most-mentioned tickers over a trailing window.
  Popular {
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    count: i64,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    days:  i64,
  },
  /// Delete rows older than the retention window.
  Prune {
    #[arg(long, allow_negative_numbers = true)]
    retention_days: Option<i64>,
  },
  /// Print the oldest stored date.
  Oldest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let cfg = BotConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = cfg.store_path();
  let store = open_store(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Close the store regardless of the command's result.
  let result = execute(&cli, &cfg, &store).await;
  let closed = store.close().await;
  result?;
  closed.context("failed to close store")?;

  Ok(())
}

async fn execute(cli: &Cli, cfg: &BotConfig, store: &SqliteStore) -> anyhow::Result<()> {
  match &cli.command {
    Command::Collect { date, on_existing } => {
      let date = date.unwrap_or_else(|| days_ago(store.today(), 1));
      let extractor = SymbolExtractor::new(cfg.symbol_table()?);
      let scorer = LexiconScorer::new();
      let source = JsonlSource::new(&cfg.source_dir, &cfg.subreddit);

      let report = CollectionRun::new(store, &source, &extractor, &scorer)
        .on_existing(on_existing.unwrap_or(cfg.on_existing))
        .collect(date)
        .await
        .with_context(|| format!("collection for {date} failed"))?;

      print_reports(cli.json, &[report])?;
    }

    Command::Backfill { days } => {
      let extractor = SymbolExtractor::new(cfg.symbol_table()?);
      let scorer = LexiconScorer::new();
      let source = JsonlSource::new(&cfg.source_dir, &cfg.subreddit);

      let reports = CollectionRun::new(store, &source, &extractor, &scorer)
        .backfill(store.today(), *days)
        .await
        .context("backfill failed")?;

      print_reports(cli.json, &reports)?;
    }

    Command::Popular { count, days } => {
      let rows = store.query_popular(*count, *days).await?;
      if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
      } else if rows.is_empty() {
        println!("no mentions in the last {days} day(s)");
      } else {
        for (rank, row) in rows.iter().enumerate() {
          println!("{:>3}  {:<10} {}", rank + 1, row.ticker, row.total_mentions);
        }
      }
    }

    Command::Prune { retention_days } => {
      let retention = retention_days.unwrap_or(i64::from(cfg.retention_days));
      let deleted = store.delete_older_than(retention).await?;
      println!("deleted {deleted} row(s) older than {retention} day(s)");
    }

    Command::Oldest => match store.oldest_date().await? {
      Some(date) => println!("{date}"),
      None => println!("no data"),
    },
  }

  Ok(())
}

fn print_reports(json: bool, reports: &[RunReport]) -> anyhow::Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(reports)?);
    return Ok(());
  }
  for r in reports {
    println!(
      "{}  {:?}  fragments={} skipped={} tickers={} rows={}",
      r.date,
      r.outcome,
      r.fragments,
      r.skipped,
      r.aggregate.tickers.len(),
      r.rows_written,
    );
  }
  Ok(())
}
