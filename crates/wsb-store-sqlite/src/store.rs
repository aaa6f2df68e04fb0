//! [`SqliteStore`]: the SQLite implementation of [`MentionStore`].

use std::{path::Path, sync::Arc};

use chrono::NaiveDate;
use rusqlite::{ErrorCode, Transaction, ffi};

use wsb_core::{
  clock::{Clock, SystemClock},
  store::MentionStore,
  ticker::{MentionCounts, MentionRecord, PopularTicker},
  window::{PopularityQuery, retention_cutoff},
};

use crate::{
  Error, Result,
  encode::{RawMention, RawPopular, decode_date, encode_counts, encode_date},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A mention store backed by a single SQLite file.
///
/// The connection is opened once and released when the last clone is dropped
/// or [`SqliteStore::close`] is called. It is never reopened implicitly.
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Connection)?;
    Self::init(conn).await
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Connection)?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::Connection)?;
    Ok(Self { conn, clock: Arc::new(SystemClock) })
  }

  /// Replace the clock that defines "today" for windows and retention.
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn today(&self) -> NaiveDate { self.clock.today() }

  /// Close the connection, surfacing any error from the final flush.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run a day's write inside one transaction, classifying failures.
  async fn write_day<F>(&self, date: NaiveDate, write: F) -> Result<usize>
  where
    F: FnOnce(&Transaction<'_>) -> rusqlite::Result<usize> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let written = write(&tx)?;
        tx.commit()?;
        Ok(written)
      })
      .await
      .map_err(|e| classify_write_error(date, e))
  }
}

/// Insert `(ticker, mentions)` rows for one date through `tx`.
fn insert_rows(
  tx:   &Transaction<'_>,
  date: &str,
  rows: &[(String, i64)],
) -> rusqlite::Result<usize> {
  let mut stmt = tx.prepare_cached(
    "INSERT INTO stock_mentions (date, ticker, mentions) VALUES (?1, ?2, ?3)",
  )?;
  for (ticker, mentions) in rows {
    stmt.execute(rusqlite::params![date, ticker, mentions])?;
  }
  Ok(rows.len())
}

fn classify_write_error(date: NaiveDate, err: tokio_rusqlite::Error) -> Error {
  match &err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.code == ErrorCode::ConstraintViolation
        && e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
    {
      Error::DuplicateDay { date }
    }
    _ => Error::Write { date, source: err },
  }
}

// ─── MentionStore impl ───────────────────────────────────────────────────────

impl MentionStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_day(&self, date: NaiveDate, counts: &MentionCounts) -> Result<usize> {
    let date_str = encode_date(date);
    let rows     = encode_counts(counts);

    let written = self
      .write_day(date, move |tx| insert_rows(tx, &date_str, &rows))
      .await?;

    tracing::debug!(%date, rows = written, "inserted day");
    Ok(written)
  }

  async fn replace_day(&self, date: NaiveDate, counts: &MentionCounts) -> Result<usize> {
    let date_str = encode_date(date);
    let rows     = encode_counts(counts);

    let written = self
      .write_day(date, move |tx| {
        let removed = tx.execute(
          "DELETE FROM stock_mentions WHERE date = ?1",
          rusqlite::params![date_str],
        )?;
        tracing::debug!(date = %date_str, removed, "cleared day before replace");
        insert_rows(tx, &date_str, &rows)
      })
      .await?;

    tracing::debug!(%date, rows = written, "replaced day");
    Ok(written)
  }

  async fn delete_older_than(&self, retention_days: i64) -> Result<usize> {
    let cutoff     = retention_cutoff(self.today(), retention_days)?;
    let cutoff_str = encode_date(cutoff);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM stock_mentions WHERE date < ?1",
          rusqlite::params![cutoff_str],
        )?)
      })
      .await?;

    tracing::info!(%cutoff, deleted, "pruned expired mentions");
    Ok(deleted)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_popular(&self, count: i64, days: i64) -> Result<Vec<PopularTicker>> {
    let query     = PopularityQuery::new(count, days)?;
    let since_str = encode_date(query.since(self.today()));
    let limit     = i64::from(query.count);

    let raws: Vec<RawPopular> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ticker, SUM(mentions) AS total
           FROM stock_mentions
           WHERE date >= ?1
           GROUP BY ticker
           ORDER BY total DESC, ticker ASC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str, limit], |row| {
            Ok(RawPopular { ticker: row.get(0)?, total: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPopular::into_popular).collect()
  }

  async fn oldest_date(&self) -> Result<Option<NaiveDate>> {
    let raw: Option<String> = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT MIN(date) FROM stock_mentions", [], |row| {
          row.get(0)
        })?)
      })
      .await?;

    raw.as_deref().map(decode_date).transpose()
  }

  async fn has_day(&self, date: NaiveDate) -> Result<bool> {
    let date_str = encode_date(date);

    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM stock_mentions WHERE date = ?1)",
          rusqlite::params![date_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(exists)
  }

  async fn day(&self, date: NaiveDate) -> Result<Vec<MentionRecord>> {
    let date_str = encode_date(date);

    let raws: Vec<RawMention> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT date, ticker, mentions
           FROM stock_mentions
           WHERE date = ?1
           ORDER BY mentions DESC, ticker ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], |row| {
            Ok(RawMention {
              date:     row.get(0)?,
              ticker:   row.get(1)?,
              mentions: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMention::into_record).collect()
  }
}
