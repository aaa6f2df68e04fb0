//! SQL schema for the mention store.
//!
//! Executed on every open. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per ticker per day. Rows are written in whole-day batches and
-- removed only by retention pruning or an explicit day replacement.
CREATE TABLE IF NOT EXISTS stock_mentions (
    date      TEXT    NOT NULL,   -- ISO 8601 calendar date, YYYY-MM-DD
    ticker    TEXT    NOT NULL,   -- canonical upper-case symbol
    mentions  INTEGER NOT NULL CHECK (mentions >= 0),
    PRIMARY KEY (date, ticker)
) WITHOUT ROWID;

PRAGMA user_version = 1;
";
