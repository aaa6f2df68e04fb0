//! Runtime configuration, deserialised from `wsb-bot.toml` and `WSB_*`
//! environment variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use wsb_core::{extract::SymbolTable, ticker::Ticker, window::RETENTION_DAYS};

// ─── Policy ───────────────────────────────────────────────────────────────────

/// What a collection run does when the day is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExistingDayPolicy {
  /// Attempt the insert and surface the uniqueness violation.
  #[default]
  Fail,
  /// Leave the stored day alone and report it as skipped.
  Skip,
  /// Delete the stored day and write the new counts in one transaction.
  Replace,
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
  pub store_path:     PathBuf,
  /// Root of the fragment dumps; one sub-directory per subreddit.
  pub source_dir:     PathBuf,
  pub subreddit:      String,
  pub retention_days: u32,
  /// Known symbols. Empty means "accept any well-formed cashtag".
  pub symbols:        Vec<String>,
  /// Optional file with one symbol per line, merged into `symbols`.
  pub symbols_file:   Option<PathBuf>,
  /// Single-word company names mapped to their symbol, e.g.
  /// `gamestop = "GME"`.
  pub aliases:        BTreeMap<String, String>,
  pub on_existing:    ExistingDayPolicy,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      store_path:     PathBuf::from("stocks.db"),
      source_dir:     PathBuf::from("fragments"),
      subreddit:      "wallstreetbets".to_string(),
      retention_days: RETENTION_DAYS,
      symbols:        Vec::new(),
      symbols_file:   None,
      aliases:        BTreeMap::new(),
      on_existing:    ExistingDayPolicy::default(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("failed to read symbols file {path:?}: {source}")]
  SymbolsFile {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid symbol configuration: {0}")]
  Symbols(#[from] wsb_core::Error),
}

impl BotConfig {
  /// Layer the optional TOML file at `path` under `WSB_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::layered(path, config::Environment::with_prefix("WSB"))
  }

  fn layered(
    path: &Path,
    env: config::Environment,
  ) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  #[cfg(test)]
  pub(crate) fn load_with_env(
    path: &Path,
    vars: &[(&str, &str)],
  ) -> Result<Self, ConfigError> {
    let vars = vars
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect();
    Self::layered(path, config::Environment::with_prefix("WSB").source(Some(vars)))
  }

  /// `store_path` with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// Build the disambiguation table from `symbols`, `symbols_file` and
  /// `aliases`.
  pub fn symbol_table(&self) -> Result<SymbolTable, ConfigError> {
    let mut table = SymbolTable::new().with_symbols(&self.symbols)?;

    if let Some(path) = &self.symbols_file {
      let path = expand_tilde(path);
      let contents = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::SymbolsFile { path: path.clone(), source })?;
      table = table.with_symbols(SymbolTable::parse_symbol_list(&contents)?)?;
    }

    for (name, symbol) in &self.aliases {
      table = table.with_alias(name, Ticker::new(symbol)?)?;
    }

    tracing::debug!(symbols = table.len(), aliases = self.aliases.len(), "built symbol table");
    Ok(table)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
