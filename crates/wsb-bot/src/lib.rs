//! Daily collection of ticker mentions from a forum.
//!
//! Wires a [`TextFragmentSource`](wsb_core::source::TextFragmentSource), the
//! extraction and scoring collaborators, and a
//! [`MentionStore`](wsb_core::store::MentionStore) into a [`CollectionRun`].

pub mod config;
pub mod error;
pub mod jsonl;
pub mod run;

pub use config::{BotConfig, ExistingDayPolicy};
pub use error::RunError;
pub use jsonl::JsonlSource;
pub use run::{CollectionRun, RunOutcome, RunReport};

use std::path::Path;

use wsb_store_sqlite::SqliteStore;

/// Open the store for one session. Failure here is fatal to the run.
pub async fn open_store(path: &Path) -> Result<SqliteStore, RunError> {
  SqliteStore::open(path)
    .await
    .map_err(|e| RunError::Connection(Box::new(e)))
}

#[cfg(test)]
mod tests;
