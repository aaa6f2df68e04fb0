//! A [`TextFragmentSource`] over JSON-lines dumps on disk.
//!
//! Layout: `<source_dir>/<subreddit>/<YYYY-MM-DD>.jsonl`, one JSON
//! [`Fragment`] per line, e.g.
//!
//! ```text
//! {"id":"t3_l6wu59","kind":"title","text":"GME YOLO update"}
//! {"id":"t1_gl1xyz","kind":"comment","parent":"t3_l6wu59","text":"$GME 🚀"}
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use wsb_core::{Error, fragment::Fragment, source::TextFragmentSource};

#[derive(Debug, Clone)]
pub struct JsonlSource {
  root: PathBuf,
}

impl JsonlSource {
  pub fn new(source_dir: impl AsRef<Path>, subreddit: &str) -> Self {
    Self { root: source_dir.as_ref().join(subreddit) }
  }

  /// The file holding fragments for `date`.
  pub fn path_for(&self, date: NaiveDate) -> PathBuf {
    self.root.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
  }
}

impl TextFragmentSource for JsonlSource {
  type Error = Error;

  async fn for_day(&self, date: NaiveDate) -> Result<Vec<Fragment>, Error> {
    let path = self.path_for(date);
    let raw = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(Error::SourceUnavailable(date));
      }
      Err(e) => return Err(Error::Source(format!("{}: {e}", path.display()))),
    };

    let fragments = parse_fragments(&raw, &path);
    tracing::debug!(path = %path.display(), fragments = fragments.len(), "read fragments");
    Ok(fragments)
  }

  fn is_unavailable(err: &Error) -> bool { matches!(err, Error::SourceUnavailable(_)) }
}

/// Parse one fragment per non-blank line; malformed lines are logged and
/// skipped.
fn parse_fragments(raw: &str, origin: &Path) -> Vec<Fragment> {
  raw
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .filter_map(|(i, line)| match serde_json::from_str::<Fragment>(line) {
      Ok(f) => Some(f),
      Err(e) => {
        tracing::warn!(
          file = %origin.display(),
          line = i + 1,
          error = %e,
          "skipping malformed fragment"
        );
        None
      }
    })
    .collect()
}
