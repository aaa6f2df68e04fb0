//! Fragments: the units of text the aggregator consumes.

use serde::{Deserialize, Serialize};

/// Where a fragment came from within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
  Title,
  Body,
  #[default]
  Comment,
}

/// A post title, post body, or comment body.
///
/// The thread relationship is carried for provenance only; aggregation looks
/// at `text` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
  /// Forum-assigned identifier, if the source has one.
  #[serde(default)]
  pub id:     Option<String>,
  #[serde(default)]
  pub kind:   FragmentKind,
  /// Identifier of the submission or comment this one replies to.
  #[serde(default)]
  pub parent: Option<String>,
  pub text:   String,
}

impl Fragment {
  /// A bare comment fragment with no provenance.
  pub fn text(text: impl Into<String>) -> Self {
    Self { id: None, kind: FragmentKind::Comment, parent: None, text: text.into() }
  }
}
