//! Ticker extraction and sentiment scoring.
//!
//! The aggregator only sees the two composed contracts, [`TickerExtractor`]
//! and [`SentimentScorer`]. The default implementations here are lexical:
//! [`SymbolExtractor`] recognises candidate strings with a regex and hands
//! each to a [`Disambiguator`], and [`LexiconScorer`] counts bullish and
//! bearish vocabulary. Either can be swapped for an NLP-backed
//! implementation without touching the core.

use std::{
  collections::{BTreeSet, HashMap, HashSet},
  sync::LazyLock,
};

use regex::Regex;

use crate::{Error, Result, ticker::Ticker};

// ─── Contracts ───────────────────────────────────────────────────────────────

/// Maps a fragment of text to the canonical tickers it mentions.
pub trait TickerExtractor: Send + Sync {
  /// Return every distinct ticker found in `text` (possibly none).
  ///
  /// Empty or whitespace-only input yields an empty set, never an error.
  fn extract(&self, text: &str) -> Result<BTreeSet<Ticker>>;
}

/// Maps a fragment of text to a polarity score in `[-1.0, 1.0]`.
pub trait SentimentScorer: Send + Sync {
  fn score(&self, text: &str) -> Result<f64>;
}

/// How a candidate string appeared in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateForm {
  /// Prefixed with `$`, e.g. `$GME`.
  Cashtag,
  /// A bare all-caps word, e.g. `GME`.
  Symbol,
  /// Any other word, possibly a company name, e.g. `GameStop`.
  Word,
}

/// A raw string the recogniser thinks might name a security.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
  /// The text without any `$` prefix.
  pub text: &'a str,
  pub form: CandidateForm,
}

/// Resolves a recognised candidate to a canonical ticker, or `None` when it
/// is not a ticker.
pub trait Disambiguator: Send + Sync {
  fn resolve(&self, candidate: &Candidate<'_>) -> Option<Ticker>;
}

// ─── SymbolTable ─────────────────────────────────────────────────────────────

/// All-caps words common on the forum that are not (useful) tickers.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
  "A", "ALL", "AM", "AN", "AND", "ARE", "AT", "ATH", "BE", "BUY", "CEO", "CFO",
  "DD", "EOD", "EPS", "ETF", "FD", "FOMO", "FUD", "FYI", "GDP", "HODL", "I",
  "IMO", "IPO", "IRS", "IT", "LOL", "MOON", "NYSE", "OP", "OR", "OTM", "ITM",
  "PM", "SEC", "SO", "THE", "TLDR", "USA", "USD", "WSB", "YOLO",
];

/// A [`Disambiguator`] backed by a list of known symbols, company-name
/// aliases and a stop-list.
///
/// With no known symbols every syntactically valid cashtag is accepted and
/// bare words are ignored. With a non-empty symbol list only listed symbols
/// (or aliases) resolve.
#[derive(Debug, Clone)]
pub struct SymbolTable {
  symbols:    HashSet<Ticker>,
  aliases:    HashMap<String, Ticker>,
  stop_words: HashSet<String>,
}

impl Default for SymbolTable {
  fn default() -> Self {
    Self {
      symbols:    HashSet::new(),
      aliases:    HashMap::new(),
      stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_owned()).collect(),
    }
  }
}

impl SymbolTable {
  pub fn new() -> Self { Self::default() }

  /// Add known symbols. Invalid entries are rejected.
  pub fn with_symbols<I, S>(mut self, symbols: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for s in symbols {
      self.symbols.insert(Ticker::new(s.as_ref())?);
    }
    Ok(self)
  }

  /// Add a company-name alias, matched case-insensitively as a whole word.
  ///
  /// Candidates are single words, so a name with spaces or punctuation
  /// other than `.` is rejected.
  pub fn with_alias(mut self, name: &str, ticker: Ticker) -> Result<Self> {
    let name = name.trim();
    let whole = candidate_pattern()?
      .find(name)
      .is_some_and(|m| m.start() == 0 && m.end() == name.len());
    if !whole || name.starts_with('$') {
      return Err(Error::InvalidAlias(name.to_owned()));
    }
    self.aliases.insert(name.to_uppercase(), ticker);
    Ok(self)
  }

  /// Parse a symbol list: one symbol per line, blank lines and `#` comments
  /// ignored.
  pub fn parse_symbol_list(contents: &str) -> Result<Vec<Ticker>> {
    contents
      .lines()
      .map(|line| line.split('#').next().unwrap_or_default().trim())
      .filter(|line| !line.is_empty())
      .map(Ticker::new)
      .collect()
  }

  pub fn len(&self) -> usize { self.symbols.len() }

  pub fn is_empty(&self) -> bool { self.symbols.is_empty() }
}

impl Disambiguator for SymbolTable {
  fn resolve(&self, candidate: &Candidate<'_>) -> Option<Ticker> {
    let upper = candidate.text.to_uppercase();

    if let Some(t) = self.aliases.get(&upper) {
      return Some(t.clone());
    }

    match candidate.form {
      CandidateForm::Word => None,
      CandidateForm::Symbol if self.stop_words.contains(&upper) => None,
      CandidateForm::Symbol => {
        let t = Ticker::new(&upper).ok()?;
        self.symbols.contains(&t).then_some(t)
      }
      CandidateForm::Cashtag => {
        let t = Ticker::new(&upper).ok()?;
        (self.symbols.is_empty() || self.symbols.contains(&t)).then_some(t)
      }
    }
  }
}

// ─── SymbolExtractor ─────────────────────────────────────────────────────────

/// Longest bare all-caps word considered a symbol candidate.
const MAX_BARE_SYMBOL_LEN: usize = 5;

// `$`-prefixed or bare words; `.` allowed inside for class shares.
static CANDIDATE: LazyLock<Result<Regex, regex::Error>> =
  LazyLock::new(|| Regex::new(r"\$?[A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z0-9]+)*"));

fn candidate_pattern() -> Result<&'static Regex> {
  CANDIDATE
    .as_ref()
    .map_err(|e| Error::Extraction(format!("candidate pattern: {e}")))
}

/// Regex-based recogniser composed with a [`Disambiguator`].
pub struct SymbolExtractor<D> {
  disambiguator: D,
}

impl<D: Disambiguator> SymbolExtractor<D> {
  pub fn new(disambiguator: D) -> Self { Self { disambiguator } }

  /// Candidate strings in order of appearance, duplicates included.
  pub fn candidates<'t>(&self, text: &'t str) -> Result<Vec<Candidate<'t>>> {
    Ok(
      candidate_pattern()?
        .find_iter(text)
        .filter(|m| {
          // Reject matches glued to a preceding word character, e.g. `a$b`.
          !text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        })
        .map(|m| {
          let raw = m.as_str();
          if let Some(stripped) = raw.strip_prefix('$') {
            Candidate { text: stripped, form: CandidateForm::Cashtag }
          } else if raw.len() <= MAX_BARE_SYMBOL_LEN
            && raw.chars().all(|c| c.is_ascii_uppercase() || c == '.')
          {
            Candidate { text: raw, form: CandidateForm::Symbol }
          } else {
            Candidate { text: raw, form: CandidateForm::Word }
          }
        })
        .collect(),
    )
  }
}

impl<D: Disambiguator> TickerExtractor for SymbolExtractor<D> {
  fn extract(&self, text: &str) -> Result<BTreeSet<Ticker>> {
    Ok(
      self
        .candidates(text)?
        .iter()
        .filter_map(|c| self.disambiguator.resolve(c))
        .collect(),
    )
  }
}

// ─── LexiconScorer ───────────────────────────────────────────────────────────

const BULLISH: &[&str] = &[
  "bull", "bullish", "buy", "buying", "calls", "call", "long", "moon",
  "mooning", "rocket", "🚀", "squeeze", "tendies", "gain", "gains", "green",
  "up", "rally", "breakout", "undervalued", "hold", "holding", "diamond",
];

const BEARISH: &[&str] = &[
  "bear", "bearish", "sell", "selling", "puts", "put", "short", "shorting",
  "crash", "dump", "dumping", "red", "down", "loss", "losses", "rug",
  "overvalued", "bagholder", "bagholding", "drill", "drilling", "bankrupt",
];

/// Polarity from a bullish/bearish vocabulary.
///
/// `score = (bullish - bearish) / (bullish + bearish)`, or `0.0` when the
/// text contains neither.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
  bullish: HashSet<String>,
  bearish: HashSet<String>,
}

impl Default for LexiconScorer {
  fn default() -> Self {
    Self {
      bullish: BULLISH.iter().map(|w| (*w).to_owned()).collect(),
      bearish: BEARISH.iter().map(|w| (*w).to_owned()).collect(),
    }
  }
}

impl LexiconScorer {
  pub fn new() -> Self { Self::default() }
}

impl SentimentScorer for LexiconScorer {
  fn score(&self, text: &str) -> Result<f64> {
    let (mut bull, mut bear) = (0u32, 0u32);

    for token in text.split_whitespace() {
      let word = token
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
      if self.bullish.contains(&word) {
        bull += 1;
      } else if self.bearish.contains(&word) {
        bear += 1;
      }
    }

    let total = bull + bear;
    if total == 0 {
      return Ok(0.0);
    }
    Ok((f64::from(bull) - f64::from(bear)) / f64::from(total))
  }
}
