//! Core editor types: tokens, candidates, selections and caret snapshots.
//!
//! These types are framework-agnostic. Tokens and candidates deserialize
//! straight from the checking service's JSON; everything else is local state.

use std::ops::Range;

use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

/// Language code the service uses for "unknown / auto-detect".
pub const UNDETERMINED_LANG: &str = "und";

/// A replacement proposal for a misspelled word.
///
/// Candidates arrive ordered best-first; the first one is what fix-all uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub word: SmolStr,
    pub lang: SmolStr,
}

impl Candidate {
    pub fn new(word: impl Into<SmolStr>, lang: impl Into<SmolStr>) -> Self {
        Self {
            word: word.into(),
            lang: lang.into(),
        }
    }

    /// Menu label: the word followed by its source language.
    pub fn label(&self) -> String {
        format!("{} ({})", self.word, self.lang)
    }
}

/// Classification of a token as returned by the service.
///
/// Only `Word` tokens can be flagged. Older service builds send `text` for
/// non-word runs; that and anything unrecognised lands in `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Space,
    Punctuation,
    #[default]
    #[serde(other)]
    Other,
}

/// Smallest unit returned by the checking service.
///
/// Concatenating the `text` of every token in a response reproduces the
/// submitted text exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: TokenKind,
    #[serde(default = "default_valid")]
    pub is_valid: bool,
    #[serde(default, deserialize_with = "deserialize_candidates")]
    pub suggestions: Vec<Candidate>,
}

fn default_valid() -> bool {
    true
}

impl Token {
    /// A valid word token.
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TokenKind::Word,
            is_valid: true,
            suggestions: Vec::new(),
        }
    }

    /// An invalid word token with the given candidates.
    pub fn misspelled(text: impl Into<String>, suggestions: Vec<Candidate>) -> Self {
        Self {
            text: text.into(),
            kind: TokenKind::Word,
            is_valid: false,
            suggestions,
        }
    }

    /// A non-word token (whitespace, punctuation, ...).
    pub fn other(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = if text.chars().all(char::is_whitespace) {
            TokenKind::Space
        } else {
            TokenKind::Punctuation
        };
        Self {
            text,
            kind,
            is_valid: true,
            suggestions: Vec::new(),
        }
    }

    /// Whether this token should render as a misspelled span.
    pub fn is_misspelled(&self) -> bool {
        self.kind == TokenKind::Word && !self.is_valid
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Concatenate token texts back into the text they were cut from.
pub fn concat_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCandidate {
    Full {
        word: SmolStr,
        #[serde(default)]
        lang: Option<SmolStr>,
    },
    Bare(SmolStr),
    Junk(serde::de::IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCandidates {
    List(Vec<RawCandidate>),
    Junk(serde::de::IgnoredAny),
}

/// A candidate list parsed with the same leniency as `Token::suggestions`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CandidateList(#[serde(deserialize_with = "deserialize_candidates")] pub Vec<Candidate>);

/// Parse a candidate list, dropping anything unparsable.
///
/// A malformed list is treated as "no candidates" rather than failing the
/// whole response: the span still renders and its menu offers only "ignore".
fn deserialize_candidates<'de, D>(deserializer: D) -> Result<Vec<Candidate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawCandidates::deserialize(deserializer)?;
    let RawCandidates::List(items) = raw else {
        tracing::debug!(target: "quill::check", "suggestions field is not a list, ignoring");
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            RawCandidate::Full { word, lang } => Some(Candidate {
                word,
                lang: lang.unwrap_or_else(|| SmolStr::new_static(UNDETERMINED_LANG)),
            }),
            RawCandidate::Bare(word) => {
                Some(Candidate::new(word, SmolStr::new_static(UNDETERMINED_LANG)))
            }
            RawCandidate::Junk(_) => None,
        })
        .filter(|c| !c.word.is_empty())
        .collect())
}

/// Text selection with anchor and head positions, in chars.
///
/// The anchor is where the selection started, the head is where the caret is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where caret is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (caret position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }
}

/// Caret/selection captured right before a destructive re-render.
///
/// Offsets are chars into the flattened plain text. `0 <= start <= end`;
/// with no selection both equal the caret position. `backward` remembers
/// whether the user was extending the selection to the left.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct CaretSnapshot {
    pub start: usize,
    pub end: usize,
    pub backward: bool,
}

impl CaretSnapshot {
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
            backward: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends into `0..=len`.
    pub fn clamped(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
            backward: self.backward,
        }
    }

    pub fn to_selection(&self) -> Selection {
        if self.backward {
            Selection::new(self.end, self.start)
        } else {
            Selection::new(self.start, self.end)
        }
    }
}

impl From<Selection> for CaretSnapshot {
    fn from(sel: Selection) -> Self {
        Self {
            start: sel.start(),
            end: sel.end(),
            backward: sel.is_backwards(),
        }
    }
}
