//! Token rendering.
//!
//! Turns a check response's token sequence into a fresh `Document`. The
//! renderer is a pure function of its inputs: the same tokens (and ignore
//! list) always produce the same document.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::document::{DisplayNode, Document, MisspelledSpan, SpanId, is_word_char};
use crate::text_helpers::diff_edit;
use crate::types::Token;

/// Occurrences the user chose to ignore, keyed by char offset.
///
/// An occurrence is a word at a specific position. Re-flagging the same word
/// elsewhere in the text is still allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoredOccurrences {
    by_offset: BTreeMap<usize, SmolStr>,
}

impl IgnoredOccurrences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<SmolStr>) {
        self.by_offset.insert(offset, text.into());
    }

    pub fn contains(&self, offset: usize, text: &str) -> bool {
        self.by_offset.get(&offset).is_some_and(|t| t == text)
    }

    pub fn len(&self) -> usize {
        self.by_offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_offset.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_offset.clear();
    }

    /// Carry ignores across the edit that turned `old` into `new`.
    ///
    /// Occurrences after the edit shift by its length delta. Occurrences the
    /// edit overlaps, or that now run into adjacent word characters, are
    /// dropped since the word they named no longer exists.
    pub fn rebase(&mut self, old: &str, new: &str) {
        let Some((replaced, inserted)) = diff_edit(old, new) else {
            return;
        };
        let new_chars: Vec<char> = new.chars().collect();
        let edit_end = replaced.start + inserted;
        // First char at the edit point and last char before the edit's end,
        // both in the new text.
        let char_at_edit = new_chars.get(replaced.start).copied();
        let char_before_edit_end = edit_end.checked_sub(1).and_then(|i| new_chars.get(i).copied());

        let before = std::mem::take(&mut self.by_offset);
        for (offset, text) in before {
            let end = offset + text.chars().count();
            let keep_left = end < replaced.start
                || (end == replaced.start && !char_at_edit.is_some_and(is_word_char));
            let keep_right = offset > replaced.end
                || (offset == replaced.end && !char_before_edit_end.is_some_and(is_word_char));

            if keep_left {
                self.by_offset.insert(offset, text);
            } else if keep_right {
                let shifted = offset - replaced.len() + inserted;
                self.by_offset.insert(shifted, text);
            } else {
                tracing::trace!(
                    target: "quill::render",
                    offset,
                    text = %text,
                    "edit touched ignored occurrence, dropping it"
                );
            }
        }
    }
}

/// Render tokens into a document.
pub fn render(tokens: &[Token]) -> Document {
    render_with_ignores(tokens, &IgnoredOccurrences::default())
}

/// Render tokens, leaving ignored occurrences as plain text.
///
/// Misspelled word tokens become spans whose id is the token's index in
/// `tokens`; everything else becomes plain text.
pub fn render_with_ignores(tokens: &[Token], ignored: &IgnoredOccurrences) -> Document {
    let mut offset = 0;
    let nodes = tokens.iter().enumerate().map(|(index, token)| {
        let start = offset;
        offset += token.char_len();
        if token.is_misspelled() && !ignored.contains(start, &token.text) {
            DisplayNode::Misspelled(MisspelledSpan {
                id: SpanId(index),
                text: SmolStr::new(&token.text),
                candidates: token.suggestions.clone(),
            })
        } else {
            DisplayNode::Text(token.text.clone())
        }
    });
    let doc = Document::from_nodes(nodes);
    tracing::trace!(
        target: "quill::render",
        tokens = tokens.len(),
        nodes = doc.nodes().len(),
        misspelled = doc.misspelled_count(),
        "rendered tokens"
    );
    doc
}
