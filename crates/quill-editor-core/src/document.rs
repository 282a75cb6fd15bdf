//! The rendered document: an ordered list of display nodes.
//!
//! A `Document` is rebuilt wholesale from every accepted check response and
//! mutated in place only by suggestion resolution. Each node is one leaf text
//! run on the rendering surface, which is what the caret tracker walks.

use std::fmt;
use std::ops::Range;

use pulldown_cmark_escape::escape_html;
use smol_str::SmolStr;

use crate::text_helpers::diff_edit;
use crate::types::Candidate;

/// CSS class carried by every misspelled span.
pub const MISSPELLED_CLASS: &str = "misspelled";
/// Extra class on the span the open suggestion menu is anchored to.
pub const ACTIVE_CLASS: &str = "active";
/// Attribute holding a span's identifier on the rendering surface.
pub const SPAN_ID_ATTR: &str = "data-span-id";

/// Identifier of a misspelled span: the positional index of its token in the
/// response it was rendered from. Used as the click-target key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub usize);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SpanId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SpanId)
    }
}

/// A rendered, interactive region wrapping one invalid word token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MisspelledSpan {
    pub id: SpanId,
    pub text: SmolStr,
    pub candidates: Vec<Candidate>,
}

impl MisspelledSpan {
    /// The best-ranked candidate, if the service offered any.
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// One leaf of the rendered document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayNode {
    Text(String),
    Misspelled(MisspelledSpan),
}

impl DisplayNode {
    pub fn text(&self) -> &str {
        match self {
            DisplayNode::Text(text) => text,
            DisplayNode::Misspelled(span) => &span.text,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn as_span(&self) -> Option<&MisspelledSpan> {
        match self {
            DisplayNode::Misspelled(span) => Some(span),
            DisplayNode::Text(_) => None,
        }
    }
}

/// The live editable surface's content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<DisplayNode>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from nodes, merging adjacent text and dropping empty text nodes.
    pub fn from_nodes(nodes: impl IntoIterator<Item = DisplayNode>) -> Self {
        let mut doc = Self { nodes: Vec::new() };
        for node in nodes {
            doc.push(node);
        }
        doc
    }

    /// A document with no misspellings.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_nodes([DisplayNode::Text(text.into())])
    }

    fn push(&mut self, node: DisplayNode) {
        match node {
            DisplayNode::Text(text) if text.is_empty() => {}
            DisplayNode::Text(text) => match self.nodes.last_mut() {
                Some(DisplayNode::Text(prev)) => prev.push_str(&text),
                _ => self.nodes.push(DisplayNode::Text(text)),
            },
            span @ DisplayNode::Misspelled(_) => self.nodes.push(span),
        }
    }

    pub fn nodes(&self) -> &[DisplayNode] {
        &self.nodes
    }

    /// Flattened plain text.
    pub fn text(&self) -> String {
        self.nodes.iter().map(DisplayNode::text).collect()
    }

    pub fn len_chars(&self) -> usize {
        self.nodes.iter().map(DisplayNode::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf text runs in document order, as the caret tracker sees them.
    pub fn runs(&self) -> Vec<&str> {
        self.nodes.iter().map(DisplayNode::text).collect()
    }

    pub fn misspelled_spans(&self) -> impl Iterator<Item = &MisspelledSpan> {
        self.nodes.iter().filter_map(DisplayNode::as_span)
    }

    pub fn misspelled_count(&self) -> usize {
        self.misspelled_spans().count()
    }

    pub fn span(&self, id: SpanId) -> Option<&MisspelledSpan> {
        self.misspelled_spans().find(|span| span.id == id)
    }

    /// Char range the span occupies in the flattened text.
    pub fn span_range(&self, id: SpanId) -> Option<Range<usize>> {
        let mut start = 0;
        for node in &self.nodes {
            let len = node.char_len();
            if node.as_span().is_some_and(|span| span.id == id) {
                return Some(start..start + len);
            }
            start += len;
        }
        None
    }

    /// Replace a misspelled span with plain `text`.
    ///
    /// The span's candidate data is discarded. Returns the char range the
    /// replacement occupies, or `None` if no such span exists.
    pub fn replace_span(&mut self, id: SpanId, text: &str) -> Option<Range<usize>> {
        let range = self.span_range(id)?;
        let nodes = std::mem::take(&mut self.nodes);
        *self = Self::from_nodes(nodes.into_iter().map(|node| match node {
            DisplayNode::Misspelled(span) if span.id == id => DisplayNode::Text(text.to_owned()),
            other => other,
        }));
        Some(range.start..range.start + text.chars().count())
    }

    /// Strip the misspelled marking from a span, keeping its text verbatim.
    pub fn unmark_span(&mut self, id: SpanId) -> Option<Range<usize>> {
        let text = self.span(id)?.text.clone();
        self.replace_span(id, &text)
    }

    /// Bring the document in line with text the user edited on the surface.
    ///
    /// Nodes the edit does not reach keep their identity (spans stay
    /// clickable until the next check replaces them); everything the edit
    /// touches collapses into plain text. A span directly adjacent to the
    /// edit is absorbed too if the edit glued word characters onto it.
    pub fn apply_edit(&mut self, new_text: &str) {
        let old = self.text();
        let Some((replaced, inserted)) = diff_edit(&old, new_text) else {
            return;
        };
        let new_chars: Vec<char> = new_text.chars().collect();
        let edit_end = replaced.start + inserted;
        let glued_after = new_chars.get(replaced.start).is_some_and(|c| is_word_char(*c));
        let glued_before = edit_end
            .checked_sub(1)
            .and_then(|i| new_chars.get(i))
            .is_some_and(|c| is_word_char(*c));

        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut start = 0;
        for node in std::mem::take(&mut self.nodes) {
            let end = start + node.char_len();
            let (keep_head, keep_tail) = match &node {
                DisplayNode::Text(_) => (end <= replaced.start, start >= replaced.end),
                DisplayNode::Misspelled(_) => (
                    end < replaced.start || (end == replaced.start && !glued_after),
                    start > replaced.end || (start == replaced.end && !glued_before),
                ),
            };
            if keep_head {
                head.push(node);
            } else if keep_tail {
                tail.push(node);
            }
            start = end;
        }

        let head_len: usize = head.iter().map(DisplayNode::char_len).sum();
        let tail_len: usize = tail.iter().map(DisplayNode::char_len).sum();
        let middle: String = new_chars[head_len..new_chars.len() - tail_len].iter().collect();

        *self = Self::from_nodes(
            head.into_iter()
                .chain(std::iter::once(DisplayNode::Text(middle)))
                .chain(tail),
        );
    }

    /// Render as HTML for the editing surface.
    pub fn to_html(&self) -> String {
        self.to_html_with_active(None)
    }

    /// Render as HTML, marking `active` as the span the open menu belongs to.
    ///
    /// All text is escaped; nothing from the checked text is ever emitted as
    /// markup.
    pub fn to_html_with_active(&self, active: Option<SpanId>) -> String {
        let mut out = String::with_capacity(self.len_chars() + self.nodes.len() * 48);
        for node in &self.nodes {
            match node {
                DisplayNode::Text(text) => push_escaped(&mut out, text),
                DisplayNode::Misspelled(span) => {
                    out.push_str("<span class=\"");
                    out.push_str(MISSPELLED_CLASS);
                    if active == Some(span.id) {
                        out.push(' ');
                        out.push_str(ACTIVE_CLASS);
                    }
                    out.push_str("\" ");
                    out.push_str(SPAN_ID_ATTR);
                    out.push_str("=\"");
                    out.push_str(&span.id.to_string());
                    out.push_str("\">");
                    push_escaped(&mut out, &span.text);
                    out.push_str("</span>");
                }
            }
        }
        out
    }
}

/// Letters, digits and apostrophes: characters that extend a word.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Escape `&`, `<`, `>`, `"` and `'` into `out`.
pub fn push_escaped(out: &mut String, text: &str) {
    for (i, part) in text.split('\'').enumerate() {
        if i > 0 {
            out.push_str("&#39;");
        }
        // Writing into a String cannot fail.
        let _ = escape_html(&mut *out, part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_nodes([
            DisplayNode::Misspelled(MisspelledSpan {
                id: SpanId(0),
                text: "Ths".into(),
                candidates: vec![Candidate::new("This", "en"), Candidate::new("Its", "en")],
            }),
            DisplayNode::Text(" is a ".into()),
            DisplayNode::Misspelled(MisspelledSpan {
                id: SpanId(6),
                text: "tst".into(),
                candidates: vec![Candidate::new("test", "en")],
            }),
            DisplayNode::Text(".".into()),
        ])
    }

    #[test]
    fn test_from_nodes_merges_text() {
        let doc = Document::from_nodes([
            DisplayNode::Text("a".into()),
            DisplayNode::Text(String::new()),
            DisplayNode::Text(" b".into()),
        ]);
        assert_eq!(doc.nodes().len(), 1);
        assert_eq!(doc.text(), "a b");
    }

    #[test]
    fn test_span_range() {
        let doc = sample();
        assert_eq!(doc.span_range(SpanId(0)), Some(0..3));
        assert_eq!(doc.span_range(SpanId(6)), Some(9..12));
        assert_eq!(doc.span_range(SpanId(3)), None);
        assert_eq!(doc.len_chars(), 13);
    }

    #[test]
    fn test_replace_span() {
        let mut doc = sample();
        let range = doc.replace_span(SpanId(0), "This").unwrap();
        assert_eq!(range, 0..4);
        assert_eq!(doc.text(), "This is a tst.");
        assert_eq!(doc.misspelled_count(), 1);
        // Replacement merged into the following text run.
        assert_eq!(doc.runs(), vec!["This is a ", "tst", "."]);
    }

    #[test]
    fn test_unmark_span_keeps_text() {
        let mut doc = sample();
        doc.unmark_span(SpanId(6)).unwrap();
        assert_eq!(doc.text(), "Ths is a tst.");
        assert_eq!(doc.misspelled_count(), 1);
        assert!(doc.span(SpanId(6)).is_none());
        assert!(doc.unmark_span(SpanId(6)).is_none());
    }

    #[test]
    fn test_html_output() {
        let doc = sample();
        insta::assert_snapshot!(
            doc.to_html_with_active(Some(SpanId(6))),
            @r#"<span class="misspelled" data-span-id="0">Ths</span> is a <span class="misspelled active" data-span-id="6">tst</span>."#
        );
    }

    #[test]
    fn test_apply_edit_keeps_untouched_spans() {
        let mut doc = sample();
        doc.apply_edit("Ths is not a tst.");
        assert_eq!(doc.text(), "Ths is not a tst.");
        assert_eq!(doc.misspelled_count(), 2);
        assert_eq!(doc.span_range(SpanId(6)), Some(13..16));
    }

    #[test]
    fn test_apply_edit_absorbs_touched_span() {
        let mut doc = sample();
        doc.apply_edit("Ths is a test.");
        assert_eq!(doc.text(), "Ths is a test.");
        assert_eq!(doc.misspelled_count(), 1);
        assert!(doc.span(SpanId(6)).is_none());

        // Typing a space after a span leaves it alone.
        let mut doc = sample();
        doc.apply_edit("Ths  is a tst.");
        assert_eq!(doc.misspelled_count(), 2);
        assert_eq!(doc.runs(), vec!["Ths", "  is a ", "tst", "."]);
    }

    #[test]
    fn test_apply_edit_to_empty() {
        let mut doc = sample();
        doc.apply_edit("");
        assert!(doc.is_empty());
        doc.apply_edit("fresh");
        assert_eq!(doc.runs(), vec!["fresh"]);
    }

    #[test]
    fn test_html_escapes_markup() {
        let doc = Document::plain(r#"<b>"Tom" & 'Jerry'</b>"#);
        let html = doc.to_html();
        assert!(!html.contains('<'));
        assert!(!html.contains('\''));
        assert!(!html.contains('"'));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("&amp;"));
        assert!(html.contains("&#39;Jerry&#39;"));
    }
}
