//! Terminal rendering of checked documents.

use std::collections::BTreeMap;
use std::fmt::Write;

use quill_editor_core::{Candidate, DisplayNode, Document, EditorStats, LanguageBadge};

/// How to mark misspelled spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    /// ANSI underline instead of brackets.
    pub color: bool,
    /// Append each span's id, for commands that take one.
    pub ids: bool,
}

impl Style {
    pub fn for_stdout(ids: bool) -> Self {
        use std::io::IsTerminal;
        Self {
            color: std::io::stdout().is_terminal(),
            ids,
        }
    }
}

/// The document's text with misspelled spans marked.
pub fn highlight(doc: &Document, style: Style) -> String {
    let mut out = String::with_capacity(doc.len_chars() + doc.misspelled_count() * 16);
    for node in doc.nodes() {
        match node {
            DisplayNode::Text(text) => out.push_str(text),
            DisplayNode::Misspelled(span) => {
                match (style.color, style.ids) {
                    (true, true) => write!(out, "\x1b[4;31m{}\x1b[0m\x1b[2m#{}\x1b[0m", span.text, span.id),
                    (true, false) => write!(out, "\x1b[4;31m{}\x1b[0m", span.text),
                    (false, true) => write!(out, "[{}#{}]", span.text, span.id),
                    (false, false) => write!(out, "[{}]", span.text),
                }
                .ok();
            }
        }
    }
    out
}

/// One line per span: id, word and its candidates.
pub fn span_list(doc: &Document) -> Vec<String> {
    doc.misspelled_spans()
        .map(|span| format!("#{} {}: {}", span.id, span.text, candidate_labels(&span.candidates)))
        .collect()
}

pub fn candidate_labels(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "(no suggestions)".to_owned();
    }
    candidates
        .iter()
        .map(Candidate::label)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn suggestion_map(suggestions: &BTreeMap<String, Vec<Candidate>>) -> Vec<String> {
    suggestions
        .iter()
        .map(|(word, candidates)| format!("{}: {}", word, candidate_labels(candidates)))
        .collect()
}

pub fn status_line(stats: EditorStats, badge: &LanguageBadge) -> String {
    format!(
        "{} chars, {} words, {} misspelled | language {}",
        stats.chars, stats.words, stats.misspelled, badge
    )
}

#[cfg(test)]
mod tests {
    use quill_editor_core::{Token, render};

    use super::*;

    fn doc() -> Document {
        render(&[
            Token::misspelled("Ths", vec![Candidate::new("This", "en")]),
            Token::other(" is "),
            Token::misspelled("qzx", vec![]),
            Token::other("."),
        ])
    }

    #[test]
    fn test_plain_highlight() {
        let plain = Style {
            color: false,
            ids: false,
        };
        assert_eq!(highlight(&doc(), plain), "[Ths] is [qzx].");
        let with_ids = Style { ids: true, ..plain };
        assert_eq!(highlight(&doc(), with_ids), "[Ths#0] is [qzx#2].");
    }

    #[test]
    fn test_span_list() {
        assert_eq!(
            span_list(&doc()),
            vec!["#0 Ths: This (en)", "#2 qzx: (no suggestions)"]
        );
    }

    #[test]
    fn test_status_line() {
        let stats = EditorStats::measure("Ths is qzx.", 2);
        assert_eq!(
            status_line(stats, &LanguageBadge::default()),
            "11 chars, 3 words, 2 misspelled | language und (0.00)"
        );
    }
}
