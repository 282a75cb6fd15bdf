//! Suggestion menu lifecycle and span resolution.
//!
//! At most one `ActiveSuggestionMenu` exists, owned by the resolver. The menu
//! holds a subscription `S` (on the web: the outside-click listener and the
//! menu element) and every way of closing the menu drops it, so disposal is
//! tied to the menu's lifetime rather than to bookkeeping at each call site.

use std::convert::Infallible;
use std::ops::Range;

use smol_str::SmolStr;

use crate::document::{Document, SpanId};
use crate::render::IgnoredOccurrences;
use crate::types::Candidate;

/// Label of the trailing option that ignores the occurrence.
pub const IGNORE_LABEL: &str = "Ignore";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuOption {
    Candidate(Candidate),
    Ignore,
}

impl MenuOption {
    pub fn label(&self) -> String {
        match self {
            MenuOption::Candidate(candidate) => candidate.label(),
            MenuOption::Ignore => IGNORE_LABEL.to_owned(),
        }
    }
}

/// Build the option list for a span: one entry per candidate, then ignore.
pub fn menu_options(candidates: &[Candidate]) -> Vec<MenuOption> {
    candidates
        .iter()
        .cloned()
        .map(MenuOption::Candidate)
        .chain(std::iter::once(MenuOption::Ignore))
        .collect()
}

/// The one open menu.
#[derive(Debug)]
pub struct ActiveSuggestionMenu<S> {
    span: SpanId,
    word: SmolStr,
    options: Vec<MenuOption>,
    _subscription: S,
}

impl<S> ActiveSuggestionMenu<S> {
    pub fn span(&self) -> SpanId {
        self.span
    }

    /// The misspelled word the menu was opened for.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }
}

/// Where a click landed, as far as the menu is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Span(SpanId),
    Menu,
    Outside,
}

/// What a resolution did to the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Span replaced by a candidate; the text changed.
    Replaced { span: SpanId, range: Range<usize> },
    /// Span unmarked; the text is unchanged.
    Ignored { span: SpanId, range: Range<usize> },
}

impl Resolution {
    pub fn range(&self) -> Range<usize> {
        match self {
            Resolution::Replaced { range, .. } | Resolution::Ignored { range, .. } => range.clone(),
        }
    }

    pub fn changes_text(&self) -> bool {
        matches!(self, Resolution::Replaced { .. })
    }
}

#[derive(Debug)]
pub struct SuggestionResolver<S> {
    active: Option<ActiveSuggestionMenu<S>>,
}

impl<S> Default for SuggestionResolver<S> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<S> SuggestionResolver<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveSuggestionMenu<S>> {
        self.active.as_ref()
    }

    pub fn active_span(&self) -> Option<SpanId> {
        self.active.as_ref().map(|menu| menu.span)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Open a menu for `span`.
    ///
    /// Any open menu is closed (and its subscription dropped) before
    /// `subscribe` runs for the new one. Returns `None` and leaves no menu
    /// open if the span is not in `doc`.
    pub fn open<F>(&mut self, doc: &Document, span: SpanId, subscribe: F) -> Option<&ActiveSuggestionMenu<S>>
    where
        F: FnOnce(SpanId, &[MenuOption]) -> S,
    {
        let opened = self.try_open(doc, span, |span, options| {
            Ok::<_, Infallible>(subscribe(span, options))
        });
        match opened {
            Ok(menu) => menu,
            Err(never) => match never {},
        }
    }

    /// [`open`](Self::open) with a subscription that can fail to attach.
    ///
    /// On failure no menu is left open and the error is returned.
    pub fn try_open<F, E>(
        &mut self,
        doc: &Document,
        span: SpanId,
        subscribe: F,
    ) -> Result<Option<&ActiveSuggestionMenu<S>>, E>
    where
        F: FnOnce(SpanId, &[MenuOption]) -> Result<S, E>,
    {
        self.close();
        let Some(target) = doc.span(span) else {
            tracing::debug!(target: "quill::suggest", %span, "no such span, not opening menu");
            return Ok(None);
        };
        let options = menu_options(&target.candidates);
        let subscription = subscribe(span, &options)?;
        tracing::debug!(
            target: "quill::suggest",
            %span,
            word = %target.text,
            options = options.len(),
            "menu opened"
        );
        self.active = Some(ActiveSuggestionMenu {
            span,
            word: target.text.clone(),
            options,
            _subscription: subscription,
        });
        Ok(self.active.as_ref())
    }

    /// Close the open menu, if any. Returns whether one was open.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(menu) => {
                tracing::trace!(target: "quill::suggest", span = %menu.span, "menu closed");
                true
            }
            None => false,
        }
    }

    /// Route a click. Clicks outside both the anchor span and the menu close
    /// it; returns whether that happened.
    pub fn handle_click(&mut self, target: ClickTarget) -> bool {
        match (target, self.active_span()) {
            (_, None) => false,
            (ClickTarget::Menu, Some(_)) => false,
            (ClickTarget::Span(clicked), Some(anchor)) if clicked == anchor => false,
            // A different span: close now, the caller opens the new menu.
            (ClickTarget::Span(_) | ClickTarget::Outside, Some(_)) => self.close(),
        }
    }

    /// Replace `span` with `word` and close the menu.
    pub fn select_candidate(&mut self, doc: &mut Document, span: SpanId, word: &str) -> Option<Resolution> {
        self.close();
        let range = doc.replace_span(span, word)?;
        tracing::debug!(target: "quill::suggest", %span, word, "candidate applied");
        Some(Resolution::Replaced { span, range })
    }

    /// Unmark `span`, remember the occurrence, and close the menu.
    pub fn ignore(
        &mut self,
        doc: &mut Document,
        span: SpanId,
        ignored: &mut IgnoredOccurrences,
    ) -> Option<Resolution> {
        self.close();
        let text = doc.span(span)?.text.clone();
        let range = doc.unmark_span(span)?;
        ignored.insert(range.start, text);
        tracing::debug!(target: "quill::suggest", %span, offset = range.start, "occurrence ignored");
        Some(Resolution::Ignored { span, range })
    }

    /// Apply option `index` of the open menu.
    pub fn choose(
        &mut self,
        doc: &mut Document,
        index: usize,
        ignored: &mut IgnoredOccurrences,
    ) -> Option<Resolution> {
        let menu = self.active.as_ref()?;
        let span = menu.span;
        let option = menu.options.get(index)?.clone();
        match option {
            MenuOption::Candidate(candidate) => self.select_candidate(doc, span, &candidate.word),
            MenuOption::Ignore => self.ignore(doc, span, ignored),
        }
    }

    /// Replace every misspelled span that has a candidate with its best one.
    ///
    /// Spans with no candidates stay as they are. Returns how many spans were
    /// replaced; zero means the document was not touched.
    pub fn fix_all(&mut self, doc: &mut Document) -> usize {
        self.close();
        let fixes: Vec<(SpanId, SmolStr)> = doc
            .misspelled_spans()
            .filter_map(|span| span.best_candidate().map(|c| (span.id, c.word.clone())))
            .collect();
        for (span, word) in &fixes {
            doc.replace_span(*span, word);
        }
        if !fixes.is_empty() {
            tracing::debug!(target: "quill::suggest", fixed = fixes.len(), "fix-all applied");
        }
        fixes.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::render::render;
    use crate::types::Token;

    /// Subscription stand-in that counts how many are alive.
    pub(crate) struct Guard(pub Rc<Cell<usize>>);

    impl Guard {
        pub(crate) fn new(live: &Rc<Cell<usize>>) -> Self {
            live.set(live.get() + 1);
            Guard(live.clone())
        }
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    pub(crate) fn sample_tokens() -> Vec<Token> {
        vec![
            Token::misspelled(
                "Ths",
                vec![Candidate::new("This", "en"), Candidate::new("Its", "en")],
            ),
            Token::other(" "),
            Token::word("is"),
            Token::other(" "),
            Token::word("a"),
            Token::other(" "),
            Token::misspelled(
                "tst",
                vec![Candidate::new("test", "en"), Candidate::new("tot", "en")],
            ),
            Token::other("."),
        ]
    }

    #[test]
    fn test_open_lists_candidates_then_ignore() {
        let doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut resolver = SuggestionResolver::new();
        let menu = resolver.open(&doc, SpanId(0), |_, _| Guard::new(&live)).unwrap();
        let labels: Vec<_> = menu.options().iter().map(MenuOption::label).collect();
        assert_eq!(labels, vec!["This (en)", "Its (en)", "Ignore"]);
        assert_eq!(menu.word(), "Ths");
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_failed_subscribe_leaves_no_menu() {
        let doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut resolver = SuggestionResolver::new();
        resolver.open(&doc, SpanId(0), |_, _| Guard::new(&live));

        let opened = resolver.try_open(&doc, SpanId(6), |_, _| {
            // The previous menu is gone before the new one attaches.
            assert_eq!(live.get(), 0);
            Err::<Guard, _>("menu element could not be mounted")
        });
        assert_eq!(opened.err(), Some("menu element could not be mounted"));
        assert!(!resolver.is_open());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_at_most_one_menu() {
        let doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut resolver = SuggestionResolver::new();

        resolver.open(&doc, SpanId(0), |_, _| Guard::new(&live));
        resolver.open(&doc, SpanId(6), |_, _| {
            // The first subscription is gone before the second is made.
            assert_eq!(live.get(), 0);
            Guard::new(&live)
        });
        assert_eq!(live.get(), 1);
        assert_eq!(resolver.active_span(), Some(SpanId(6)));

        // Unknown span: old menu closed, nothing new opened.
        assert!(resolver.open(&doc, SpanId(2), |_, _| Guard::new(&live)).is_none());
        assert_eq!(live.get(), 0);
        assert!(!resolver.is_open());
    }

    #[test]
    fn test_click_routing() {
        let doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut resolver = SuggestionResolver::new();
        resolver.open(&doc, SpanId(0), |_, _| Guard::new(&live));

        assert!(!resolver.handle_click(ClickTarget::Menu));
        assert!(!resolver.handle_click(ClickTarget::Span(SpanId(0))));
        assert_eq!(live.get(), 1);
        assert!(resolver.handle_click(ClickTarget::Outside));
        assert_eq!(live.get(), 0);
        assert!(!resolver.handle_click(ClickTarget::Outside));
    }

    #[test]
    fn test_select_candidate_replaces_only_that_span() {
        let mut doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut resolver = SuggestionResolver::new();
        resolver.open(&doc, SpanId(0), |_, _| Guard::new(&live));

        let res = resolver.choose(&mut doc, 0, &mut IgnoredOccurrences::new()).unwrap();
        assert_eq!(res, Resolution::Replaced { span: SpanId(0), range: 0..4 });
        assert!(res.changes_text());
        assert_eq!(doc.text(), "This is a tst.");
        assert_eq!(doc.misspelled_count(), 1);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_ignore_keeps_text_and_records_occurrence() {
        let mut doc = render(&sample_tokens());
        let live = Rc::new(Cell::new(0));
        let mut ignored = IgnoredOccurrences::new();
        let mut resolver = SuggestionResolver::new();
        resolver.open(&doc, SpanId(6), |_, _| Guard::new(&live));

        let res = resolver.choose(&mut doc, 2, &mut ignored).unwrap();
        assert_eq!(res.range(), 9..12);
        assert!(!res.changes_text());
        assert_eq!(doc.text(), "Ths is a tst.");
        assert!(doc.span(SpanId(6)).is_none());
        assert!(ignored.contains(9, "tst"));
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_zero_candidates_offers_only_ignore() {
        let doc = render(&[Token::misspelled("qzx", Vec::new())]);
        let mut resolver: SuggestionResolver<()> = SuggestionResolver::new();
        let menu = resolver.open(&doc, SpanId(0), |_, _| ()).unwrap();
        assert_eq!(menu.options(), &[MenuOption::Ignore]);
    }

    #[test]
    fn test_fix_all() {
        let mut tokens = sample_tokens();
        tokens.push(Token::other(" "));
        tokens.push(Token::misspelled("qzx", Vec::new()));
        let mut doc = render(&tokens);
        let mut resolver: SuggestionResolver<()> = SuggestionResolver::new();

        assert_eq!(resolver.fix_all(&mut doc), 2);
        assert_eq!(doc.text(), "This is a test. qzx");
        assert_eq!(doc.misspelled_count(), 1);

        // Only the candidate-less span is left: nothing more to do.
        let before = doc.clone();
        assert_eq!(resolver.fix_all(&mut doc), 0);
        assert_eq!(doc, before);
    }
}
