//! Editor controller.
//!
//! Owns all live editing state and wires the pieces together:
//! input → debounce → check dispatch → response → render + caret restore,
//! and menu actions → document mutation → re-check.
//!
//! The controller does no I/O. It hands out `PendingCheck`s for a driver to
//! send and takes the results back through `apply_response` /
//! `check_failed`; timers are likewise the driver's job, fed in through
//! `poll` or `on_timer`.

use std::fmt;

use smol_str::SmolStr;
use web_time::Instant;

use crate::caret::{RestoredSelection, restore};
use crate::check::{CheckMode, CheckRequest, CheckResult, LanguageBadge};
use crate::debounce::{DebounceConfig, DebounceScheduler, EditKind, Generation, TimerTicket};
use crate::document::{Document, SpanId};
use crate::error::ApplyError;
use crate::render::{IgnoredOccurrences, render_with_ignores};
use crate::sequence::{RequestId, RequestSequencer};
use crate::stats::EditorStats;
use crate::suggestion::{ActiveSuggestionMenu, ClickTarget, MenuOption, Resolution, SuggestionResolver};
use crate::types::{CaretSnapshot, UNDETERMINED_LANG, concat_tokens};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    pub mode: CheckMode,
    /// Language hint; `"und"` asks the service to detect.
    pub lang: SmolStr,
    pub debounce: DebounceConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mode: CheckMode::default(),
            lang: SmolStr::new_static(UNDETERMINED_LANG),
            debounce: DebounceConfig::default(),
        }
    }
}

/// A check the driver should send now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCheck {
    pub id: RequestId,
    pub request: CheckRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// A newer check was issued after this one (or the editor was cleared).
    Superseded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The document was rebuilt from the response.
    Applied {
        /// Where to put the selection on the rebuilt surface.
        caret: Option<RestoredSelection>,
        misspelled: usize,
    },
    /// The response was dropped; nothing changed.
    Discarded(DiscardReason),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Result of a menu action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub resolution: Resolution,
    /// Set when the action changed the text and a re-check is due.
    pub check: Option<PendingCheck>,
}

impl Resolved {
    /// Caret position after the action: the end of the resolved word.
    pub fn caret(&self) -> CaretSnapshot {
        CaretSnapshot::caret(self.resolution.range().end)
    }
}

/// Result of fix-all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedAll {
    pub fixed: usize,
    pub check: Option<PendingCheck>,
}

#[derive(Debug)]
pub struct EditorController<S> {
    config: EditorConfig,
    text: String,
    document: Document,
    ignored: IgnoredOccurrences,
    scheduler: DebounceScheduler,
    sequencer: RequestSequencer,
    /// Text of the latest dispatched check, awaiting its response.
    submitted: Option<(RequestId, String)>,
    resolver: SuggestionResolver<S>,
    stats: EditorStats,
    badge: LanguageBadge,
}

impl<S> Default for EditorController<S> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl<S> EditorController<S> {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scheduler: DebounceScheduler::new(config.debounce),
            config,
            text: String::new(),
            document: Document::new(),
            ignored: IgnoredOccurrences::new(),
            sequencer: RequestSequencer::new(),
            submitted: None,
            resolver: SuggestionResolver::new(),
            stats: EditorStats::default(),
            badge: LanguageBadge::default(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: CheckMode) {
        self.config.mode = mode;
    }

    pub fn set_lang(&mut self, lang: impl Into<SmolStr>) {
        self.config.lang = lang.into();
    }

    pub fn set_debounce(&mut self, debounce: DebounceConfig) {
        self.config.debounce = debounce;
        self.scheduler.set_config(debounce);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn stats(&self) -> EditorStats {
        self.stats
    }

    pub fn badge(&self) -> &LanguageBadge {
        &self.badge
    }

    pub fn ignored(&self) -> &IgnoredOccurrences {
        &self.ignored
    }

    pub fn active_menu(&self) -> Option<&ActiveSuggestionMenu<S>> {
        self.resolver.active()
    }

    pub fn active_span(&self) -> Option<SpanId> {
        self.resolver.active_span()
    }

    /// When the armed debounce timer is due, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// The document as HTML, with the open menu's span marked active.
    pub fn render_html(&self) -> String {
        self.document.to_html_with_active(self.active_span())
    }

    /// The surface's text changed to `text`.
    ///
    /// Updates stats, keeps the document and ignore list in step with the
    /// edit, and re-arms the debounce timer. Returns the timer to schedule.
    pub fn on_input(&mut self, text: &str, kind: EditKind, now: Instant) -> TimerTicket {
        if text != self.text {
            self.ignored.rebase(&self.text, text);
            self.document.apply_edit(text);
            self.text = text.to_owned();
            let anchor_gone = self
                .resolver
                .active_span()
                .is_some_and(|span| self.document.span(span).is_none());
            if anchor_gone {
                self.resolver.close();
            }
        }
        self.refresh_stats();
        self.scheduler.on_edit(kind, now)
    }

    /// Dispatch the debounced check if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<PendingCheck> {
        self.scheduler.poll(now)?;
        self.dispatch()
    }

    /// A timer armed for `generation` went off.
    pub fn on_timer(&mut self, generation: Generation) -> Option<PendingCheck> {
        if !self.scheduler.fire(generation) {
            return None;
        }
        self.dispatch()
    }

    /// Check the current text right away, skipping the quiet period.
    pub fn request_check(&mut self) -> Option<PendingCheck> {
        self.scheduler.cancel();
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<PendingCheck> {
        self.scheduler.finish();
        let Some(request) = CheckRequest::new(self.text.clone(), self.config.mode, &self.config.lang)
        else {
            tracing::trace!(target: "quill::check", "blank text, not checking");
            return None;
        };
        let id = self.sequencer.issue();
        tracing::debug!(
            target: "quill::check",
            %id,
            chars = request.char_len(),
            mode = %request.mode,
            "check dispatched"
        );
        self.submitted = Some((id, request.text.clone()));
        Some(PendingCheck { id, request })
    }

    /// Apply the response to check `id`.
    ///
    /// `caret` is the selection read off the surface just before this call.
    /// Only the latest check is applied. If the text was edited while it was
    /// in flight, the rendered document is carried over that edit: spans it
    /// did not touch stay marked, the edited region becomes plain text.
    pub fn apply_response(
        &mut self,
        id: RequestId,
        result: CheckResult,
        caret: Option<CaretSnapshot>,
    ) -> Result<ApplyOutcome, ApplyError> {
        let submitted = match self.submitted.take() {
            Some((latest, text)) if latest == id && self.sequencer.is_latest(id) => text,
            other => {
                self.submitted = other;
                tracing::debug!(target: "quill::check", %id, "superseded response dropped");
                return Ok(ApplyOutcome::Discarded(DiscardReason::Superseded));
            }
        };

        let covered = concat_tokens(&result.tokens);
        if covered != submitted {
            let err = ApplyError::RoundTrip {
                id,
                submitted_chars: submitted.chars().count(),
                token_chars: covered.chars().count(),
            };
            tracing::warn!(target: "quill::check", %err, "rejecting response");
            return Err(err);
        }

        // Spans are about to be replaced wholesale; their menu goes with them.
        self.resolver.close();
        self.document = if submitted == self.text {
            render_with_ignores(&result.tokens, &self.ignored)
        } else {
            tracing::trace!(target: "quill::check", %id, "text changed in flight, rebasing response");
            let mut ignored = self.ignored.clone();
            ignored.rebase(&self.text, &submitted);
            let mut document = render_with_ignores(&result.tokens, &ignored);
            document.apply_edit(&self.text);
            document
        };
        self.badge = result.badge();
        self.refresh_stats();

        let caret = caret.and_then(|snap| restore(&self.document.runs(), snap));
        let misspelled = self.document.misspelled_count();
        tracing::debug!(
            target: "quill::check",
            %id,
            misspelled,
            lang = %self.badge.lang,
            "check applied"
        );
        Ok(ApplyOutcome::Applied { caret, misspelled })
    }

    /// Check `id` failed. The document stays as it is.
    pub fn check_failed(&mut self, id: RequestId, error: &dyn fmt::Display) {
        if self.submitted.as_ref().is_some_and(|(latest, _)| *latest == id) {
            self.submitted = None;
        }
        tracing::warn!(target: "quill::check", %id, %error, "check failed, keeping current document");
    }

    /// Open the suggestion menu on `span`. See [`SuggestionResolver::open`].
    pub fn open_menu<F>(&mut self, span: SpanId, subscribe: F) -> Option<&ActiveSuggestionMenu<S>>
    where
        F: FnOnce(SpanId, &[MenuOption]) -> S,
    {
        self.resolver.open(&self.document, span, subscribe)
    }

    /// Like [`open_menu`](Self::open_menu), for subscriptions that can fail.
    pub fn try_open_menu<F, E>(
        &mut self,
        span: SpanId,
        subscribe: F,
    ) -> Result<Option<&ActiveSuggestionMenu<S>>, E>
    where
        F: FnOnce(SpanId, &[MenuOption]) -> Result<S, E>,
    {
        self.resolver.try_open(&self.document, span, subscribe)
    }

    pub fn close_menu(&mut self) -> bool {
        self.resolver.close()
    }

    /// Route a click; returns whether the open menu was dismissed.
    pub fn click(&mut self, target: ClickTarget) -> bool {
        self.resolver.handle_click(target)
    }

    /// Apply option `index` of the open menu.
    pub fn choose(&mut self, index: usize) -> Option<Resolved> {
        let resolution = self.resolver.choose(&mut self.document, index, &mut self.ignored)?;
        Some(self.finish_resolution(resolution))
    }

    pub fn select_candidate(&mut self, span: SpanId, word: &str) -> Option<Resolved> {
        let resolution = self.resolver.select_candidate(&mut self.document, span, word)?;
        Some(self.finish_resolution(resolution))
    }

    pub fn ignore(&mut self, span: SpanId) -> Option<Resolved> {
        let resolution = self.resolver.ignore(&mut self.document, span, &mut self.ignored)?;
        Some(self.finish_resolution(resolution))
    }

    /// Replace every fixable span with its best candidate and re-check once.
    pub fn fix_all(&mut self) -> FixedAll {
        let fixed = self.resolver.fix_all(&mut self.document);
        if fixed == 0 {
            return FixedAll { fixed, check: None };
        }
        self.sync_text_from_document();
        FixedAll {
            fixed,
            check: self.request_check(),
        }
    }

    fn finish_resolution(&mut self, resolution: Resolution) -> Resolved {
        let check = if resolution.changes_text() {
            self.sync_text_from_document();
            self.request_check()
        } else {
            self.refresh_stats();
            None
        };
        Resolved { resolution, check }
    }

    fn sync_text_from_document(&mut self) {
        let text = self.document.text();
        self.ignored.rebase(&self.text, &text);
        self.text = text;
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        self.stats = EditorStats::measure(&self.text, self.document.misspelled_count());
    }

    /// Reset to an empty editor. Checks still in flight will be dropped.
    pub fn clear(&mut self) {
        self.text.clear();
        self.document = Document::new();
        self.ignored.clear();
        self.scheduler.cancel();
        self.sequencer.invalidate();
        self.submitted = None;
        self.resolver.close();
        self.stats = EditorStats::default();
        self.badge = LanguageBadge::default();
        tracing::debug!(target: "quill::editor", "cleared");
    }
}
