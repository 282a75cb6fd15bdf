//! Platform abstraction for the editing surface.
//!
//! The controller never touches a real surface. Implementations of
//! `EditorSurface` (the browser DOM, a terminal, a test fake) read the
//! selection out and write documents and selections back in; the helpers
//! here sequence those calls around a re-render so the caret lands where
//! the user left it.

use crate::caret::{RestoredSelection, restore};
use crate::check::CheckResult;
use crate::controller::{ApplyOutcome, EditorController};
use crate::document::{Document, SpanId};
use crate::error::ApplyError;
use crate::sequence::RequestId;
use crate::types::CaretSnapshot;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// A rendering surface the editor can draw into.
pub trait EditorSurface {
    /// Read the current selection as char offsets into the surface's text.
    ///
    /// Returns `None` when the selection is not inside the editor.
    fn read_caret(&self) -> Result<Option<CaretSnapshot>, PlatformError>;

    /// Replace the surface's content with `doc`, marking `active` as the span
    /// the open menu belongs to.
    fn render(&self, doc: &Document, active: Option<SpanId>) -> Result<(), PlatformError>;

    /// Put the selection at `selection`, whose run points index `doc.runs()`.
    fn place_caret(&self, doc: &Document, selection: &RestoredSelection) -> Result<(), PlatformError>;
}

/// Render `doc` and put the caret back at `caret`.
///
/// The document is always fully rendered before the selection is touched.
pub fn rerender<P: EditorSurface + ?Sized>(
    surface: &P,
    doc: &Document,
    active: Option<SpanId>,
    caret: Option<CaretSnapshot>,
) -> Result<Option<RestoredSelection>, PlatformError> {
    surface.render(doc, active)?;
    let Some(selection) = caret.and_then(|snap| restore(&doc.runs(), snap)) else {
        return Ok(None);
    };
    surface.place_caret(doc, &selection)?;
    Ok(Some(selection))
}

/// Feed a check response through the controller and onto the surface.
///
/// Surface failures are logged and otherwise ignored: a live update must
/// never interrupt typing.
pub fn apply_to_surface<S, P: EditorSurface + ?Sized>(
    controller: &mut EditorController<S>,
    surface: &P,
    id: RequestId,
    result: CheckResult,
) -> Result<ApplyOutcome, ApplyError> {
    let caret = surface.read_caret().unwrap_or_else(|err| {
        tracing::warn!(target: "quill::caret", %err, "could not read selection");
        None
    });
    let outcome = controller.apply_response(id, result, caret)?;
    if let ApplyOutcome::Applied { caret, .. } = &outcome {
        let doc = controller.document();
        match surface.render(doc, controller.active_span()) {
            Ok(()) => {
                let placed = caret.as_ref().map(|selection| surface.place_caret(doc, selection));
                if let Some(Err(err)) = placed {
                    tracing::warn!(target: "quill::caret", %err, "could not restore selection");
                }
            }
            Err(err) => tracing::warn!(target: "quill::render", %err, "render failed"),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::caret::{RunPoint, point_to_offset, snapshot};
    use crate::debounce::EditKind;
    use crate::suggestion::tests::sample_tokens;

    /// Surface that keeps rendered runs and a caret in memory.
    #[derive(Default)]
    struct FakeSurface {
        runs: RefCell<Vec<String>>,
        html: RefCell<String>,
        selection: RefCell<Option<(RunPoint, RunPoint)>>,
    }

    impl FakeSurface {
        fn caret_offset(&self) -> Option<usize> {
            let (_, focus) = (*self.selection.borrow())?;
            Some(point_to_offset(self.runs.borrow().as_slice(), focus))
        }
    }

    impl EditorSurface for FakeSurface {
        fn read_caret(&self) -> Result<Option<CaretSnapshot>, PlatformError> {
            let runs = self.runs.borrow();
            Ok((*self.selection.borrow()).map(|(anchor, focus)| snapshot(runs.as_slice(), anchor, focus)))
        }

        fn render(&self, doc: &Document, active: Option<SpanId>) -> Result<(), PlatformError> {
            *self.runs.borrow_mut() = doc.runs().into_iter().map(str::to_owned).collect();
            *self.html.borrow_mut() = doc.to_html_with_active(active);
            Ok(())
        }

        fn place_caret(&self, _doc: &Document, selection: &RestoredSelection) -> Result<(), PlatformError> {
            *self.selection.borrow_mut() = Some((selection.anchor, selection.focus));
            Ok(())
        }
    }

    #[test]
    fn test_caret_kept_through_check() {
        let surface = FakeSurface::default();
        let mut ctl: EditorController<()> = EditorController::default();
        let now = web_time::Instant::now();

        // The user typed into a plain surface and left the caret after "a ".
        let text = "Ths is a tst.";
        rerender(&surface, &Document::plain(text), None, Some(CaretSnapshot::caret(9))).unwrap();
        ctl.on_input(text, EditKind::Typing, now);
        let check = ctl.request_check().unwrap();

        let result = CheckResult {
            tokens: sample_tokens(),
            ..Default::default()
        };
        let outcome = apply_to_surface(&mut ctl, &surface, check.id, result).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(surface.runs.borrow().len(), 4);
        assert!(surface.html.borrow().contains("data-span-id=\"6\""));
        assert_eq!(surface.caret_offset(), Some(9));
        // Boundary offsets stay on the earlier run.
        assert_eq!(*surface.selection.borrow(), Some((RunPoint::new(1, 6), RunPoint::new(1, 6))));
    }

    #[test]
    fn test_rerender_after_resolution() {
        let surface = FakeSurface::default();
        let mut ctl: EditorController<()> = EditorController::default();
        ctl.on_input("Ths is a tst.", EditKind::Typing, web_time::Instant::now());
        let check = ctl.request_check().unwrap();
        let result = CheckResult {
            tokens: sample_tokens(),
            ..Default::default()
        };
        apply_to_surface(&mut ctl, &surface, check.id, result).unwrap();

        let resolved = ctl.select_candidate(SpanId(6), "test").unwrap();
        let placed = rerender(&surface, ctl.document(), ctl.active_span(), Some(resolved.caret()))
            .unwrap()
            .unwrap();
        assert!(placed.is_collapsed());
        assert_eq!(surface.caret_offset(), Some(13));
        assert_eq!(surface.runs.borrow().concat(), "Ths is a test.");
    }
}
