//! Caret tracking across full re-renders.
//!
//! The rendering surface is flattened into an ordered list of leaf text runs.
//! A caret position on the surface is a `RunPoint` (which run, how far into
//! it); a caret position that survives a rebuild is a plain char offset into
//! the concatenated text. Snapshot converts the former into the latter;
//! restore goes back, against the freshly rebuilt run list.
//!
//! Everything here is pure over `&[impl AsRef<str>]`, so the surface can be a
//! DOM tree walk, a test fixture, or a terminal buffer.

use crate::text_helpers::{char_to_utf16_offset, utf16_to_char_offset};
use crate::types::CaretSnapshot;

/// A position inside one leaf text run. `offset` is in chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RunPoint {
    pub run: usize,
    pub offset: usize,
}

impl RunPoint {
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }

    /// Build from a UTF-16 offset inside `runs[run]`.
    pub fn from_utf16<R: AsRef<str>>(runs: &[R], run: usize, utf16_offset: usize) -> Self {
        let offset = runs
            .get(run)
            .map(|text| utf16_to_char_offset(text.as_ref(), utf16_offset))
            .unwrap_or(0);
        Self { run, offset }
    }

    /// The point between child `index` and its predecessor, for surfaces that
    /// report a position as "before the Nth child" of the container.
    pub fn before_child<R: AsRef<str>>(runs: &[R], index: usize) -> Self {
        if index == 0 || runs.is_empty() {
            return Self::new(0, 0);
        }
        let prev = index.min(runs.len()) - 1;
        Self::new(prev, runs[prev].as_ref().chars().count())
    }

    /// This point's offset inside its run in UTF-16 units.
    pub fn utf16_offset<R: AsRef<str>>(&self, runs: &[R]) -> usize {
        runs.get(self.run)
            .map(|text| char_to_utf16_offset(text.as_ref(), self.offset))
            .unwrap_or(0)
    }
}

/// Total char length of all runs.
pub fn total_len<R: AsRef<str>>(runs: &[R]) -> usize {
    runs.iter().map(|r| r.as_ref().chars().count()).sum()
}

/// Absolute char offset of a point: every char in earlier runs plus the
/// offset into its own run. Out-of-range points clamp to the content.
pub fn point_to_offset<R: AsRef<str>>(runs: &[R], point: RunPoint) -> usize {
    let mut offset = 0;
    for (index, run) in runs.iter().enumerate() {
        let len = run.as_ref().chars().count();
        if index == point.run {
            return offset + point.offset.min(len);
        }
        offset += len;
    }
    offset
}

/// Find the run containing `offset`.
///
/// Walks runs accumulating length and stops at the first run whose
/// accumulated end reaches the target, so an offset exactly on a boundary
/// lands at the end of the earlier run. Offsets past the end clamp to the
/// end of the last run. `None` only when there are no runs at all.
pub fn offset_to_point<R: AsRef<str>>(runs: &[R], offset: usize) -> Option<RunPoint> {
    let mut acc = 0;
    for (index, run) in runs.iter().enumerate() {
        let len = run.as_ref().chars().count();
        if acc + len >= offset {
            return Some(RunPoint::new(index, offset - acc));
        }
        acc += len;
    }
    let last = runs.len().checked_sub(1)?;
    Some(RunPoint::new(last, runs[last].as_ref().chars().count()))
}

/// Capture the selection between `anchor` and `focus` as char offsets.
pub fn snapshot<R: AsRef<str>>(runs: &[R], anchor: RunPoint, focus: RunPoint) -> CaretSnapshot {
    let anchor_offset = point_to_offset(runs, anchor);
    let focus_offset = point_to_offset(runs, focus);
    let snap = CaretSnapshot {
        start: anchor_offset.min(focus_offset),
        end: anchor_offset.max(focus_offset),
        backward: focus_offset < anchor_offset,
    };
    tracing::trace!(
        target: "quill::caret",
        ?anchor,
        ?focus,
        start = snap.start,
        end = snap.end,
        "caret snapshot"
    );
    snap
}

/// Where to put the selection on the rebuilt surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoredSelection {
    pub anchor: RunPoint,
    pub focus: RunPoint,
    /// The snapshot reached past the new content and was pulled back.
    pub clamped: bool,
}

impl RestoredSelection {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Map a snapshot back onto a (possibly differently segmented) run list.
///
/// Never fails on content mismatch: offsets beyond the new content clamp to
/// its end. Returns `None` only when there is nowhere to put a caret.
pub fn restore<R: AsRef<str>>(runs: &[R], snap: CaretSnapshot) -> Option<RestoredSelection> {
    let len = total_len(runs);
    let clamped = snap.end > len;
    let snap = snap.clamped(len);
    let start = offset_to_point(runs, snap.start)?;
    let end = offset_to_point(runs, snap.end)?;

    if clamped {
        tracing::debug!(
            target: "quill::caret",
            len,
            start = snap.start,
            end = snap.end,
            "caret snapshot past content end, clamped"
        );
    }

    let (anchor, focus) = if snap.backward { (end, start) } else { (start, end) };
    Some(RestoredSelection {
        anchor,
        focus,
        clamped,
    })
}
