//! quill-editor-core: live spell-check editing engine without framework dependencies.
//!
//! This crate provides:
//! - `Document` - the rendered text with misspelled spans, and `render` to build it from tokens
//! - Caret snapshot/restore over flattened text runs
//! - `DebounceScheduler` and `RequestSequencer` for coalescing and fencing checks
//! - `SuggestionResolver` - the single suggestion menu and span resolution
//! - `EditorController<S>` - sans-IO orchestration of all of the above
//! - `EditorSurface` trait for platform rendering surfaces

pub mod caret;
pub mod check;
pub mod controller;
pub mod debounce;
pub mod document;
pub mod error;
pub mod platform;
pub mod render;
pub mod sequence;
pub mod stats;
pub mod suggestion;
pub mod text_helpers;
pub mod types;

pub use caret::{RestoredSelection, RunPoint};
pub use check::{
    BadgeTone, CheckMode, CheckRequest, CheckResult, LanguageBadge, MAX_TEXT_CHARS, UnknownMode,
};
pub use controller::{
    ApplyOutcome, DiscardReason, EditorConfig, EditorController, FixedAll, PendingCheck, Resolved,
};
pub use debounce::{DebounceConfig, DebounceScheduler, DebounceState, EditKind, Generation, TimerTicket};
pub use document::{DisplayNode, Document, MisspelledSpan, SpanId};
pub use error::ApplyError;
pub use platform::{EditorSurface, PlatformError, apply_to_surface, rerender};
pub use render::{IgnoredOccurrences, render, render_with_ignores};
pub use sequence::{RequestId, RequestSequencer};
pub use smol_str::SmolStr;
pub use stats::EditorStats;
pub use suggestion::{
    ActiveSuggestionMenu, ClickTarget, MenuOption, Resolution, SuggestionResolver,
};
pub use types::{CaretSnapshot, Candidate, Selection, Token, TokenKind, UNDETERMINED_LANG};
