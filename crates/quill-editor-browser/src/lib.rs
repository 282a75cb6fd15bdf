//! Browser DOM layer for the quill live spell-check editor.
//!
//! Everything that touches the page lives here; the editing logic is in
//! `quill-editor-core`. Assumes a `wasm32-unknown-unknown` target.
//!
//! # Architecture
//!
//! - `dom_sync`: editor text nodes → text runs, DOM selection → caret snapshot
//! - `cursor`: `BrowserSurface`, rendering and selection placement
//! - `events`: input type and click classification, line-break handling
//! - `menu`: the suggestion menu element and its listeners
//! - `editor`: the `LiveEditor` class exported to JS
//!
//! # Re-exports
//!
//! This crate re-exports `quill-editor-core` for convenience, so consumers
//! only need to depend on `quill-editor-browser`.

// Re-export core crate
pub use quill_editor_core;
pub use quill_editor_core::*;

pub mod cursor;
pub mod dom_sync;
pub mod editor;
pub mod events;
pub mod menu;

pub use cursor::BrowserSurface;
pub use editor::{EditorStatus, LiveEditor};
pub use events::{classify_click, edit_kind_for_input_type};
pub use menu::{MenuAction, MenuSubscription};

use wasm_bindgen::prelude::*;

/// Install the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(all(target_family = "wasm", target_os = "unknown"))]
    {
        use tracing::Level;
        use tracing::subscriber::set_global_default;
        use tracing_subscriber::Registry;
        use tracing_subscriber::layer::SubscriberExt;

        console_error_panic_hook::set_once();

        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };
        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(console_level)
                .build(),
        );
        let _ = set_global_default(Registry::default().with(wasm_layer));
    }
}

/// Describe a JS exception for a `PlatformError`.
pub(crate) fn js_error(context: &str, err: JsValue) -> PlatformError {
    let detail = match gloo_utils::errors::JsError::try_from(err) {
        Ok(err) => err.to_string(),
        Err(not_error) => not_error.to_string(),
    };
    PlatformError(format!("{} failed: {}", context, detail))
}
