//! Browser event classification.
//!
//! Maps `InputEvent.inputType` onto debounce edit kinds and DOM click
//! targets onto suggestion-menu click targets.

use quill_editor_core::document::{MISSPELLED_CLASS, SPAN_ID_ATTR};
use quill_editor_core::{ClickTarget, EditKind, PlatformError, SpanId};
use wasm_bindgen::JsCast;

use crate::js_error;

/// Class on the suggestion menu's root element.
pub const MENU_CLASS: &str = "quill-menu";

/// Attribute carrying an option's index on each menu entry.
pub const OPTION_INDEX_ATTR: &str = "data-option-index";

/// Marks the `<br>` kept as the editor's last child. A trailing `\n` only
/// shows as an empty last line when something follows it; the `<br>` holds
/// no text, so text runs never see it.
pub const SENTINEL_ATTR: &str = "data-quill-sentinel";

pub(crate) const SENTINEL_HTML: &str = "<br data-quill-sentinel=\"\">";

/// Debounce kind for a browser `inputType` string.
///
/// Pastes and drops get the short quiet period: the user is done with that
/// edit, there is no more typing to wait for.
pub fn edit_kind_for_input_type(input_type: &str) -> EditKind {
    match input_type {
        "insertFromPaste" | "insertFromPasteAsQuotation" | "insertFromDrop" | "insertFromYank" => {
            EditKind::Paste
        }
        _ => EditKind::Typing,
    }
}

/// Edit kind for an `input` event, falling back to typing when the event
/// carries no input type.
pub fn edit_kind_for_event(event: &web_sys::Event) -> EditKind {
    event
        .dyn_ref::<web_sys::InputEvent>()
        .map(|input| edit_kind_for_input_type(&input.input_type()))
        .unwrap_or_default()
}

/// Result of handling a beforeinput event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeInputResult {
    /// Let the browser apply the edit.
    PassThrough,
    /// The edit was applied here; the default was prevented.
    Handled,
}

/// Keep line breaks as `\n` text instead of the `<div>`/`<br>` markup
/// contenteditable inserts by default, so the editor's text nodes carry all
/// of its text. The trailing sentinel is restored afterwards.
pub fn handle_beforeinput(
    editor: &web_sys::Element,
    event: &web_sys::InputEvent,
) -> BeforeInputResult {
    if event.is_composing() {
        return BeforeInputResult::PassThrough;
    }
    match event.input_type().as_str() {
        "insertParagraph" | "insertLineBreak" => {
            event.prevent_default();
            let inserted = insert_text_at_selection("\n").and_then(|()| ensure_sentinel(editor));
            if let Err(err) = inserted {
                tracing::warn!(target: "quill::input", %err, "could not insert line break");
            }
            BeforeInputResult::Handled
        }
        _ => BeforeInputResult::PassThrough,
    }
}

/// Put the sentinel `<br>` back at the end of `editor` if an edit removed it.
pub fn ensure_sentinel(editor: &web_sys::Element) -> Result<(), PlatformError> {
    let present = editor
        .last_element_child()
        .is_some_and(|last| last.has_attribute(SENTINEL_ATTR) && last.next_sibling().is_none());
    if present {
        return Ok(());
    }
    let document = editor.owner_document().ok_or("editor element is not attached to a document")?;
    let sentinel = document
        .create_element("br")
        .map_err(|e| js_error("create_element", e))?;
    sentinel
        .set_attribute(SENTINEL_ATTR, "")
        .map_err(|e| js_error("set_attribute", e))?;
    editor
        .append_child(&sentinel)
        .map_err(|e| js_error("append_child", e))?;
    Ok(())
}

fn insert_text_at_selection(text: &str) -> Result<(), PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let selection = window
        .get_selection()
        .map_err(|e| js_error("get_selection", e))?
        .ok_or("no selection object")?;
    if selection.range_count() == 0 {
        return Ok(());
    }
    let range = selection
        .get_range_at(0)
        .map_err(|e| js_error("get_range_at", e))?;
    range
        .delete_contents()
        .map_err(|e| js_error("delete_contents", e))?;
    let node = document.create_text_node(text);
    range
        .insert_node(&node)
        .map_err(|e| js_error("insert_node", e))?;
    range
        .set_start_after(&node)
        .map_err(|e| js_error("set_start_after", e))?;
    range.collapse_with_to_start(true);
    selection
        .remove_all_ranges()
        .map_err(|e| js_error("remove_all_ranges", e))?;
    selection
        .add_range(&range)
        .map_err(|e| js_error("add_range", e))?;
    Ok(())
}

/// Misspelled span id on `element` or its nearest marked ancestor.
pub fn span_at(element: &web_sys::Element) -> Option<SpanId> {
    let selector = format!(".{}[{}]", MISSPELLED_CLASS, SPAN_ID_ATTR);
    let span = element.closest(&selector).ok().flatten()?;
    span.get_attribute(SPAN_ID_ATTR)?.parse().ok()
}

/// Menu option index on `element` or its nearest option ancestor.
pub fn option_at(element: &web_sys::Element) -> Option<usize> {
    let selector = format!("[{}]", OPTION_INDEX_ATTR);
    let option = element.closest(&selector).ok().flatten()?;
    option.get_attribute(OPTION_INDEX_ATTR)?.parse().ok()
}

/// Classify a click for the suggestion menu.
pub fn classify_click(event: &web_sys::Event) -> ClickTarget {
    let Some(element) = event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Node>().ok())
        .and_then(element_for_node)
    else {
        return ClickTarget::Outside;
    };

    let menu_selector = format!(".{}", MENU_CLASS);
    if element.closest(&menu_selector).ok().flatten().is_some() {
        return ClickTarget::Menu;
    }
    match span_at(&element) {
        Some(span) => ClickTarget::Span(span),
        None => ClickTarget::Outside,
    }
}

/// The node itself if it is an element, else its parent element.
fn element_for_node(node: web_sys::Node) -> Option<web_sys::Element> {
    match node.dyn_into::<web_sys::Element>() {
        Ok(element) => Some(element),
        Err(node) => node.parent_element(),
    }
}
