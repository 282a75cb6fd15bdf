//! Browser implementation of the editing surface.
//!
//! Renders documents into the editor element and moves the DOM selection
//! with the Selection API.

use quill_editor_core::caret::{self, RunPoint};
use quill_editor_core::{
    CaretSnapshot, Document, EditorSurface, PlatformError, RestoredSelection, SpanId,
};

use crate::dom_sync::{TextRuns, read_selection};
use crate::events::SENTINEL_HTML;
use crate::js_error;

/// The contenteditable element the editor draws into.
#[derive(Clone, Debug)]
pub struct BrowserSurface {
    editor: web_sys::HtmlElement,
}

impl BrowserSurface {
    pub fn new(editor: web_sys::HtmlElement) -> Self {
        Self { editor }
    }

    /// Look the editor element up by id.
    pub fn from_id(editor_id: &str) -> Result<Self, PlatformError> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let element = document
            .get_element_by_id(editor_id)
            .ok_or_else(|| PlatformError::from(format!("no element with id '{}'", editor_id)))?;
        let editor = element
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| PlatformError::from(format!("'{}' is not an HTML element", editor_id)))?;
        Ok(Self::new(editor))
    }

    pub fn element(&self) -> &web_sys::HtmlElement {
        &self.editor
    }

    /// The editor's current text, read from its text nodes.
    pub fn text(&self) -> Result<String, PlatformError> {
        Ok(TextRuns::collect(&self.editor)?.text())
    }
}

impl EditorSurface for BrowserSurface {
    fn read_caret(&self) -> Result<Option<CaretSnapshot>, PlatformError> {
        read_selection(&self.editor)
    }

    fn render(&self, doc: &Document, active: Option<SpanId>) -> Result<(), PlatformError> {
        let mut html = doc.to_html_with_active(active);
        html.push_str(SENTINEL_HTML);
        self.editor.set_inner_html(&html);
        tracing::trace!(
            target: "quill::render",
            nodes = doc.nodes().len(),
            misspelled = doc.misspelled_count(),
            "rendered document"
        );
        Ok(())
    }

    fn place_caret(&self, doc: &Document, selection: &RestoredSelection) -> Result<(), PlatformError> {
        // The HTML parser may merge or drop text nodes, so go through
        // absolute offsets rather than trusting run indices to line up.
        let doc_runs = doc.runs();
        let anchor = caret::point_to_offset(&doc_runs, selection.anchor);
        let focus = caret::point_to_offset(&doc_runs, selection.focus);

        let dom = TextRuns::collect(&self.editor)?;
        let (Some(anchor), Some(focus)) = (
            caret::offset_to_point(&dom.runs, anchor),
            caret::offset_to_point(&dom.runs, focus),
        ) else {
            // Empty editor: put the caret in the element itself.
            return set_selection(self.editor.as_ref(), 0, self.editor.as_ref(), 0);
        };

        let (anchor_node, anchor_offset) = dom_position(&dom, anchor)?;
        let (focus_node, focus_offset) = dom_position(&dom, focus)?;
        tracing::trace!(
            target: "quill::caret",
            ?anchor,
            ?focus,
            clamped = selection.clamped,
            "placing selection"
        );
        set_selection(anchor_node, anchor_offset, focus_node, focus_offset)
    }
}

fn dom_position(dom: &TextRuns, point: RunPoint) -> Result<(&web_sys::Node, u32), PlatformError> {
    let node = dom
        .nodes
        .get(point.run)
        .ok_or_else(|| PlatformError::from(format!("no text node for run {}", point.run)))?;
    Ok((node.as_ref(), point.utf16_offset(&dom.runs) as u32))
}

/// Replace the document selection with `anchor` → `focus`.
///
/// Uses `Selection.setBaseAndExtent` so a backward selection stays backward.
fn set_selection(
    anchor_node: &web_sys::Node,
    anchor_offset: u32,
    focus_node: &web_sys::Node,
    focus_offset: u32,
) -> Result<(), PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    let selection = window
        .get_selection()
        .map_err(|e| js_error("get_selection", e))?
        .ok_or("no selection object")?;

    selection
        .set_base_and_extent(anchor_node, anchor_offset, focus_node, focus_offset)
        .map_err(|e| js_error("set_base_and_extent", e))?;
    Ok(())
}

/// Place a collapsed caret at the end of the editor's content.
pub fn caret_to_end(editor: &web_sys::HtmlElement) -> Result<(), PlatformError> {
    let dom = TextRuns::collect(editor)?;
    match dom.nodes.last() {
        Some(last) => {
            let end = last.length();
            set_selection(last.as_ref(), end, last.as_ref(), end)
        }
        None => set_selection(editor.as_ref(), 0, editor.as_ref(), 0),
    }
}
