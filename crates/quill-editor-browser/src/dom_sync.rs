//! DOM → model reads.
//!
//! The editor element is flattened into its leaf text nodes, in document
//! order. Their contents are the text runs the core caret tracker works over,
//! and their concatenation is the editor's text.

use quill_editor_core::caret::{self, RunPoint};
use quill_editor_core::{CaretSnapshot, PlatformError};
use wasm_bindgen::JsCast;

use crate::js_error;

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

/// The editor's leaf text nodes paired with their contents.
pub struct TextRuns {
    pub nodes: Vec<web_sys::Text>,
    pub runs: Vec<String>,
}

impl TextRuns {
    /// Walk `editor` and collect its text nodes.
    pub fn collect(editor: &web_sys::Element) -> Result<Self, PlatformError> {
        let dom_document = editor
            .owner_document()
            .ok_or("editor element is not attached to a document")?;
        let walker = dom_document
            .create_tree_walker_with_what_to_show(editor, SHOW_TEXT)
            .map_err(|e| js_error("create_tree_walker", e))?;

        let mut nodes = Vec::new();
        let mut runs = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            if let Ok(text) = node.dyn_into::<web_sys::Text>() {
                runs.push(text.data());
                nodes.push(text);
            }
        }
        Ok(Self { nodes, runs })
    }

    /// Concatenated text of every run.
    pub fn text(&self) -> String {
        self.runs.concat()
    }

    /// Map a DOM boundary point (`node`, `offset`) to a run point.
    ///
    /// `offset` follows DOM rules: UTF-16 units when `node` is a text node,
    /// a child index otherwise. Returns `None` if the point is outside the
    /// editor.
    pub fn point(
        &self,
        editor: &web_sys::Element,
        node: &web_sys::Node,
        offset: u32,
    ) -> Option<RunPoint> {
        let editor_node: &web_sys::Node = editor.as_ref();
        if !editor_node.contains(Some(node)) {
            return None;
        }

        if node.node_type() == web_sys::Node::TEXT_NODE {
            let index = self.nodes.iter().position(|text| {
                let text: &web_sys::Node = text.as_ref();
                text == node
            })?;
            return Some(RunPoint::from_utf16(&self.runs, index, offset as usize));
        }

        // Element boundary: count the text nodes that come before it.
        let children = node.child_nodes();
        let preceding = match children.get(offset) {
            Some(child) => self
                .nodes
                .iter()
                .take_while(|text| {
                    let position = child.compare_document_position(text.as_ref());
                    position & web_sys::Node::DOCUMENT_POSITION_PRECEDING != 0
                })
                .count(),
            None => self
                .nodes
                .iter()
                .take_while(|text| {
                    let position = node.compare_document_position(text.as_ref());
                    position & web_sys::Node::DOCUMENT_POSITION_CONTAINED_BY != 0
                        || position & web_sys::Node::DOCUMENT_POSITION_FOLLOWING == 0
                })
                .count(),
        };
        tracing::trace!(
            target: "quill::caret",
            node_name = %node.node_name(),
            offset,
            preceding,
            "element boundary"
        );
        Some(RunPoint::before_child(&self.runs, preceding))
    }
}

/// Read the current DOM selection as a caret snapshot over `editor`.
///
/// `Ok(None)` when nothing is selected or the selection is elsewhere on
/// the page.
pub fn read_selection(editor: &web_sys::Element) -> Result<Option<CaretSnapshot>, PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    let selection = match window.get_selection() {
        Ok(Some(sel)) => sel,
        _ => return Ok(None),
    };
    let (Some(anchor_node), Some(focus_node)) = (selection.anchor_node(), selection.focus_node())
    else {
        return Ok(None);
    };

    let runs = TextRuns::collect(editor)?;
    let anchor = runs.point(editor, &anchor_node, selection.anchor_offset());
    let focus = runs.point(editor, &focus_node, selection.focus_offset());
    match (anchor, focus) {
        (Some(anchor), Some(focus)) => Ok(Some(caret::snapshot(&runs.runs, anchor, focus))),
        _ => {
            tracing::trace!(target: "quill::caret", "selection outside editor");
            Ok(None)
        }
    }
}
