//! WASM browser tests for quill-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(all(target_family = "wasm", target_os = "unknown"))]

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use quill_editor_browser::dom_sync::{TextRuns, read_selection};
use quill_editor_browser::events::{
    BeforeInputResult, MENU_CLASS, OPTION_INDEX_ATTR, SENTINEL_ATTR, handle_beforeinput,
};
use quill_editor_browser::{
    BrowserSurface, CaretSnapshot, CheckResult, ClickTarget, Document, EditKind, EditorController,
    EditorSurface, MenuAction, MenuOption, MenuSubscription, SpanId, Token, apply_to_surface,
    edit_kind_for_input_type, rerender,
};
use quill_editor_core::Candidate;

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Fresh contenteditable element attached to the body.
fn mount(id: &str) -> web_sys::HtmlElement {
    let doc = document();
    if let Some(old) = doc.get_element_by_id(id) {
        old.remove();
    }
    let element = doc
        .create_element("div")
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    element.set_id(id);
    element.set_attribute("contenteditable", "true").unwrap();
    doc.body().unwrap().append_child(&element).unwrap();
    element
}

fn sample_tokens() -> Vec<Token> {
    vec![
        Token::misspelled("Ths", vec![Candidate::new("This", "en"), Candidate::new("Its", "en")]),
        Token::other(" "),
        Token::word("is"),
        Token::other(" "),
        Token::word("a"),
        Token::other(" "),
        Token::misspelled("tst", vec![Candidate::new("test", "en"), Candidate::new("tot", "en")]),
        Token::other("."),
    ]
}

fn select(node: &web_sys::Node, offset: u32) {
    let selection = web_sys::window().unwrap().get_selection().unwrap().unwrap();
    selection.set_base_and_extent(node, offset, node, offset).unwrap();
}

// === Event classification ===

#[wasm_bindgen_test]
fn test_paste_input_type() {
    assert_eq!(edit_kind_for_input_type("insertFromPaste"), EditKind::Paste);
    assert_eq!(edit_kind_for_input_type("insertText"), EditKind::Typing);
}

// === Line breaks ===

fn sentinel_count(editor: &web_sys::HtmlElement) -> u32 {
    editor
        .query_selector_all(&format!("br[{}]", SENTINEL_ATTR))
        .unwrap()
        .length()
}

#[wasm_bindgen_test]
fn test_render_ends_with_sentinel() {
    let editor = mount("quill-sentinel");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&Document::plain("line\n"), None).unwrap();

    let last = editor.last_element_child().unwrap();
    assert!(last.has_attribute(SENTINEL_ATTR));
    assert_eq!(sentinel_count(&editor), 1);
    assert_eq!(surface.text().unwrap(), "line\n");
}

#[wasm_bindgen_test]
fn test_enter_at_end_keeps_caret_on_new_line() {
    let editor = mount("quill-enter");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&Document::plain("abc"), None).unwrap();
    // An edit that took the sentinel with it.
    editor.last_element_child().unwrap().remove();
    select(&editor.first_child().unwrap(), 3);

    let init = web_sys::InputEventInit::new();
    init.set_input_type("insertParagraph");
    init.set_cancelable(true);
    let event = web_sys::InputEvent::new_with_event_init_dict("beforeinput", &init).unwrap();
    assert_eq!(handle_beforeinput(&editor, &event), BeforeInputResult::Handled);

    assert_eq!(surface.text().unwrap(), "abc\n");
    assert_eq!(sentinel_count(&editor), 1);
    assert!(editor.last_element_child().unwrap().has_attribute(SENTINEL_ATTR));
    assert_eq!(read_selection(&editor).unwrap(), Some(CaretSnapshot::caret(4)));

    // A second Enter does not stack sentinels.
    assert_eq!(handle_beforeinput(&editor, &event), BeforeInputResult::Handled);
    assert_eq!(surface.text().unwrap(), "abc\n\n");
    assert_eq!(sentinel_count(&editor), 1);
}

// === Text runs and selection ===

#[wasm_bindgen_test]
fn test_text_runs_follow_rendered_spans() {
    let editor = mount("quill-runs");
    let surface = BrowserSurface::new(editor.clone());
    let doc = quill_editor_browser::render(&sample_tokens());
    surface.render(&doc, None).unwrap();

    let runs = TextRuns::collect(&editor).unwrap();
    assert_eq!(runs.text(), "Ths is a tst.");
    assert_eq!(runs.runs, vec!["Ths", " is a ", "tst", "."]);
    assert_eq!(surface.text().unwrap(), "Ths is a tst.");
}

#[wasm_bindgen_test]
fn test_read_selection_in_text_node() {
    let editor = mount("quill-read");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&Document::plain("héllo wörld"), None).unwrap();

    let text = editor.first_child().unwrap();
    select(&text, 7);
    assert_eq!(read_selection(&editor).unwrap(), Some(CaretSnapshot::caret(7)));
}

#[wasm_bindgen_test]
fn test_read_selection_at_element_boundary() {
    let editor = mount("quill-boundary");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&quill_editor_browser::render(&sample_tokens()), None).unwrap();

    // Before the second child node: after "Ths".
    select(editor.as_ref(), 1);
    assert_eq!(read_selection(&editor).unwrap(), Some(CaretSnapshot::caret(3)));
    // After the last child.
    select(editor.as_ref(), editor.child_nodes().length());
    assert_eq!(read_selection(&editor).unwrap(), Some(CaretSnapshot::caret(13)));
}

#[wasm_bindgen_test]
fn test_selection_outside_editor_is_none() {
    let editor = mount("quill-outside");
    let other = mount("quill-outside-other");
    BrowserSurface::new(other.clone())
        .render(&Document::plain("elsewhere"), None)
        .unwrap();
    select(&other.first_child().unwrap(), 2);
    assert_eq!(read_selection(&editor).unwrap(), None);
}

// === Re-render and caret restore ===

#[wasm_bindgen_test]
fn test_caret_survives_check_render() {
    let editor = mount("quill-apply");
    let surface = BrowserSurface::new(editor.clone());
    let mut controller: EditorController<()> = EditorController::default();

    surface.render(&Document::plain("Ths is a tst."), None).unwrap();
    select(&editor.first_child().unwrap(), 11);
    controller.on_input(&surface.text().unwrap(), EditKind::Typing, web_time::Instant::now());
    let pending = controller.request_check().unwrap();

    let result = CheckResult {
        tokens: sample_tokens(),
        ..Default::default()
    };
    let outcome = apply_to_surface(&mut controller, &surface, pending.id, result).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(editor.query_selector_all(".misspelled").unwrap().length(), 2);
    assert_eq!(read_selection(&editor).unwrap(), Some(CaretSnapshot::caret(11)));
}

#[wasm_bindgen_test]
fn test_backward_selection_restored() {
    let editor = mount("quill-backward");
    let surface = BrowserSurface::new(editor.clone());
    let doc = quill_editor_browser::render(&sample_tokens());
    let snap = CaretSnapshot {
        start: 2,
        end: 8,
        backward: true,
    };
    rerender(&surface, &doc, None, Some(snap)).unwrap();
    assert_eq!(read_selection(&editor).unwrap(), Some(snap));
}

#[wasm_bindgen_test]
fn test_active_span_marked() {
    let editor = mount("quill-active");
    let surface = BrowserSurface::new(editor.clone());
    surface
        .render(&quill_editor_browser::render(&sample_tokens()), Some(SpanId(6)))
        .unwrap();
    let active = editor.query_selector(".misspelled.active").unwrap().unwrap();
    assert_eq!(active.text_content().unwrap(), "tst");
}

// === Suggestion menu ===

#[wasm_bindgen_test]
fn test_menu_mounts_and_unmounts() {
    let editor = mount("quill-menu");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&quill_editor_browser::render(&sample_tokens()), None).unwrap();

    let options = vec![
        MenuOption::Candidate(Candidate::new("test", "en")),
        MenuOption::Ignore,
    ];
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    let handler: Rc<dyn Fn(MenuAction)> = Rc::new(move |_| seen.set(seen.get() + 1));

    let menu = MenuSubscription::open(&editor, SpanId(6), &options, handler).unwrap();
    let selector = format!(".{}", MENU_CLASS);
    let element = document().query_selector(&selector).unwrap().unwrap();
    let entries = element
        .query_selector_all(&format!("[{}]", OPTION_INDEX_ATTR))
        .unwrap();
    assert_eq!(entries.length(), 2);
    assert_eq!(element.text_content().unwrap(), "test (en)Ignore");
    assert!(editor.query_selector(".misspelled.active").unwrap().is_some());

    drop(menu);
    assert!(document().query_selector(&selector).unwrap().is_none());
    assert!(editor.query_selector(".misspelled.active").unwrap().is_none());
    assert_eq!(calls.get(), 0);
}

#[wasm_bindgen_test]
fn test_click_outside_classified() {
    let editor = mount("quill-click");
    let surface = BrowserSurface::new(editor.clone());
    surface.render(&quill_editor_browser::render(&sample_tokens()), None).unwrap();

    let event = web_sys::Event::new("click").unwrap();
    let span = editor.query_selector("[data-span-id=\"6\"]").unwrap().unwrap();
    span.dispatch_event(&event).unwrap();
    assert_eq!(
        quill_editor_browser::classify_click(&event),
        ClickTarget::Span(SpanId(6))
    );

    let event = web_sys::Event::new("click").unwrap();
    editor.dispatch_event(&event).unwrap();
    assert_eq!(quill_editor_browser::classify_click(&event), ClickTarget::Outside);
}
