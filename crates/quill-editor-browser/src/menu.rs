//! Suggestion menu DOM.
//!
//! A `MenuSubscription` is everything an open menu holds on the page: the
//! menu element, the active mark on its anchor span, and the listeners for
//! option clicks and outside clicks. Dropping it removes all of them.

use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use quill_editor_core::document::{ACTIVE_CLASS, SPAN_ID_ATTR};
use quill_editor_core::{ClickTarget, MenuOption, PlatformError, SpanId};
use wasm_bindgen::JsCast;

use crate::events::{MENU_CLASS, OPTION_INDEX_ATTR, classify_click, option_at};
use crate::js_error;

/// Something the user did with an open menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    /// Picked option `index`.
    Choose(usize),
    /// Clicked somewhere on the page while the menu was open.
    Click(ClickTarget),
}

/// Callback for menu actions.
///
/// Always invoked from a fresh task, never from inside the listener, since
/// handling an action usually drops the subscription that owns the listener.
pub type MenuHandler = Rc<dyn Fn(MenuAction)>;

pub struct MenuSubscription {
    menu: web_sys::HtmlElement,
    anchor: Option<web_sys::Element>,
    _option_click: EventListener,
    _keep_selection: EventListener,
    _outside_click: EventListener,
}

impl std::fmt::Debug for MenuSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuSubscription")
            .field("anchor", &self.anchor.as_ref().map(|a| a.outer_html()))
            .finish_non_exhaustive()
    }
}

impl MenuSubscription {
    /// Build the menu for `span` under `editor` and start listening.
    pub fn open(
        editor: &web_sys::HtmlElement,
        span: SpanId,
        options: &[MenuOption],
        handler: MenuHandler,
    ) -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let body = document.body().ok_or("no body")?;

        let menu = document
            .create_element("div")
            .map_err(|e| js_error("create_element", e))?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| "menu element is not an HtmlElement")?;
        menu.set_class_name(MENU_CLASS);
        menu.set_attribute("role", "menu").map_err(|e| js_error("set_attribute", e))?;

        for (index, option) in options.iter().enumerate() {
            let entry = document
                .create_element("button")
                .map_err(|e| js_error("create_element", e))?;
            entry.set_class_name(match option {
                MenuOption::Candidate(_) => "quill-menu-option",
                MenuOption::Ignore => "quill-menu-option quill-menu-ignore",
            });
            entry
                .set_attribute(OPTION_INDEX_ATTR, &index.to_string())
                .map_err(|e| js_error("set_attribute", e))?;
            entry
                .set_attribute("type", "button")
                .map_err(|e| js_error("set_attribute", e))?;
            entry.set_text_content(Some(&option.label()));
            menu.append_child(&entry).map_err(|e| js_error("append_child", e))?;
        }

        let anchor = editor
            .query_selector(&format!("[{}=\"{}\"]", SPAN_ID_ATTR, span))
            .map_err(|e| js_error("query_selector", e))?;
        if let Some(anchor) = &anchor {
            position_below(&window, &menu, anchor)?;
        }
        body.append_child(&menu).map_err(|e| js_error("append_child", e))?;
        // Last fallible step; undo the mount if it fails.
        if let Some(anchor) = &anchor {
            if let Err(e) = anchor.class_list().add_1(ACTIVE_CLASS) {
                menu.remove();
                return Err(js_error("classList.add", e));
            }
        }

        let on_option = handler.clone();
        let option_click = EventListener::new(&menu, "click", move |event| {
            let index = event
                .target()
                .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                .and_then(|element| option_at(&element));
            if let Some(index) = index {
                defer(&on_option, MenuAction::Choose(index));
            }
        });

        // Keep the editor's selection while the menu is being clicked.
        let keep_selection = EventListener::new_with_options(
            &menu,
            "mousedown",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        );

        let outside_click = EventListener::new(&document, "click", move |event| {
            let target = classify_click(event);
            if target != ClickTarget::Menu {
                defer(&handler, MenuAction::Click(target));
            }
        });

        tracing::trace!(target: "quill::suggest", %span, options = options.len(), "menu mounted");
        Ok(Self {
            menu,
            anchor,
            _option_click: option_click,
            _keep_selection: keep_selection,
            _outside_click: outside_click,
        })
    }
}

impl Drop for MenuSubscription {
    fn drop(&mut self) {
        self.menu.remove();
        if let Some(anchor) = &self.anchor {
            let _ = anchor.class_list().remove_1(ACTIVE_CLASS);
        }
        tracing::trace!(target: "quill::suggest", "menu unmounted");
    }
}

fn defer(handler: &MenuHandler, action: MenuAction) {
    let handler = handler.clone();
    wasm_bindgen_futures::spawn_local(async move { handler(action) });
}

/// Absolutely position `menu` just under `anchor`.
fn position_below(
    window: &web_sys::Window,
    menu: &web_sys::HtmlElement,
    anchor: &web_sys::Element,
) -> Result<(), PlatformError> {
    let rect = anchor.get_bounding_client_rect();
    let scroll_x = window.scroll_x().unwrap_or(0.0);
    let scroll_y = window.scroll_y().unwrap_or(0.0);
    let style = menu.style();
    style
        .set_property("position", "absolute")
        .map_err(|e| js_error("style", e))?;
    style
        .set_property("left", &format!("{}px", rect.left() + scroll_x))
        .map_err(|e| js_error("style", e))?;
    style
        .set_property("top", &format!("{}px", rect.bottom() + scroll_y))
        .map_err(|e| js_error("style", e))?;
    Ok(())
}
