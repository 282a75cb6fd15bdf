//! `LiveEditor`: the JS-facing editor.
//!
//! Owns an `EditorController` and drives it from DOM events, `setTimeout`
//! timers and `fetch` completions. All of those run on the one JS thread, so
//! state lives in an `Rc<RefCell<_>>`; callbacks hold a `Weak` and give up
//! quietly once the editor has been freed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use quill_common::{CheckClient, CheckError, QuillConfig};
use quill_editor_core::{
    ApplyOutcome, CheckMode, CheckResult, ClickTarget, Document, EditKind, EditorController,
    EditorSurface, PendingCheck, RequestId, Resolved, SpanId, TimerTicket, apply_to_surface,
    rerender,
};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::cursor::{BrowserSurface, caret_to_end};
use crate::events::{BeforeInputResult, classify_click, edit_kind_for_event, handle_beforeinput};
use crate::menu::{MenuAction, MenuHandler, MenuSubscription};

type Controller = EditorController<MenuSubscription>;
type Shared = Rc<RefCell<EditorState>>;

struct EditorState {
    controller: Controller,
    surface: BrowserSurface,
    client: CheckClient,
    /// The armed debounce timer. Replacing it cancels the old one.
    timer: Option<Timeout>,
    on_update: Option<js_sys::Function>,
}

/// Counters and language badge, as handed to JS.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorStatus {
    pub chars: usize,
    pub words: usize,
    pub misspelled: usize,
    pub lang: String,
    pub confidence: String,
    pub badge_class: &'static str,
}

impl EditorStatus {
    fn from_controller(controller: &Controller) -> Self {
        let stats = controller.stats();
        let badge = controller.badge();
        Self {
            chars: stats.chars,
            words: stats.words,
            misspelled: stats.misspelled,
            lang: badge.lang.to_string(),
            confidence: badge.confidence_label(),
            badge_class: badge.tone.class(),
        }
    }
}

/// A live spell-checking editor mounted on a contenteditable element.
#[wasm_bindgen]
pub struct LiveEditor {
    state: Shared,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl LiveEditor {
    /// Mount on the element with id `editor_id`.
    ///
    /// `config` is an optional object with the same fields as the config
    /// file (`endpoint`, `mode`, `lang`, `typing_quiet_ms`, `paste_quiet_ms`).
    #[wasm_bindgen(constructor)]
    pub fn new(editor_id: &str, config: JsValue) -> Result<LiveEditor, JsError> {
        let config: QuillConfig = if config.is_undefined() || config.is_null() {
            QuillConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("invalid editor config: {}", e)))?
        };
        let client = CheckClient::from_config(&config).map_err(|e| JsError::new(&e.to_string()))?;
        let surface = BrowserSurface::from_id(editor_id).map_err(|e| JsError::new(&e.to_string()))?;

        let element = surface.element().clone();
        element
            .set_attribute("contenteditable", "true")
            .map_err(|_| JsError::new("could not make the editor editable"))?;
        // The browser's own checker would fight ours for the same words.
        element.set_spellcheck(false);
        let _ = element.style().set_property("white-space", "pre-wrap");

        let state = Rc::new(RefCell::new(EditorState {
            controller: EditorController::new(config.editor_config()),
            surface,
            client,
            timer: None,
            on_update: None,
        }));

        let listeners = vec![
            {
                let weak = Rc::downgrade(&state);
                let editor = element.clone();
                EventListener::new_with_options(
                    &element,
                    "beforeinput",
                    EventListenerOptions::enable_prevent_default(),
                    move |event| {
                        let Some(input) = event.dyn_ref::<web_sys::InputEvent>() else {
                            return;
                        };
                        if handle_beforeinput(&editor, input) == BeforeInputResult::Handled {
                            // No `input` event follows a prevented edit.
                            with_state(&weak, |shared| handle_input(shared, EditKind::Typing));
                        }
                    },
                )
            },
            {
                let weak = Rc::downgrade(&state);
                EventListener::new(&element, "input", move |event| {
                    let kind = edit_kind_for_event(event);
                    with_state(&weak, |shared| handle_input(shared, kind));
                })
            },
            {
                let weak = Rc::downgrade(&state);
                EventListener::new(&element, "click", move |event| {
                    if let ClickTarget::Span(span) = classify_click(event) {
                        with_state(&weak, |shared| open_menu(shared, span));
                    }
                })
            },
        ];

        tracing::info!(target: "quill::editor", editor_id, endpoint = %config.endpoint, "editor mounted");
        Ok(LiveEditor {
            state,
            _listeners: listeners,
        })
    }

    /// Called with the editor status after every change to it.
    #[wasm_bindgen(js_name = setOnUpdate)]
    pub fn set_on_update(&self, callback: Option<js_sys::Function>) {
        self.state.borrow_mut().on_update = callback;
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.state.borrow().controller.text().to_owned()
    }

    /// Current counters and badge.
    pub fn status(&self) -> Result<JsValue, JsError> {
        let status = EditorStatus::from_controller(&self.state.borrow().controller);
        serde_wasm_bindgen::to_value(&status).map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<(), JsError> {
        let mode = CheckMode::from_str(mode).map_err(|e| JsError::new(&e.to_string()))?;
        self.state.borrow_mut().controller.set_mode(mode);
        Ok(())
    }

    #[wasm_bindgen(js_name = setLang)]
    pub fn set_lang(&self, lang: &str) {
        self.state.borrow_mut().controller.set_lang(lang);
    }

    /// Replace the editor's content, e.g. with a loaded file, and schedule a
    /// check with the paste quiet period.
    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&self, text: &str) {
        {
            let state = self.state.borrow();
            if let Err(err) = state.surface.render(&Document::plain(text), None) {
                tracing::warn!(target: "quill::render", %err, "could not load text");
                return;
            }
            if let Err(err) = caret_to_end(state.surface.element()) {
                tracing::debug!(target: "quill::caret", %err, "could not move caret to end");
            }
        }
        handle_input(&self.state, EditKind::Paste);
    }

    /// Check the current text now.
    ///
    /// Unlike the background checks this is a deliberate action, so the
    /// returned promise rejects with the error message on failure.
    #[wasm_bindgen(js_name = checkNow)]
    pub fn check_now(&self) -> js_sys::Promise {
        let weak = Rc::downgrade(&self.state);
        let pending = {
            let mut state = self.state.borrow_mut();
            state.timer = None;
            state.controller.request_check()
        };
        let client = self.state.borrow().client.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let Some(pending) = pending else {
                return Ok(JsValue::FALSE);
            };
            let result = client.check(&pending.request).await;
            let message = result.as_ref().err().map(|err| err.to_string());
            with_state(&weak, |shared| finish_check(shared, pending.id, result));
            match message {
                Some(message) => Err(JsValue::from_str(&message)),
                None => Ok(JsValue::TRUE),
            }
        })
    }

    /// Replace every misspelling that has a suggestion with its first one,
    /// then check once. Returns how many were replaced.
    #[wasm_bindgen(js_name = fixAll)]
    pub fn fix_all(&self) -> usize {
        let fixed = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            let caret = state.surface.read_caret().ok().flatten();
            let fixed = state.controller.fix_all();
            if fixed.fixed > 0 {
                render_and_place(state, caret);
            }
            fixed
        };
        if let Some(pending) = fixed.check {
            send_check(&self.state, pending);
        }
        notify(&self.state);
        fixed.fixed
    }

    /// Empty the editor and drop any pending or in-flight check.
    pub fn clear(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.timer = None;
            state.controller.clear();
            if let Err(err) = state.surface.render(state.controller.document(), None) {
                tracing::warn!(target: "quill::render", %err, "could not clear surface");
            }
        }
        notify(&self.state);
    }

    /// Close the suggestion menu if one is open.
    #[wasm_bindgen(js_name = closeMenu)]
    pub fn close_menu(&self) -> bool {
        self.state.borrow_mut().controller.close_menu()
    }
}

fn with_state(weak: &Weak<RefCell<EditorState>>, f: impl FnOnce(&Shared)) {
    match weak.upgrade() {
        Some(shared) => f(&shared),
        None => tracing::trace!(target: "quill::editor", "editor freed, dropping event"),
    }
}

/// The surface's text changed: feed the controller and re-arm the timer.
fn handle_input(shared: &Shared, kind: EditKind) {
    {
        let mut state = shared.borrow_mut();
        let text = match state.surface.text() {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(target: "quill::input", %err, "could not read editor text");
                return;
            }
        };
        let ticket = state.controller.on_input(&text, kind, Instant::now());
        state.timer = Some(arm_timer(shared, ticket));
    }
    notify(shared);
}

fn arm_timer(shared: &Shared, ticket: TimerTicket) -> Timeout {
    let weak = Rc::downgrade(shared);
    let millis = u32::try_from(ticket.delay.as_millis()).unwrap_or(u32::MAX);
    Timeout::new(millis, move || {
        with_state(&weak, |shared| {
            let pending = shared.borrow_mut().controller.on_timer(ticket.generation);
            if let Some(pending) = pending {
                send_check(shared, pending);
            }
        });
    })
}

fn send_check(shared: &Shared, pending: PendingCheck) {
    let client = shared.borrow().client.clone();
    let weak = Rc::downgrade(shared);
    wasm_bindgen_futures::spawn_local(async move {
        let result = client.check(&pending.request).await;
        with_state(&weak, |shared| finish_check(shared, pending.id, result));
    });
}

fn finish_check(shared: &Shared, id: RequestId, result: Result<CheckResult, CheckError>) {
    {
        let mut state = shared.borrow_mut();
        let state = &mut *state;
        match result {
            Ok(result) => match apply_to_surface(&mut state.controller, &state.surface, id, result) {
                Ok(ApplyOutcome::Applied { misspelled, .. }) => {
                    tracing::debug!(target: "quill::editor", %id, misspelled, "document updated");
                }
                Ok(ApplyOutcome::Discarded(reason)) => {
                    tracing::trace!(target: "quill::editor", %id, ?reason, "response discarded");
                }
                Err(err) => tracing::warn!(target: "quill::editor", %id, %err, "response rejected"),
            },
            Err(err) => state.controller.check_failed(id, &err),
        }
    }
    notify(shared);
}

fn open_menu(shared: &Shared, span: SpanId) {
    let mut state = shared.borrow_mut();
    if state.controller.active_span() == Some(span) {
        return;
    }

    let weak = Rc::downgrade(shared);
    let handler: MenuHandler = Rc::new(move |action| {
        with_state(&weak, |shared| handle_menu_action(shared, action));
    });
    let editor = state.surface.element().clone();
    let opened = state.controller.try_open_menu(span, |span, options| {
        MenuSubscription::open(&editor, span, options, handler)
    });
    match opened {
        Ok(Some(_)) => {}
        Ok(None) => tracing::debug!(target: "quill::suggest", %span, "clicked span is stale"),
        Err(err) => tracing::warn!(target: "quill::suggest", %span, %err, "could not open menu"),
    }
}

fn handle_menu_action(shared: &Shared, action: MenuAction) {
    let resolved = {
        let mut state = shared.borrow_mut();
        let state = &mut *state;
        match action {
            MenuAction::Click(target) => {
                state.controller.click(target);
                return;
            }
            MenuAction::Choose(index) => {
                let Some(resolved) = state.controller.choose(index) else {
                    return;
                };
                render_and_place(state, Some(resolved.caret()));
                resolved
            }
        }
    };
    let Resolved { check, .. } = resolved;
    if let Some(pending) = check {
        send_check(shared, pending);
    }
    notify(shared);
}

/// Redraw the document and put the caret back. Failures are logged only.
fn render_and_place(state: &mut EditorState, caret: Option<quill_editor_core::CaretSnapshot>) {
    let doc = state.controller.document();
    if let Err(err) = rerender(&state.surface, doc, state.controller.active_span(), caret) {
        tracing::warn!(target: "quill::render", %err, "re-render failed");
    }
}

/// Hand the current status to the JS callback, if one is set.
fn notify(shared: &Shared) {
    let (callback, status) = {
        let state = shared.borrow();
        let Some(callback) = state.on_update.clone() else {
            return;
        };
        (callback, EditorStatus::from_controller(&state.controller))
    };
    let status = match serde_wasm_bindgen::to_value(&status) {
        Ok(status) => status,
        Err(err) => {
            tracing::warn!(target: "quill::editor", %err, "could not convert status");
            return;
        }
    };
    if let Err(err) = callback.call1(&JsValue::NULL, &status) {
        tracing::warn!(target: "quill::editor", ?err, "update callback threw");
    }
}
