//! Analysis Page App
//!
//! Binds the analysis form and one task event stream to the page. Stream
//! messages go through the shared [`Session`]; the `EventSource` is closed
//! as soon as a dispatch says so and never reopened.

use std::cell::RefCell;
use std::rc::Rc;

use stockview::form;
use stockview::protocol::{page_path_with_task, stream_path, TaskId, TASK_ID_PARAM};
use stockview::session::{Dispatch, Session};
use stockview::view::{AnalysisView, Document};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent, UrlSearchParams};

use crate::api;
use crate::dom::DomView;
use crate::markdown::fallback_policy;

/// Analysis page controller
#[derive(Clone)]
pub struct AnalysisApp {
    view: Rc<RefCell<DomView>>,
    session: Rc<RefCell<Session>>,
    source: Rc<RefCell<Option<EventSource>>>,
}

impl AnalysisApp {
    /// App for the current page, following its `taskId` parameter
    pub fn from_location() -> Option<Self> {
        let window = web_sys::window()?;
        let search = window.location().search().unwrap_or_default();
        Self::with_task_id(task_id_from_search(&search))
    }

    /// App for the current page following `task_id`
    pub fn with_task_id(task_id: Option<TaskId>) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let view = DomView::bind(&document, fallback_policy());

        Some(Self {
            view: Rc::new(RefCell::new(view)),
            session: Rc::new(RefCell::new(Session::new(task_id))),
            source: Rc::new(RefCell::new(None)),
        })
    }

    /// Bind the form and open the task stream
    pub fn initialize(&self) {
        self.bind_events();
        self.init_sse();
    }

    fn bind_events(&self) {
        let Some(form) = self.view.borrow().form().cloned() else {
            return;
        };

        let app = self.clone();
        let on_submit = Closure::wrap(Box::new(move |event: web_sys::Event| {
            event.prevent_default();
            app.submit_analysis();
        }) as Box<dyn FnMut(web_sys::Event)>);

        if let Err(e) =
            form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())
        {
            web_sys::console::error_1(&format!("Failed to bind analysis form: {:?}", e).into());
        }
        on_submit.forget();
    }

    /// Validate the form and navigate to the analysis page
    pub fn submit_analysis(&self) {
        let (symbol, market) = self.view.borrow().form_values();
        let path = form::submit_analysis(&symbol, &market, &mut *self.view.borrow_mut());

        if let Some(path) = path {
            navigate(&path);
        }
    }

    /// Open the event stream of the session's task, if there is one
    pub fn init_sse(&self) {
        let Some(task_id) = self.session.borrow_mut().subscribe() else {
            return;
        };

        let url = stream_path(&task_id);
        let source = match EventSource::new(&url) {
            Ok(source) => source,
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to open {}: {:?}", url, e).into());
                let dispatch = self
                    .session
                    .borrow_mut()
                    .handle_transport_error(&mut *self.view.borrow_mut());
                self.finish(dispatch);
                return;
            }
        };

        // On message
        let app = self.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(data) = event.data().as_string() else {
                return;
            };
            let dispatch = app
                .session
                .borrow_mut()
                .handle_payload(&data, &mut *app.view.borrow_mut());
            if let Dispatch::Malformed(e) = &dispatch {
                web_sys::console::error_1(&format!("Failed to parse stream message: {}", e).into());
            }
            app.finish(dispatch);
        }) as Box<dyn FnMut(MessageEvent)>);
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On error
        let app = self.clone();
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Task stream error: {:?}", e).into());
            let dispatch = app
                .session
                .borrow_mut()
                .handle_transport_error(&mut *app.view.borrow_mut());
            app.finish(dispatch);
        }) as Box<dyn FnMut(JsValue)>);
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        *self.source.borrow_mut() = Some(source);
    }

    /// Close the stream on a terminal dispatch and load the report
    fn finish(&self, dispatch: Dispatch) {
        if !dispatch.closes_stream() {
            return;
        }

        if let Some(source) = self.source.borrow_mut().take() {
            source.close();
        }

        if let Dispatch::Completed {
            document: Some(address),
        } = dispatch
        {
            let view = Rc::clone(&self.view);
            wasm_bindgen_futures::spawn_local(async move {
                let document = match api::fetch_document(&address).await {
                    Ok(markdown) => Document::Loaded(markdown),
                    Err(e) => {
                        web_sys::console::error_1(
                            &format!("Failed to load analysis {}: {}", address, e).into(),
                        );
                        Document::Unavailable
                    }
                };
                view.borrow_mut().show_document(&document);
            });
        }
    }
}

/// `taskId` of a `location.search` string; empty counts as absent
fn task_id_from_search(search: &str) -> Option<TaskId> {
    UrlSearchParams::new_with_str(search)
        .ok()?
        .get(TASK_ID_PARAM)
        .filter(|id| !id.is_empty())
        .map(TaskId::new)
}

fn navigate(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(path) {
            web_sys::console::error_1(&format!("Navigation to {} failed: {:?}", path, e).into());
        }
    }
}

/// Create a task for `symbol_market` and follow it on this page.
///
/// The page address is rewritten to carry the new `taskId` so a reload
/// rejoins the same stream. Returns whether a task was started.
pub async fn start_analysis(symbol_market: &str) -> Result<bool, String> {
    if symbol_market.is_empty() {
        return Ok(false);
    }

    let created = api::create_task(symbol_market).await?;
    let Some(task_id) = created.task_id() else {
        web_sys::console::error_1(&format!("No task id returned for {}", symbol_market).into());
        return Ok(false);
    };

    if let Some(window) = web_sys::window() {
        let pathname = window.location().pathname().unwrap_or_default();
        let url = page_path_with_task(&pathname, &task_id);
        let replaced = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(e) = replaced {
            let message = format!("Failed to update address to {}: {:?}", url, e);
            web_sys::console::error_1(&message.into());
        }
    }

    web_sys::console::log_1(&format!("Following task {}", task_id).into());
    let app = AnalysisApp::with_task_id(Some(task_id))
        .ok_or_else(|| "Analysis page unavailable".to_string())?;
    app.init_sse();
    Ok(true)
}

/// Expose [`start_analysis`] as `window.startAnalysis(symbolMarket)`,
/// returning a promise of whether a task was started
pub fn install_start_analysis(window: &web_sys::Window) {
    let start = Closure::wrap(Box::new(move |symbol_market: String| -> js_sys::Promise {
        wasm_bindgen_futures::future_to_promise(async move {
            start_analysis(&symbol_market)
                .await
                .map(JsValue::from_bool)
                .map_err(|e| JsValue::from_str(&e))
        })
    }) as Box<dyn FnMut(String) -> js_sys::Promise>);

    let installed = js_sys::Reflect::set(window, &JsValue::from_str("startAnalysis"), start.as_ref());
    if let Err(e) = installed {
        web_sys::console::error_1(&format!("Failed to install startAnalysis: {:?}", e).into());
    }
    start.forget();
}
