//! Stockview Analysis Page
//!
//! Browser frontend for the stock chart analysis service, compiled to
//! WebAssembly and loaded by the analysis page.
//!
//! # Features
//!
//! - Analysis form that navigates to `/analysis/{symbol}.{market}`
//! - Live progress from the task event stream named by `?taskId=`
//! - Daily and hourly charts plus the rendered markdown report
//! - `window.startAnalysis(symbolMarket)` to create a task from script
//!
//! # Architecture
//!
//! The page binds a [`dom::DomView`] to the server-rendered markup and feeds
//! it from a `stockview::Session` over a browser `EventSource`. All message
//! handling lives in the shared `stockview` crate.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::DocumentReadyState;

mod api;
mod app;
mod dom;
mod markdown;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    let Some(window) = web_sys::window() else {
        return;
    };
    app::install_start_analysis(&window);

    let Some(document) = window.document() else {
        return;
    };

    if document.ready_state() == DocumentReadyState::Loading {
        let on_ready = Closure::wrap(Box::new(move |_: web_sys::Event| {
            start_page();
        }) as Box<dyn FnMut(web_sys::Event)>);
        if let Err(e) = document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())
        {
            web_sys::console::error_1(&format!("Failed to wait for the page: {:?}", e).into());
        }
        on_ready.forget();
    } else {
        start_page();
    }
}

fn start_page() {
    match app::AnalysisApp::from_location() {
        Some(app) => app.initialize(),
        None => web_sys::console::error_1(&"Analysis page unavailable".into()),
    }
}
