//! Analysis App
//!
//! Drives one [`Session`] from an [`AnalysisBackend`] into an
//! [`AnalysisView`]: opens the task stream, dispatches its events in order,
//! closes it on the first terminal outcome and loads the report.

use futures_util::StreamExt;

use super::backend::AnalysisBackend;
use super::error::ClientResult;
use crate::form;
use crate::protocol::{task_id_from_url, TaskId};
use crate::session::{Dispatch, Session, SubscriptionState};
use crate::view::{AnalysisView, Document};

/// One task subscription bound to a backend and a view
pub struct AnalysisApp<B, V> {
    backend: B,
    view: V,
    session: Session,
}

impl<B: AnalysisBackend, V: AnalysisView> AnalysisApp<B, V> {
    pub fn new(backend: B, view: V, task_id: Option<TaskId>) -> Self {
        Self {
            backend,
            view,
            session: Session::new(task_id),
        }
    }

    /// App for the page at `page_url`, following its `taskId` parameter
    pub fn from_page_url(backend: B, view: V, page_url: &str) -> Self {
        Self::new(backend, view, task_id_from_url(page_url))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Validate the form values; returns the page path to navigate to
    pub fn submit_analysis(&mut self, symbol: &str, market: &str) -> Option<String> {
        form::submit_analysis(symbol, market, &mut self.view)
    }

    /// Follow the task stream until it closes.
    ///
    /// Without a task id this returns [`SubscriptionState::Idle`] and
    /// touches nothing. Otherwise the result is the closed state.
    pub async fn run(&mut self) -> SubscriptionState {
        let Some(task_id) = self.session.subscribe() else {
            tracing::debug!("No task id, not subscribing");
            return self.session.state();
        };

        let mut events = match self.backend.open_stream(&task_id).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Failed to open task stream");
                self.session.handle_transport_error(&mut self.view);
                return self.session.state();
            }
        };

        let mut document = None;
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(task_id = %task_id, error = %e, "Task stream failed");
                    self.session.handle_transport_error(&mut self.view);
                    break;
                }
            };

            if !event.is_message() {
                tracing::debug!(event = ?event.event, "Skipping named event");
                continue;
            }

            let dispatch = self.session.handle_payload(&event.data, &mut self.view);
            if dispatch.closes_stream() {
                if let Dispatch::Completed { document: address } = dispatch {
                    document = address;
                }
                break;
            }
        }

        if self.session.state().is_subscribed() {
            tracing::warn!(task_id = %task_id, "Task stream ended without a final status");
            self.session.handle_transport_error(&mut self.view);
        }
        drop(events);

        if let Some(address) = document {
            self.load_document(&address).await;
        }

        self.session.state()
    }

    async fn load_document(&mut self, address: &str) {
        let document = match self.backend.fetch_document(address).await {
            Ok(markdown) => Document::Loaded(markdown),
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Failed to load analysis");
                Document::Unavailable
            }
        };

        self.view.show_document(&document);
    }
}

/// Create a task for `symbol_market` and bind a new app to it.
///
/// The app follows the task id returned by the server. Returns `Ok(None)`
/// for empty input or a response without a task id.
pub async fn start_analysis<B: AnalysisBackend, V: AnalysisView>(
    backend: B,
    view: V,
    symbol_market: &str,
) -> ClientResult<Option<AnalysisApp<B, V>>> {
    if symbol_market.is_empty() {
        return Ok(None);
    }

    let created = backend.create_task(symbol_market).await?;
    let Some(task_id) = created.task_id() else {
        tracing::warn!(symbol_market = %symbol_market, "Task creation returned no task id");
        return Ok(None);
    };

    tracing::info!(
        task_id = %task_id,
        estimated_completion = ?created.estimated_completion,
        "Analysis task created"
    );

    Ok(Some(AnalysisApp::new(backend, view, Some(task_id))))
}
