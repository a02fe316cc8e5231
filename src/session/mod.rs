//! Analysis Session
//!
//! One page load (or one CLI run) following one task stream. The session owns
//! the subscription state and turns stream payloads into view updates; the
//! frontend owns the transport and closes it whenever a [`Dispatch`] says so.
//!
//! ## Message handling
//!
//! | status       | view                         | subscription |
//! |--------------|------------------------------|--------------|
//! | `processing` | progress text and fill       | stays open   |
//! | `completed`  | charts, then the report      | closed       |
//! | `failed`     | error text or default        | closed       |
//! | other        | nothing                      | stays open   |
//! | malformed    | nothing (logged)             | stays open   |

mod state;

pub use state::{CloseReason, SubscriptionState};

use crate::protocol::{task_id_from_query, DecodeError, StreamMessage, TaskId};
use crate::view::{AnalysisView, ProgressUpdate, DEFAULT_FAILURE_TEXT, TRANSPORT_ERROR_TEXT};

/// What handling one stream event did
#[derive(Debug)]
pub enum Dispatch {
    /// Progress shown
    Progress,
    /// Result shown; the caller loads the report from `document` if present
    Completed { document: Option<String> },
    /// Error shown
    Failed { message: String },
    /// Status not handled; nothing shown
    Ignored { status: Option<String> },
    /// Payload could not be decoded; nothing shown
    Malformed(DecodeError),
    /// Transport failure shown
    TransportError,
    /// Arrived while not subscribed; dropped
    Discarded,
}

impl Dispatch {
    /// Whether the caller must close the stream now
    pub fn closes_stream(&self) -> bool {
        matches!(
            self,
            Dispatch::Completed { .. } | Dispatch::Failed { .. } | Dispatch::TransportError
        )
    }
}

/// State of one task subscription
#[derive(Debug, Default)]
pub struct Session {
    task_id: Option<TaskId>,
    state: SubscriptionState,
}

impl Session {
    pub fn new(task_id: Option<TaskId>) -> Self {
        Self {
            task_id,
            state: SubscriptionState::Idle,
        }
    }

    /// Session for the page whose query string is `query`
    pub fn from_query(query: &str) -> Self {
        Self::new(task_id_from_query(query))
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Start the subscription.
    ///
    /// Returns the task to stream, or `None` without any side effect when
    /// there is no task id or the session already subscribed once.
    pub fn subscribe(&mut self) -> Option<TaskId> {
        let task_id = self.task_id.clone()?;
        if !self.state.subscribe() {
            return None;
        }

        tracing::debug!(task_id = %task_id, "Subscribing to task stream");
        Some(task_id)
    }

    /// Handle one raw `data` payload
    pub fn handle_payload<V: AnalysisView + ?Sized>(
        &mut self,
        payload: &str,
        view: &mut V,
    ) -> Dispatch {
        if !self.state.is_subscribed() {
            return Dispatch::Discarded;
        }

        match StreamMessage::decode(payload) {
            Ok(message) => self.handle_message(message, view),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse stream message");
                Dispatch::Malformed(e)
            }
        }
    }

    /// Handle one decoded message
    pub fn handle_message<V: AnalysisView + ?Sized>(
        &mut self,
        message: StreamMessage,
        view: &mut V,
    ) -> Dispatch {
        if !self.state.is_subscribed() {
            return Dispatch::Discarded;
        }

        match message {
            StreamMessage::Processing { message, percentage } => {
                view.show_progress(&ProgressUpdate::new(message, percentage));
                Dispatch::Progress
            }
            StreamMessage::Completed { result } => {
                let result = result.unwrap_or_default();
                view.show_result(&result);
                self.state.close(CloseReason::Completed);
                Dispatch::Completed {
                    document: result.analysis().map(str::to_string),
                }
            }
            StreamMessage::Failed { error } => {
                let message = error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_TEXT.to_string());
                view.show_error(&message);
                self.state.close(CloseReason::Failed);
                Dispatch::Failed { message }
            }
            StreamMessage::Unknown { status } => {
                tracing::debug!(status = ?status, "Ignoring stream message");
                Dispatch::Ignored { status }
            }
        }
    }

    /// Handle a transport failure of the stream
    pub fn handle_transport_error<V: AnalysisView + ?Sized>(&mut self, view: &mut V) -> Dispatch {
        if !self.state.close(CloseReason::TransportError) {
            return Dispatch::Discarded;
        }

        view.show_error(TRANSPORT_ERROR_TEXT);
        Dispatch::TransportError
    }
}
