//! Analysis Server Backend
//!
//! HTTP client for the three calls the app makes: task creation, the task
//! event stream and the report download.

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use super::error::{ClientError, ClientResult};
use crate::protocol::{
    create_task_path, stream_path, ApiErrorBody, SseDecoder, SseEvent, TaskCreated, TaskId,
};

/// Decoded events of one task stream, in server order
pub type EventStream = Pin<Box<dyn Stream<Item = ClientResult<SseEvent>> + Send>>;

/// Server calls used by [`AnalysisApp`](super::AnalysisApp)
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// `GET /api/analysis/{symbolMarket}`
    async fn create_task(&self, symbol_market: &str) -> ClientResult<TaskCreated>;

    /// `GET /api/stream/{taskId}` as a stream of SSE events
    async fn open_stream(&self, task_id: &TaskId) -> ClientResult<EventStream>;

    /// Download the markdown report at `address`
    async fn fetch_document(&self, address: &str) -> ClientResult<String>;
}

/// reqwest implementation of [`AnalysisBackend`]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpBackend {
    /// Create a backend for the server at `base_url`.
    ///
    /// `request_timeout_secs` bounds task creation and report download. The
    /// event stream is never timed out.
    pub fn new(base_url: &str, request_timeout_secs: u64) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Resolve a path or address against the base URL
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn create_task(&self, symbol_market: &str) -> ClientResult<TaskCreated> {
        let url = self.url(&create_task_path(symbol_market))?;
        tracing::debug!(url = %url, "Creating analysis task");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(ClientError::from_reqwest);
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => Err(ClientError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            }),
            Err(_) => Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }

    async fn open_stream(&self, task_id: &TaskId) -> ClientResult<EventStream> {
        let url = self.url(&stream_path(task_id))?;
        tracing::debug!(url = %url, "Opening task stream");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(sse_events(response.bytes_stream()))
    }

    async fn fetch_document(&self, address: &str) -> ClientResult<String> {
        let url = self.url(address)?;
        tracing::debug!(url = %url, "Loading analysis report");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(ClientError::from_reqwest)
    }
}

struct SseState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    done: bool,
}

/// Decode a body byte stream into SSE events.
///
/// A body error is yielded once and ends the stream.
pub fn sse_events<S, B>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(ClientError::from_reqwest(e)), state));
                }
                None => return None,
            }
        }
    }))
}
