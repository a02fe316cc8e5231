//! Wire Protocol
//!
//! Everything the client exchanges with the analysis server:
//!
//! - **messages**: JSON bodies of the stream, task creation and error responses
//! - **sse**: incremental `text/event-stream` decoder
//! - **routes**: URL paths and the `taskId` query parameter

mod messages;
mod routes;
mod sse;

pub use messages::{AnalysisResult, ApiErrorBody, DecodeError, StreamMessage, TaskCreated, TaskId};
pub use routes::{
    analysis_page_path, create_task_path, page_path_with_task, stream_path, task_id_from_query,
    task_id_from_url, TASK_ID_PARAM,
};
pub use sse::{SseDecoder, SseEvent};
