//! # Stockview
//!
//! Client for a stock chart analysis service. A task is created for a
//! `symbol.market` pair, its progress arrives over a server-sent-events
//! stream, and the finished task yields a daily chart, an hourly chart and a
//! markdown report.
//!
//! ## Modules
//!
//! - [`protocol`]: wire messages, SSE decoding and URL paths
//! - [`session`]: the one-shot subscription state machine and message dispatch
//! - [`view`]: the display contract every frontend implements
//! - [`form`]: analysis form validation and navigation
//! - [`markdown`]: report markup and the escaping policy
//! - [`client`]: native HTTP backend, app driver and terminal view
//!   (`client` feature)
//! - [`config`]: TOML configuration for the native client (`client` feature)
//!
//! The core modules have no platform dependencies; the browser frontend
//! (`stockview-ui`) uses them with default features disabled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stockview::client::{AnalysisApp, HttpBackend, TerminalView};
//! use stockview::protocol::TaskId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::new("http://localhost:8080", 30)?;
//!     let view = TerminalView::new(std::io::stdout());
//!
//!     let mut app = AnalysisApp::new(backend, view, Some(TaskId::new("NVDA_us_2024010215")));
//!     let state = app.run().await;
//!
//!     println!("stream finished: {:?}", state);
//!     Ok(())
//! }
//! ```

pub mod form;
pub mod markdown;
pub mod protocol;
pub mod session;
pub mod view;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod config;

pub use form::{submit_analysis, AnalysisTarget, FormError};
pub use markdown::{document_html, escape_html, markdown_to_html, FallbackPolicy, MarkdownRenderer};
pub use protocol::{
    AnalysisResult, ApiErrorBody, DecodeError, SseDecoder, SseEvent, StreamMessage, TaskCreated,
    TaskId,
};
pub use session::{CloseReason, Dispatch, Session, SubscriptionState};
pub use view::{AnalysisView, Document, ProgressUpdate, RecordingView, ViewEvent};

#[cfg(feature = "client")]
pub use client::{
    start_analysis, AnalysisApp, AnalysisBackend, ClientError, ClientResult, EventStream,
    HttpBackend, ReportFormat, TerminalView,
};

#[cfg(feature = "client")]
pub use config::{Config, ConfigError, LoggingConfig, RenderConfig, ServerConfig};
