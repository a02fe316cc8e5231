//! Native Client
//!
//! Follows analysis tasks from a terminal.
//!
//! ## Architecture
//!
//! - **AnalysisBackend**: the three server calls (create task, open stream,
//!   fetch report), implemented over reqwest by [`HttpBackend`]
//! - **AnalysisApp**: drives a [`Session`](crate::session::Session) from a
//!   backend into a view
//! - **TerminalView**: prints progress, results and the report

mod app;
mod backend;
mod error;
mod terminal;

pub use app::{start_analysis, AnalysisApp};
pub use backend::{sse_events, AnalysisBackend, EventStream, HttpBackend};
pub use error::{ClientError, ClientResult};
pub use terminal::{ReportFormat, TerminalView};
