//! View Contract
//!
//! What a frontend must be able to display. The browser implements it over
//! DOM handles, the CLI over a terminal writer.

use crate::protocol::AnalysisResult;

/// Shown when the stream transport fails
pub const TRANSPORT_ERROR_TEXT: &str = "连接失败，请刷新页面重试";

/// Shown when a task fails without an error text
pub const DEFAULT_FAILURE_TEXT: &str = "分析失败";

/// Alert for a form submitted with a missing field
pub const INCOMPLETE_FORM_TEXT: &str = "请填写完整的股票代码和市场信息";

/// Shown in place of a report that could not be loaded
pub const DOCUMENT_UNAVAILABLE_TEXT: &str = "分析内容加载失败";

/// Progress region update
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub message: String,
    /// CSS width of the fill element, `None` leaves it unchanged
    pub fill_width: Option<String>,
}

impl ProgressUpdate {
    pub fn new(message: impl Into<String>, percentage: Option<f64>) -> Self {
        Self {
            message: message.into(),
            fill_width: percentage.map(fill_width),
        }
    }
}

/// Fill width for a percentage. Out-of-range values pass through.
pub fn fill_width(percentage: f64) -> String {
    format!("{}%", percentage)
}

/// Outcome of loading the markdown report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Loaded(String),
    Unavailable,
}

/// Display surface driven by a [`Session`](crate::session::Session)
pub trait AnalysisView {
    /// Reveal the progress region and update text and fill
    fn show_progress(&mut self, update: &ProgressUpdate);

    /// Reveal the result region and set the chart sources that are present
    fn show_result(&mut self, result: &AnalysisResult);

    /// Fill the report region
    fn show_document(&mut self, document: &Document);

    /// Reveal the error region with a message
    fn show_error(&mut self, message: &str);

    /// Blocking notice for invalid input
    fn alert(&mut self, message: &str);
}

/// A recorded view operation
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Progress(ProgressUpdate),
    Result(AnalysisResult),
    Document(Document),
    Error(String),
    Alert(String),
}

/// View that records every operation, for headless runs and tests
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Most recent error message, if any
    pub fn last_error(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Error(message) => Some(message.as_str()),
            _ => None,
        })
    }
}

impl AnalysisView for RecordingView {
    fn show_progress(&mut self, update: &ProgressUpdate) {
        self.events.push(ViewEvent::Progress(update.clone()));
    }

    fn show_result(&mut self, result: &AnalysisResult) {
        self.events.push(ViewEvent::Result(result.clone()));
    }

    fn show_document(&mut self, document: &Document) {
        self.events.push(ViewEvent::Document(document.clone()));
    }

    fn show_error(&mut self, message: &str) {
        self.events.push(ViewEvent::Error(message.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(ViewEvent::Alert(message.to_string()));
    }
}
