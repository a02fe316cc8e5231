//! Terminal View
//!
//! Prints session updates line by line to any writer.

use std::io::Write;

use crate::markdown::{document_html, FallbackPolicy};
use crate::protocol::AnalysisResult;
use crate::view::{AnalysisView, Document, ProgressUpdate, DOCUMENT_UNAVAILABLE_TEXT};

/// How the report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Raw markdown as downloaded
    Markdown,
    /// HTML markup, as the browser content region would receive it
    Html(FallbackPolicy),
}

/// [`AnalysisView`] over a writer
pub struct TerminalView<W: Write> {
    out: W,
    format: ReportFormat,
    timestamps: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            format: ReportFormat::Markdown,
            timestamps: true,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let result = if self.timestamps {
            let now = chrono::Local::now().format("%H:%M:%S");
            writeln!(self.out, "[{}] {}", now, text)
        } else {
            writeln!(self.out, "{}", text)
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }

    fn block(&mut self, text: &str) {
        let result = writeln!(self.out, "{}", text).and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: Write> AnalysisView for TerminalView<W> {
    fn show_progress(&mut self, update: &ProgressUpdate) {
        match &update.fill_width {
            Some(width) => self.line(&format!("[{:>5}] {}", width, update.message)),
            None => self.line(&update.message),
        }
    }

    fn show_result(&mut self, result: &AnalysisResult) {
        self.line("Analysis completed");
        if let Some(chart) = result.daily_chart() {
            self.line(&format!("Daily chart:  {}", chart));
        }
        if let Some(chart) = result.hourly_chart() {
            self.line(&format!("Hourly chart: {}", chart));
        }
    }

    fn show_document(&mut self, document: &Document) {
        let text = match (self.format, document) {
            (ReportFormat::Markdown, Document::Loaded(markdown)) => markdown.clone(),
            (ReportFormat::Markdown, Document::Unavailable) => {
                DOCUMENT_UNAVAILABLE_TEXT.to_string()
            }
            (ReportFormat::Html(policy), document) => document_html(document, None, policy),
        };

        self.block("");
        self.block(&text);
    }

    fn show_error(&mut self, message: &str) {
        self.line(&format!("Error: {}", message));
    }

    fn alert(&mut self, message: &str) {
        self.block(message);
    }
}
