//! DOM View
//!
//! Element handles of the analysis page, resolved once by id. Every handle
//! is optional; updates to a missing element are skipped.

use stockview::markdown::{document_html, FallbackPolicy};
use stockview::protocol::AnalysisResult;
use stockview::view::{AnalysisView, Document, ProgressUpdate};
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlElement, HtmlFormElement, HtmlImageElement, HtmlInputElement, HtmlSelectElement,
};

use crate::markdown::MarkedRenderer;

/// A form field the user types or picks a value in
enum Field {
    Input(HtmlInputElement),
    Select(HtmlSelectElement),
}

impl Field {
    fn from_element(element: Element) -> Option<Self> {
        match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => Some(Field::Input(input)),
            Err(element) => element.dyn_into::<HtmlSelectElement>().ok().map(Field::Select),
        }
    }

    fn value(&self) -> String {
        match self {
            Field::Input(input) => input.value(),
            Field::Select(select) => select.value(),
        }
    }
}

/// [`AnalysisView`] over the page elements
pub struct DomView {
    form: Option<HtmlFormElement>,
    symbol: Option<Field>,
    market: Option<Field>,
    progress: Option<HtmlElement>,
    progress_text: Option<Element>,
    progress_fill: Option<HtmlElement>,
    result: Option<HtmlElement>,
    daily_chart: Option<HtmlImageElement>,
    hourly_chart: Option<HtmlImageElement>,
    analysis_content: Option<Element>,
    error: Option<HtmlElement>,
    error_message: Option<Element>,
    fallback: FallbackPolicy,
}

impl DomView {
    pub fn bind(document: &web_sys::Document, fallback: FallbackPolicy) -> Self {
        let element = |id: &str| document.get_element_by_id(id);
        let html = |id: &str| element(id).and_then(|e| e.dyn_into::<HtmlElement>().ok());
        let image = |id: &str| element(id).and_then(|e| e.dyn_into::<HtmlImageElement>().ok());

        Self {
            form: element("analysisForm").and_then(|e| e.dyn_into::<HtmlFormElement>().ok()),
            symbol: element("symbol").and_then(Field::from_element),
            market: element("market").and_then(Field::from_element),
            progress: html("progress"),
            progress_text: element("progressText"),
            progress_fill: html("progressFill"),
            result: html("result"),
            daily_chart: image("dailyChart"),
            hourly_chart: image("hourlyChart"),
            analysis_content: element("analysisContent"),
            error: html("error"),
            error_message: element("errorMessage"),
            fallback,
        }
    }

    pub fn form(&self) -> Option<&HtmlFormElement> {
        self.form.as_ref()
    }

    /// Current symbol and market values, empty when a field is missing
    pub fn form_values(&self) -> (String, String) {
        let value = |field: &Option<Field>| field.as_ref().map(Field::value).unwrap_or_default();
        (value(&self.symbol), value(&self.market))
    }
}

fn reveal(element: &Option<HtmlElement>) {
    if let Some(element) = element {
        set_style(element, "display", "block");
    }
}

fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = element.style().set_property(property, value) {
        web_sys::console::error_1(&format!("Failed to set {}: {:?}", property, e).into());
    }
}

fn set_text(element: &Option<Element>, text: &str) {
    if let Some(element) = element {
        element.set_text_content(Some(text));
    }
}

impl AnalysisView for DomView {
    fn show_progress(&mut self, update: &ProgressUpdate) {
        reveal(&self.progress);
        set_text(&self.progress_text, &update.message);

        if let (Some(fill), Some(width)) = (&self.progress_fill, &update.fill_width) {
            set_style(fill, "width", width);
        }
    }

    fn show_result(&mut self, result: &AnalysisResult) {
        reveal(&self.result);

        if let (Some(image), Some(src)) = (&self.daily_chart, result.daily_chart()) {
            image.set_src(src);
        }
        if let (Some(image), Some(src)) = (&self.hourly_chart, result.hourly_chart()) {
            image.set_src(src);
        }
    }

    fn show_document(&mut self, document: &Document) {
        if let Some(content) = &self.analysis_content {
            content.set_inner_html(&document_html(document, Some(&MarkedRenderer), self.fallback));
        }
    }

    fn show_error(&mut self, message: &str) {
        reveal(&self.error);
        set_text(&self.error_message, message);
    }

    fn alert(&mut self, message: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.alert_with_message(message) {
            web_sys::console::error_1(&format!("Failed to alert: {:?}", e).into());
        }
    }
}
