//! Analysis Form
//!
//! Validation of the symbol/market form and the navigation it triggers.

use thiserror::Error;

use crate::protocol::analysis_page_path;
use crate::view::{AnalysisView, INCOMPLETE_FORM_TEXT};

/// Form validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Symbol or market left empty
    #[error("{}", INCOMPLETE_FORM_TEXT)]
    Incomplete,
}

/// A validated symbol/market pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTarget {
    pub symbol: String,
    pub market: String,
}

impl AnalysisTarget {
    /// Both fields must be non-empty. No other validation or trimming.
    pub fn from_form(symbol: &str, market: &str) -> Result<Self, FormError> {
        if symbol.is_empty() || market.is_empty() {
            return Err(FormError::Incomplete);
        }

        Ok(Self {
            symbol: symbol.to_string(),
            market: market.to_string(),
        })
    }

    /// Path of the analysis page for this target
    pub fn page_path(&self) -> String {
        analysis_page_path(&self.symbol, &self.market)
    }
}

/// Handle a form submission.
///
/// Returns the path to navigate to, or alerts through the view and returns
/// `None` when a field is missing.
pub fn submit_analysis<V: AnalysisView + ?Sized>(
    symbol: &str,
    market: &str,
    view: &mut V,
) -> Option<String> {
    match AnalysisTarget::from_form(symbol, market) {
        Ok(target) => Some(target.page_path()),
        Err(e) => {
            view.alert(&e.to_string());
            None
        }
    }
}
