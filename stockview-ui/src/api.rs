//! HTTP API Client
//!
//! Requests the page makes besides the event stream. Paths are relative to
//! the page origin.

use gloo_net::http::Request;
use stockview::protocol::{create_task_path, ApiErrorBody, TaskCreated};

/// Create an analysis task for `symbol_market`
pub async fn create_task(symbol_market: &str) -> Result<TaskCreated, String> {
    let response = Request::get(&create_task_path(symbol_market))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let status = response.status();
        return match response.json::<ApiErrorBody>().await {
            Ok(error) => Err(format!("{}: {}", error.code, error.message)),
            Err(_) => Err(format!("HTTP {}", status)),
        };
    }

    response
        .json()
        .await
        .map_err(|e| format!("Parse error: {}", e))
}

/// Download the markdown report at `address`
pub async fn fetch_document(address: &str) -> Result<String, String> {
    let response = Request::get(address)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    response
        .text()
        .await
        .map_err(|e| format!("Read error: {}", e))
}
