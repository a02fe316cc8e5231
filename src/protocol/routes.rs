//! URL Paths
//!
//! Paths of the analysis server and the `taskId` query parameter that ties a
//! page to its task stream.

use url::{form_urlencoded, ParseError, Url};

use super::messages::TaskId;

/// Query parameter naming the task a page follows
pub const TASK_ID_PARAM: &str = "taskId";

/// Page shown after submitting the form. Values are used verbatim.
pub fn analysis_page_path(symbol: &str, market: &str) -> String {
    format!("/analysis/{}.{}", symbol, market)
}

/// Task creation endpoint
pub fn create_task_path(symbol_market: &str) -> String {
    format!("/api/analysis/{}", symbol_market)
}

/// Event stream of a task
pub fn stream_path(task_id: &TaskId) -> String {
    format!("/api/stream/{}", task_id)
}

/// `path` with its query replaced by `?taskId=<id>`
pub fn page_path_with_task(path: &str, task_id: &TaskId) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    format!(
        "{}?{}={}",
        path,
        TASK_ID_PARAM,
        urlencoding::encode(task_id.as_str())
    )
}

/// Read the task id from a query string such as `location.search`.
///
/// Follows `URLSearchParams.get`: the first `taskId` pair wins, `+` is a
/// space, and percent escapes are decoded. An empty value means no task.
pub fn task_id_from_query(query: &str) -> Option<TaskId> {
    let query = query.strip_prefix('?').unwrap_or(query);
    first_task_id(form_urlencoded::parse(query.as_bytes()))
}

/// Origin that paths are resolved against when only the query matters
const RELATIVE_BASE: &str = "http://localhost/";

/// Read the task id from a full URL or a path relative to the page origin
pub fn task_id_from_url(url: &str) -> Option<TaskId> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).ok()?.join(url).ok()?
        }
        Err(_) => return None,
    };
    first_task_id(parsed.query_pairs())
}

fn first_task_id(mut pairs: form_urlencoded::Parse<'_>) -> Option<TaskId> {
    pairs
        .find(|(key, _)| key == TASK_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(TaskId::new)
}
