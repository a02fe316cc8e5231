//! Message Types
//!
//! JSON bodies exchanged with the analysis server: progress messages pushed
//! over the task stream, the task creation response and the error body.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Opaque identifier of a server-side analysis task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message pushed over the task stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// The task is running
    Processing {
        /// Human readable step description
        message: String,
        /// Completion in percent, passed through without clamping
        percentage: Option<f64>,
    },
    /// The task finished; terminal
    Completed { result: Option<AnalysisResult> },
    /// The task failed; terminal
    Failed { error: Option<String> },
    /// Any other status (e.g. `pending`), or no status at all
    Unknown { status: Option<String> },
}

/// The statuses the client acts on
#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum KnownMessage {
    Processing {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, deserialize_with = "percentage")]
        percentage: Option<f64>,
    },
    Completed {
        #[serde(default)]
        result: Option<AnalysisResult>,
    },
    Failed {
        #[serde(default)]
        error: Option<String>,
    },
}

impl StreamMessage {
    /// Decode a stream payload.
    ///
    /// Only invalid JSON, or a known status whose fields have the wrong
    /// type, is an error. Valid JSON without a recognised status decodes to
    /// [`StreamMessage::Unknown`].
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(payload)?;

        let status = value.get("status").and_then(Value::as_str);
        match status {
            Some("processing") | Some("completed") | Some("failed") => {
                Ok(serde_json::from_value::<KnownMessage>(value)?.into())
            }
            other => Ok(StreamMessage::Unknown {
                status: other.map(str::to_string),
            }),
        }
    }

    /// Whether this message ends the subscription
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamMessage::Completed { .. } | StreamMessage::Failed { .. }
        )
    }
}

/// A percentage sent as a number or a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPercentage {
    Number(f64),
    Text(String),
}

/// Text that is not a number counts as no percentage
fn percentage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<RawPercentage>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPercentage::Number(value)) => Some(value),
        Some(RawPercentage::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

impl From<KnownMessage> for StreamMessage {
    fn from(msg: KnownMessage) -> Self {
        match msg {
            KnownMessage::Processing { message, percentage } => StreamMessage::Processing {
                message: message.unwrap_or_default(),
                percentage,
            },
            KnownMessage::Completed { result } => StreamMessage::Completed { result },
            KnownMessage::Failed { error } => StreamMessage::Failed { error },
        }
    }
}

/// Resources produced by a completed task
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub daily_chart: Option<String>,
    #[serde(default)]
    pub hourly_chart: Option<String>,
    /// Address of the markdown report
    #[serde(default)]
    pub analysis: Option<String>,
}

impl AnalysisResult {
    pub fn daily_chart(&self) -> Option<&str> {
        non_empty(&self.daily_chart)
    }

    pub fn hourly_chart(&self) -> Option<&str> {
        non_empty(&self.hourly_chart)
    }

    pub fn analysis(&self) -> Option<&str> {
        non_empty(&self.analysis)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Response of the task creation endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskCreated {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub estimated_completion: Option<String>,
    #[serde(default)]
    pub result_url: Option<String>,
}

impl TaskCreated {
    /// The created task, if the server returned a usable id
    pub fn task_id(&self) -> Option<TaskId> {
        non_empty(&self.task_id).map(TaskId::new)
    }
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Stream payload decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid stream payload: {0}")]
    Json(#[from] serde_json::Error),
}
