//! Request and response bodies of the Hardlink UI HTTP API.

use crate::job_monitor::types::null_as_default;
use crate::job_monitor::DuplicateGroup;
use serde::{Deserialize, Serialize};

/// Result of one poll of `/api/duplicates/results`
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job finished; the server returned its duplicate groups
    Completed(Vec<DuplicateGroup>),
    /// Job still running (HTTP 400 "Job not completed")
    NotReady(String),
    /// Job reported as failed
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStarted {
    #[serde(default)]
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkRequest<'a> {
    pub source: &'a str,
    pub dest: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubtreeRequest<'a> {
    pub source: &'a str,
    pub dest_root: &'a str,
}

/// Response of `/api/create-hardlink`. Error responses carry only `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `/api/create-hardlinks-folder`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub created: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertGroup {
    pub master: String,
    pub others: Vec<String>,
}

/// Body of `/api/duplicates/convert`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub groups: Vec<ConvertGroup>,
}

/// Response of `/api/duplicates/convert`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub bytes_saved: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error text for a failed response: the `error` field when present
pub fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.to_string()
    }
}
