//! Type definitions for job monitoring.
//!
//! Defines the snapshot shapes the server streams and returns: JobId, JobStatus,
//! ProgressSnapshot, DuplicateGroup, and the MonitorOutcome handed to callers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque server-side job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One set of byte-identical files found by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Representative path that the others would be linked to
    #[serde(alias = "Master")]
    pub master: String,
    #[serde(default, alias = "Others", deserialize_with = "null_as_default")]
    pub others: Vec<String>,
    /// Size of one copy in bytes
    #[serde(default, alias = "Size")]
    pub size: u64,
}

impl DuplicateGroup {
    /// Bytes reclaimable by turning every duplicate into a hardlink
    pub fn wasted_bytes(&self) -> u64 {
        self.size.saturating_mul(self.others.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(alias = "Status")]
    pub status: JobStatus,
    #[serde(default, alias = "Processed")]
    pub processed: u64,
    #[serde(default, rename = "total_files", alias = "TotalFiles", alias = "total")]
    pub total: u64,
    #[serde(default, alias = "GroupsFound")]
    pub groups_found: u64,
    #[serde(
        default,
        alias = "Results",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub results: Vec<DuplicateGroup>,
    #[serde(default, alias = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressSnapshot {
    pub fn running(processed: u64, total: u64, groups_found: u64) -> Self {
        Self {
            status: JobStatus::Running,
            processed,
            total,
            groups_found,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn completed(results: Vec<DuplicateGroup>) -> Self {
        Self {
            status: JobStatus::Completed,
            processed: 0,
            total: 0,
            groups_found: results.len() as u64,
            results,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            processed: 0,
            total: 0,
            groups_found: 0,
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Synthetic failure delivered when the monitor deadline expires
    pub fn timed_out(deadline: Duration) -> Self {
        Self::failed(format!(
            "Timed out: job did not finish within {}s",
            deadline.as_secs()
        ))
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Failure message, if the job failed. The server sends `""` for none.
    pub fn failure_message(&self) -> Option<&str> {
        if self.status != JobStatus::Failed {
            return None;
        }
        match self.error.as_deref() {
            Some(msg) if !msg.is_empty() => Some(msg),
            _ => Some("Scan failed"),
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let processed = u128::from(self.processed.min(self.total));
        let total = u128::from(self.total);
        ((processed * 100 + total / 2) / total) as u8
    }
}

/// What a monitor run resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    /// Terminal snapshot (completed, failed or timed out), also delivered to the callback
    Finished(ProgressSnapshot),
    /// Cancelled through a [`super::MonitorHandle`]; nothing terminal was delivered
    Cancelled,
}

impl MonitorOutcome {
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            MonitorOutcome::Finished(snapshot) => Some(snapshot),
            MonitorOutcome::Cancelled => None,
        }
    }

    pub fn into_snapshot(self) -> Option<ProgressSnapshot> {
        match self {
            MonitorOutcome::Finished(snapshot) => Some(snapshot),
            MonitorOutcome::Cancelled => None,
        }
    }
}

// Empty lists may arrive as `null`
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
