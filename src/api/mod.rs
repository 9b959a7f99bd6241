//! Remote collaborators of the monitor and executor.
//!
//! `JobApi` covers job submission, the push subscription and polling;
//! `LinkApi` covers the link operations. `HttpApi` implements both against the
//! Hardlink UI server; tests substitute in-memory fakes.

mod http;
mod sse;
mod types;

pub use http::HttpApi;
pub use sse::{SseDecoder, SseEvent, SseStream};
pub use types::{
    error_message, ConvertGroup, ConvertRequest, ConvertResponse, JobResults, JobStarted,
    LinkResponse, PollOutcome, SubtreeResponse,
};

use crate::error::Result;
use crate::job_monitor::JobId;
use futures::Stream;
use std::future::Future;

/// Job submission and progress transports
pub trait JobApi {
    /// Push subscription; an `Err` item or end of stream is a transport failure
    type Subscription: Stream<Item = Result<SseEvent>> + Unpin;

    fn start_job(&self) -> impl Future<Output = Result<JobId>>;

    fn subscribe(&self, job_id: &JobId) -> impl Future<Output = Result<Self::Subscription>>;

    fn poll_result(&self, job_id: &JobId) -> impl Future<Output = Result<PollOutcome>>;
}

/// Remote link operations
pub trait LinkApi {
    fn link(&self, source: &str, dest: &str) -> impl Future<Output = Result<LinkResponse>>;

    fn link_subtree(
        &self,
        source_root: &str,
        dest_root: &str,
    ) -> impl Future<Output = Result<SubtreeResponse>>;

    fn convert(&self, request: &ConvertRequest) -> impl Future<Output = Result<ConvertResponse>>;
}
