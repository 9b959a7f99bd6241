// Module declarations
mod cancel;
mod retry;
mod transport;
pub(crate) mod types;

pub use cancel::MonitorHandle;
pub use retry::{
    PollPolicy, BACKOFF_FACTOR, MAX_POLL_ATTEMPTS, MONITOR_DEADLINE, POLL_BASE_DELAY,
    POLL_MAX_DELAY,
};
pub use types::{DuplicateGroup, JobId, JobStatus, MonitorOutcome, ProgressSnapshot};

use crate::api::JobApi;
use crate::error::Result;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace};
use transport::{Step, Transport};

/// Follows server-side jobs to a terminal snapshot.
///
/// Progress arrives over the push subscription first. The first transport
/// failure closes it and switches to polling with backoff; the wall-clock
/// deadline of the [`PollPolicy`] pre-empts both. Every run keeps its own
/// transport and is cancelled through its own [`MonitorHandle`], so one
/// monitor can serve several runs.
pub struct JobMonitor<A> {
    api: A,
    policy: PollPolicy,
}

impl<A: JobApi> JobMonitor<A> {
    pub fn new(api: A) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Start a duplicate scan and monitor it to completion
    pub async fn start_and_monitor<F>(
        &self,
        handle: &MonitorHandle,
        on_progress: F,
    ) -> Result<(JobId, MonitorOutcome)>
    where
        F: FnMut(&ProgressSnapshot),
    {
        let job_id = self.api.start_job().await?;
        info!(component = "job-monitor", job_id = %job_id, "Scan started");

        let outcome = self.monitor(&job_id, handle, on_progress).await;
        Ok((job_id, outcome))
    }

    /// Follow `job_id` until it completes, fails, times out or is cancelled.
    ///
    /// `on_progress` receives intermediate snapshots in arrival order, then
    /// exactly one terminal snapshot (unless cancelled). Nothing is delivered
    /// after the terminal snapshot, and the subscription and poll timer are
    /// released before this returns. Cancelling `handle` ends this run only.
    pub async fn monitor<F>(
        &self,
        job_id: &JobId,
        handle: &MonitorHandle,
        mut on_progress: F,
    ) -> MonitorOutcome
    where
        F: FnMut(&ProgressSnapshot),
    {
        let deadline = Instant::now() + self.policy.deadline;
        let mut transport: Transport<A::Subscription> = Transport::Connecting;
        let mut tracker = ProgressTracker::default();

        debug!(
            component = "job-monitor",
            job_id = %job_id,
            deadline_secs = self.policy.deadline.as_secs(),
            "Monitoring job"
        );

        loop {
            let step = tokio::select! {
                biased;
                _ = handle.cancelled() => None,
                _ = time::sleep_until(deadline) => {
                    Some(Step::Terminal(ProgressSnapshot::timed_out(self.policy.deadline)))
                }
                step = transport.advance(&self.api, job_id, &self.policy) => Some(step),
            };

            match step {
                None => {
                    transport.release();
                    info!(component = "job-monitor", job_id = %job_id, "Monitoring cancelled");
                    return MonitorOutcome::Cancelled;
                }
                Some(Step::Progress(snapshot)) => {
                    if tracker.accept(&snapshot) {
                        trace!(
                            component = "job-monitor",
                            percent = snapshot.percent(),
                            processed = snapshot.processed,
                            total = snapshot.total,
                            "Progress"
                        );
                        on_progress(&snapshot);
                    }
                }
                Some(Step::Terminal(snapshot)) => {
                    let via_push = transport.is_push();
                    transport.release();
                    let snapshot = tracker.finish(snapshot);
                    log_terminal(job_id, &snapshot, via_push);
                    on_progress(&snapshot);
                    return MonitorOutcome::Finished(snapshot);
                }
                Some(Step::Fallback(reason)) => transport.fall_back_to_polling(job_id, &reason),
                Some(Step::Idle) => {}
            }
        }
    }
}

fn log_terminal(job_id: &JobId, snapshot: &ProgressSnapshot, via_push: bool) {
    let transport = if via_push { "push" } else { "poll" };
    match snapshot.failure_message() {
        None => info!(
            component = "job-monitor",
            job_id = %job_id,
            transport,
            groups = snapshot.results.len(),
            "Scan completed"
        ),
        Some(message) => error!(
            component = "job-monitor",
            job_id = %job_id,
            transport,
            error = message,
            "Scan failed"
        ),
    }
}

/// Keeps delivered progress monotonic within one run
#[derive(Debug, Default)]
struct ProgressTracker {
    processed: u64,
    total: u64,
    groups_found: u64,
}

impl ProgressTracker {
    /// Whether `snapshot` may be delivered; regressions are dropped
    fn accept(&mut self, snapshot: &ProgressSnapshot) -> bool {
        if snapshot.processed < self.processed {
            debug!(
                component = "job-monitor",
                seen = self.processed,
                got = snapshot.processed,
                "Dropping regressing progress snapshot"
            );
            return false;
        }
        self.processed = snapshot.processed;
        self.total = self.total.max(snapshot.total);
        self.groups_found = self.groups_found.max(snapshot.groups_found);
        true
    }

    /// Terminal snapshots from polling carry no counts; inherit the highest seen
    fn finish(&self, mut snapshot: ProgressSnapshot) -> ProgressSnapshot {
        snapshot.processed = snapshot.processed.max(self.processed);
        snapshot.total = snapshot.total.max(self.total);
        if snapshot.is_success() {
            snapshot.processed = snapshot.processed.max(snapshot.total);
            snapshot.groups_found = snapshot.groups_found.max(snapshot.results.len() as u64);
        } else {
            snapshot.groups_found = snapshot.groups_found.max(self.groups_found);
        }
        snapshot
    }
}
