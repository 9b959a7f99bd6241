//! Push and poll transports behind one state machine.
//!
//! A monitor starts in `Connecting`, holds the push subscription in `Push`,
//! and moves to `Poll` at most once, on the first transport failure. `Closed`
//! is terminal; releasing is idempotent.

use super::retry::PollPolicy;
use super::types::{JobId, ProgressSnapshot};
use crate::api::{JobApi, PollOutcome, SseEvent};
use crate::error::Result;
use futures::{Stream, StreamExt};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// What one transport step produced
#[derive(Debug)]
pub(crate) enum Step {
    /// Intermediate snapshot
    Progress(ProgressSnapshot),
    /// Completed or failed snapshot; the run ends
    Terminal(ProgressSnapshot),
    /// Push transport failed; switch to polling
    Fallback(String),
    /// Nothing to deliver (ignored event, poll scheduled)
    Idle,
}

#[derive(Debug, Default)]
pub(crate) struct PollState {
    pub attempt: u32,
    pub next_at: Option<Instant>,
}

pub(crate) enum Transport<S> {
    Connecting,
    Push(S),
    Poll(PollState),
    Closed,
}

impl<S> Transport<S>
where
    S: Stream<Item = Result<SseEvent>> + Unpin,
{
    pub fn is_push(&self) -> bool {
        matches!(self, Transport::Push(_))
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, Transport::Poll(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Transport::Closed)
    }

    pub async fn advance<A>(&mut self, api: &A, job_id: &JobId, policy: &PollPolicy) -> Step
    where
        A: JobApi<Subscription = S>,
    {
        match self {
            Transport::Connecting => match api.subscribe(job_id).await {
                Ok(subscription) => {
                    debug!(component = "job-monitor", job_id = %job_id, "Progress subscription open");
                    *self = Transport::Push(subscription);
                    Step::Idle
                }
                Err(e) => Step::Fallback(format!("subscription failed: {}", e)),
            },
            Transport::Push(subscription) => match subscription.next().await {
                Some(Ok(event)) => interpret_event(event),
                Some(Err(e)) => Step::Fallback(format!("stream error: {}", e)),
                None => Step::Fallback("stream closed before the job finished".to_string()),
            },
            Transport::Poll(state) => poll_once(api, job_id, policy, state).await,
            // Nothing drives a closed transport; the monitor returns before this
            Transport::Closed => std::future::pending().await,
        }
    }

    /// Close the push subscription (if any) and start polling. Only the first
    /// call switches; later calls keep the poll state.
    pub fn fall_back_to_polling(&mut self, job_id: &JobId, reason: &str) {
        if self.is_polling() || self.is_closed() {
            return;
        }
        warn!(
            component = "job-monitor",
            job_id = %job_id,
            reason,
            "Push progress unavailable, switching to polling"
        );
        self.release();
        *self = Transport::Poll(PollState::default());
    }

    /// Drop the subscription and any scheduled poll. Returns whether anything
    /// was still held.
    pub fn release(&mut self) -> bool {
        match std::mem::replace(self, Transport::Closed) {
            Transport::Push(subscription) => {
                drop(subscription);
                trace!(component = "job-monitor", "Progress subscription closed");
                true
            }
            Transport::Poll(state) => {
                if state.next_at.is_some() {
                    trace!(component = "job-monitor", "Pending poll cancelled");
                }
                true
            }
            Transport::Connecting => true,
            Transport::Closed => false,
        }
    }
}

fn interpret_event(event: SseEvent) -> Step {
    match event.name() {
        "message" | "progress" => match serde_json::from_str::<ProgressSnapshot>(&event.data) {
            Ok(snapshot) if snapshot.is_terminal() => Step::Terminal(snapshot),
            Ok(snapshot) => Step::Progress(snapshot),
            Err(e) => {
                warn!(
                    component = "job-monitor",
                    error = %e,
                    bytes = event.data.len(),
                    "Skipping malformed progress payload"
                );
                Step::Idle
            }
        },
        "connected" => {
            trace!(component = "job-monitor", data = %event.data, "Progress stream confirmed");
            Step::Idle
        }
        "error" | "timeout" => Step::Fallback(format!(
            "server sent '{}' event: {}",
            event.name(),
            event.data
        )),
        other => {
            trace!(component = "job-monitor", event = other, "Ignoring unknown event");
            Step::Idle
        }
    }
}

async fn poll_once<A: JobApi>(
    api: &A,
    job_id: &JobId,
    policy: &PollPolicy,
    state: &mut PollState,
) -> Step {
    if let Some(at) = state.next_at.take() {
        time::sleep_until(at).await;
    }

    state.attempt += 1;
    trace!(
        component = "job-monitor",
        job_id = %job_id,
        attempt = state.attempt,
        max_attempts = policy.max_attempts,
        "Polling job result"
    );

    match api.poll_result(job_id).await {
        Ok(PollOutcome::Completed(results)) => {
            debug!(
                component = "job-monitor",
                attempts = state.attempt,
                "Polling succeeded"
            );
            Step::Terminal(ProgressSnapshot::completed(results))
        }
        Ok(PollOutcome::Failed(message)) => Step::Terminal(ProgressSnapshot::failed(message)),
        Ok(PollOutcome::NotReady(_)) => schedule_next(policy, state, "job not completed"),
        // Any request failure, 4xx included, waits out the same schedule
        Err(e) if state.attempt >= policy.max_attempts => {
            Step::Terminal(ProgressSnapshot::failed(format!(
                "Polling gave up after {} attempts: {}",
                state.attempt, e
            )))
        }
        Err(e) => {
            debug!(
                component = "job-monitor",
                attempt = state.attempt,
                error_type = ?e.error_type(),
                error = %e,
                "Poll request failed"
            );
            schedule_next(policy, state, &e.to_string())
        }
    }
}

fn schedule_next(policy: &PollPolicy, state: &mut PollState, reason: &str) -> Step {
    if state.attempt >= policy.max_attempts {
        return Step::Terminal(ProgressSnapshot::failed(format!(
            "Job still unresolved after {} poll attempts",
            state.attempt
        )));
    }

    let delay = policy.delay_after(state.attempt);
    state.next_at = Some(Instant::now() + delay);
    trace!(
        component = "job-monitor",
        attempt = state.attempt,
        delay_ms = delay.as_millis() as u64,
        reason,
        "Next poll scheduled"
    );
    Step::Idle
}
