use tokio_util::sync::CancellationToken;

/// Cancels a running job monitor from outside
///
/// Usage:
/// ```no_run
/// use hardlink_client::api::HttpApi;
/// use hardlink_client::job_monitor::{JobId, JobMonitor, MonitorHandle};
///
/// # async fn example() -> hardlink_client::error::Result<()> {
/// let monitor = JobMonitor::new(HttpApi::new("http://localhost:8000")?);
/// let handle = MonitorHandle::new();
///
/// let ctrl_c = handle.clone();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     ctrl_c.cancel();
/// });
///
/// let outcome = monitor.monitor(&JobId::new("job-1"), &handle, |_| {}).await;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
///
/// A handle belongs to one run; once cancelled it stays cancelled, so each
/// run needs a fresh one.
#[derive(Debug, Clone, Default)]
pub struct MonitorHandle {
    token: CancellationToken,
}

impl MonitorHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Stop the monitor: the subscription is closed, pending waits are dropped
    /// and the progress callback is not invoked again
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
