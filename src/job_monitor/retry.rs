//! Poll backoff schedule for the polling transport.
//!
//! Attempt `n` (1-indexed) is followed by a wait of
//! `min(base * 1.5^(n-1), cap)` before attempt `n + 1`. The attempt cap is a
//! secondary bound behind the monitor's wall-clock deadline.

use std::time::Duration;

pub const POLL_BASE_DELAY: Duration = Duration::from_millis(2000);
pub const POLL_MAX_DELAY: Duration = Duration::from_millis(10_000);
pub const MAX_POLL_ATTEMPTS: u32 = 60;
pub const MONITOR_DEADLINE: Duration = Duration::from_secs(10 * 60);
pub const BACKOFF_FACTOR: f64 = 1.5;

/// Polling and deadline configuration for a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    /// Wall-clock bound from monitor start, pre-empting both transports
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            base_delay: POLL_BASE_DELAY,
            max_delay: POLL_MAX_DELAY,
            max_attempts: MAX_POLL_ATTEMPTS,
            deadline: MONITOR_DEADLINE,
        }
    }
}

impl PollPolicy {
    /// Delay to wait after `attempt` (1-indexed) before issuing the next one
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.base_delay.as_millis() as f64;
        let cap_ms = self.max_delay.as_millis() as f64;
        let delay_ms = base_ms * BACKOFF_FACTOR.powi(exponent);

        if !delay_ms.is_finite() || delay_ms >= cap_ms {
            return self.max_delay;
        }
        Duration::from_millis(delay_ms.round() as u64)
    }

    /// Sum of every wait the schedule can impose before giving up
    #[cfg(test)]
    pub fn worst_case_wait(&self) -> Duration {
        (1..self.max_attempts).map(|n| self.delay_after(n)).sum()
    }
}
