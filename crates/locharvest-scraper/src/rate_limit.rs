//! Fixed inter-page delay.

use std::time::Duration;

/// Sleeps a constant duration between consecutive page requests of a run.
///
/// The caller decides when to wait; the harvest loop waits after each
/// page's checkpoint is written and never before the first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    delay: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Blocks the current task for the configured delay. A zero delay
    /// returns immediately.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        tracing::debug!(
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "pacing before next page"
        );
        tokio::time::sleep(self.delay).await;
    }
}
