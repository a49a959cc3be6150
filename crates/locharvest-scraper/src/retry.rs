//! Fixed-wait retry policy for page fetches.
//!
//! A failed request is attempted again after a constant wait, up to a fixed
//! number of total attempts. There is no backoff growth and no jitter: the
//! default is a single extra attempt one second later.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` may succeed on a fresh attempt.
///
/// Retriable: transport failures, non-2xx statuses, bodies that are not JSON
/// and bodies missing the `scrapingResult.locals` envelope (the API
/// occasionally returns an error document in place of a result).
///
/// Not retriable: [`ScraperError::InvalidBaseUrl`], which is a configuration
/// mistake and fails identically every time.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::Deserialize { .. }
            | ScraperError::MissingEnvelope { .. }
    )
}

/// How many times a page request is attempted and how long to wait between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl Default for RetryPolicy {
    /// One retry after a one-second wait.
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; values below 1 are raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Runs `operation` until it succeeds, fails with a non-retriable error,
    /// or `max_attempts` is used up. The last error is returned on failure.
    pub(crate) async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retriable(&err) || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = u64::try_from(self.wait.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "page request failed, retrying after fixed wait"
                    );
                }
            }
            if !self.wait.is_zero() {
                tokio::time::sleep(self.wait).await;
            }
            attempt += 1;
        }
    }
}
