//! Minimum-interval rate limiting.
//!
//! Unlike a token bucket, a spacer never allows bursts: two consecutive
//! [`RequestSpacer::acquire`] calls always complete at least `min_interval`
//! apart. Clones share state, so a single spacer injected into several clients
//! throttles all of them together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Shared, lock-protected minimum-spacing limiter.
#[derive(Debug, Clone)]
pub struct RequestSpacer {
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RequestSpacer {
    /// Create a spacer enforcing `min_interval` between requests.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_request: Arc::new(Mutex::new(None)) }
    }

    /// Configured spacing.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the spacing since the previous request has elapsed, then
    /// record the current instant as the latest request.
    ///
    /// The lock is held across the sleep so concurrent callers queue up in
    /// order instead of all waking at the same deadline.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limit: waiting before request");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Instant of the most recent request, if any.
    pub async fn last_request(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }
}

impl Default for RequestSpacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}
