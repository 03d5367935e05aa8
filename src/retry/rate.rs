use crate::retry::{Clock, DelayRange};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Enforces a minimum, jittered interval between completions of one operation
///
/// Each wrapped operation owns its own limiter; nothing is shared globally.
#[derive(Debug)]
pub struct RateLimiter {
    interval: DelayRange,
    last_completion: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: DelayRange) -> Self {
        Self {
            interval,
            last_completion: Mutex::new(None),
        }
    }

    /// Returns how long to wait before the next call, given a sampled interval
    ///
    /// Returns None if the operation never completed or the interval already elapsed.
    pub fn time_until_ready(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = (*self.last_completion.lock().ok()?)?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until a freshly sampled interval has passed since the last completion
    pub async fn pace(&self, clock: &dyn Clock) {
        let interval = self.interval.sample();
        if let Some(wait) = self.time_until_ready(interval, clock.now()) {
            tracing::trace!("Rate limit: waiting {:?}", wait);
            clock.sleep(wait).await;
        }
    }

    /// Records that the operation just completed
    pub fn record_completion(&self, now: Instant) {
        if let Ok(mut last) = self.last_completion.lock() {
            *last = Some(now);
        }
    }
}
