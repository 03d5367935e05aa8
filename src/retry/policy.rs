use crate::config::RetryConfig;
use crate::retry::Clock;
use crate::HarvestError;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// An inclusive range of delays; a fixed delay is a range with equal bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn from_millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Draws a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// What a call site wants once every attempt has failed
#[derive(Debug, Clone)]
pub enum OnExhausted<T> {
    /// Return `HarvestError::RetryExhausted`
    Propagate,
    /// Log the failure and return this value instead
    Fallback(T),
}

/// Bounded retry around a fallible async operation
///
/// The policy never decides between failing and falling back on its own;
/// each call site passes an [`OnExhausted`].
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: DelayRange,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: DelayRange, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_retries,
            delay,
            clock,
        }
    }

    pub fn from_config(config: &RetryConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.max_retries,
            DelayRange::from_millis(config.min_delay_ms, config.max_delay_ms),
            clock,
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runs `operation`, retrying failures up to `max_retries` times
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful attempt, or the fallback if requested
    /// * `Err(HarvestError::RetryExhausted)` - Every attempt failed and the
    ///   call site asked to propagate
    pub async fn run_with<T, F, Fut>(
        &self,
        name: &str,
        on_exhausted: OnExhausted<T>,
        operation: F,
    ) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        match self.attempt_all(name, operation).await {
            Ok(value) => Ok(value),
            Err((attempts, last_error)) => match on_exhausted {
                OnExhausted::Propagate => Err(HarvestError::RetryExhausted {
                    operation: name.to_string(),
                    attempts,
                    last_error: last_error.to_string(),
                }),
                OnExhausted::Fallback(value) => {
                    tracing::warn!("{} gave up after {} attempts, using fallback", name, attempts);
                    Ok(value)
                }
            },
        }
    }

    /// Runs `operation` and propagates `RetryExhausted` after the last attempt
    pub async fn run<T, F, Fut>(&self, name: &str, operation: F) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        self.run_with(name, OnExhausted::Propagate, operation).await
    }

    /// Runs `operation` and returns `fallback` after the last attempt
    pub async fn run_or<T, F, Fut>(&self, name: &str, fallback: T, operation: F) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        match self.attempt_all(name, operation).await {
            Ok(value) => value,
            Err((attempts, _)) => {
                tracing::warn!("{} gave up after {} attempts, using fallback", name, attempts);
                fallback
            }
        }
    }

    /// Calls `operation` until it succeeds or the attempts run out
    ///
    /// On exhaustion returns the attempt count and the last error.
    async fn attempt_all<T, F, Fut>(
        &self,
        name: &str,
        mut operation: F,
    ) -> Result<T, (u32, HarvestError)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}/{}", name, attempt, attempts);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!("{} failed (attempt {}/{}): {}", name, attempt, attempts, e);
                    if attempt >= attempts {
                        return Err((attempts, e));
                    }
                    self.clock.sleep(self.delay.sample()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32, clock: Arc<ManualClock>) -> RetryPolicy {
        RetryPolicy::new(
            max_retries,
            DelayRange::fixed(Duration::from_millis(100)),
            clock,
        )
    }

    fn transient() -> HarvestError {
        HarvestError::TransientFetch {
            url: "https://example.com/".to_string(),
            message: "timeout".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let clock = Arc::new(ManualClock::new());
        let calls = AtomicU32::new(0);

        let result = policy(3, clock.clone())
            .run("load", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, HarvestError>(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let clock = Arc::new(ManualClock::new());
        let calls = AtomicU32::new(0);

        let result = policy(3, clock.clone())
            .run("load", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("page")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_propagates() {
        let clock = Arc::new(ManualClock::new());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy(2, clock.clone())
            .run("load", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(HarvestError::RetryExhausted {
                operation,
                attempts,
                ..
            }) => {
                assert_eq!(operation, "load");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
        // No sleep after the final attempt
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_fallback() {
        let clock = Arc::new(ManualClock::new());

        let value = policy(1, clock.clone())
            .run_or("lookup", "SENTINEL", || async { Err(transient()) })
            .await;

        assert_eq!(value, "SENTINEL");
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let clock = Arc::new(ManualClock::new());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy(0, clock.clone())
            .run("load", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_range_sample_bounds() {
        let range = DelayRange::from_millis(200, 400);
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(400));
        }
    }

    #[test]
    fn test_delay_range_swaps_inverted_bounds() {
        let range = DelayRange::from_millis(900, 100);
        assert_eq!(range.min, Duration::from_millis(100));
        assert_eq!(range.max, Duration::from_millis(900));
    }
}
