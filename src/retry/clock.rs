use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of time and sleeping for everything that waits
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for the given duration
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant
    fn now(&self) -> Instant;
}

/// Wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock: sleeping advances time instantly and is recorded
///
/// Used by tests to run harvests and lookups without real delays and to
/// assert on the waits that were requested.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    inner: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            inner: Mutex::new(ManualState::default()),
        }
    }

    /// Moves virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut state) = self.inner.lock() {
            state.offset += duration;
        }
    }

    /// Returns every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner
            .lock()
            .map(|state| state.sleeps.clone())
            .unwrap_or_default()
    }

    /// Returns the sum of all requested sleeps
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.inner.lock() {
            state.offset += duration;
            state.sleeps.push(duration);
        }
    }

    fn now(&self) -> Instant {
        let offset = self
            .inner
            .lock()
            .map(|state| state.offset)
            .unwrap_or_default();
        self.start + offset
    }
}
