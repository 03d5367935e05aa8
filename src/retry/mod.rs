//! Retry, pacing and clock primitives
//!
//! This module handles:
//! - An injectable clock so waits can be observed in tests
//! - Per-operation rate limiting with a jittered minimum interval
//! - Bounded retries with a per-call-site choice between propagating the
//!   failure and returning a fallback value

mod clock;
mod policy;
mod rate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{DelayRange, OnExhausted, RetryPolicy};
pub use rate::RateLimiter;
