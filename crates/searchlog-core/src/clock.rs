//! Submission timestamps
//!
//! Timestamps are integer milliseconds since the Unix epoch. The unit is fixed
//! across every backend so that ordering comparisons between a submission and
//! the cached "latest" entry stay meaningful.

use tokio::time::Instant;

/// Source of submission timestamps (epoch milliseconds)
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc::now()`
///
/// Comparable across processes that share a cache, subject to their clock
/// skew.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Wall-clock anchor plus monotonic elapsed time
///
/// Never goes backwards within a process, and follows the tokio clock, so it
/// advances with `tokio::time::pause`/`advance` in tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_millis: i64,
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor_millis: chrono::Utc::now().timestamp_millis(),
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.anchor_millis.saturating_add(elapsed)
    }
}
