//! Wall-clock source used to stamp measurement buckets.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Current UTC time, truncated to whole seconds.
pub trait Clock: Send + Sync + 'static {
    fn now_unix(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        // Before 1970 only on a badly broken host; stamp 0 rather than fail.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// A fixed unix origin advanced by tokio's clock.
///
/// Under `tokio::time::pause` this moves exactly with the runtime's virtual
/// time, which keeps bucket timestamps deterministic in tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin_unix: i64,
    origin: Instant,
}

impl MonotonicClock {
    pub fn starting_at(origin_unix: i64) -> Self {
        Self {
            origin_unix,
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_unix(&self) -> i64 {
        let elapsed = Instant::now().duration_since(self.origin).as_secs();
        self.origin_unix
            .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }
}
