//! Sink runtime: the registry, per-sink lifecycle tasks, and the clock that
//! stamps their buckets.

pub mod clock;
mod lifecycle;
mod registry;

pub use clock::{Clock, MonotonicClock, SystemClock};
pub use lifecycle::{ExpiryReason, OnExpire, Phase, Sink, SinkHandle};
pub use registry::SinkRegistry;
