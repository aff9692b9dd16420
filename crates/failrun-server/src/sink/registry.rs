use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use failrun_core::error::{FailRunError, Result};
use failrun_core::{Measurement, SinkId};

use super::clock::Clock;
use super::lifecycle::{ExpiryReason, OnExpire, Sink, SinkHandle};
use crate::obs::ServerMetrics;

/// Sink registry: `sink_id -> SinkHandle`.
///
/// Entries are created on first reference and removed only by the sink's
/// own expiry callback. The table is a `DashMap`, so sinks in different
/// shards never contend, and each sink's window has its own lock.
pub struct SinkRegistry {
    sinks: Arc<DashMap<String, SinkHandle>>,
    clock: Arc<dyn Clock>,
    metrics: Arc<ServerMetrics>,
    stop: watch::Sender<bool>,
    next_generation: AtomicU64,
}

impl SinkRegistry {
    pub fn new(clock: Arc<dyn Clock>, metrics: Arc<ServerMetrics>) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            sinks: Arc::new(DashMap::new()),
            clock,
            metrics,
            stop,
            next_generation: AtomicU64::new(1),
        }
    }

    /// Return the live sink for `id`, creating it if there is none.
    ///
    /// The lookup and the insert happen under one shard lock, so concurrent
    /// callers for the same id always get the same sink. Over-long or
    /// malformed ids are rejected, never truncated.
    pub fn get_or_create(&self, id: &str, die_in: Duration) -> Result<SinkHandle> {
        let id = SinkId::parse(id)?;
        if self.is_shutting_down() {
            return Err(FailRunError::ShuttingDown);
        }

        let entry = self
            .sinks
            .entry(id.as_str().to_owned())
            .or_insert_with(|| self.spawn(id, die_in));
        Ok(Arc::clone(entry.value()))
    }

    /// Count a hit on `sink`, or on its replacement if it expired first.
    ///
    /// An expired sink removes itself from the table before it refuses a
    /// hit, so the single retry lands on a fresh sink with the same id and
    /// idle timeout.
    pub async fn record_hit(&self, sink: &Sink) -> Result<Vec<Measurement>> {
        match sink.record_hit().await {
            Err(FailRunError::SinkExpired(_)) => {
                tracing::debug!(sink = %sink.id(), "hit raced expiry, retrying on a fresh sink");
                self.get_or_create(sink.id().as_str(), sink.die_in())?
                    .record_hit()
                    .await
            }
            other => other,
        }
    }

    pub fn get(&self, id: &str) -> Option<SinkHandle> {
        self.sinks.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.stop.borrow()
    }

    /// Refuse new sinks and tell every live sink to expire.
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
        tracing::info!(live = self.sinks.len(), "sink registry shutting down");
    }

    /// Wait until every sink has removed itself, up to `within`.
    /// Returns whether the registry emptied in time.
    pub async fn drained(&self, within: Duration) -> bool {
        let give_up = Instant::now() + within;
        while !self.sinks.is_empty() {
            if Instant::now() >= give_up {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }

    fn spawn(&self, id: SinkId, die_in: Duration) -> SinkHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let sinks = Arc::downgrade(&self.sinks);
        let metrics = Arc::clone(&self.metrics);
        let on_expire: OnExpire = Box::new(move |sink: &Sink, reason: ExpiryReason| {
            if let Some(sinks) = sinks.upgrade() {
                // a successor under the same id is left alone
                sinks.remove_if(sink.id().as_str(), |_, live| {
                    live.generation() == sink.generation()
                });
            }
            metrics.sinks_expired.inc(&[("reason", reason.as_str())]);
            metrics.sinks_live.dec(&[]);
        });

        let sink = Sink::spawn(
            id,
            generation,
            die_in,
            Arc::clone(&self.clock),
            self.stop.subscribe(),
            on_expire,
        );

        self.metrics.sinks_created.inc(&[]);
        self.metrics.sinks_live.inc(&[]);
        tracing::debug!(sink = %sink.id(), generation, ?die_in, "sink created");
        sink
    }
}
