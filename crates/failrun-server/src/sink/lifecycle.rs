//! One sink: its measurement window and the task that ages it.
//!
//! Each sink runs a tokio task that owns the idle deadline and the
//! one-second ticker. Callers only ever go through [`Sink::record_hit`];
//! the task and `record_hit` meet at the per-sink mutex, which is also where
//! expiry is serialized against in-flight hits.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use failrun_core::error::{FailRunError, Result};
use failrun_core::{Measurement, MeasurementWindow, SinkId};

use super::clock::Clock;

const TICK: Duration = Duration::from_secs(1);

/// Shared handle to a live (or just-expired) sink.
pub type SinkHandle = Arc<Sink>;

/// Invoked exactly once when the sink expires, with the sink lock held.
pub type OnExpire = Box<dyn FnOnce(&Sink, ExpiryReason) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Expiring,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// No hit within the idle timeout.
    Idle,
    /// The owning registry shut down.
    Shutdown,
}

impl ExpiryReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpiryReason::Idle => "idle",
            ExpiryReason::Shutdown => "shutdown",
        }
    }
}

struct SinkState {
    phase: Phase,
    window: MeasurementWindow,
}

pub struct Sink {
    id: SinkId,
    generation: u64,
    die_in: Duration,
    state: Mutex<SinkState>,
    // capacity 1: one pending reset is as good as many
    activity: mpsc::Sender<()>,
}

impl Sink {
    /// Create a sink with a single empty bucket for the current second and
    /// start its task. Must be called from within a tokio runtime.
    ///
    /// The window keeps `die_in` whole seconds of history. The sink expires
    /// after `die_in` without hits, or as soon as `stop` flips to `true`.
    pub fn spawn(
        id: SinkId,
        generation: u64,
        die_in: Duration,
        clock: Arc<dyn Clock>,
        stop: watch::Receiver<bool>,
        on_expire: OnExpire,
    ) -> SinkHandle {
        let started = Instant::now();
        let max_history = usize::try_from(die_in.as_secs()).unwrap_or(usize::MAX);
        let (activity, activity_rx) = mpsc::channel(1);

        let sink = Arc::new(Sink {
            id,
            generation,
            die_in,
            state: Mutex::new(SinkState {
                phase: Phase::Active,
                window: MeasurementWindow::new(clock.now_unix(), max_history),
            }),
            activity,
        });

        tokio::spawn(run(Arc::clone(&sink), activity_rx, clock, stop, on_expire, started));
        sink
    }

    pub fn id(&self) -> &SinkId {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn die_in(&self) -> Duration {
        self.die_in
    }

    /// Count a hit in the current second and return the whole window,
    /// oldest first.
    ///
    /// The idle-deadline reset is send-or-drop and never waits on the sink
    /// task. Fails with `SinkExpired` once expiry has started; nothing is
    /// counted in that case.
    pub async fn record_hit(&self) -> Result<Vec<Measurement>> {
        let _ = self.activity.try_send(());

        let mut state = self.state.lock().await;
        if state.phase != Phase::Active {
            return Err(FailRunError::SinkExpired(self.id.to_string()));
        }
        state.window.hit();
        Ok(state.window.snapshot())
    }

    /// Current window without counting a hit.
    pub async fn snapshot(&self) -> Vec<Measurement> {
        self.state.lock().await.window.snapshot()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    async fn expire(&self, reason: ExpiryReason, on_expire: OnExpire) {
        let mut state = self.state.lock().await;
        state.phase = Phase::Expiring;
        on_expire(self, reason);
        state.phase = Phase::Destroyed;
        tracing::debug!(sink = %self.id, reason = reason.as_str(), "sink expired");
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("id", &self.id.as_str())
            .field("generation", &self.generation)
            .field("die_in", &self.die_in)
            .finish()
    }
}

async fn run(
    sink: SinkHandle,
    mut activity: mpsc::Receiver<()>,
    clock: Arc<dyn Clock>,
    mut stop: watch::Receiver<bool>,
    on_expire: OnExpire,
    started: Instant,
) {
    let die_in = sink.die_in;
    let deadline = time::sleep_until(started + die_in);
    tokio::pin!(deadline);

    let mut ticker = time::interval_at(started + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = if *stop.borrow_and_update() {
        ExpiryReason::Shutdown
    } else {
        loop {
            tokio::select! {
                biased;

                // any change (or a dropped registry) means shut down
                _ = stop.changed() => break ExpiryReason::Shutdown,

                Some(()) = activity.recv() => {
                    deadline.as_mut().reset(Instant::now() + die_in);
                }

                () = &mut deadline => break ExpiryReason::Idle,

                _ = ticker.tick() => {
                    let now = clock.now_unix();
                    sink.state.lock().await.window.tick(now);
                }
            }
        }
    };

    sink.expire(reason, on_expire).await;
}
