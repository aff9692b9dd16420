//! Shared application state for the failrun server.

use std::sync::Arc;

use tokio::time::Duration;

use failrun_core::error::Result;
use failrun_core::IdSource;

use crate::config::ServerConfig;
use crate::obs::ServerMetrics;
use crate::sink::{Clock, SinkRegistry, SystemClock};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<SinkRegistry>,
    metrics: Arc<ServerMetrics>,
}

struct AppStateInner {
    cfg: ServerConfig,
    ids: IdSource,
}

impl AppState {
    /// Build application state stamping buckets with the system clock.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: ServerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(ServerMetrics::default());
        let registry = Arc::new(SinkRegistry::new(clock, Arc::clone(&metrics)));
        let ids = IdSource::new(cfg.ids.seed);

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, ids }),
            registry,
            metrics,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn ids(&self) -> &IdSource {
        &self.inner.ids
    }

    pub fn idle_timeout(&self) -> Duration {
        self.inner.cfg.sink.idle_timeout()
    }

    pub fn registry(&self) -> Arc<SinkRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Mark the server as draining (readiness turns 503).
    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    /// Point-in-time values rendered next to the counters on `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let sinks = u64::try_from(self.registry.len()).unwrap_or(u64::MAX);
        vec![("failrun_registry_sinks", sinks)]
    }
}
