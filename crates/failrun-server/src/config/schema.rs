use std::time::Duration;

use serde::Deserialize;
use failrun_core::error::{FailRunError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub sink: SinkSection,

    #[serde(default)]
    pub ids: IdsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            sink: SinkSection::default(),
            ids: IdsSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FailRunError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.sink.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory served for every path that is not a sink route.
    #[serde(default = "default_assets")]
    pub assets: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            assets: default_assets(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(FailRunError::Config(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        if self.assets.is_empty() {
            return Err(FailRunError::Config("server.assets must not be empty".into()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_assets() -> String {
    "web/".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSection {
    /// Idle time before a sink is destroyed; also the history length in seconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl SinkSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=3_600_000).contains(&self.idle_timeout_ms) {
            return Err(FailRunError::Config(
                "sink.idle_timeout_ms must be between 1000 and 3600000".into(),
            ));
        }
        if self.idle_timeout_ms % 1000 != 0 {
            return Err(FailRunError::Config(
                "sink.idle_timeout_ms must be a whole number of seconds".into(),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

fn default_idle_timeout_ms() -> u64 {
    30000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdsSection {
    /// Fixed seed for the id generator; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}
