//! Server config loader (strict parsing).

pub mod schema;

use std::fs;

use failrun_core::error::{FailRunError, Result};

pub use schema::{IdsSection, ServerConfig, ServerSection, SinkSection};

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FailRunError::Config(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| FailRunError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
