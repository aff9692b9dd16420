//! Shared error type across failrun crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input (sink id, config value).
    BadRequest,
    /// The sink expired while the request was in flight.
    SinkExpired,
    /// The server no longer accepts new sinks.
    ShuttingDown,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::SinkExpired => "SINK_EXPIRED",
            ClientCode::ShuttingDown => "SHUTTING_DOWN",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FailRunError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum FailRunError {
    #[error("invalid sink id: {0}")]
    InvalidId(String),
    #[error("sink expired: {0}")]
    SinkExpired(String),
    #[error("registry is shutting down")]
    ShuttingDown,
    #[error("can't encode measurements: {0}")]
    Serialization(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl FailRunError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            FailRunError::InvalidId(_) | FailRunError::Config(_) => ClientCode::BadRequest,
            FailRunError::SinkExpired(_) => ClientCode::SinkExpired,
            FailRunError::ShuttingDown => ClientCode::ShuttingDown,
            FailRunError::Serialization(_) | FailRunError::Internal(_) => ClientCode::Internal,
        }
    }
}
