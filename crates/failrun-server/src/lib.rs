//! failrun server library entry.
//!
//! Wires the sink registry, HTTP transport, config, and operational
//! endpoints into one axum application. It is consumed by the `failrund`
//! binary and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod sink;
pub mod transport;
