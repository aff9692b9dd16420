//! failrun core: transport-agnostic primitives shared by the server and tooling.
//!
//! This crate defines sink identifiers, per-second measurements, the bounded
//! measurement window, and the error surface. It intentionally carries no
//! transport or async runtime dependencies so the window logic can be tested
//! without timers.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `FailRunError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod id;
pub mod measure;

/// Shared result type.
pub use error::{FailRunError, Result};
pub use id::{IdSource, SinkId, ID_LEN};
pub use measure::{encode_snapshot, Measurement, MeasurementWindow};
