//! Transport layer (HTTP).
//!
//! Exposes the sink handlers that sit between axum and the sink registry.

pub mod http;
