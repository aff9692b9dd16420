//! Top-level facade crate for failrun.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use failrun_core::*;
}

pub mod server {
    pub use failrun_server::*;
}
