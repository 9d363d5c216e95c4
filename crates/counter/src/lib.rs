//! Top-level facade crate for counter.
//!
//! Re-exports the metric store and the server library so users can depend on a single crate.

pub mod core {
    pub use counter_core::*;
}

pub mod server {
    pub use counter_server::*;
}
