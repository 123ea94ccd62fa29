//! Top-level facade crate for spanstats.
//!
//! Re-exports the stats/trace core and the agent library so users can depend on a single crate.

pub mod core {
    pub use spanstats_core::*;
}

pub mod agent {
    pub use spanstats_agent::*;
}
