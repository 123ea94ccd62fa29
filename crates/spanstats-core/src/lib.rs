//! spanstats core: measures, views, aggregations, the recorder and trace config.
//!
//! This crate holds the registration and recording lifecycle shared by the
//! agent and tests. It carries no runtime or transport dependencies; sinks,
//! schedulers and the span collector live in `spanstats-agent`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `StatsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod stats;
pub mod telemetry;
pub mod trace;

/// Shared result type.
pub use error::{Result, StatsError};
pub use telemetry::Telemetry;
