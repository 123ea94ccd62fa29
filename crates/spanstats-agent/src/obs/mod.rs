//! Agent-side observability: app measures and views, span collection, and
//! Prometheus text rendering of view data.

pub mod collector;
pub mod exposition;
pub mod measures;

pub use collector::{FinishedSpan, SpanCollector};
pub use measures::{register_metric_views, AppMeasures, LATENCY_BOUNDS_MS};
