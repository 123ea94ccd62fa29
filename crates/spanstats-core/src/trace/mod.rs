//! Trace configuration: ids, sampler policy and active parameters.

pub mod config;
pub mod sampler;

pub use config::{TraceConfig, TraceParams};
pub use sampler::{Sampler, SpanId, TraceId};
