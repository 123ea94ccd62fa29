use std::fmt;

use serde::Serialize;

use crate::error::{Result, StatsError};

/// 128-bit trace identifier, rendered as 32 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct TraceId(pub u128);

/// 64-bit span identifier, rendered as 16 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct SpanId(pub u64);

impl TraceId {
    /// Random, never zero.
    pub fn random() -> Self {
        loop {
            let v: u128 = rand::random();
            if v != 0 {
                return Self(v);
            }
        }
    }

    /// Low 64 bits, used for ratio sampling.
    pub fn low_u64(self) -> u64 {
        self.0 as u64
    }
}

impl SpanId {
    /// Random, never zero.
    pub fn random() -> Self {
        loop {
            let v: u64 = rand::random();
            if v != 0 {
                return Self(v);
            }
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<TraceId> for String {
    fn from(id: TraceId) -> Self {
        id.to_string()
    }
}

impl From<SpanId> for String {
    fn from(id: SpanId) -> Self {
        id.to_string()
    }
}

/// Decides whether a new trace is recorded.
///
/// `AlwaysSample` is meant for demos and tests; under real traffic prefer a
/// `Probability` sampler to bound overhead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    AlwaysSample,
    NeverSample,
    /// Samples roughly this fraction of root traces. Children follow the parent.
    Probability(f64),
}

/// Ratio used when nothing else is configured.
pub const DEFAULT_PROBABILITY: f64 = 1e-4;

impl Default for Sampler {
    fn default() -> Self {
        Sampler::Probability(DEFAULT_PROBABILITY)
    }
}

impl Sampler {
    pub fn probability(ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(StatsError::BadConfig(format!(
                "sampler probability must be within 0..=1, got {ratio}"
            )));
        }
        Ok(Sampler::Probability(ratio))
    }

    /// `parent_sampled` is `None` for root spans.
    pub fn should_sample(&self, parent_sampled: Option<bool>, trace_id: TraceId) -> bool {
        match *self {
            Sampler::AlwaysSample => true,
            Sampler::NeverSample => false,
            Sampler::Probability(p) => {
                if parent_sampled == Some(true) {
                    return true;
                }
                if p >= 1.0 {
                    return true;
                }
                if p <= 0.0 {
                    return false;
                }
                let bound = (p * u64::MAX as f64) as u64;
                trace_id.low_u64() < bound
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Sampler::AlwaysSample => "always".into(),
            Sampler::NeverSample => "never".into(),
            Sampler::Probability(p) => format!("probability({p})"),
        }
    }
}
