use std::sync::{PoisonError, RwLock};

use super::sampler::Sampler;

/// Default cap on finished spans waiting for export.
pub const DEFAULT_MAX_BUFFERED_SPANS: usize = 1024;

/// Parameters applied to every span created after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceParams {
    pub sampler: Sampler,
    pub max_buffered_spans: usize,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            sampler: Sampler::default(),
            max_buffered_spans: DEFAULT_MAX_BUFFERED_SPANS,
        }
    }
}

/// Process-scoped trace configuration, owned by the telemetry context.
#[derive(Debug, Default)]
pub struct TraceConfig {
    active: RwLock<TraceParams>,
}

impl TraceConfig {
    pub fn new(params: TraceParams) -> Self {
        Self {
            active: RwLock::new(params),
        }
    }

    pub fn active_params(&self) -> TraceParams {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_active_params(&self, params: TraceParams) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = params;
        tracing::info!(sampler = %params.sampler.describe(), "trace params updated");
    }

    pub fn set_sampler(&self, sampler: Sampler) {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .sampler = sampler;
        tracing::info!(sampler = %sampler.describe(), "trace sampler updated");
    }

    pub fn sampler(&self) -> Sampler {
        self.active_params().sampler
    }
}
