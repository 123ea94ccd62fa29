//! Shared state for the ops endpoints.

use std::sync::Arc;

use spanstats_core::Telemetry;

use crate::obs::SpanCollector;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    telemetry: Telemetry,
    collector: Option<SpanCollector>,
}

impl AppState {
    pub fn new(telemetry: Telemetry, collector: Option<SpanCollector>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { telemetry, collector }),
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }

    /// Internal counters appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let mut extra = vec![(
            "spanstats_dropped_measurements",
            self.inner.telemetry.views().dropped_measurements(),
        )];
        if let Some(c) = &self.inner.collector {
            extra.push(("spanstats_pending_spans", c.pending() as u64));
            extra.push(("spanstats_dropped_spans", c.dropped_spans()));
        }
        extra
    }
}
