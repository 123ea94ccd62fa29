//! Explicit telemetry context.
//!
//! Bundles the measure registry, view manager, recorder and trace config so
//! callers pass one handle around instead of touching process globals.

use std::sync::Arc;

use crate::error::Result;
use crate::stats::{
    Aggregation, Measure, MeasureDouble, MeasureKind, MeasureLong, MeasureRegistry,
    StatsRecorder, TagKey, View, ViewManager,
};
use crate::trace::{TraceConfig, TraceParams};

#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    measures: MeasureRegistry,
    views: Arc<ViewManager>,
    recorder: StatsRecorder,
    trace: Arc<TraceConfig>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(TraceParams::default())
    }
}

impl Telemetry {
    pub fn new(params: TraceParams) -> Self {
        let views = Arc::new(ViewManager::new());
        Self {
            inner: Arc::new(TelemetryInner {
                measures: MeasureRegistry::new(),
                recorder: StatsRecorder::new(Arc::clone(&views)),
                views,
                trace: Arc::new(TraceConfig::new(params)),
            }),
        }
    }

    pub fn define_measure(
        &self,
        name: &str,
        description: &str,
        unit: &str,
        kind: MeasureKind,
    ) -> Result<Measure> {
        self.inner.measures.define_measure(name, description, unit, kind)
    }

    pub fn define_double(&self, name: &str, description: &str, unit: &str) -> Result<MeasureDouble> {
        self.inner.measures.define_double(name, description, unit)
    }

    pub fn define_long(&self, name: &str, description: &str, unit: &str) -> Result<MeasureLong> {
        self.inner.measures.define_long(name, description, unit)
    }

    pub fn register_view(
        &self,
        name: &str,
        description: &str,
        measure: &Measure,
        aggregation: Aggregation,
        tag_keys: Vec<TagKey>,
    ) -> Result<()> {
        self.inner
            .views
            .register_view(View::new(name, description, measure, aggregation, tag_keys))
    }

    pub fn measures(&self) -> &MeasureRegistry {
        &self.inner.measures
    }

    pub fn views(&self) -> &ViewManager {
        &self.inner.views
    }

    pub fn recorder(&self) -> &StatsRecorder {
        &self.inner.recorder
    }

    pub fn trace_config(&self) -> Arc<TraceConfig> {
        Arc::clone(&self.inner.trace)
    }
}
