use std::sync::Arc;

use super::manager::ViewManager;
use super::measure::{Measure, MeasureDouble, MeasureLong};
use super::tags::{TagKey, TagMap};

/// Entry point for recording measurements.
#[derive(Clone)]
pub struct StatsRecorder {
    manager: Arc<ViewManager>,
}

impl StatsRecorder {
    pub fn new(manager: Arc<ViewManager>) -> Self {
        Self { manager }
    }

    /// Start a transient measure map. Nothing is recorded until `record()`.
    pub fn new_measure_map(&self) -> MeasureMap<'_> {
        MeasureMap {
            manager: &self.manager,
            values: Vec::new(),
            tags: TagMap::new(),
        }
    }
}

/// A batch of measure values recorded together under one tag map.
#[must_use = "a measure map records nothing until `record()` is called"]
pub struct MeasureMap<'a> {
    manager: &'a ViewManager,
    values: Vec<(Measure, f64)>,
    tags: TagMap,
}

impl<'a> MeasureMap<'a> {
    pub fn put_double(mut self, measure: &MeasureDouble, value: f64) -> Self {
        self.values.push((measure.measure().clone(), value));
        self
    }

    pub fn put_long(mut self, measure: &MeasureLong, value: i64) -> Self {
        self.values.push((measure.measure().clone(), value as f64));
        self
    }

    pub fn with_tag(mut self, key: &TagKey, value: impl Into<String>) -> Self {
        self.tags.insert(key.clone(), value);
        self
    }

    /// Fold every value into the live views. Never fails.
    ///
    /// Returns false when the whole map was rejected because a value was
    /// negative or not finite; nothing from the map is recorded then.
    pub fn record(self) -> bool {
        if let Some((m, v)) = self.values.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            tracing::warn!(measure = %m.name(), value = %v, "invalid measurement; map dropped");
            return false;
        }
        self.manager.record(&self.values, &self.tags);
        true
    }
}
