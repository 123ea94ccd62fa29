//! Measure definitions and the process-scoped measure registry.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::error::{Result, StatsError};

/// Numeric kind of a measure. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Double,
    Long,
}

#[derive(Debug, PartialEq, Eq)]
struct MeasureInner {
    name: String,
    description: String,
    unit: String,
    kind: MeasureKind,
}

/// A named, typed quantity that can be recorded. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    inner: Arc<MeasureInner>,
}

impl Measure {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    pub fn unit(&self) -> &str {
        &self.inner.unit
    }

    pub fn kind(&self) -> MeasureKind {
        self.inner.kind
    }
}

/// Measure recorded as `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureDouble(Measure);

/// Measure recorded as `i64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureLong(Measure);

impl MeasureDouble {
    pub fn measure(&self) -> &Measure {
        &self.0
    }
}

impl MeasureLong {
    pub fn measure(&self) -> &Measure {
        &self.0
    }
}

/// Holds every measure defined in this process. Names are unique.
#[derive(Default)]
pub struct MeasureRegistry {
    map: DashMap<String, Measure>,
}

impl MeasureRegistry {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Define a new measure. Fails with `DuplicateMeasure` if the name is taken.
    pub fn define_measure(
        &self,
        name: &str,
        description: &str,
        unit: &str,
        kind: MeasureKind,
    ) -> Result<Measure> {
        if name.is_empty() {
            return Err(StatsError::BadConfig("measure name must not be empty".into()));
        }
        match self.map.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StatsError::DuplicateMeasure(name.to_string())),
            Entry::Vacant(v) => {
                let m = Measure {
                    inner: Arc::new(MeasureInner {
                        name: name.to_string(),
                        description: description.to_string(),
                        unit: unit.to_string(),
                        kind,
                    }),
                };
                v.insert(m.clone());
                tracing::debug!(measure = %name, unit = %unit, ?kind, "measure defined");
                Ok(m)
            }
        }
    }

    pub fn define_double(&self, name: &str, description: &str, unit: &str) -> Result<MeasureDouble> {
        self.define_measure(name, description, unit, MeasureKind::Double)
            .map(MeasureDouble)
    }

    pub fn define_long(&self, name: &str, description: &str, unit: &str) -> Result<MeasureLong> {
        self.define_measure(name, description, unit, MeasureKind::Long)
            .map(MeasureLong)
    }

    pub fn get(&self, name: &str) -> Option<Measure> {
        self.map.get(name).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
