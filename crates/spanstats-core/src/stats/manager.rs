//! View manager: owns registered views and their aggregation buffers.
//!
//! Rows live in a `DashMap` keyed by the ordered tag values of the view.
//! Writers (record calls) and readers (exporter snapshots) go through the
//! shard locks, so a snapshot never observes a half-updated row.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::clock::now_unix_ms;
use crate::error::{Result, StatsError};

use super::aggregation::AggregationData;
use super::tags::TagMap;
use super::view::{View, ViewData, ViewRow};
use super::measure::Measure;

struct RegisteredView {
    view: View,
    start_unix_ms: u64,
    rows: DashMap<Vec<String>, AggregationData>,
}

impl RegisteredView {
    fn add(&self, tags: &TagMap, value: f64) {
        let key = tags.values_for(&self.view.tag_keys);
        self.rows
            .entry(key)
            .or_insert_with(|| self.view.aggregation.new_data())
            .add(value);
    }

    fn data(&self) -> ViewData {
        let mut rows: Vec<ViewRow> = self
            .rows
            .iter()
            .map(|r| ViewRow {
                tag_values: r.key().clone(),
                data: r.value().clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.tag_values.cmp(&b.tag_values));

        ViewData {
            view: self.view.name.clone(),
            description: self.view.description.clone(),
            measure: self.view.measure.name().to_string(),
            unit: self.view.measure.unit().to_string(),
            aggregation: self.view.aggregation.kind_str(),
            tag_keys: self.view.tag_keys.clone(),
            rows,
            start_unix_ms: self.start_unix_ms,
            end_unix_ms: now_unix_ms(),
        }
    }
}

/// Registry of live views.
///
/// Values recorded against a measure with no registered view are dropped and
/// counted in [`ViewManager::dropped_measurements`]. They are not buffered or
/// replayed into views registered later.
#[derive(Default)]
pub struct ViewManager {
    views: DashMap<String, Arc<RegisteredView>>,
    by_measure: DashMap<String, Vec<Arc<RegisteredView>>>,
    dropped: AtomicU64,
}

impl ViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a view live. Registering an identical view again is a no-op.
    pub fn register_view(&self, view: View) -> Result<()> {
        if view.name.is_empty() {
            return Err(StatsError::BadConfig("view name must not be empty".into()));
        }
        match self.views.entry(view.name.clone()) {
            Entry::Occupied(e) => {
                if e.get().view == view {
                    tracing::debug!(view = %view.name, "view already registered");
                    Ok(())
                } else {
                    Err(StatsError::DuplicateView(view.name))
                }
            }
            Entry::Vacant(e) => {
                let measure = view.measure.name().to_string();
                tracing::info!(
                    view = %view.name,
                    measure = %measure,
                    aggregation = view.aggregation.kind_str(),
                    "view registered"
                );
                let rv = Arc::new(RegisteredView {
                    view,
                    start_unix_ms: now_unix_ms(),
                    rows: DashMap::new(),
                });
                self.by_measure
                    .entry(measure)
                    .or_default()
                    .push(Arc::clone(&rv));
                e.insert(rv);
                Ok(())
            }
        }
    }

    /// Fold a batch of values into every view bound to their measures.
    pub(crate) fn record(&self, values: &[(Measure, f64)], tags: &TagMap) {
        for (measure, value) in values {
            match self.by_measure.get(measure.name()) {
                Some(views) => {
                    for rv in views.iter() {
                        rv.add(tags, *value);
                    }
                }
                None => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(measure = %measure.name(), "no view registered; value dropped");
                }
            }
        }
    }

    /// Copy of one view's state.
    pub fn view_data(&self, name: &str) -> Option<ViewData> {
        self.views.get(name).map(|rv| rv.data())
    }

    /// Copies of every registered view, ordered by name.
    pub fn snapshot(&self) -> Vec<ViewData> {
        let mut all: Vec<ViewData> = self.views.iter().map(|rv| rv.data()).collect();
        all.sort_by(|a, b| a.view.cmp(&b.view));
        all
    }

    pub fn registered_views(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Values dropped because their measure had no view.
    pub fn dropped_measurements(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
