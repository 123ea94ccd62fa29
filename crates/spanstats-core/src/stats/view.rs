use serde::Serialize;

use super::aggregation::{Aggregation, AggregationData};
use super::measure::Measure;
use super::tags::TagKey;

/// Aggregation policy bound to one measure, grouped by tag keys.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub description: String,
    pub measure: Measure,
    pub aggregation: Aggregation,
    pub tag_keys: Vec<TagKey>,
}

impl View {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        measure: &Measure,
        aggregation: Aggregation,
        tag_keys: Vec<TagKey>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            measure: measure.clone(),
            aggregation,
            tag_keys,
        }
    }
}

/// One aggregated row: the tag values (ordered like the view's tag keys) and data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub tag_values: Vec<String>,
    pub data: AggregationData,
}

/// Immutable copy of a view's accumulated state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewData {
    pub view: String,
    pub description: String,
    pub measure: String,
    pub unit: String,
    pub aggregation: &'static str,
    pub tag_keys: Vec<TagKey>,
    pub rows: Vec<ViewRow>,
    /// Unix millis at registration.
    pub start_unix_ms: u64,
    /// Unix millis when this copy was taken.
    pub end_unix_ms: u64,
}

impl ViewData {
    /// Row matching exactly these tag values.
    pub fn row(&self, tag_values: &[&str]) -> Option<&AggregationData> {
        self.rows
            .iter()
            .find(|r| r.tag_values.iter().map(String::as_str).eq(tag_values.iter().copied()))
            .map(|r| &r.data)
    }

    /// Sum of recording counts across every row.
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.data.count()).sum()
    }
}
