//! Aggregation policies and the accumulated data they produce.
//!
//! Distribution buckets follow the explicit-boundary layout: with `n`
//! boundaries there are `n + 1` buckets. Bucket 0 holds values below the
//! first boundary, bucket `i` holds `[b[i-1], b[i])`, and the last bucket
//! (overflow) holds everything at or above the last boundary.

use serde::Serialize;

use crate::error::{Result, StatsError};

/// Ascending, finite bucket boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BucketBoundaries(Vec<f64>);

impl BucketBoundaries {
    pub fn new(bounds: Vec<f64>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(StatsError::InvalidAggregation(
                "bucket boundaries must not be empty".into(),
            ));
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(StatsError::InvalidAggregation(
                "bucket boundaries must be finite".into(),
            ));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StatsError::InvalidAggregation(
                "bucket boundaries must be strictly ascending".into(),
            ));
        }
        Ok(Self(bounds))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Index of the bucket receiving `value`: first boundary strictly greater
    /// than the value, or the overflow bucket.
    pub fn bucket_index(&self, value: f64) -> usize {
        self.0.partition_point(|b| *b <= value)
    }

    /// Number of buckets (boundaries + 1).
    pub fn bucket_count(&self) -> usize {
        self.0.len() + 1
    }
}

/// How recorded values are combined for a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Number of recordings.
    Count,
    /// Bucketed histogram over explicit boundaries.
    Distribution(BucketBoundaries),
}

impl Aggregation {
    pub fn distribution(bounds: Vec<f64>) -> Result<Self> {
        BucketBoundaries::new(bounds).map(Aggregation::Distribution)
    }

    /// Fresh, empty accumulator for this policy.
    pub fn new_data(&self) -> AggregationData {
        match self {
            Aggregation::Count => AggregationData::Count { count: 0 },
            Aggregation::Distribution(b) => AggregationData::Distribution(DistributionData::new(b)),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Distribution(_) => "distribution",
        }
    }
}

/// Running state of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionData {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sum_of_squared_deviation: f64,
    pub bucket_boundaries: Vec<f64>,
    pub bucket_counts: Vec<u64>,
}

impl DistributionData {
    fn new(bounds: &BucketBoundaries) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            sum_of_squared_deviation: 0.0,
            bucket_boundaries: bounds.as_slice().to_vec(),
            bucket_counts: vec![0; bounds.bucket_count()],
        }
    }

    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;

        // Welford update
        let prev_mean = self.mean;
        self.mean += (value - prev_mean) / self.count as f64;
        self.sum_of_squared_deviation += (value - prev_mean) * (value - self.mean);

        let idx = self.bucket_boundaries.partition_point(|b| *b <= value);
        if let Some(slot) = self.bucket_counts.get_mut(idx) {
            *slot += 1;
        }
    }
}

/// Accumulated value of one view row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AggregationData {
    Count { count: u64 },
    Distribution(DistributionData),
}

impl AggregationData {
    /// Fold one recorded value in.
    pub fn add(&mut self, value: f64) {
        match self {
            AggregationData::Count { count } => *count += 1,
            AggregationData::Distribution(d) => d.add(value),
        }
    }

    /// Number of values folded in so far.
    pub fn count(&self) -> u64 {
        match self {
            AggregationData::Count { count } => *count,
            AggregationData::Distribution(d) => d.count,
        }
    }

    pub fn as_distribution(&self) -> Option<&DistributionData> {
        match self {
            AggregationData::Distribution(d) => Some(d),
            AggregationData::Count { .. } => None,
        }
    }
}
