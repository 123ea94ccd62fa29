//! Stats pipeline: measures, views, aggregations and the recorder.
//!
//! Registration order matters. A view only sees values recorded after it was
//! registered, so register views before any operational work starts.

pub mod aggregation;
pub mod manager;
pub mod measure;
pub mod recorder;
pub mod tags;
pub mod view;

pub use aggregation::{Aggregation, AggregationData, BucketBoundaries, DistributionData};
pub use manager::ViewManager;
pub use measure::{Measure, MeasureDouble, MeasureKind, MeasureLong, MeasureRegistry};
pub use recorder::{MeasureMap, StatsRecorder};
pub use tags::{TagKey, TagMap};
pub use view::{View, ViewData, ViewRow};
