//! The three app measures and the views that keep them.

use spanstats_core::error::Result;
use spanstats_core::stats::{Aggregation, MeasureDouble, MeasureLong, TagKey};
use spanstats_core::Telemetry;

/// Latency histogram boundaries, milliseconds.
pub const LATENCY_BOUNDS_MS: [f64; 9] = [0.0, 5.0, 10.0, 25.0, 100.0, 200.0, 400.0, 800.0, 10000.0];

pub const READ_LATENCY: &str = "dbapp/read_latency";
pub const WRITE_LATENCY: &str = "dbapp/write_latency";
pub const TRANSACTION_SETS: &str = "dbapp/transaction_set_count";

pub const READ_LATENCY_VIEW: &str = "dbappmetrics/read_latency";
pub const WRITE_LATENCY_VIEW: &str = "dbappmetrics/write_latency";
pub const TRANSACTION_SETS_VIEW: &str = "dbappmetrics/transaction_set_count";

pub struct AppMeasures {
    pub read_latency: MeasureDouble,
    pub write_latency: MeasureDouble,
    pub transaction_sets: MeasureLong,
}

impl AppMeasures {
    pub fn define(telemetry: &Telemetry) -> Result<Self> {
        Ok(Self {
            read_latency: telemetry.define_double(
                READ_LATENCY,
                "The latency in milliseconds for read",
                "ms",
            )?,
            write_latency: telemetry.define_double(
                WRITE_LATENCY,
                "The latency in milliseconds for write",
                "ms",
            )?,
            transaction_sets: telemetry.define_long(
                TRANSACTION_SETS,
                "The count of transactions",
                "1",
            )?,
        })
    }
}

/// Define the app measures and register their views.
///
/// Must run before the driver records anything; values recorded earlier are
/// not kept.
pub fn register_metric_views(telemetry: &Telemetry) -> Result<AppMeasures> {
    let measures = AppMeasures::define(telemetry)?;

    let latency = TagKey::new("latency")?;
    let transactions = TagKey::new("transactions")?;
    let distribution = Aggregation::distribution(LATENCY_BOUNDS_MS.to_vec())?;

    telemetry.register_view(
        READ_LATENCY_VIEW,
        "The distribution of the read latencies",
        measures.read_latency.measure(),
        distribution.clone(),
        vec![latency.clone()],
    )?;
    telemetry.register_view(
        WRITE_LATENCY_VIEW,
        "The distribution of the write latencies",
        measures.write_latency.measure(),
        distribution,
        vec![latency],
    )?;
    telemetry.register_view(
        TRANSACTION_SETS_VIEW,
        "The number of transaction sets performed",
        measures.transaction_sets.measure(),
        Aggregation::Count,
        vec![transactions],
    )?;

    Ok(measures)
}
