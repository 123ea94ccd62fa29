//! Per-call client views.
//!
//! Every call through [`InstrumentedDatabase`] records its roundtrip latency
//! and a completion count, tagged by method and final status.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use spanstats_core::error::Result;
use spanstats_core::stats::{Aggregation, MeasureDouble, MeasureLong, TagKey};
use spanstats_core::Telemetry;

use super::schema::{Mutation, Row, TableSchema};
use super::Database;
use crate::config::DatabaseId;
use crate::obs::LATENCY_BOUNDS_MS;

pub const ROUNDTRIP_LATENCY: &str = "spanstats/client/roundtrip_latency";
pub const COMPLETED_CALLS: &str = "spanstats/client/completed_calls";

pub const ROUNDTRIP_LATENCY_VIEW: &str = "spanstats/client/roundtrip_latency";
pub const COMPLETED_CALLS_VIEW: &str = "spanstats/client/completed_calls";

#[derive(Clone)]
pub struct ClientMeasures {
    roundtrip: MeasureDouble,
    completed: MeasureLong,
    method: TagKey,
    status: TagKey,
}

/// Define the client measures and register their views.
pub fn register_client_views(telemetry: &Telemetry) -> Result<ClientMeasures> {
    let method = TagKey::new("method")?;
    let status = TagKey::new("status")?;

    let roundtrip = telemetry.define_double(
        ROUNDTRIP_LATENCY,
        "Time between first byte of request sent and last byte of response received",
        "ms",
    )?;
    let completed = telemetry.define_long(COMPLETED_CALLS, "Completed client calls", "1")?;

    telemetry.register_view(
        ROUNDTRIP_LATENCY_VIEW,
        "Distribution of client call latencies by method and status",
        roundtrip.measure(),
        Aggregation::distribution(LATENCY_BOUNDS_MS.to_vec())?,
        vec![method.clone(), status.clone()],
    )?;
    telemetry.register_view(
        COMPLETED_CALLS_VIEW,
        "Number of completed client calls by method and status",
        completed.measure(),
        Aggregation::Count,
        vec![method.clone(), status.clone()],
    )?;

    Ok(ClientMeasures {
        roundtrip,
        completed,
        method,
        status,
    })
}

pub struct InstrumentedDatabase {
    inner: Arc<dyn Database>,
    telemetry: Telemetry,
    measures: ClientMeasures,
}

impl InstrumentedDatabase {
    pub fn new(inner: Arc<dyn Database>, telemetry: Telemetry, measures: ClientMeasures) -> Self {
        Self {
            inner,
            telemetry,
            measures,
        }
    }

    async fn observe<T, F>(&self, method: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let start = Instant::now();
        let res = call.await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let status = match &res {
            Ok(_) => "OK",
            Err(e) => e.db_kind().map(|k| k.as_str()).unwrap_or(e.code().as_str()),
        };
        let m = &self.measures;
        self.telemetry
            .recorder()
            .new_measure_map()
            .put_double(&m.roundtrip, elapsed_ms)
            .put_long(&m.completed, 1)
            .with_tag(&m.method, method)
            .with_tag(&m.status, status)
            .record();
        res
    }
}

#[async_trait]
impl Database for InstrumentedDatabase {
    async fn create_database(&self, id: &DatabaseId, tables: &[TableSchema]) -> Result<()> {
        self.observe("CreateDatabase", self.inner.create_database(id, tables))
            .await
    }

    async fn read_row(
        &self,
        id: &DatabaseId,
        table: &str,
        key: &str,
        columns: &[&str],
    ) -> Result<Option<Row>> {
        self.observe("Read", self.inner.read_row(id, table, key, columns))
            .await
    }

    async fn write(&self, id: &DatabaseId, mutations: Vec<Mutation>) -> Result<()> {
        self.observe("Commit", self.inner.write(id, mutations)).await
    }

    fn close(&self) {
        self.inner.close();
    }
}
