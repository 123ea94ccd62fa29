//! Scripted database operations with latency recording.
//!
//! Sequence: create the database, then under one root span do a timed
//! warm-up read followed by a fixed number of timed insert batches. Each
//! successful batch records read latency, write latency and one transaction
//! set in a single measure map. The first error ends the sequence; it is
//! logged and returned in the report. The client is closed exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use spanstats_core::clock::now_unix_secs;
use spanstats_core::error::{Result, StatsError};
use spanstats_core::Telemetry;

use crate::config::DatabaseId;
use crate::db::{players_table, ClientGuard, Database, Mutation};
use crate::obs::AppMeasures;
use crate::shutdown::Interrupt;

/// Key read during warm-up. Not expected to exist.
pub const WARMUP_KEY: &str = "foo@gmail.com";

/// Outcome of one driver run.
#[derive(Debug, Default)]
pub struct DriverReport {
    /// Measure maps recorded (one per successful batch).
    pub transactions: u32,
    pub read_latency_ms: Option<f64>,
    pub error: Option<StatsError>,
}

impl DriverReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Prefix making emails unique per iteration and run, e.g. `2-1700000000.`.
pub fn uniqueness_token(iteration: u32, unix_secs: u64) -> String {
    format!("{iteration}-{unix_secs}.")
}

pub fn player_mutation(first_name: &str, last_name: &str, email: &str, uuid: &str) -> Mutation {
    Mutation::insert("Players")
        .set("first_name", first_name)
        .set("last_name", last_name)
        .set("uuid", uuid)
        .set("email", email)
}

pub fn player_batch(token: &str) -> Vec<Mutation> {
    vec![
        player_mutation(
            "Poke",
            "Mon",
            &format!("{token}poke.mon@example.org"),
            "f1578551-eb4b-4ecd-aee2-9f97c37e164e",
        ),
        player_mutation(
            "Go",
            "Census",
            &format!("{token}go.census@census.io"),
            "540868a2-a1d8-456b-a995-b324e4e7957a",
        ),
        player_mutation(
            "Quick",
            "Sort",
            &format!("{token}q.sort@gmail.com"),
            "2b7e0098-a5cc-4f32-aabd-b978fc6b9710",
        ),
    ]
}

/// Create the database, racing the interrupt.
///
/// The collaborator's own error is returned unchanged; `Interrupted` only
/// when the interrupt fired and creation had not finished.
pub async fn create_database(db: &dyn Database, id: &DatabaseId, interrupt: &Interrupt) -> Result<()> {
    let tables = [players_table()];
    tokio::select! {
        biased;

        res = db.create_database(id, &tables) => {
            res?;
            tracing::info!(database = %id, "created database");
            Ok(())
        }
        _ = interrupt.wait() => Err(StatsError::Interrupted),
    }
}

/// Run the scripted sequence. Never fails; errors land in the report.
pub async fn run_operations(
    telemetry: &Telemetry,
    measures: &AppMeasures,
    db: Arc<dyn Database>,
    id: &DatabaseId,
    iterations: u32,
    interrupt: &Interrupt,
) -> DriverReport {
    let client = ClientGuard::new(db);
    let mut report = DriverReport::default();

    if let Err(e) = drive(&client, telemetry, measures, id, iterations, interrupt, &mut report).await {
        tracing::error!(error = %e, code = e.code().as_str(), "exception while adding players");
        report.error = Some(e);
    }

    client.release();
    report
}

async fn drive(
    client: &ClientGuard,
    telemetry: &Telemetry,
    measures: &AppMeasures,
    id: &DatabaseId,
    iterations: u32,
    interrupt: &Interrupt,
    report: &mut DriverReport,
) -> Result<()> {
    create_database(&**client, id, interrupt)
        .instrument(tracing::info_span!("create-database"))
        .await?;

    let root = tracing::info_span!("create-players", database = %id);
    async {
        // warm-up: establishes the session before the timed writes
        let start = Instant::now();
        let row = client
            .read_row(id, "Players", WARMUP_KEY, &["email"])
            .instrument(tracing::info_span!("warmup-read"))
            .await?;
        let read_ms = elapsed_ms(start);
        report.read_latency_ms = Some(read_ms);
        tracing::debug!(found = row.is_some(), read_ms, "warm-up read done");

        for i in 0..iterations {
            let token = uniqueness_token(i, now_unix_secs());
            let batch = player_batch(&token);

            let start = Instant::now();
            client
                .write(id, batch)
                .instrument(tracing::info_span!("write-batch", iteration = i))
                .await?;
            let write_ms = elapsed_ms(start);

            let recorded = telemetry
                .recorder()
                .new_measure_map()
                .put_double(&measures.read_latency, read_ms)
                .put_double(&measures.write_latency, write_ms)
                .put_long(&measures.transaction_sets, 1)
                .record();
            if recorded {
                report.transactions += 1;
            }
            tracing::debug!(iteration = i, write_ms, "batch written");
        }
        Ok::<(), StatsError>(())
    }
    .instrument(root)
    .await
}

/// Keep the process alive so the exporters get one more cycle.
/// An interrupt cuts the wait short and is otherwise ignored.
pub async fn wait_for_export(linger: Duration, interrupt: &Interrupt) {
    tracing::info!(linger_secs = linger.as_secs(), "waiting for final export");
    tokio::select! {
        _ = tokio::time::sleep(linger) => {}
        _ = interrupt.wait() => {
            tracing::info!("interrupted during final wait");
        }
    }
}
