//! spanstats agent
//!
//! Registers the app views, starts the stats and trace exporters, runs the
//! scripted database operations, then lingers for a final export cycle.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spanstats_agent::config::{self, Settings};
use spanstats_agent::db::MemoryDatabase;
use spanstats_agent::obs::SpanCollector;
use spanstats_agent::{agent, shutdown};
use spanstats_core::Telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let telemetry = Telemetry::default();
    let collector = SpanCollector::new(telemetry.trace_config());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(collector.clone())
        .init();

    let settings = match config::load_default().and_then(Settings::from_env) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let (trigger, interrupt) = shutdown::interrupt_pair();
    tokio::spawn(async move {
        shutdown::shutdown_signal().await;
        trigger.trigger();
    });

    let latency = Duration::from_millis(settings.config.driver.simulated_latency_ms);
    let db = Arc::new(MemoryDatabase::with_latency(latency));

    match agent::run(settings, telemetry, collector, db, interrupt).await {
        Ok(summary) => {
            tracing::info!(
                transactions = summary.report.transactions,
                views = summary.views.len(),
                ok = summary.report.is_ok(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "startup failed");
            ExitCode::FAILURE
        }
    }
}
