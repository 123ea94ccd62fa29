//! Startup and run orchestration.
//!
//! Order: register views, configure exporters, run the driver, linger for
//! one more export cycle, then stop the exporters with a final flush.
//! Config, view and exporter errors are returned before any database work.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use spanstats_core::error::{Result, StatsError};
use spanstats_core::stats::ViewData;
use spanstats_core::Telemetry;

use crate::app_state::AppState;
use crate::config::Settings;
use crate::db::{register_client_views, Database, InstrumentedDatabase};
use crate::driver::{self, DriverReport};
use crate::export;
use crate::obs::{register_metric_views, SpanCollector};
use crate::router;
use crate::shutdown::Interrupt;

pub struct RunSummary {
    pub report: DriverReport,
    pub views: Vec<ViewData>,
}

async fn spawn_ops(listen: &str, state: AppState) -> Result<JoinHandle<()>> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| StatsError::BadConfig(format!("ops.listen bind {listen}: {e}")))?;
    tracing::info!(%listen, "ops endpoint listening");
    let app = router::build_router(state);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::warn!(error = %e, "ops server stopped");
        }
    }))
}

pub async fn run(
    settings: Settings,
    telemetry: Telemetry,
    collector: SpanCollector,
    db: Arc<dyn Database>,
    interrupt: Interrupt,
) -> Result<RunSummary> {
    let cfg = &settings.config;

    let measures = register_metric_views(&telemetry)?;
    let db: Arc<dyn Database> = if cfg.exporter.client_views {
        let client = register_client_views(&telemetry)?;
        Arc::new(InstrumentedDatabase::new(db, telemetry.clone(), client))
    } else {
        db
    };

    let exporters = export::register_exporters(&settings, &telemetry, &collector).await?;

    let ops = match &cfg.ops.listen {
        Some(listen) => {
            let state = AppState::new(telemetry.clone(), Some(collector.clone()));
            match spawn_ops(listen, state).await {
                Ok(h) => Some(h),
                Err(e) => {
                    exporters.shutdown().await;
                    return Err(e);
                }
            }
        }
        None => None,
    };

    tracing::info!(database = %settings.database, iterations = cfg.driver.iterations, "running operations");
    let report = driver::run_operations(
        &telemetry,
        &measures,
        db,
        &settings.database,
        cfg.driver.iterations,
        &interrupt,
    )
    .await;

    driver::wait_for_export(Duration::from_secs(cfg.exporter.linger_secs), &interrupt).await;
    exporters.shutdown().await;
    if let Some(h) = ops {
        h.abort();
    }

    Ok(RunSummary {
        report,
        views: telemetry.views().snapshot(),
    })
}
