//! Background export loop.
//!
//! Each exporter is one tokio task ticking on a fixed interval. The first tick
//! (immediate) is skipped. Shutdown runs one final flush before the task ends.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use spanstats_core::error::{Result, StatsError};
use spanstats_core::Telemetry;

use super::sink::{StatsSink, TraceSink};
use crate::obs::SpanCollector;

pub struct ExporterHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ExporterHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the loop after one final flush.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::warn!(exporter = self.name, error = %e, "exporter task ended abnormally");
        }
    }
}

async fn flush_logged<F, Fut>(name: &'static str, flush: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<usize>>,
{
    match flush().await {
        Ok(0) => {}
        Ok(n) => tracing::debug!(exporter = name, items = n, "exported"),
        Err(e) => tracing::warn!(exporter = name, error = %e, "export failed"),
    }
}

fn spawn_periodic<F, Fut>(name: &'static str, interval: Duration, flush: F) -> ExporterHandle
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<usize>> + Send + 'static,
{
    let (tx, mut rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => flush_logged(name, &flush).await,
                _ = rx.changed() => {
                    flush_logged(name, &flush).await;
                    break;
                }
            }
        }
        tracing::debug!(exporter = name, "exporter stopped");
    });

    ExporterHandle {
        name,
        shutdown: tx,
        task,
    }
}

/// Push cumulative view snapshots to `sink` every `interval`.
pub fn spawn_stats_exporter(
    telemetry: Telemetry,
    sink: Arc<dyn StatsSink>,
    interval: Duration,
) -> ExporterHandle {
    tracing::info!(sink = sink.name(), interval_secs = interval.as_secs(), "stats exporter registered");
    spawn_periodic("stats", interval, move || {
        let telemetry = telemetry.clone();
        let sink = Arc::clone(&sink);
        async move {
            let views = telemetry.views().snapshot();
            if views.is_empty() {
                return Ok(0);
            }
            sink.export_stats(&views).await?;
            Ok::<usize, StatsError>(views.len())
        }
    })
}

/// Drain finished spans into `sink` every `interval`.
pub fn spawn_trace_exporter(
    collector: SpanCollector,
    sink: Arc<dyn TraceSink>,
    interval: Duration,
) -> ExporterHandle {
    tracing::info!(sink = sink.name(), interval_secs = interval.as_secs(), "trace exporter registered");
    spawn_periodic("trace", interval, move || {
        let collector = collector.clone();
        let sink = Arc::clone(&sink);
        async move {
            let spans = collector.drain();
            if spans.is_empty() {
                return Ok(0);
            }
            sink.export_spans(&spans).await?;
            Ok::<usize, StatsError>(spans.len())
        }
    })
}
