//! Exporter configuration: sampler policy plus stats and trace sinks.

pub mod periodic;
pub mod sink;

use std::sync::Arc;
use std::time::Duration;

use spanstats_core::error::Result;
use spanstats_core::Telemetry;

use crate::config::{SinkConfig, Settings};
use crate::obs::SpanCollector;

pub use periodic::{spawn_stats_exporter, spawn_trace_exporter, ExporterHandle};
pub use sink::{Credentials, JsonFileSink, LogSink, StatsSink, TraceSink};

/// Both running exporters.
pub struct Exporters {
    stats: ExporterHandle,
    trace: ExporterHandle,
}

impl Exporters {
    /// Final flush of both sinks, then stop.
    pub async fn shutdown(self) {
        futures_util::future::join(self.stats.shutdown(), self.trace.shutdown()).await;
        tracing::info!("exporters stopped");
    }
}

/// Apply the configured sampler, set up sinks and start both export loops.
///
/// Any failure here is `ExporterInit` (or `BadConfig` for the sampler) and
/// should abort startup.
pub async fn register_exporters(
    settings: &Settings,
    telemetry: &Telemetry,
    collector: &SpanCollector,
) -> Result<Exporters> {
    let cfg = &settings.config.exporter;

    let sampler = settings.config.trace.sampler.to_sampler()?;
    telemetry.trace_config().set_sampler(sampler);

    let credentials = match &cfg.credentials_file {
        Some(path) => Credentials::load(path).await?,
        None => Credentials::default(),
    };

    let project = settings.project_id();
    let (stats_sink, trace_sink): (Arc<dyn StatsSink>, Arc<dyn TraceSink>) = match &cfg.sink {
        SinkConfig::Log => {
            let sink = Arc::new(LogSink::new(project, credentials));
            let stats: Arc<dyn StatsSink> = sink.clone();
            let trace: Arc<dyn TraceSink> = sink;
            (stats, trace)
        }
        SinkConfig::File { path } => {
            let sink = Arc::new(JsonFileSink::open(path, project).await?);
            let stats: Arc<dyn StatsSink> = sink.clone();
            let trace: Arc<dyn TraceSink> = sink;
            (stats, trace)
        }
    };

    let interval = Duration::from_secs(cfg.interval_secs);
    Ok(Exporters {
        stats: spawn_stats_exporter(telemetry.clone(), stats_sink, interval),
        trace: spawn_trace_exporter(collector.clone(), trace_sink, interval),
    })
}
