use std::path::PathBuf;

use serde::Deserialize;
use spanstats_core::error::{Result, StatsError};
use spanstats_core::trace::{sampler::DEFAULT_PROBABILITY, Sampler};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    /// Used only when no project id is discoverable from the environment.
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub trace: TraceSection,

    #[serde(default)]
    pub driver: DriverSection,

    #[serde(default)]
    pub ops: OpsSection,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: 1,
            project_id: None,
            exporter: ExporterSection::default(),
            trace: TraceSection::default(),
            driver: DriverSection::default(),
            ops: OpsSection::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatsError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if let Some(p) = &self.project_id {
            if p.trim().is_empty() {
                return Err(StatsError::BadConfig("project_id must not be blank".into()));
            }
        }

        self.exporter.validate()?;
        self.trace.validate()?;
        self.driver.validate()?;
        self.ops.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How long the process stays up after the driver finishes.
    #[serde(default = "default_linger_secs")]
    pub linger_secs: u64,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub client_views: bool,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            linger_secs: default_linger_secs(),
            sink: SinkConfig::default(),
            credentials_file: None,
            client_views: true,
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(StatsError::BadConfig(
                "exporter.interval_secs must be between 1 and 3600".into(),
            ));
        }
        // anything shorter loses the last batch
        if self.linger_secs < self.interval_secs {
            return Err(StatsError::BadConfig(
                "exporter.linger_secs must be at least exporter.interval_secs".into(),
            ));
        }
        if let SinkConfig::File { path } = &self.sink {
            if path.as_os_str().is_empty() {
                return Err(StatsError::BadConfig("exporter.sink.path must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SinkConfig {
    /// Structured log lines through `tracing`.
    #[default]
    Log,
    /// JSON lines appended to a file.
    File { path: PathBuf },
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TraceSection {
    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl TraceSection {
    pub fn validate(&self) -> Result<()> {
        self.sampler.to_sampler().map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SamplerConfig {
    Always,
    Never,
    Probability { ratio: f64 },
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig::Probability {
            ratio: DEFAULT_PROBABILITY,
        }
    }
}

impl SamplerConfig {
    pub fn to_sampler(self) -> Result<Sampler> {
        match self {
            SamplerConfig::Always => Ok(Sampler::AlwaysSample),
            SamplerConfig::Never => Ok(Sampler::NeverSample),
            SamplerConfig::Probability { ratio } => Sampler::probability(ratio),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverSection {
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Artificial delay per call on the in-memory backend.
    #[serde(default)]
    pub simulated_latency_ms: u64,
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            simulated_latency_ms: 0,
        }
    }
}

impl DriverSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.iterations) {
            return Err(StatsError::BadConfig(
                "driver.iterations must be between 1 and 100".into(),
            ));
        }
        if self.simulated_latency_ms > 10_000 {
            return Err(StatsError::BadConfig(
                "driver.simulated_latency_ms must not exceed 10000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    /// Listen address for `/healthz` and `/metrics`; disabled when absent.
    #[serde(default)]
    pub listen: Option<String>,
}

impl OpsSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(addr) = &self.listen {
            addr.parse::<std::net::SocketAddr>().map_err(|e| {
                StatsError::BadConfig(format!("ops.listen must be a valid SocketAddr: {e}"))
            })?;
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    60
}
fn default_linger_secs() -> u64 {
    70
}
fn default_iterations() -> u32 {
    3
}
fn default_true() -> bool {
    true
}
