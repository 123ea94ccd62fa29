//! Export sinks for stats and spans.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use spanstats_core::error::{Result, StatsError};
use spanstats_core::stats::ViewData;

use crate::obs::exposition;
use crate::obs::FinishedSpan;

#[async_trait]
pub trait StatsSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn export_stats(&self, views: &[ViewData]) -> Result<()>;
}

#[async_trait]
pub trait TraceSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn export_spans(&self, spans: &[FinishedSpan]) -> Result<()>;
}

/// Service account identity read from a credentials file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub principal: Option<String>,
}

impl Credentials {
    /// Read and parse a JSON credentials file. Any failure is `ExporterInit`.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StatsError::ExporterInit(format!("read credentials {}: {e}", path.display()))
        })?;
        let v: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            StatsError::ExporterInit(format!("parse credentials {}: {e}", path.display()))
        })?;
        if !v.is_object() {
            return Err(StatsError::ExporterInit(format!(
                "credentials {} must be a JSON object",
                path.display()
            )));
        }
        Ok(Self {
            principal: v
                .get("client_email")
                .and_then(|e| e.as_str())
                .map(str::to_string),
        })
    }
}

/// Emits stats as exposition lines and spans as structured events.
pub struct LogSink {
    project_id: String,
    principal: Option<String>,
}

impl LogSink {
    pub fn new(project_id: &str, credentials: Credentials) -> Self {
        Self {
            project_id: project_id.to_string(),
            principal: credentials.principal,
        }
    }
}

#[async_trait]
impl StatsSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn export_stats(&self, views: &[ViewData]) -> Result<()> {
        let text = exposition::render(views, &[]);
        for line in text.lines().filter(|l| !l.starts_with('#')) {
            tracing::info!(
                target: "spanstats::export",
                project = %self.project_id,
                principal = self.principal.as_deref().unwrap_or("-"),
                "{line}"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl TraceSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn export_spans(&self, spans: &[FinishedSpan]) -> Result<()> {
        for s in spans {
            tracing::info!(
                target: "spanstats::export",
                project = %self.project_id,
                trace_id = %s.trace_id,
                span_id = %s.span_id,
                parent = %s.parent_span_id.map(|p| p.to_string()).unwrap_or_default(),
                span = %s.name,
                duration_us = s.duration_us,
                "span"
            );
        }
        Ok(())
    }
}

/// Appends one JSON object per view or span to a file.
pub struct JsonFileSink {
    project_id: String,
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonFileSink {
    /// Open (or create) the file in append mode. Failure is `ExporterInit`.
    pub async fn open(path: &Path, project_id: &str) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| StatsError::ExporterInit(format!("open {}: {e}", path.display())))?;
        Ok(Self {
            project_id: project_id.to_string(),
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    async fn append(&self, lines: Vec<serde_json::Value>) -> Result<()> {
        let mut buf = String::new();
        for l in lines {
            buf.push_str(&l.to_string());
            buf.push('\n');
        }
        let mut f = self.file.lock().await;
        f.write_all(buf.as_bytes())
            .await
            .map_err(|e| StatsError::Internal(format!("write {}: {e}", self.path.display())))?;
        f.flush()
            .await
            .map_err(|e| StatsError::Internal(format!("flush {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl StatsSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn export_stats(&self, views: &[ViewData]) -> Result<()> {
        let lines = views
            .iter()
            .map(|v| json!({ "kind": "view", "project": self.project_id, "data": v }))
            .collect();
        self.append(lines).await
    }
}

#[async_trait]
impl TraceSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn export_spans(&self, spans: &[FinishedSpan]) -> Result<()> {
        let lines = spans
            .iter()
            .map(|s| json!({ "kind": "span", "project": self.project_id, "data": s }))
            .collect();
        self.append(lines).await
    }
}
