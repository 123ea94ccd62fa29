//! Span collection as a `tracing_subscriber` layer.
//!
//! Root spans get a fresh trace id and a sampling decision from the active
//! trace config; child spans inherit both from their parent. Finished sampled
//! spans wait in a bounded buffer until the trace exporter drains them. When
//! the buffer is full the oldest span is dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use spanstats_core::clock::now_unix_ms;
use spanstats_core::trace::{SpanId, TraceConfig, TraceId};

/// A closed, sampled span ready for export.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedSpan {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub name: String,
    pub target: String,
    pub start_unix_ms: u64,
    pub duration_us: u64,
    pub fields: Vec<(String, String)>,
}

/// Per-span state kept in the registry extensions.
struct SpanState {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    sampled: bool,
    start_unix_ms: u64,
    started: Instant,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldVisitor(Vec<(String, String)>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
}

struct CollectorInner {
    trace: Arc<TraceConfig>,
    finished: Mutex<VecDeque<FinishedSpan>>,
    dropped: AtomicU64,
}

#[derive(Clone)]
pub struct SpanCollector {
    inner: Arc<CollectorInner>,
}

impl SpanCollector {
    pub fn new(trace: Arc<TraceConfig>) -> Self {
        Self {
            inner: Arc::new(CollectorInner {
                trace,
                finished: Mutex::new(VecDeque::new()),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Take every buffered span, oldest first.
    pub fn drain(&self) -> Vec<FinishedSpan> {
        let mut q = self
            .inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        q.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Spans evicted because the buffer was full.
    pub fn dropped_spans(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, span: FinishedSpan) {
        let cap = self.inner.trace.active_params().max_buffered_spans.max(1);
        let mut q = self
            .inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while q.len() >= cap {
            q.pop_front();
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
        q.push_back(span);
    }
}

impl<S> Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };

        let parent = span.parent().and_then(|p| {
            p.extensions()
                .get::<SpanState>()
                .map(|s| (s.trace_id, s.span_id, s.sampled))
        });

        let (trace_id, parent_span_id, sampled) = match parent {
            Some((trace_id, parent_id, sampled)) => (trace_id, Some(parent_id), sampled),
            None => {
                let trace_id = TraceId::random();
                let sampled = self
                    .inner
                    .trace
                    .sampler()
                    .should_sample(None, trace_id);
                (trace_id, None, sampled)
            }
        };

        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        span.extensions_mut().insert(SpanState {
            trace_id,
            span_id: SpanId::random(),
            parent_span_id,
            sampled,
            start_unix_ms: now_unix_ms(),
            started: Instant::now(),
            fields: visitor.0,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut ext = span.extensions_mut();
        if let Some(state) = ext.get_mut::<SpanState>() {
            let mut visitor = FieldVisitor::default();
            values.record(&mut visitor);
            state.fields.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let finished = {
            let ext = span.extensions();
            let Some(state) = ext.get::<SpanState>() else { return };
            if !state.sampled {
                return;
            }
            FinishedSpan {
                trace_id: state.trace_id,
                span_id: state.span_id,
                parent_span_id: state.parent_span_id,
                name: span.name().to_string(),
                target: span.metadata().target().to_string(),
                start_unix_ms: state.start_unix_ms,
                duration_us: state.started.elapsed().as_micros() as u64,
                fields: state.fields.clone(),
            }
        };
        self.push(finished);
    }
}
