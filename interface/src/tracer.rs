use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

pub type SpanId = u64;

/// The abstract span sink the runtime reports into. The core only ever
/// opens a span, emits zero or more events on it, and closes it exactly
/// once (ok or with a final error message) — it never inspects a backend's
/// own types, so a caller can swap in an OpenTelemetry exporter, a test
/// double, or nothing at all.
pub trait Tracer: Send + Sync {
    fn span_open(&self, name: &str) -> SpanId;
    fn span_event(&self, span: SpanId, message: &str);
    fn span_close_ok(&self, span: SpanId);
    fn span_close_err(&self, span: SpanId, message: &str);
}

/// Default `Tracer` backed by the `tracing` crate. Each logical span is
/// tracked by id because `Tracer::span_open` must return before any
/// `tracing::Span` guard could be entered on the calling task's stack (the
/// span will typically be closed from a different await point, sometimes a
/// different task, than the one that opened it).
#[derive(Default)]
pub struct TracingTracer {
    next_id: AtomicU64,
    spans: Mutex<HashMap<SpanId, tracing::Span>>,
}

impl TracingTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for TracingTracer {
    fn span_open(&self, name: &str) -> SpanId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let span = tracing::info_span!("task", name = %name, span_id = id);
        let _entered = span.enter();
        drop(_entered);
        self.spans.lock().unwrap().insert(id, span);
        id
    }

    fn span_event(&self, span: SpanId, message: &str) {
        if let Some(span) = self.spans.lock().unwrap().get(&span) {
            let _guard = span.enter();
            tracing::warn!(message);
        }
    }

    fn span_close_ok(&self, span: SpanId) {
        if let Some(span) = self.spans.lock().unwrap().remove(&span) {
            let _guard = span.enter();
            tracing::debug!("span closed ok");
        }
    }

    fn span_close_err(&self, span: SpanId, message: &str) {
        if let Some(span) = self.spans.lock().unwrap().remove(&span) {
            let _guard = span.enter();
            tracing::error!(message);
        }
    }
}

/// A `Tracer` that records nothing. Useful in tests where span bookkeeping
/// would just be noise.
#[derive(Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn span_open(&self, _name: &str) -> SpanId {
        0
    }
    fn span_event(&self, _span: SpanId, _message: &str) {}
    fn span_close_ok(&self, _span: SpanId) {}
    fn span_close_err(&self, _span: SpanId, _message: &str) {}
}
