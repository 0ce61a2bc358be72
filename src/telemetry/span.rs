use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use super::trace_context::{SpanContext, SpanId};

// ============================================================================
// Spans - units of work in a distributed trace
// ============================================================================
//
// A `Span` is ended exactly once: by `end()` or, failing that, on drop.
// Ended spans are handed to a process-wide `SpanExporter`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub timestamp: DateTime<Utc>,
}

/// Immutable record of an ended span.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub name: String,
    pub context: SpanContext,
    pub parent_span_id: Option<SpanId>,
    pub attributes: Vec<(String, String)>,
    pub status: SpanStatus,
    pub events: Vec<SpanEvent>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl FinishedSpan {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &SpanEvent> {
        self.events.iter().filter(|e| e.name == "exception")
    }
}

pub trait SpanExporter: Send + Sync {
    fn export(&self, span: FinishedSpan);
}

/// Writes ended spans to the structured log.
pub struct LoggingSpanExporter;

impl SpanExporter for LoggingSpanExporter {
    fn export(&self, span: FinishedSpan) {
        let duration_ms = (span.end_time - span.start_time).num_milliseconds();
        let parent = span.parent_span_id.map(|id| id.to_string()).unwrap_or_default();

        match &span.status {
            SpanStatus::Error(message) => tracing::warn!(
                span_name = %span.name,
                trace_id = %span.context.trace_id(),
                span_id = %span.context.span_id(),
                parent_span_id = %parent,
                duration_ms,
                error = %message,
                exceptions = span.exceptions().count(),
                "span ended with error"
            ),
            _ => tracing::debug!(
                span_name = %span.name,
                trace_id = %span.context.trace_id(),
                span_id = %span.context.span_id(),
                parent_span_id = %parent,
                duration_ms,
                "span ended"
            ),
        }
    }
}

/// Collects ended spans in memory.
#[derive(Default)]
pub struct InMemorySpanExporter {
    spans: Mutex<Vec<FinishedSpan>>,
}

impl InMemorySpanExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished(&self) -> Vec<FinishedSpan> {
        self.spans.lock().clone()
    }

    pub fn find(&self, name: &str) -> Vec<FinishedSpan> {
        self.spans
            .lock()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&self, span: FinishedSpan) {
        self.spans.lock().push(span);
    }
}

/// Process-wide span factory.
#[derive(Clone)]
pub struct Tracer {
    exporter: Arc<dyn SpanExporter>,
}

impl Tracer {
    pub fn new(exporter: Arc<dyn SpanExporter>) -> Self {
        Self { exporter }
    }

    /// Start a span under `parent`, or a new root trace when there is none.
    pub fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> Span {
        let (context, parent_span_id) = match parent {
            Some(parent) => (parent.child(), Some(parent.span_id())),
            None => (SpanContext::new_root(), None),
        };
        Span::new(name, context, parent_span_id, self.exporter.clone())
    }

    pub fn start_child(&self, name: &str, parent: &Span) -> Span {
        self.start_span(name, Some(parent.context()))
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Arc::new(LoggingSpanExporter))
    }
}

pub struct Span {
    name: String,
    context: SpanContext,
    parent_span_id: Option<SpanId>,
    attributes: Vec<(String, String)>,
    status: SpanStatus,
    events: Vec<SpanEvent>,
    start_time: DateTime<Utc>,
    exporter: Arc<dyn SpanExporter>,
    ended: bool,
}

impl Span {
    fn new(
        name: &str,
        context: SpanContext,
        parent_span_id: Option<SpanId>,
        exporter: Arc<dyn SpanExporter>,
    ) -> Self {
        Self {
            name: name.to_string(),
            context,
            parent_span_id,
            attributes: Vec::new(),
            status: SpanStatus::Unset,
            events: Vec::new(),
            start_time: Utc::now(),
            exporter,
            ended: false,
        }
    }

    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    pub fn set_attribute(&mut self, key: &str, value: impl ToString) {
        self.attributes.push((key.to_string(), value.to_string()));
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        self.status = status;
    }

    /// Attach an `exception` event describing `error` and its source chain.
    pub fn record_exception(&mut self, error: &(dyn std::error::Error + 'static)) {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        let mut attributes = vec![("exception.message".to_string(), error.to_string())];
        if !chain.is_empty() {
            attributes.push(("exception.cause".to_string(), chain.join(": ")));
        }

        self.events.push(SpanEvent {
            name: "exception".to_string(),
            attributes,
            timestamp: Utc::now(),
        });
    }

    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        self.exporter.export(FinishedSpan {
            name: std::mem::take(&mut self.name),
            context: self.context.clone(),
            parent_span_id: self.parent_span_id,
            attributes: std::mem::take(&mut self.attributes),
            status: self.status.clone(),
            events: std::mem::take(&mut self.events),
            start_time: self.start_time,
            end_time: Utc::now(),
        });
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.finish();
    }
}
