// ============================================================================
// Telemetry - logging, trace context propagation and spans
// ============================================================================

mod logging;
mod span;
mod trace_context;

pub use logging::init_logging;
pub use span::{
    FinishedSpan, InMemorySpanExporter, LoggingSpanExporter, Span, SpanEvent, SpanExporter,
    SpanStatus, Tracer,
};
pub use trace_context::{
    InboundContext, PropagationContext, SpanContext, SpanId, TraceId, REQUEST_ID_HEADER,
    TRACEPARENT_HEADER, TRACESTATE_HEADER,
};
