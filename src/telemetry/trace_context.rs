use std::fmt;
use uuid::Uuid;

// ============================================================================
// W3C Trace Context
// ============================================================================
//
// traceparent = version "-" trace-id "-" parent-id "-" trace-flags
//               00      - 32 hex      - 16 hex     - 2 hex
//
// ============================================================================

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const SAMPLED: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn random() -> Self {
        loop {
            let value = Uuid::new_v4().as_u128();
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub fn parse(hex: &str) -> Option<Self> {
        parse_lower_hex(hex, 32)
            .and_then(|v| u128::from_str_radix(v, 16).ok())
            .filter(|v| *v != 0)
            .map(Self)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn random() -> Self {
        loop {
            let value = (Uuid::new_v4().as_u128() >> 64) as u64;
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub fn parse(hex: &str) -> Option<Self> {
        parse_lower_hex(hex, 16)
            .and_then(|v| u64::from_str_radix(v, 16).ok())
            .filter(|v| *v != 0)
            .map(Self)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

fn parse_lower_hex(value: &str, len: usize) -> Option<&str> {
    let well_formed = value.len() == len
        && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    well_formed.then_some(value)
}

/// Identity of one span within a distributed trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: u8,
    trace_state: Option<String>,
}

impl SpanContext {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags: SAMPLED,
            trace_state: None,
        }
    }

    /// Fresh root context: new trace id and span id.
    pub fn new_root() -> Self {
        Self::new(TraceId::random(), SpanId::random())
    }

    /// Same trace, new span id; flags and tracestate are inherited.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
            trace_flags: self.trace_flags,
            trace_state: self.trace_state.clone(),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags & SAMPLED == SAMPLED
    }

    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    /// Extract the inbound context. An absent or invalid `traceparent` yields
    /// `None`; `tracestate` is only honoured next to a valid `traceparent`.
    pub fn extract(traceparent: Option<&str>, tracestate: Option<&str>) -> Option<Self> {
        let mut parts = traceparent?.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let flags = parts.next()?;

        // version 00 has exactly four fields
        if parse_lower_hex(version, 2).is_none() || version == "ff" {
            return None;
        }
        if version == "00" && parts.next().is_some() {
            return None;
        }

        let trace_id = TraceId::parse(trace_id)?;
        let span_id = SpanId::parse(span_id)?;
        let trace_flags = parse_lower_hex(flags, 2).and_then(|f| u8::from_str_radix(f, 16).ok())?;

        let trace_state = tracestate
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(Self {
            trace_id,
            span_id,
            trace_flags,
            trace_state,
        })
    }

    pub fn traceparent(&self) -> String {
        format!("00-{}-{}-{:02x}", self.trace_id, self.span_id, self.trace_flags)
    }
}

/// What an outbound call must carry: the calling span plus the mesh request id.
#[derive(Debug, Clone)]
pub struct PropagationContext {
    pub span: SpanContext,
    pub request_id: Option<String>,
}

impl PropagationContext {
    pub fn new(span: SpanContext, request_id: Option<String>) -> Self {
        Self { span, request_id }
    }

    /// Header pairs to inject into an outbound request.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![(TRACEPARENT_HEADER, self.span.traceparent())];
        if let Some(state) = self.span.trace_state() {
            headers.push((TRACESTATE_HEADER, state.to_string()));
        }
        if let Some(request_id) = &self.request_id {
            headers.push((REQUEST_ID_HEADER, request_id.clone()));
        }
        headers
    }
}

/// Correlation data taken from an inbound request.
#[derive(Debug, Clone, Default)]
pub struct InboundContext {
    pub parent: Option<SpanContext>,
    pub request_id: Option<String>,
}

impl InboundContext {
    pub fn from_headers(
        traceparent: Option<&str>,
        tracestate: Option<&str>,
        request_id: Option<&str>,
    ) -> Self {
        Self {
            parent: SpanContext::extract(traceparent, tracestate),
            request_id: request_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}
