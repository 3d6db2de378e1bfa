//! Trace correlation fields extracted from an OpenTelemetry context.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;

/// Entry key Cloud Logging reads the trace resource name from.
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";

/// Entry key Cloud Logging reads the span id from.
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";

/// Trace correlation values for one log entry.
///
/// `trace` is the project-qualified resource name
/// `projects/<project>/traces/<trace-id>` when a project id is known,
/// otherwise the bare 32-digit hex trace id. `span_id` is always the
/// bare 16-digit hex span id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFields {
    pub trace: String,
    pub span_id: String,
}

/// Extract trace correlation fields from `cx`.
///
/// **Parameters**
/// - `cx`: context whose active span is inspected.
/// - `project_id`: Google Cloud project id used to qualify the trace
///   name; pass an empty string to emit the bare trace id.
///
/// **Returns** `None` when the context carries no valid span, in which
/// case the entry gets no trace fields at all.
pub fn trace_fields(cx: &Context, project_id: &str) -> Option<TraceFields> {
    let span = cx.span();
    let span_context = span.span_context();
    if !span_context.is_valid() {
        return None;
    }
    let trace_id = format!("{:032x}", span_context.trace_id());
    let trace = if project_id.is_empty() {
        trace_id
    } else {
        format!("projects/{}/traces/{}", project_id, trace_id)
    };
    Some(TraceFields {
        trace,
        span_id: format!("{:016x}", span_context.span_id()),
    })
}
