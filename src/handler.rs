//! The handler: level gating, scoped attributes, and entry rendering.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::SecondsFormat;
use opentelemetry::Context;
use serde_json::{Map, Value as JsonValue};

use crate::env;
use crate::level::Level;
use crate::record::{Record, SOURCE_LOCATION_KEY};
use crate::sink::Sink;
use crate::trace::{trace_fields, SPAN_ID_KEY, TRACE_KEY};
use crate::tree;
use crate::value::Attr;

/// Tunables for a [`Handler`].
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Minimum level a record must reach to be emitted.
    pub level: Level,
    /// Attach `logging.googleapis.com/sourceLocation` when the record
    /// carries a call site.
    pub add_source_location: bool,
    /// Attach `logging.googleapis.com/trace` and `spanId` when the
    /// context carries a valid span.
    pub add_trace_info: bool,
    /// Google Cloud project id used to qualify trace names; empty means
    /// emit the bare trace id.
    pub project_id: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            level: Level::INFO,
            add_source_location: false,
            add_trace_info: true,
            project_id: String::new(),
        }
    }
}

impl HandlerOptions {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.add_source_location = enabled;
        self
    }

    pub fn with_trace_info(mut self, enabled: bool) -> Self {
        self.add_trace_info = enabled;
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }
}

/// Error type returned when emitting a record.
#[derive(thiserror::Error, Debug)]
pub enum HandleError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink rejected record: {0}")]
    Sink(#[source] Box<dyn Error + Send + Sync>),
}

/// A persistent attribute together with the number of group names that
/// were open when it was attached. The attribute renders under exactly
/// that prefix of the group path; groups opened later do not move it.
#[derive(Debug, Clone)]
struct ScopedAttr {
    depth: usize,
    attr: Attr,
}

/// Renders records as Cloud Logging JSON lines and hands them to a sink.
///
/// Attributes are placed at the top level of the entry beside the fixed
/// `severity`/`time`/`msg` keys; only group scopes nest them deeper.
/// Handlers are immutable: [`with_attrs`](Handler::with_attrs) and
/// [`with_group`](Handler::with_group) return derived handlers and leave
/// the original untouched, so one handler can be shared across threads
/// and specialized per subsystem.
#[derive(Clone)]
pub struct Handler {
    options: Arc<HandlerOptions>,
    sink: Arc<dyn Sink>,
    attrs: Vec<ScopedAttr>,
    groups: Vec<String>,
}

impl Handler {
    /// Create a handler writing to `sink`.
    ///
    /// **Parameters**
    /// - `sink`: destination for rendered entries, shared with whoever
    ///   else needs a handle on it (tests keep one to read back output).
    /// - `options`: filtering and enrichment tunables.
    pub fn new(sink: Arc<dyn Sink>, options: HandlerOptions) -> Self {
        Handler {
            options: Arc::new(options),
            sink,
            attrs: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Create a handler configured from the process environment.
    ///
    /// See [`env::options_from_env`] for the variables consulted.
    pub fn from_env(sink: Arc<dyn Sink>) -> Self {
        Handler::new(sink, env::options_from_env())
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    /// Derive a handler carrying `attrs` on every future record.
    ///
    /// The attributes bind to the group path open right now; an empty
    /// batch derives an unchanged handler.
    pub fn with_attrs(&self, attrs: impl IntoIterator<Item = Attr>) -> Handler {
        let depth = self.groups.len();
        let scoped: Vec<ScopedAttr> = attrs
            .into_iter()
            .map(|attr| ScopedAttr { depth, attr })
            .collect();
        if scoped.is_empty() {
            return self.clone();
        }
        let mut derived = self.clone();
        derived.attrs.extend(scoped);
        derived
    }

    /// Derive a handler that nests subsequent attributes under `name`.
    ///
    /// An empty name derives an unchanged handler.
    pub fn with_group(&self, name: impl Into<String>) -> Handler {
        let name = name.into();
        if name.is_empty() {
            return self.clone();
        }
        let mut derived = self.clone();
        derived.groups.push(name);
        derived
    }

    /// Render `record` and write it to the sink, correlating it with the
    /// span active in `cx`.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was emitted, or silently dropped because
    ///   its level is below the minimum.
    /// - `Err(..)` if serialization failed or the sink refused the line.
    pub fn handle(&self, cx: &Context, record: Record) -> Result<(), HandleError> {
        if !self.enabled(record.level) {
            return Ok(());
        }

        let mut entry = Map::new();
        entry.insert(
            "severity".to_string(),
            JsonValue::String(record.level.severity().to_string()),
        );
        entry.insert(
            "time".to_string(),
            JsonValue::String(record.time.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        entry.insert("msg".to_string(), JsonValue::String(record.message));

        if self.options.add_source_location {
            if let Some(source) = &record.source {
                entry.insert(SOURCE_LOCATION_KEY.to_string(), serde_json::to_value(source)?);
            }
        }
        if self.options.add_trace_info {
            if let Some(fields) = trace_fields(cx, &self.options.project_id) {
                entry.insert(TRACE_KEY.to_string(), JsonValue::String(fields.trace));
                entry.insert(SPAN_ID_KEY.to_string(), JsonValue::String(fields.span_id));
            }
        }

        // Fixed keys went in first; attributes may not displace them.
        for (key, value) in self.merge(&record.attrs) {
            entry.entry(key).or_insert(value);
        }

        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.sink.write_line(&line).map_err(HandleError::Sink)
    }

    /// [`handle`](Handler::handle) against the thread's current
    /// OpenTelemetry context.
    pub fn handle_current(&self, record: Record) -> Result<(), HandleError> {
        self.handle(&Context::current(), record)
    }

    /// Merge persistent and per-record attributes into one tree. Each
    /// persistent attribute lands under the group prefix open when it
    /// was attached; record attributes land under the full path. Later
    /// writers win on key collisions.
    fn merge(&self, record_attrs: &[Attr]) -> Map<String, JsonValue> {
        let mut merged = Map::new();
        for scoped in &self.attrs {
            tree::insert_at(&mut merged, &self.groups[..scoped.depth], &scoped.attr);
        }
        for attr in record_attrs {
            tree::insert_at(&mut merged, &self.groups, attr);
        }
        merged
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("options", &self.options)
            .field("attrs", &self.attrs)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::value::Value;
    use chrono::{DateTime, Utc};
    use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn capture(options: HandlerOptions) -> (Arc<MemorySink>, Handler) {
        let sink = Arc::new(MemorySink::new());
        let handler = Handler::new(sink.clone(), options);
        (sink, handler)
    }

    fn single_entry(sink: &MemorySink) -> JsonValue {
        let lines = sink.lines();
        assert_eq!(lines.len(), 1, "expected exactly one entry, got {:?}", lines);
        serde_json::from_str(&lines[0]).unwrap()
    }

    #[test]
    fn records_below_minimum_are_dropped() {
        let (sink, handler) = capture(HandlerOptions::default());
        handler
            .handle_current(Record::new(Level::DEBUG, "noise"))
            .unwrap();
        assert!(sink.lines().is_empty());
        assert!(!handler.enabled(Level::DEBUG));
        assert!(handler.enabled(Level::INFO));
    }

    #[test]
    fn dropped_records_do_not_resolve_lazy_values() {
        let (sink, handler) = capture(HandlerOptions::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Value::from("ran")
            }
        };
        handler
            .handle_current(Record::new(Level::DEBUG, "skip").with_attrs([Attr::lazy("probe", probe.clone())]))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        handler
            .handle_current(Record::new(Level::INFO, "emit").with_attrs([Attr::lazy("probe", probe)]))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(single_entry(&sink)["probe"], "ran");
    }

    #[test]
    fn record_attrs_override_persistent_attrs() {
        let (sink, handler) = capture(HandlerOptions::default());
        let handler = handler.with_attrs([Attr::new("user", "alice")]);
        handler
            .handle_current(Record::new(Level::INFO, "login").with_attr("user", "bob"))
            .unwrap();
        assert_eq!(single_entry(&sink)["user"], "bob");
    }

    #[test]
    fn groups_scope_only_later_attrs() {
        let (sink, handler) = capture(HandlerOptions::default());
        let handler = handler
            .with_attrs([Attr::new("region", "eu")])
            .with_group("request")
            .with_attrs([Attr::new("id", "r-1")]);
        handler
            .handle_current(Record::new(Level::INFO, "done").with_attr("status", 200))
            .unwrap();
        let entry = single_entry(&sink);
        assert_eq!(entry["region"], "eu");
        assert_eq!(entry["request"]["id"], "r-1");
        assert_eq!(entry["request"]["status"], 200);
    }

    #[test]
    fn empty_group_name_derives_unchanged_handler() {
        let (sink, handler) = capture(HandlerOptions::default());
        let derived = handler.with_group("");
        assert!(derived.groups.is_empty());
        derived
            .handle_current(Record::new(Level::INFO, "flat").with_attr("key", "value"))
            .unwrap();
        assert_eq!(single_entry(&sink)["key"], "value");
    }

    #[test]
    fn empty_attr_batch_derives_unchanged_handler() {
        let (_sink, handler) = capture(HandlerOptions::default());
        let derived = handler.with_attrs(Vec::new());
        assert!(derived.attrs.is_empty());
        assert!(derived.groups.is_empty());
    }

    #[test]
    fn derived_handlers_leave_the_original_untouched() {
        let (sink, handler) = capture(HandlerOptions::default());
        let _derived = handler.with_attrs([Attr::new("component", "worker")]);
        handler
            .handle_current(Record::new(Level::INFO, "base"))
            .unwrap();
        let entry = single_entry(&sink);
        assert!(entry.get("component").is_none());
    }

    #[test]
    fn reserved_keys_are_not_displaced_by_attrs() {
        let (sink, handler) = capture(HandlerOptions::default());
        handler
            .handle_current(Record::new(Level::WARN, "tamper").with_attr("severity", "HARMLESS"))
            .unwrap();
        assert_eq!(single_entry(&sink)["severity"], "WARNING");
    }

    #[test]
    fn explicit_time_renders_with_nanoseconds() {
        let (sink, handler) = capture(HandlerOptions::default());
        let at: DateTime<Utc> = "2024-05-01T12:00:00.123456789Z".parse().unwrap();
        handler
            .handle_current(Record::new(Level::INFO, "stamped").with_time(at))
            .unwrap();
        assert_eq!(single_entry(&sink)["time"], "2024-05-01T12:00:00.123456789Z");
    }

    #[test]
    fn trace_fields_respect_the_toggle() {
        let (sink, handler) =
            capture(HandlerOptions::default().with_trace_info(false).with_project_id("p"));
        let span_context = SpanContext::new(
            TraceId::from_hex("01020304050607080102030405060708").unwrap(),
            SpanId::from_hex("0102030405060708").unwrap(),
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(span_context);
        handler.handle(&cx, Record::new(Level::INFO, "quiet")).unwrap();
        let entry = single_entry(&sink);
        assert!(entry.get(TRACE_KEY).is_none());
        assert!(entry.get(SPAN_ID_KEY).is_none());
    }

    #[test]
    fn sink_failures_surface_as_handle_errors() {
        struct FailingSink;
        impl Sink for FailingSink {
            fn write_line(&self, _line: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
                Err("sink closed".into())
            }
        }
        let handler = Handler::new(Arc::new(FailingSink), HandlerOptions::default());
        let err = handler
            .handle_current(Record::new(Level::ERROR, "lost"))
            .unwrap_err();
        assert!(matches!(err, HandleError::Sink(_)));
    }
}
