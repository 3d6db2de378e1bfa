use std::sync::Arc;

use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry::Context;

use gclog::handler::{Handler, HandlerOptions};
use gclog::level::Level;
use gclog::record::Record;
use gclog::sink::WriterSink;
use gclog::source_location;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = HandlerOptions::default()
        .with_project_id("demo-project")
        .with_source_location(true);
    let handler = Handler::new(Arc::new(WriterSink::stdout()), options).with_group("rpc");

    // Stand-in for the span a tracing middleware would have activated.
    let span_context = SpanContext::new(
        TraceId::from_hex("01020304050607080102030405060708")?,
        SpanId::from_hex("0102030405060708")?,
        TraceFlags::SAMPLED,
        false,
        TraceState::default(),
    );
    let cx = Context::new().with_remote_span_context(span_context);

    handler.handle(
        &cx,
        Record::new(Level::INFO, "handling call")
            .with_attr("method", "/users.Get")
            .with_source(source_location!()),
    )?;

    Ok(())
}
