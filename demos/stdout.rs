use std::sync::Arc;
use std::time::Duration;

use gclog::handler::{Handler, HandlerOptions};
use gclog::level::Level;
use gclog::record::Record;
use gclog::sink::WriterSink;
use gclog::value::Attr;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(WriterSink::stdout());
    let handler = Handler::new(sink, HandlerOptions::default());

    handler.handle_current(Record::new(Level::INFO, "server listening").with_attr("port", 8080))?;

    // Below the default minimum level, so this one prints nothing.
    handler.handle_current(Record::new(Level::DEBUG, "connection pool sized"))?;

    let worker = handler
        .with_attrs([Attr::new("component", "ingest")])
        .with_group("request")
        .with_attrs([Attr::new("id", "req-42")]);

    worker.handle_current(
        Record::new(Level::WARN, "slow request").with_attr("elapsed", Duration::from_millis(1500)),
    )?;

    Ok(())
}
