use std::error::Error;
use std::io::{self, Write};
use std::sync::Mutex;

/// Destination for rendered log entries.
///
/// Implementations transport complete entry lines to a concrete
/// destination (stdout, a file, an in-memory buffer in tests). The
/// handler serializes each record before calling `write_line`, so
/// implementations never see partial entries.
pub trait Sink: Send + Sync {
    /// Write a single rendered entry.
    ///
    /// **Parameters**
    /// - `line`: one complete JSON entry, already newline-terminated.
    ///
    /// **Returns**
    /// - `Ok(())` if the entry reached the destination.
    /// - `Err(..)` if it did not (I/O error, poisoned lock, etc.).
    ///
    /// Each call carries exactly one entry, and implementations must not
    /// interleave the bytes of concurrent calls.
    fn write_line(&self, line: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Sink that writes entries to any [`std::io::Write`] destination.
///
/// The writer sits behind a mutex, so a single `WriterSink` can be
/// shared by any number of handlers without interleaving their lines.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }
}

impl WriterSink<io::Stdout> {
    /// Sink writing to standard output, the usual choice on Cloud Run
    /// and GKE where the logging agent tails the container's stdout.
    pub fn stdout() -> Self {
        WriterSink::new(io::stdout())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_line(&self, line: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| "log writer mutex poisoned")?;
        writer.write_all(line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Sink that collects entries in memory, for tests and examples.
#[derive(Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Everything written so far, as one UTF-8 string.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Entries written so far, one per line, without the trailing newline.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut buffer = self.buffer.lock().map_err(|_| "log buffer mutex poisoned")?;
        buffer.extend_from_slice(line);
        Ok(())
    }
}

/// Sink that discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn write_line(&self, _line: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
