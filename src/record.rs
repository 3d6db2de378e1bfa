//! Log records and their source location metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::level::Level;
use crate::value::{Attr, Value};

/// Entry key Cloud Logging reads source location metadata from.
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";

/// A single log record on its way to a handler.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub message: String,
    /// Capture time, stamped when the record is constructed.
    pub time: DateTime<Utc>,
    pub attrs: Vec<Attr>,
    pub source: Option<SourceLocation>,
}

impl Record {
    /// Create a record stamped with the current time.
    ///
    /// **Parameters**
    /// - `level`: severity of the record.
    /// - `message`: human-readable message body.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            level,
            message: message.into(),
            time: Utc::now(),
            attrs: Vec::new(),
            source: None,
        }
    }

    /// Append one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    /// Append a batch of attributes, preserving order.
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Attach the call site, typically captured with [`source_location!`].
    ///
    /// [`source_location!`]: crate::source_location
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    /// Override the capture time, mainly useful in tests.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}

/// Call site of a log statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub function: String,
}

/// Capture the current file, line, and enclosing function path as a
/// [`SourceLocation`](crate::record::SourceLocation).
#[macro_export]
macro_rules! source_location {
    () => {{
        fn __here() {}
        fn __name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let __function = __name_of(__here);
        let __function = __function.strip_suffix("::__here").unwrap_or(__function);
        $crate::record::SourceLocation {
            file: file!().to_string(),
            line: line!(),
            function: __function.to_string(),
        }
    }};
}
