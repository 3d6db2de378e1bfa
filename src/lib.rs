//! Structured logging handler that renders records as Google Cloud
//! Logging JSON lines: severity mapping, optional source location, and
//! OpenTelemetry trace correlation. Attributes land at the top level of
//! each entry, nested only by group scopes.

pub mod level;
pub mod value;
pub mod record;
pub mod sink;
pub mod trace;
pub mod handler;
pub mod env;

mod tree;
