//! tracing setup and ndjson output.

mod format;

pub use format::StructuredLogger;
