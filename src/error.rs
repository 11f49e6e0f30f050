//! Error taxonomy shared by the collector, filter, termination and config layers.

use thiserror::Error;

/// The OS enumeration facility itself is unusable. Aborts one cycle, never the monitor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("process enumeration is not supported on this platform")]
    Unsupported,
    #[error("process enumeration failed: {0}")]
    Processes(String),
    #[error("socket enumeration failed: {0}")]
    Sockets(String),
}

/// One process or socket could not be read. Skipped by the collector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("access denied")]
    Denied,
    #[error("entity vanished during enumeration")]
    Vanished,
    #[error("{0}")]
    Other(String),
}

/// Raw failure of a platform terminate call.
#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("no such process")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("refusing to signal pid {0}")]
    Invalid(u32),
    #[error(transparent)]
    Os(#[from] std::io::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterPatternError {
    #[error("pattern ends with an unfinished escape")]
    DanglingEscape,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}
