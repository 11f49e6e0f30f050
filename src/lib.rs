//! portscope: live process and listening-port monitor.
//!
//! Modular structure:
//! - [`collectors`]: OS process and socket enumeration
//! - [`snapshot`]: Port correlation, published snapshots, cycle diffs
//! - [`filter`]: Wildcard row filtering
//! - [`scheduler`]: Background polling and the [`Monitor`] handle
//! - [`terminate`]: Process termination gateway
//! - [`view`]: Display-side table model
//! - [`logging`]: tracing setup

pub mod collectors;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod scheduler;
pub mod snapshot;
pub mod terminate;
pub mod view;

pub use collectors::{ProcessSource, SnapshotCollector, SocketSource};
pub use config::MonitorConfig;
pub use error::{AccessError, CollectionError, FilterPatternError, TerminationError};
pub use filter::{filter, FilterPattern, Matcher};
pub use logging::StructuredLogger;
pub use scheduler::{CoreEvent, Monitor};
pub use snapshot::{correlate, diff, ChangeSet, ProcessRecord, Snapshot};
pub use terminate::{TerminationGateway, TerminationOutcome, TerminationResult};
pub use view::ProcessView;
