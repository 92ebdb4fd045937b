//! Global log stream instances.
//!
//! One stream per task: single producer per stream, single consumer (the
//! log drain).

use crate::logging::{LogStream, TaskId};

/// Ingest task log (core 0).
pub static INGEST_LOG: LogStream = LogStream::new(TaskId::Ingest);

/// Process task log (core 1).
pub static PROCESS_LOG: LogStream = LogStream::new(TaskId::Process);

/// Startup and drain-thread messages.
pub static SYSTEM_LOG: LogStream = LogStream::new(TaskId::System);

/// All global streams, in drain priority order.
pub static ALL_LOGS: [&LogStream; 3] = [&INGEST_LOG, &PROCESS_LOG, &SYSTEM_LOG];
