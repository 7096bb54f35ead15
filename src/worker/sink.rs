//! Observable output from the work loop
//!
//! The worker narrates progress through a collaborator-provided sink
//! rather than a concrete stream, so hosts decide where output lands
//! (log file, memory, nowhere).

use parking_lot::Mutex;
use tracing::info;

/// Destination for per-iteration worker output
pub trait ProgressSink: Send + Sync {
    /// Deliver one line of output
    fn emit(&self, message: &str);
}

/// Sink that routes output through `tracing` at info level
///
/// Default for the CLI host; the subscriber decides whether that ends up
/// on the console or in a log file.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, message: &str) {
        info!(target: "svcrun::worker", "{}", message);
    }
}

/// Sink that discards all output
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _message: &str) {}
}

/// Sink that collects output lines in memory
///
/// Used by tests and by hosts that want to inspect worker output after
/// the run.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of lines collected so far
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Check whether nothing has been emitted yet
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}
