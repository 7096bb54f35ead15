//! Per-iteration units of work executed by the run loop

use crate::error::WorkloadError;
use crate::worker::sink::ProgressSink;

/// Outcome of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More work remains
    Continue,
    /// Natural termination condition reached
    Done,
}

/// One unit of work at a time, driven by [`ServiceWorker::run`]
///
/// The run loop owns pacing and stop checks; implementations own the
/// work. A tick must make bounded-time forward progress - a tick that
/// blocks indefinitely delays the stop check by the same amount.
///
/// [`ServiceWorker::run`]: crate::worker::ServiceWorker::run
pub trait Workload: Send {
    /// One-time setup before the first tick
    fn setup(&mut self, _args: &[String], _sink: &dyn ProgressSink) -> Result<(), WorkloadError> {
        Ok(())
    }

    /// Execute one bounded unit of work
    fn tick(&mut self, iteration: u64, sink: &dyn ProgressSink) -> Result<Step, WorkloadError>;

    /// Teardown; runs on every exit path, including after a failed tick
    fn teardown(&mut self, _sink: &dyn ProgressSink) {}
}

/// Demo workload: announces its arguments, then counts iterations
///
/// With a limit of 0 it runs until the host requests a stop; otherwise
/// the limit is its natural termination condition.
pub struct CounterWorkload {
    limit: u64,
}

impl CounterWorkload {
    /// Create a counter that runs until stopped
    pub fn unbounded() -> Self {
        Self { limit: 0 }
    }

    /// Create a counter that finishes on its own after `limit` ticks
    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }
}

impl Workload for CounterWorkload {
    fn setup(&mut self, args: &[String], sink: &dyn ProgressSink) -> Result<(), WorkloadError> {
        sink.emit("service starting");
        if !args.is_empty() {
            sink.emit("input arguments:");
            for arg in args {
                sink.emit(arg);
            }
        }
        Ok(())
    }

    fn tick(&mut self, iteration: u64, sink: &dyn ProgressSink) -> Result<Step, WorkloadError> {
        sink.emit(&format!("service counter: {}", iteration));

        if self.limit != 0 && iteration + 1 >= self.limit {
            return Ok(Step::Done);
        }

        Ok(Step::Continue)
    }

    fn teardown(&mut self, sink: &dyn ProgressSink) {
        sink.emit("service has stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::sink::MemorySink;

    #[test]
    fn test_counter_finishes_at_limit() {
        let mut counter = CounterWorkload::with_limit(3);
        let sink = MemorySink::new();

        assert_eq!(counter.tick(0, &sink).unwrap(), Step::Continue);
        assert_eq!(counter.tick(1, &sink).unwrap(), Step::Continue);
        assert_eq!(counter.tick(2, &sink).unwrap(), Step::Done);

        assert_eq!(
            sink.lines(),
            vec![
                "service counter: 0",
                "service counter: 1",
                "service counter: 2"
            ]
        );
    }

    #[test]
    fn test_unbounded_counter_never_finishes_on_its_own() {
        let mut counter = CounterWorkload::unbounded();
        let sink = MemorySink::new();

        for i in 0..100 {
            assert_eq!(counter.tick(i, &sink).unwrap(), Step::Continue);
        }
    }

    #[test]
    fn test_setup_announces_arguments() {
        let mut counter = CounterWorkload::unbounded();
        let sink = MemorySink::new();

        let args = vec!["a".to_string(), "b".to_string()];
        counter.setup(&args, &sink).unwrap();

        let lines = sink.lines();
        assert!(lines.contains(&"a".to_string()));
        assert!(lines.contains(&"b".to_string()));
    }
}
