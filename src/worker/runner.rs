//! Service worker run loop and stop signaling
//!
//! The host calls [`ServiceWorker::run`] once on its worker thread and
//! delivers stop notifications from any other thread through a
//! [`StopHandle`]. The loop checks the shared state cell every iteration
//! and while pacing, so stop latency is bounded by one in-flight tick
//! plus one stop-check nap.

use crate::error::{Result, SvcrunError};
use crate::worker::sink::{LogSink, ProgressSink};
use crate::worker::state::{StateCell, WorkerState};
use crate::worker::workload::{Step, Workload};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// Worker pacing configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between iterations
    pub pace: Duration,
    /// Longest uninterrupted nap while pacing
    ///
    /// The pace sleep is sliced into naps of this length with a stop
    /// check between naps, which keeps stop latency independent of the
    /// pace.
    pub stop_check_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pace: Duration::from_millis(100),
            stop_check_interval: Duration::from_millis(10),
        }
    }
}

/// Events from the worker that external controllers might care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The run loop has started
    Started,
    /// One unit of work completed
    Progress {
        /// Zero-based index of the completed tick
        iteration: u64,
    },
    /// The run has ended; the instance is now stopped
    Stopped {
        /// Total completed ticks for the run
        iterations: u64,
    },
}

/// Cloneable stop signal for a [`ServiceWorker`]
///
/// `request_stop` is a single compare-and-swap: it never blocks, never
/// fails, and is a no-op in every state but `Running`. Safe to call from
/// any number of threads, any number of times, before, during, or after
/// the run.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<StateCell>,
}

impl StopHandle {
    /// Ask the active run to stop at its next state check
    pub fn request_stop(&self) {
        signal_stop(&self.state);
    }

    /// Current lifecycle state of the worker this handle points at
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }
}

fn signal_stop(state: &StateCell) {
    if state.transition(WorkerState::Running, WorkerState::StopRequested) {
        info!("stop requested");
    } else {
        debug!("stop request ignored in state {}", state.get());
    }
}

/// A host-startable, host-stoppable worker
///
/// Owns the lifecycle state and the run loop. `run` blocks the calling
/// thread; at most one run is active per instance, enforced by the state
/// cell. After a run the instance stays `Stopped` until the host calls
/// [`ServiceWorker::reset`].
pub struct ServiceWorker {
    config: WorkerConfig,
    state: Arc<StateCell>,
    sink: Arc<dyn ProgressSink>,
    event_tx: Option<Sender<WorkerEvent>>,
}

impl ServiceWorker {
    /// Create a worker that narrates progress through `tracing`
    pub fn new(config: WorkerConfig) -> Self {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Create a worker with a collaborator-provided output sink
    pub fn with_sink(config: WorkerConfig, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::new()),
            sink,
            event_tx: None,
        }
    }

    /// Set an event notification channel
    ///
    /// Events are sent best-effort; a full or disconnected channel never
    /// stalls the run loop.
    pub fn set_event_channel(&mut self, tx: Sender<WorkerEvent>) {
        self.event_tx = Some(tx);
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Check whether a run is currently active
    pub fn is_running(&self) -> bool {
        matches!(
            self.state.get(),
            WorkerState::Running | WorkerState::StopRequested
        )
    }

    /// Hand out a stop signal usable from other threads
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: self.state.clone(),
        }
    }

    /// Ask the active run to stop; no-op if no run is active
    pub fn request_stop(&self) {
        signal_stop(&self.state);
    }

    /// Make a stopped instance runnable again
    ///
    /// Reuse is a host decision; `run` refuses a spent instance until the
    /// host explicitly resets it. Returns `false` if the worker is not in
    /// the `Stopped` state.
    pub fn reset(&self) -> bool {
        self.state
            .transition(WorkerState::Stopped, WorkerState::NotStarted)
    }

    /// Execute the work loop until a stop is requested or the workload
    /// finishes on its own
    ///
    /// Blocks the calling thread for the lifetime of the run. Performs
    /// `workload.setup` once, then alternates stop checks, ticks, and
    /// paced sleeps. `workload.teardown` runs on every exit path and the
    /// state always reaches `Stopped` before this returns.
    ///
    /// Returns the number of completed ticks. Errors from the workload
    /// propagate to the host after teardown; the host's recourse is to
    /// log and treat the service as stopped.
    pub fn run(&self, args: &[String], workload: &mut dyn Workload) -> Result<u64> {
        if !self
            .state
            .transition(WorkerState::NotStarted, WorkerState::Running)
        {
            return Err(match self.state.get() {
                WorkerState::Stopped => SvcrunError::AlreadyStopped,
                _ => SvcrunError::AlreadyRunning,
            });
        }

        info!("worker started");
        self.send(WorkerEvent::Started);

        let (iterations, outcome) = self.drive(args, workload);
        workload.teardown(self.sink.as_ref());

        // Either the loop observed the request, or the run ended on its
        // own and a late request changes nothing.
        if !self
            .state
            .transition(WorkerState::StopRequested, WorkerState::Stopped)
        {
            self.state
                .transition(WorkerState::Running, WorkerState::Stopped);
        }

        self.send(WorkerEvent::Stopped { iterations });

        match outcome {
            Ok(()) => {
                info!("worker stopped after {} iterations", iterations);
                Ok(iterations)
            }
            Err(e) => {
                error!("worker stopped on error: {}", e);
                Err(e)
            }
        }
    }

    /// The loop proper; returns completed ticks alongside the outcome so
    /// the caller can report progress even for a failed run
    fn drive(
        &self,
        args: &[String],
        workload: &mut dyn Workload,
    ) -> (u64, std::result::Result<(), SvcrunError>) {
        if let Err(e) = workload.setup(args, self.sink.as_ref()) {
            return (0, Err(SvcrunError::Setup(e)));
        }

        let mut completed = 0u64;

        while !self.state.stop_requested() {
            let step = match workload.tick(completed, self.sink.as_ref()) {
                Ok(step) => step,
                Err(e) => return (completed, Err(SvcrunError::workload(completed, e))),
            };

            self.send(WorkerEvent::Progress {
                iteration: completed,
            });
            completed += 1;

            if step == Step::Done {
                debug!("workload finished on its own after {} iterations", completed);
                break;
            }

            self.pace();
        }

        (completed, Ok(()))
    }

    /// Sleep out the configured pace in stop-checkable slices
    fn pace(&self) {
        let slice = self.config.stop_check_interval.max(Duration::from_millis(1));
        let mut remaining = self.config.pace;

        while !remaining.is_zero() {
            if self.state.stop_requested() {
                return;
            }
            let nap = remaining.min(slice);
            thread::sleep(nap);
            remaining -= nap;
        }
    }

    fn send(&self, event: WorkerEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkloadError;
    use crate::worker::sink::MemorySink;
    use crate::worker::workload::CounterWorkload;
    use crossbeam_channel::{unbounded, Receiver};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Workload whose ticks only complete when the test releases them
    struct GatedWorkload {
        gate: Receiver<()>,
    }

    impl Workload for GatedWorkload {
        fn tick(
            &mut self,
            _iteration: u64,
            _sink: &dyn ProgressSink,
        ) -> std::result::Result<Step, WorkloadError> {
            self.gate.recv()?;
            Ok(Step::Continue)
        }
    }

    /// Workload that fails on a chosen iteration and records teardown
    struct FailingWorkload {
        fail_at: u64,
        torn_down: Arc<AtomicBool>,
    }

    impl Workload for FailingWorkload {
        fn tick(
            &mut self,
            iteration: u64,
            _sink: &dyn ProgressSink,
        ) -> std::result::Result<Step, WorkloadError> {
            if iteration == self.fail_at {
                return Err("unit of work exploded".into());
            }
            Ok(Step::Continue)
        }

        fn teardown(&mut self, _sink: &dyn ProgressSink) {
            self.torn_down.store(true, Ordering::SeqCst);
        }
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            pace: Duration::ZERO,
            stop_check_interval: Duration::from_millis(1),
        }
    }

    fn wait_until_running(worker: &ServiceWorker) {
        for _ in 0..2000 {
            if worker.state() == WorkerState::Running {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("worker never reached the running state");
    }

    #[test]
    fn test_stop_before_run_is_noop() {
        let worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));
        let handle = worker.stop_handle();

        handle.request_stop();
        handle.request_stop();
        assert_eq!(worker.state(), WorkerState::NotStarted);

        // The earlier requests must not pre-empt this run
        let iterations = worker
            .run(&[], &mut CounterWorkload::with_limit(3))
            .unwrap();
        assert_eq!(iterations, 3);
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_stop_after_run_is_noop() {
        let worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));
        worker
            .run(&[], &mut CounterWorkload::with_limit(1))
            .unwrap();

        worker.request_stop();
        worker.stop_handle().request_stop();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_natural_completion() {
        let sink = Arc::new(MemorySink::new());
        let worker = ServiceWorker::with_sink(fast_config(), sink.clone());

        let iterations = worker
            .run(&[], &mut CounterWorkload::with_limit(5))
            .unwrap();

        assert_eq!(iterations, 5);
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(sink.lines().contains(&"service counter: 4".to_string()));
    }

    #[test]
    fn test_run_on_spent_instance_requires_reset() {
        let worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));
        worker
            .run(&[], &mut CounterWorkload::with_limit(1))
            .unwrap();

        let err = worker
            .run(&[], &mut CounterWorkload::with_limit(1))
            .unwrap_err();
        assert!(matches!(err, SvcrunError::AlreadyStopped));

        assert!(worker.reset());
        assert_eq!(worker.state(), WorkerState::NotStarted);
        let iterations = worker
            .run(&[], &mut CounterWorkload::with_limit(2))
            .unwrap();
        assert_eq!(iterations, 2);
    }

    #[test]
    fn test_reset_requires_stopped() {
        let worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));
        assert!(!worker.reset());
        assert_eq!(worker.state(), WorkerState::NotStarted);
    }

    #[test]
    fn test_second_concurrent_run_is_refused() {
        let (gate_tx, gate_rx) = unbounded();
        let worker = Arc::new(ServiceWorker::with_sink(
            fast_config(),
            Arc::new(MemorySink::new()),
        ));

        let runner = worker.clone();
        let join = thread::spawn(move || runner.run(&[], &mut GatedWorkload { gate: gate_rx }));

        wait_until_running(&worker);

        let err = worker
            .run(&[], &mut CounterWorkload::with_limit(1))
            .unwrap_err();
        assert!(matches!(err, SvcrunError::AlreadyRunning));
        assert!(err.is_lifecycle());

        worker.request_stop();
        gate_tx.send(()).unwrap();

        let result = join.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_bounded_stop_latency() {
        let (gate_tx, gate_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let sink = Arc::new(MemorySink::new());

        let mut worker = ServiceWorker::with_sink(fast_config(), sink.clone());
        worker.set_event_channel(event_tx);
        let worker = Arc::new(worker);

        let handle = worker.stop_handle();
        let runner = worker.clone();
        let join = thread::spawn(move || {
            let args = vec!["a".to_string(), "b".to_string()];
            runner.run(&args, &mut GatedWorkload { gate: gate_rx })
        });

        // Let exactly three ticks through, then observe them
        for _ in 0..3 {
            gate_tx.send(()).unwrap();
        }
        let mut seen = 0;
        while seen < 3 {
            if let WorkerEvent::Progress { .. } =
                event_rx.recv_timeout(Duration::from_secs(5)).unwrap()
            {
                seen += 1;
            }
        }

        handle.request_stop();

        // Release a possibly in-flight tick; anything beyond that must
        // not run because the stop precedes these tokens
        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();

        let iterations = join.join().unwrap().unwrap();
        assert!(
            (3..=4).contains(&iterations),
            "expected bounded stop latency, got {} iterations",
            iterations
        );
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(sink.lines().contains(&"a".to_string()));
        assert!(sink.lines().contains(&"b".to_string()));
    }

    #[test]
    fn test_concurrent_stop_stress() {
        let worker = Arc::new(ServiceWorker::with_sink(
            WorkerConfig {
                pace: Duration::from_millis(1),
                stop_check_interval: Duration::from_millis(1),
            },
            Arc::new(MemorySink::new()),
        ));

        let runner = worker.clone();
        let join = thread::spawn(move || runner.run(&[], &mut CounterWorkload::unbounded()));

        wait_until_running(&worker);

        let stoppers: Vec<_> = (0..8)
            .map(|_| {
                let handle = worker.stop_handle();
                thread::spawn(move || {
                    for _ in 0..100 {
                        handle.request_stop();
                    }
                })
            })
            .collect();

        for stopper in stoppers {
            stopper.join().unwrap();
        }

        // Exactly one termination, no hang, clean terminal state
        let result = join.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_tick_error_propagates_after_teardown() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));

        let err = worker
            .run(
                &[],
                &mut FailingWorkload {
                    fail_at: 2,
                    torn_down: torn_down.clone(),
                },
            )
            .unwrap_err();

        assert!(matches!(err, SvcrunError::Workload { iteration: 2, .. }));
        assert!(torn_down.load(Ordering::SeqCst));
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_events_cover_the_lifecycle() {
        let (event_tx, event_rx) = unbounded();
        let mut worker = ServiceWorker::with_sink(fast_config(), Arc::new(MemorySink::new()));
        worker.set_event_channel(event_tx);

        worker
            .run(&[], &mut CounterWorkload::with_limit(2))
            .unwrap();

        let events: Vec<_> = event_rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                WorkerEvent::Started,
                WorkerEvent::Progress { iteration: 0 },
                WorkerEvent::Progress { iteration: 1 },
                WorkerEvent::Stopped { iterations: 2 },
            ]
        );
    }
}
