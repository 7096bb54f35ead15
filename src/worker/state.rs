//! Atomic lifecycle state shared between the run thread and stop callers

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle states of a service worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Created, `run` not yet entered
    NotStarted = 0,
    /// `run` is executing its loop
    Running = 1,
    /// A stop was requested; the loop has not observed it yet
    StopRequested = 2,
    /// `run` has returned
    Stopped = 3,
}

impl WorkerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => WorkerState::NotStarted,
            1 => WorkerState::Running,
            2 => WorkerState::StopRequested,
            _ => WorkerState::Stopped,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::NotStarted => "not-started",
            WorkerState::Running => "running",
            WorkerState::StopRequested => "stop-requested",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared atomic cell holding a [`WorkerState`]
///
/// Two threads touch this cell without a lock (the run loop and stop
/// callers), so every access goes through SeqCst atomics: a stop request
/// that has returned is visible to the very next state check on the run
/// thread. Mutation is compare-and-swap only, which keeps illegal
/// transitions (e.g. stop-requested on a worker that never started) from
/// being expressible.
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Create a cell in the `NotStarted` state
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::NotStarted as u8))
    }

    /// Read the current state
    pub fn get(&self) -> WorkerState {
        WorkerState::from_raw(self.0.load(Ordering::SeqCst))
    }

    /// Transition `from` -> `to` atomically
    ///
    /// Returns `true` if the cell held `from` and now holds `to`; `false`
    /// leaves the cell untouched.
    pub fn transition(&self, from: WorkerState, to: WorkerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Check whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        self.get() == WorkerState::StopRequested
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
