//! Service worker lifecycle: state machine, run loop, and output seam

mod runner;
mod sink;
mod state;
mod workload;

pub use runner::{ServiceWorker, StopHandle, WorkerConfig, WorkerEvent};
pub use sink::{LogSink, MemorySink, NullSink, ProgressSink};
pub use state::{StateCell, WorkerState};
pub use workload::{CounterWorkload, Step, Workload};
