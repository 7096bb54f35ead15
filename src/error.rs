//! Unified error types for svcrun

use thiserror::Error;

/// Error produced by a workload's setup or tick.
///
/// Workloads bring their own error types; the run loop boxes them so the
/// worker stays decoupled from collaborator error enums.
pub type WorkloadError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for svcrun operations
#[derive(Error, Debug)]
pub enum SvcrunError {
    /// A run is already active on this worker instance
    #[error("worker already running")]
    AlreadyRunning,

    /// The worker has finished its run and was not reset
    #[error("worker already stopped; reset before running again")]
    AlreadyStopped,

    /// Workload setup failed before the loop started
    #[error("workload setup failed: {0}")]
    Setup(#[source] WorkloadError),

    /// A unit of work failed mid-loop
    #[error("workload failed at iteration {iteration}: {source}")]
    Workload {
        iteration: u64,
        #[source]
        source: WorkloadError,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for svcrun operations
pub type Result<T> = std::result::Result<T, SvcrunError>;

impl SvcrunError {
    /// Wrap a workload tick failure with the iteration it occurred on
    pub fn workload(iteration: u64, source: WorkloadError) -> Self {
        Self::Workload { iteration, source }
    }

    /// Check if this error is a lifecycle misuse (wrong state for the call)
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            SvcrunError::AlreadyRunning | SvcrunError::AlreadyStopped
        )
    }
}
