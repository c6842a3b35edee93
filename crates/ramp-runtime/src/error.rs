//! Error types for runtime adapter operations.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur while driving the container runtime.
///
/// All of these are recoverable from the control loop's point of view:
/// a failed operation is logged and the actual/desired mismatch is
/// corrected by the next cycle's reconciliation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to invoke runtime binary: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("could not parse runtime output: {0}")]
    Parse(String),

    #[error("stop of {id} exceeded {secs}s deadline")]
    StopTimeout { id: String, secs: u64 },
}
