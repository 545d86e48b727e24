//! Scheduler error types.

use crate::report::HookFailure;
use crate::system::Phase;

/// Errors returned by the [`FrameScheduler`](crate::FrameScheduler) and
/// [`TickLoop`](crate::TickLoop).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Systems can only be registered before initialisation.
    #[error("scheduler already initialised; systems must be registered at startup")]
    AlreadyInitialized,

    /// `run_frame` was called before `initialize`.
    #[error("scheduler not initialised")]
    NotInitialized,

    /// A system's `init` hook failed.
    #[error("{0}")]
    InitFailed(HookFailure),

    /// Under [`ErrorPolicy::AbortFrame`](crate::ErrorPolicy::AbortFrame), a
    /// hook failed and the frame stopped after the phase completed.
    #[error("frame {frame} aborted after {phase}: {} hook failure(s)", .failures.len())]
    FrameAborted {
        /// The aborted frame.
        frame: u64,
        /// The phase in which the failures occurred.
        phase: Phase,
        /// Every failure of the aborted frame. Never empty.
        failures: Vec<HookFailure>,
    },

    /// Every worker thread has exited.
    #[error("worker pool is closed")]
    PoolClosed,
}
