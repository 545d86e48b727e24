//! Scheduler configuration.

use std::num::NonZeroUsize;

use tracing::warn;

/// Environment variable overriding the worker thread count.
pub const WORKERS_ENV: &str = "ENGINE_WORKERS";

/// Environment variable overriding the work queue capacity.
pub const QUEUE_CAPACITY_ENV: &str = "ENGINE_QUEUE_CAPACITY";

/// Default bounded queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Worker count used when the available parallelism cannot be determined.
const FALLBACK_WORKERS: usize = 4;

/// What the scheduler does after a hook fails or panics.
///
/// In both modes the failure is logged with system, phase, and entity, and
/// nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Skip the failing hook or work item, run the rest of the frame, and
    /// list the failure in the [`FrameReport`](crate::FrameReport).
    #[default]
    Continue,
    /// Let the current phase finish (the barrier still holds), then stop the
    /// frame and return [`SchedulerError::FrameAborted`](crate::SchedulerError::FrameAborted).
    AbortFrame,
}

/// Configuration for a [`FrameScheduler`](crate::FrameScheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of worker threads for the parallel update pass.
    pub worker_count: usize,
    /// Capacity of the bounded work queue. Producers block when it is full.
    pub queue_capacity: usize,
    /// Failure handling.
    pub error_policy: ErrorPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism()
                .map_or(FALLBACK_WORKERS, NonZeroUsize::get),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Defaults, overridden by [`WORKERS_ENV`] and [`QUEUE_CAPACITY_ENV`]
    /// when set to a positive integer.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(n) = parse_positive(WORKERS_ENV, lookup(WORKERS_ENV)) {
            config.worker_count = n;
        }
        if let Some(n) = parse_positive(QUEUE_CAPACITY_ENV, lookup(QUEUE_CAPACITY_ENV)) {
            config.queue_capacity = n;
        }
        config
    }

    /// Override the worker count (at least one thread is always used).
    #[must_use]
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    /// Override the queue capacity (at least one slot is always used).
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }

    /// Override the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

fn parse_positive(key: &str, value: Option<String>) -> Option<usize> {
    let value = value?;
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(key, value = %value, "ignoring invalid scheduler setting");
            None
        }
    }
}
