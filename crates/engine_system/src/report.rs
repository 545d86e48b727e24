//! Per-frame reports.

use std::fmt;
use std::time::Duration;

use engine_component::Entity;
use tracing::error;

use crate::system::Phase;

/// A hook that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    /// Name of the failing system.
    pub system: String,
    /// Phase the hook belongs to.
    pub phase: Phase,
    /// The entity being updated, for [`Phase::Update`] failures.
    pub entity: Option<Entity>,
    /// The error chain or panic message.
    pub message: String,
}

impl HookFailure {
    pub(crate) fn log(&self, frame: u64) {
        match self.entity {
            Some(entity) => error!(
                frame,
                system = %self.system,
                phase = %self.phase,
                %entity,
                error = %self.message,
                "system hook failed"
            ),
            None => error!(
                frame,
                system = %self.system,
                phase = %self.phase,
                error = %self.message,
                "system hook failed"
            ),
        }
    }
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed in {}", self.system, self.phase)?;
        if let Some(entity) = self.entity {
            write!(f, " on {entity}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Time spent in each phase of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Sequential before-update hooks.
    pub before_update: Duration,
    /// Snapshot queries plus the parallel pass, up to the barrier.
    pub update: Duration,
    /// Sequential after-update hooks.
    pub after_update: Duration,
    /// Sequential before-render hooks.
    pub before_render: Duration,
}

/// Outcome of one [`FrameScheduler::run_frame`](crate::FrameScheduler::run_frame) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Work items taken from the phase-two snapshot.
    pub work_items: usize,
    /// Work items whose update returned successfully.
    pub completed: usize,
    /// Work items dropped because their entity was destroyed mid-frame.
    pub skipped: usize,
    /// Every hook failure of the frame, in the order observed.
    pub failures: Vec<HookFailure>,
    /// Per-phase durations.
    pub timings: PhaseTimings,
    /// Wall time of the whole frame.
    pub elapsed: Duration,
}

impl FrameReport {
    /// Returns `true` if no hook failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Work items whose update failed.
    #[must_use]
    pub fn failed_items(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.phase == Phase::Update)
            .count()
    }
}
